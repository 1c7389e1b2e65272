use rand::{rngs::OsRng, Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use std::cell::RefCell;

/// One random list mutation, expressed against the list length at the time
/// it is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit<T> {
    Insert(usize, T),
    Remove(usize),
    Set(usize, T),
}

impl<T: Clone> Edit<T> {
    /// Applies the edit to a plain `Vec`, the reference model for list tests.
    pub fn apply(&self, list: &mut Vec<T>) {
        match self {
            Edit::Insert(i, v) => list.insert(*i, v.clone()),
            Edit::Remove(i) => {
                list.remove(*i);
            }
            Edit::Set(i, v) => list[*i] = v.clone(),
        }
    }
}

/// Seeded random generator for list workloads.
///
/// Uses the xoshiro256** PRNG, so two fuzzers built from the same seed
/// produce the same sequence.
///
/// ```
/// use glaze_util::Fuzzer;
///
/// let fuzzer = Fuzzer::new(Some([7; 32]));
/// let list = fuzzer.random_list(8, &['a', 'b']);
/// assert_eq!(list.len(), 8);
/// ```
pub struct Fuzzer {
    pub seed: [u8; 32],
    rng: RefCell<Xoshiro256StarStar>,
}

impl Fuzzer {
    /// Creates a fuzzer, drawing a seed from `OsRng` when none is given.
    pub fn new(seed: Option<[u8; 32]>) -> Self {
        let seed = seed.unwrap_or_else(|| {
            let mut bytes = [0u8; 32];
            OsRng.fill_bytes(&mut bytes);
            bytes
        });
        Self {
            seed,
            rng: RefCell::new(Xoshiro256StarStar::from_seed(seed)),
        }
    }

    /// Seed built from a single number, handy for looping over seeds.
    pub fn from_u64(seed: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&seed.to_le_bytes());
        Self::new(Some(bytes))
    }

    /// Random integer in `[min, max]`.
    pub fn random_int(&self, min: usize, max: usize) -> usize {
        self.rng.borrow_mut().gen_range(min..=max)
    }

    pub fn random_bool(&self, probability: f64) -> bool {
        self.rng.borrow_mut().gen_bool(probability)
    }

    pub fn pick<'a, T>(&self, elements: &'a [T]) -> &'a T {
        let idx = self.rng.borrow_mut().gen_range(0..elements.len());
        &elements[idx]
    }

    /// List of `len` values drawn from `alphabet`. Small alphabets give long
    /// runs of equal neighbours.
    pub fn random_list<T: Clone>(&self, len: usize, alphabet: &[T]) -> Vec<T> {
        (0..len).map(|_| self.pick(alphabet).clone()).collect()
    }

    /// Random edit valid for a list of length `len`.
    pub fn random_edit<T: Clone>(&self, len: usize, alphabet: &[T]) -> Edit<T> {
        let roll = if len == 0 { 0 } else { self.random_int(0, 2) };
        match roll {
            0 => Edit::Insert(self.random_int(0, len), self.pick(alphabet).clone()),
            1 => Edit::Remove(self.random_int(0, len - 1)),
            _ => Edit::Set(self.random_int(0, len - 1), self.pick(alphabet).clone()),
        }
    }

    /// `count` edits applied in turn to a list that starts at length `len`.
    pub fn random_edits<T: Clone>(&self, len: usize, count: usize, alphabet: &[T]) -> Vec<Edit<T>> {
        let mut len = len;
        let mut edits = Vec::with_capacity(count);
        for _ in 0..count {
            let edit = self.random_edit(len, alphabet);
            match edit {
                Edit::Insert(..) => len += 1,
                Edit::Remove(_) => len -= 1,
                Edit::Set(..) => {}
            }
            edits.push(edit);
        }
        edits
    }
}
