//! Myers O(ND) shortest edit script and list reconciliation.
//!
//! The edit graph has `alpha` along x and `beta` along y. A horizontal step
//! deletes `alpha[x]`, a vertical step inserts `beta[y]`, a diagonal step
//! keeps a matching pair. The script is returned as the sequence of unit-step
//! points from `(0, 0)` to `(alpha_len, beta_len)`.

use tracing::debug;

/// The two sequences being compared, seen through lengths and a pairwise
/// equality test.
pub trait DiffMatcher {
    fn alpha_len(&self) -> usize;
    fn beta_len(&self) -> usize;
    fn match_pair(&self, alpha: usize, beta: usize) -> bool;
}

/// Compares two slices, by `PartialEq` or by a custom equality.
pub struct SliceMatcher<'a, T, F = fn(&T, &T) -> bool> {
    alpha: &'a [T],
    beta: &'a [T],
    eq: F,
}

impl<'a, T: PartialEq> SliceMatcher<'a, T> {
    pub fn new(alpha: &'a [T], beta: &'a [T]) -> Self {
        Self {
            alpha,
            beta,
            eq: <T as PartialEq>::eq,
        }
    }
}

impl<'a, T, F> SliceMatcher<'a, T, F>
where
    F: Fn(&T, &T) -> bool,
{
    pub fn with_eq(alpha: &'a [T], beta: &'a [T], eq: F) -> Self {
        Self { alpha, beta, eq }
    }
}

impl<T, F> DiffMatcher for SliceMatcher<'_, T, F>
where
    F: Fn(&T, &T) -> bool,
{
    fn alpha_len(&self) -> usize {
        self.alpha.len()
    }

    fn beta_len(&self) -> usize {
        self.beta.len()
    }

    fn match_pair(&self, alpha: usize, beta: usize) -> bool {
        (self.eq)(&self.alpha[alpha], &self.beta[beta])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

/// One step of an edit script, with indices into alpha and beta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Match(usize, usize),
    Delete(usize),
    Insert(usize),
}

/// Shortest edit script from alpha to beta as unit-step points.
///
/// Among paths of equal length the vertical step is preferred on the lower
/// boundary diagonal, and elsewhere whenever the diagonal below reaches
/// further right than the diagonal above.
pub fn shortest_edit_script<M: DiffMatcher + ?Sized>(matcher: &M) -> Vec<Point> {
    let n = matcher.alpha_len();
    let m = matcher.beta_len();
    let max_d = (n + m) as isize;
    let offset = max_d + 1;

    // Points with the arena id of their predecessor.
    let mut arena: Vec<(Point, Option<usize>)> = Vec::new();
    // Furthest point reached on each diagonal `k = x - y`.
    let mut v: Vec<Option<usize>> = vec![None; (2 * max_d + 3) as usize];

    for d in 0..=max_d {
        let mut k = -d;
        while k <= d {
            let ki = (offset + k) as usize;
            let start = if d == 0 {
                Some((Point { x: 0, y: 0 }, None))
            } else {
                let horizontal = (if k > -d { v[ki - 1] } else { None })
                    .map(|p| {
                        let at = arena[p].0;
                        (Point { x: at.x + 1, y: at.y }, Some(p))
                    })
                    .filter(|(pt, _)| pt.x <= n);
                let vertical = (if k < d { v[ki + 1] } else { None })
                    .map(|p| {
                        let at = arena[p].0;
                        (Point { x: at.x, y: at.y + 1 }, Some(p))
                    })
                    .filter(|(pt, _)| pt.y <= m);
                match (horizontal, vertical) {
                    (Some(h), Some(down)) => Some(if h.0.x <= down.0.x { down } else { h }),
                    (h, down) => h.or(down),
                }
            };

            let Some((mut pt, pred)) = start else {
                v[ki] = None;
                k += 2;
                continue;
            };
            arena.push((pt, pred));
            let mut last = arena.len() - 1;
            while pt.x < n && pt.y < m && matcher.match_pair(pt.x, pt.y) {
                pt = Point {
                    x: pt.x + 1,
                    y: pt.y + 1,
                };
                arena.push((pt, Some(last)));
                last = arena.len() - 1;
            }
            v[ki] = Some(last);

            if pt.x >= n && pt.y >= m {
                debug!(alpha = n, beta = m, distance = d, "edit script found");
                return path(&arena, last);
            }
            k += 2;
        }
    }
    unreachable!("no edit script within alpha + beta steps")
}

fn path(arena: &[(Point, Option<usize>)], last: usize) -> Vec<Point> {
    let mut points = Vec::new();
    let mut curr = Some(last);
    while let Some(i) = curr {
        points.push(arena[i].0);
        curr = arena[i].1;
    }
    points.reverse();
    points
}

/// The shortest edit script as typed steps.
pub fn edit_script<M: DiffMatcher + ?Sized>(matcher: &M) -> Vec<Edit> {
    shortest_edit_script(matcher)
        .windows(2)
        .map(|w| match (w[1].x - w[0].x, w[1].y - w[0].y) {
            (1, 1) => Edit::Match(w[0].x, w[0].y),
            (1, 0) => Edit::Delete(w[0].x),
            (0, 1) => Edit::Insert(w[0].y),
            delta => unreachable!("edit script step {delta:?}"),
        })
        .collect()
}

/// Random-access list that [`replace_all`] can rewrite in place.
pub trait MutableSequence<T> {
    fn len(&self) -> usize;
    fn get(&self, index: usize) -> &T;
    fn set(&mut self, index: usize, value: T);
    fn insert(&mut self, index: usize, value: T);
    fn remove(&mut self, index: usize);
}

impl<T> MutableSequence<T> for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn get(&self, index: usize) -> &T {
        &self[index]
    }

    fn set(&mut self, index: usize, value: T) {
        self[index] = value;
    }

    fn insert(&mut self, index: usize, value: T) {
        Vec::insert(self, index, value);
    }

    fn remove(&mut self, index: usize) {
        Vec::remove(self, index);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// Write matched source elements over their target counterparts, so
    /// equal-but-not-identical elements are refreshed and reported as
    /// updates.
    pub updates: bool,
}

struct TargetMatcher<'a, T, S: ?Sized, F> {
    target: &'a S,
    source: &'a [T],
    eq: &'a F,
}

impl<T, S, F> DiffMatcher for TargetMatcher<'_, T, S, F>
where
    S: MutableSequence<T> + ?Sized,
    F: Fn(&T, &T) -> bool,
{
    fn alpha_len(&self) -> usize {
        self.target.len()
    }

    fn beta_len(&self) -> usize {
        self.source.len()
    }

    fn match_pair(&self, alpha: usize, beta: usize) -> bool {
        (self.eq)(self.target.get(alpha), &self.source[beta])
    }
}

/// Rewrites `target` into `source` with a minimal number of inserts and
/// removes.
pub fn replace_all<T, S>(target: &mut S, source: &[T], options: DiffOptions)
where
    T: PartialEq + Clone,
    S: MutableSequence<T> + ?Sized,
{
    replace_all_with(target, source, options, |a: &T, b: &T| a == b);
}

pub fn replace_all_with<T, S, F>(target: &mut S, source: &[T], options: DiffOptions, eq: F)
where
    T: Clone,
    S: MutableSequence<T> + ?Sized,
    F: Fn(&T, &T) -> bool,
{
    let script = shortest_edit_script(&TargetMatcher {
        target: &*target,
        source,
        eq: &eq,
    });

    let mut target_index = 0;
    let mut source_index = 0;
    for w in script.windows(2) {
        match (w[1].x - w[0].x, w[1].y - w[0].y) {
            (1, 1) => {
                if options.updates {
                    target.set(target_index, source[source_index].clone());
                }
                target_index += 1;
                source_index += 1;
            }
            (1, 0) => target.remove(target_index),
            (0, 1) => {
                target.insert(target_index, source[source_index].clone());
                target_index += 1;
                source_index += 1;
            }
            delta => unreachable!("edit script step {delta:?}"),
        }
    }
}
