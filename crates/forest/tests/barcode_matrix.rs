use glaze_forest::{Barcode, Colour};
use glaze_util::Fuzzer;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add(usize, Colour, usize),
    Remove(usize, usize),
    Set(usize, Colour, usize),
}

fn colour() -> impl Strategy<Value = Colour> {
    prop_oneof![Just(Colour::Black), Just(Colour::White)]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..100, colour(), 1usize..5).prop_map(|(i, c, n)| Op::Add(i, c, n)),
        (0usize..100, 1usize..5).prop_map(|(i, n)| Op::Remove(i, n)),
        (0usize..100, colour(), 1usize..5).prop_map(|(i, c, n)| Op::Set(i, c, n)),
    ]
}

/// Applies `op` to both the barcode and a plain vector, clamping positions to
/// the current length.
fn apply(barcode: &mut Barcode, model: &mut Vec<Colour>, op: &Op) {
    let len = model.len();
    if len == 0 && !matches!(op, Op::Add(..)) {
        return;
    }
    match *op {
        Op::Add(i, c, n) => {
            let i = i % (len + 1);
            barcode.add(i, c, n).unwrap();
            model.splice(i..i, std::iter::repeat(c).take(n));
        }
        Op::Remove(i, n) => {
            let i = i % len;
            let n = n.min(len - i);
            barcode.remove(i, n).unwrap();
            model.drain(i..i + n);
        }
        Op::Set(i, c, n) => {
            let i = i % len;
            let n = n.min(len - i);
            barcode.set(i, c, n).unwrap();
            model[i..i + n].fill(c);
        }
    }
}

fn black_runs(model: &[Colour]) -> usize {
    model
        .iter()
        .enumerate()
        .filter(|(i, c)| **c == Colour::Black && (*i == 0 || model[i - 1] == Colour::White))
        .count()
}

#[test]
fn mixed_workload_matrix() {
    for seed in 0..30u64 {
        let fuzzer = Fuzzer::from_u64(seed);
        let mut barcode = Barcode::new();
        let mut model = Vec::new();
        for _ in 0..200 {
            let colour = *fuzzer.pick(&[Colour::Black, Colour::White]);
            let n = fuzzer.random_int(1, 4);
            let i = fuzzer.random_int(0, 100);
            let op = match fuzzer.random_int(0, 2) {
                0 => Op::Add(i, colour, n),
                1 => Op::Remove(i, n),
                _ => Op::Set(i, colour, n),
            };
            apply(&mut barcode, &mut model, &op);
        }
        assert_eq!(barcode.iter().collect::<Vec<_>>(), model, "seed={seed}");
        assert_eq!(barcode.node_count(), black_runs(&model), "seed={seed}");
        barcode.assert_valid().unwrap();
    }
}

#[test]
fn white_tail_materializes_matrix() {
    let mut barcode = Barcode::new();
    barcode.add(0, Colour::White, 1000).unwrap();
    assert_eq!(barcode.node_count(), 0);
    barcode.add(500, Colour::Black, 1).unwrap();
    assert_eq!(barcode.tree_size(), 501);
    assert_eq!(barcode.white_count(), 1000);
    barcode.remove(500, 1).unwrap();
    assert_eq!(barcode.node_count(), 0);
    assert_eq!(barcode.tree_size(), 0);
    assert_eq!(barcode.len(), 1000);
}

proptest! {
    #[test]
    fn runs_are_compressed(ops in prop::collection::vec(op(), 1..60)) {
        let mut barcode = Barcode::new();
        let mut model = Vec::new();
        for op in &ops {
            apply(&mut barcode, &mut model, op);
            prop_assert_eq!(barcode.node_count(), black_runs(&model));
        }
        prop_assert_eq!(barcode.iter().collect::<Vec<_>>(), model);
        prop_assert!(barcode.assert_valid().is_ok());
    }

    #[test]
    fn colour_index_round_trips(ops in prop::collection::vec(op(), 1..60)) {
        let mut barcode = Barcode::new();
        let mut model = Vec::new();
        for op in &ops {
            apply(&mut barcode, &mut model, op);
        }
        for (i, c) in model.iter().enumerate() {
            let ci = barcode.get_colour_index(i, *c).unwrap();
            prop_assert_eq!(barcode.get_index(ci, *c).unwrap(), i);
            prop_assert!(barcode.get_colour_index(i, c.flip()).is_err());
        }
    }
}
