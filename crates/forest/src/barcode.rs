//! Run-length compressed two-colour sequence with dual indexing.
//!
//! A barcode is a sequence of positions, each [`Colour::Black`] or
//! [`Colour::White`]. It is stored as one tree node per black run: the node
//! holds the white gap in front of the run and the run length itself. White
//! positions after the last black run are a plain counter (`white_space`) and
//! never become nodes, so append-heavy white workloads cost O(1).
//!
//! Compression invariant: every node has a non-empty black run, and every
//! node except the first has a non-empty white gap. Two adjacent nodes can
//! therefore never describe one continuous run of the same colour.
//!
//! Positions are addressed either by real index (position in the whole
//! sequence) or by colour index (position among the positions of one
//! colour).

use crate::avl;
use crate::error::ForestError;
use crate::types::{AvlNode, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Colour {
    Black,
    White,
}

impl Colour {
    pub fn flip(self) -> Self {
        match self {
            Colour::Black => Colour::White,
            Colour::White => Colour::Black,
        }
    }
}

/// Per-colour position counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub white: usize,
    pub black: usize,
}

impl Counts {
    pub fn total(&self) -> usize {
        self.white + self.black
    }

    pub fn of(&self, colour: Colour) -> usize {
        match colour {
            Colour::Black => self.black,
            Colour::White => self.white,
        }
    }

    fn add(&mut self, other: Counts) {
        self.white += other.white;
        self.black += other.black;
    }
}

#[derive(Debug, Clone)]
struct RunNode {
    p: Option<u32>,
    l: Option<u32>,
    r: Option<u32>,
    height: u32,
    /// White positions in front of the black run.
    white: usize,
    /// Length of the black run.
    black: usize,
    sub: Counts,
}

impl RunNode {
    fn new(white: usize, black: usize) -> Self {
        Self {
            p: None,
            l: None,
            r: None,
            height: 1,
            white,
            black,
            sub: Counts { white, black },
        }
    }

    fn own(&self) -> usize {
        self.white + self.black
    }
}

impl Node for RunNode {
    fn p(&self) -> Option<u32> {
        self.p
    }

    fn l(&self) -> Option<u32> {
        self.l
    }

    fn r(&self) -> Option<u32> {
        self.r
    }

    fn set_p(&mut self, v: Option<u32>) {
        self.p = v;
    }

    fn set_l(&mut self, v: Option<u32>) {
        self.l = v;
    }

    fn set_r(&mut self, v: Option<u32>) {
        self.r = v;
    }
}

impl AvlNode for RunNode {
    type Summary = Counts;

    fn height(&self) -> u32 {
        self.height
    }

    fn set_height(&mut self, height: u32) {
        self.height = height;
    }

    fn summary(&self) -> Counts {
        self.sub
    }

    fn refresh(&mut self, left: Counts, right: Counts) {
        self.sub = Counts {
            white: left.white + self.white + right.white,
            black: left.black + self.black + right.black,
        };
    }
}

#[derive(Debug, Clone, Default)]
pub struct Barcode {
    arena: Vec<RunNode>,
    free: Vec<u32>,
    root: Option<u32>,
    /// Trailing white positions after the last black run.
    white_space: usize,
}

impl Barcode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Positions covered by tree nodes, excluding trailing white space.
    pub fn tree_size(&self) -> usize {
        avl::summary(&self.arena, self.root).total()
    }

    pub fn len(&self) -> usize {
        self.tree_size() + self.white_space
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn colour_count(&self, colour: Colour) -> usize {
        let tree = avl::summary(&self.arena, self.root).of(colour);
        match colour {
            Colour::Black => tree,
            Colour::White => tree + self.white_space,
        }
    }

    pub fn black_count(&self) -> usize {
        self.colour_count(Colour::Black)
    }

    pub fn white_count(&self) -> usize {
        self.colour_count(Colour::White)
    }

    /// Number of tree nodes, one per black run.
    pub fn node_count(&self) -> usize {
        self.arena.len() - self.free.len()
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.free.clear();
        self.root = None;
        self.white_space = 0;
    }

    fn alloc(&mut self, white: usize, black: usize) -> u32 {
        let node = RunNode::new(white, black);
        match self.free.pop() {
            Some(i) => {
                self.arena[i as usize] = node;
                i
            }
            None => {
                self.arena.push(node);
                (self.arena.len() - 1) as u32
            }
        }
    }

    fn unlink(&mut self, i: u32) {
        self.root = avl::remove(&mut self.arena, self.root, i);
        self.free.push(i);
    }

    fn refresh_from(&mut self, i: u32) {
        self.root = avl::rebalance_up(&mut self.arena, self.root, Some(i));
    }

    /// Node containing tree position `index` and the offset into that node.
    fn locate(&self, mut index: usize) -> (u32, usize) {
        let mut curr = self.root;
        while let Some(i) = curr {
            let n = &self.arena[i as usize];
            let left = avl::summary(&self.arena, n.l).total();
            if index < left {
                curr = n.l;
                continue;
            }
            index -= left;
            if index < n.own() {
                return (i, index);
            }
            index -= n.own();
            curr = n.r;
        }
        unreachable!("tree position beyond tree size");
    }

    /// Real index of the first position covered by node `i`.
    fn node_start(&self, mut i: u32) -> usize {
        let mut start = avl::summary(&self.arena, self.arena[i as usize].l).total();
        while let Some(p) = self.arena[i as usize].p {
            let pn = &self.arena[p as usize];
            if pn.r == Some(i) {
                start += avl::summary(&self.arena, pn.l).total() + pn.own();
            }
            i = p;
        }
        start
    }

    fn check_index(&self, index: usize) -> Result<(), ForestError> {
        let len = self.len();
        if index >= len {
            return Err(ForestError::IndexOutOfBounds { index, len });
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<Colour, ForestError> {
        self.check_index(index)?;
        if index >= self.tree_size() {
            return Ok(Colour::White);
        }
        let (i, offset) = self.locate(index);
        Ok(if offset < self.arena[i as usize].white {
            Colour::White
        } else {
            Colour::Black
        })
    }

    /// Per-colour counts of the positions in `[0, index)`. `index` is clamped
    /// to the length of the barcode.
    pub fn counts_before(&self, index: usize) -> Counts {
        let tree_size = self.tree_size();
        if index >= tree_size {
            let mut counts = avl::summary(&self.arena, self.root);
            counts.white += (index - tree_size).min(self.white_space);
            return counts;
        }

        let mut acc = Counts::default();
        let mut idx = index;
        let mut curr = self.root;
        while let Some(i) = curr {
            let n = &self.arena[i as usize];
            let left = avl::summary(&self.arena, n.l);
            if idx < left.total() {
                curr = n.l;
                continue;
            }
            idx -= left.total();
            acc.add(left);
            if idx < n.own() {
                acc.white += idx.min(n.white);
                acc.black += idx.saturating_sub(n.white);
                return acc;
            }
            idx -= n.own();
            acc.white += n.white;
            acc.black += n.black;
            curr = n.r;
        }
        acc
    }

    pub fn colour_count_before(&self, index: usize, colour: Colour) -> usize {
        self.counts_before(index).of(colour)
    }

    /// Colour index of the position at `index`, which must have `colour`.
    pub fn get_colour_index(&self, index: usize, colour: Colour) -> Result<usize, ForestError> {
        if self.get(index)? != colour {
            return Err(ForestError::WrongColour {
                index,
                expected: colour,
            });
        }
        Ok(self.colour_count_before(index, colour))
    }

    pub fn get_black_index(&self, index: usize) -> Result<usize, ForestError> {
        self.get_colour_index(index, Colour::Black)
    }

    pub fn get_white_index(&self, index: usize) -> Result<usize, ForestError> {
        self.get_colour_index(index, Colour::White)
    }

    /// Colour index of `index` if it has `colour`, otherwise of the nearest
    /// position of that colour to its left. `None` when there is none.
    pub fn colour_index_left(&self, index: usize, colour: Colour) -> Option<usize> {
        let before = self.colour_count_before(index, colour);
        if index < self.len() && self.get(index).ok() == Some(colour) {
            Some(before)
        } else {
            before.checked_sub(1)
        }
    }

    /// Colour index of `index` if it has `colour`, otherwise of the nearest
    /// position of that colour to its right. Equals
    /// [`colour_count`](Self::colour_count) when there is none.
    pub fn colour_index_right(&self, index: usize, colour: Colour) -> usize {
        self.colour_count_before(index, colour)
    }

    /// Real index of the `colour_index`-th position of `colour`.
    pub fn get_index(&self, colour_index: usize, colour: Colour) -> Result<usize, ForestError> {
        let count = self.colour_count(colour);
        if colour_index >= count {
            return Err(ForestError::IndexOutOfBounds {
                index: colour_index,
                len: count,
            });
        }

        let mut k = colour_index;
        let mut base = 0;
        let mut curr = self.root;
        while let Some(i) = curr {
            let n = &self.arena[i as usize];
            let left = avl::summary(&self.arena, n.l);
            if k < left.of(colour) {
                curr = n.l;
                continue;
            }
            k -= left.of(colour);
            base += left.total();
            match colour {
                Colour::Black if k < n.black => return Ok(base + n.white + k),
                Colour::Black => k -= n.black,
                Colour::White if k < n.white => return Ok(base + k),
                Colour::White => k -= n.white,
            }
            base += n.own();
            curr = n.r;
        }
        // Only white positions live past the last node.
        Ok(base + k)
    }

    /// Exclusive end of the same-colour run containing `index`.
    pub fn run_end(&self, index: usize) -> Result<usize, ForestError> {
        self.check_index(index)?;
        if index >= self.tree_size() {
            return Ok(self.len());
        }
        let (i, offset) = self.locate(index);
        let n = &self.arena[i as usize];
        let start = self.node_start(i);
        Ok(if offset < n.white {
            start + n.white
        } else {
            start + n.own()
        })
    }

    /// Inserts `length` positions of `colour` so the first lands at `index`.
    pub fn add(&mut self, index: usize, colour: Colour, length: usize) -> Result<(), ForestError> {
        let len = self.len();
        if index > len {
            return Err(ForestError::IndexOutOfBounds { index, len });
        }
        if length == 0 {
            return Ok(());
        }
        match colour {
            Colour::Black => self.add_black(index, length),
            Colour::White => self.add_white(index, length),
        }
        Ok(())
    }

    /// Appends `length` positions of `colour` at the end.
    pub fn push(&mut self, colour: Colour, length: usize) {
        if length == 0 {
            return;
        }
        let end = self.len();
        match colour {
            Colour::Black => self.add_black(end, length),
            Colour::White => self.add_white(end, length),
        }
    }

    fn add_black(&mut self, index: usize, length: usize) {
        let tree_size = self.tree_size();
        if index >= tree_size {
            let offset = index - tree_size;
            let last = avl::last(&self.arena, self.root);
            match last {
                Some(last) if offset == 0 => {
                    self.arena[last as usize].black += length;
                    self.refresh_from(last);
                }
                _ => {
                    // Trailing white space in front of the new run materializes.
                    self.white_space -= offset;
                    let n = self.alloc(offset, length);
                    self.root = avl::append(&mut self.arena, self.root, n);
                }
            }
            return;
        }

        let (i, offset) = self.locate(index);
        let white = self.arena[i as usize].white;
        if offset >= white {
            self.arena[i as usize].black += length;
            self.refresh_from(i);
            return;
        }
        if offset == 0 {
            if let Some(prev) = avl::prev(&self.arena, i) {
                self.arena[prev as usize].black += length;
                self.refresh_from(prev);
                return;
            }
        }
        // Split the white gap: the front part goes to the new node.
        self.arena[i as usize].white = white - offset;
        self.refresh_from(i);
        let n = self.alloc(offset, length);
        self.root = avl::insert_before(&mut self.arena, self.root, n, i);
    }

    fn add_white(&mut self, index: usize, length: usize) {
        if index >= self.tree_size() {
            self.white_space += length;
            return;
        }

        let (i, offset) = self.locate(index);
        let white = self.arena[i as usize].white;
        if offset <= white {
            self.arena[i as usize].white += length;
            self.refresh_from(i);
            return;
        }
        // Split the black run: its tail moves to a new node behind the gap.
        let keep = offset - white;
        let tail = self.arena[i as usize].black - keep;
        self.arena[i as usize].black = keep;
        self.refresh_from(i);
        let n = self.alloc(length, tail);
        self.root = avl::insert_after(&mut self.arena, self.root, n, i);
    }

    /// Removes `length` positions starting at `index`.
    pub fn remove(&mut self, index: usize, length: usize) -> Result<(), ForestError> {
        let len = self.len();
        if index + length > len {
            return Err(ForestError::IndexOutOfBounds {
                index: index + length,
                len,
            });
        }

        let mut remaining = length;
        while remaining > 0 {
            if index >= self.tree_size() {
                self.white_space -= remaining;
                break;
            }

            let (i, offset) = self.locate(index);
            let (white, black) = (self.arena[i as usize].white, self.arena[i as usize].black);
            if offset < white {
                let k = remaining.min(white - offset);
                remaining -= k;
                self.arena[i as usize].white -= k;
                if self.arena[i as usize].white == 0 {
                    if let Some(prev) = avl::prev(&self.arena, i) {
                        // The gap closed: the two black runs are now one.
                        self.arena[prev as usize].black += black;
                        self.unlink(i);
                        self.refresh_from(prev);
                        continue;
                    }
                }
                self.refresh_from(i);
            } else {
                let k = remaining.min(white + black - offset);
                remaining -= k;
                self.arena[i as usize].black -= k;
                if self.arena[i as usize].black > 0 {
                    self.refresh_from(i);
                    continue;
                }
                // The run is gone: its gap joins the following white.
                match avl::next(&self.arena, i) {
                    Some(next) => {
                        self.arena[next as usize].white += white;
                        self.unlink(i);
                        self.refresh_from(next);
                    }
                    None => {
                        self.white_space += white;
                        self.unlink(i);
                    }
                }
            }
        }
        Ok(())
    }

    /// Recolours `length` positions starting at `index`.
    pub fn set(&mut self, index: usize, colour: Colour, length: usize) -> Result<(), ForestError> {
        self.remove(index, length)?;
        self.add(index, colour, length)
    }

    /// Colour runs in order, as `(colour, length)`.
    pub fn runs(&self) -> Vec<(Colour, usize)> {
        let mut runs = Vec::with_capacity(self.node_count() * 2 + 1);
        let mut curr = avl::first(&self.arena, self.root);
        while let Some(i) = curr {
            let n = &self.arena[i as usize];
            if n.white > 0 {
                runs.push((Colour::White, n.white));
            }
            runs.push((Colour::Black, n.black));
            curr = avl::next(&self.arena, i);
        }
        if self.white_space > 0 {
            runs.push((Colour::White, self.white_space));
        }
        runs
    }

    pub fn iter(&self) -> impl Iterator<Item = Colour> + '_ {
        self.runs()
            .into_iter()
            .flat_map(|(colour, len)| std::iter::repeat(colour).take(len))
    }

    /// Checks the compression invariant, cached counts and AVL shape.
    pub fn assert_valid(&self) -> Result<(), String> {
        avl::assert_avl(&self.arena, self.root)?;

        fn check(arena: &[RunNode], node: Option<u32>) -> Result<Counts, String> {
            let Some(i) = node else {
                return Ok(Counts::default());
            };
            let n = &arena[i as usize];
            if n.black == 0 {
                return Err(format!("Node {i} has an empty black run"));
            }
            let mut counts = check(arena, n.l)?;
            counts.white += n.white;
            counts.black += n.black;
            counts.add(check(arena, n.r)?);
            if counts != n.sub {
                return Err(format!("Cached counts mismatch at {i}"));
            }
            Ok(counts)
        }
        check(&self.arena, self.root)?;

        let mut curr = avl::first(&self.arena, self.root);
        let mut first = true;
        while let Some(i) = curr {
            if !first && self.arena[i as usize].white == 0 {
                return Err(format!("Node {i} is not compressed into its predecessor"));
            }
            first = false;
            curr = avl::next(&self.arena, i);
        }
        Ok(())
    }
}
