use crate::types::{AvlNode, Node};

#[inline]
fn set_p<N: Node>(arena: &mut [N], i: u32, v: Option<u32>) {
    arena[i as usize].set_p(v);
}

#[inline]
fn set_l<N: Node>(arena: &mut [N], i: u32, v: Option<u32>) {
    arena[i as usize].set_l(v);
}

#[inline]
fn set_r<N: Node>(arena: &mut [N], i: u32, v: Option<u32>) {
    arena[i as usize].set_r(v);
}

/// Height of the subtree at `node`, `0` for an empty subtree.
#[inline]
pub fn height<N: AvlNode>(arena: &[N], node: Option<u32>) -> u32 {
    node.map_or(0, |i| arena[i as usize].height())
}

/// Summary of the subtree at `node`, the default summary for an empty subtree.
#[inline]
pub fn summary<N: AvlNode>(arena: &[N], node: Option<u32>) -> N::Summary {
    node.map_or_else(N::Summary::default, |i| arena[i as usize].summary())
}

/// Recomputes height and cached summary of `i` from its children.
pub fn update<N: AvlNode>(arena: &mut [N], i: u32) {
    let l = arena[i as usize].l();
    let r = arena[i as usize].r();
    let h = 1 + height(arena, l).max(height(arena, r));
    let ls = summary(arena, l);
    let rs = summary(arena, r);
    let node = &mut arena[i as usize];
    node.set_height(h);
    node.refresh(ls, rs);
}

fn replace_child<N: Node>(
    arena: &mut [N],
    root: Option<u32>,
    parent: Option<u32>,
    old: u32,
    new: Option<u32>,
) -> Option<u32> {
    match parent {
        Some(p) => {
            if arena[p as usize].l() == Some(old) {
                set_l(arena, p, new);
            } else {
                set_r(arena, p, new);
            }
            root
        }
        None => new,
    }
}

fn rotate_left<N: AvlNode>(arena: &mut [N], root: Option<u32>, x: u32) -> (Option<u32>, u32) {
    let y = arena[x as usize].r().expect("left rotation needs a right child");
    let yl = arena[y as usize].l();
    let p = arena[x as usize].p();

    set_r(arena, x, yl);
    if let Some(yl) = yl {
        set_p(arena, yl, Some(x));
    }
    set_p(arena, y, p);
    let root = replace_child(arena, root, p, x, Some(y));
    set_l(arena, y, Some(x));
    set_p(arena, x, Some(y));

    update(arena, x);
    update(arena, y);
    (root, y)
}

fn rotate_right<N: AvlNode>(arena: &mut [N], root: Option<u32>, x: u32) -> (Option<u32>, u32) {
    let y = arena[x as usize].l().expect("right rotation needs a left child");
    let yr = arena[y as usize].r();
    let p = arena[x as usize].p();

    set_l(arena, x, yr);
    if let Some(yr) = yr {
        set_p(arena, yr, Some(x));
    }
    set_p(arena, y, p);
    let root = replace_child(arena, root, p, x, Some(y));
    set_r(arena, y, Some(x));
    set_p(arena, x, Some(y));

    update(arena, x);
    update(arena, y);
    (root, y)
}

/// Restores the AVL property at `i`, returning the new root and the node now
/// at the top of this subtree.
///
/// A single rotation is used when the inner grandchild is not taller than the
/// outer one, a double rotation otherwise.
fn rebalance<N: AvlNode>(arena: &mut [N], root: Option<u32>, i: u32) -> (Option<u32>, u32) {
    let l = arena[i as usize].l();
    let r = arena[i as usize].r();
    let bf = height(arena, l) as i64 - height(arena, r) as i64;

    if bf >= 2 {
        let l = l.expect("left-heavy node has a left child");
        let outer = arena[l as usize].l();
        let inner = arena[l as usize].r();
        let mut root = root;
        if height(arena, inner) > height(arena, outer) {
            root = rotate_left(arena, root, l).0;
        }
        rotate_right(arena, root, i)
    } else if bf <= -2 {
        let r = r.expect("right-heavy node has a right child");
        let outer = arena[r as usize].r();
        let inner = arena[r as usize].l();
        let mut root = root;
        if height(arena, inner) > height(arena, outer) {
            root = rotate_right(arena, root, r).0;
        }
        rotate_left(arena, root, i)
    } else {
        (root, i)
    }
}

/// Walks from `from` to the root, refreshing cached data and rotating every
/// level whose children differ in height by two or more.
pub fn rebalance_up<N: AvlNode>(arena: &mut [N], root: Option<u32>, from: Option<u32>) -> Option<u32> {
    let mut root = root;
    let mut curr = from;
    while let Some(i) = curr {
        update(arena, i);
        let (new_root, top) = rebalance(arena, root, i);
        root = new_root;
        curr = arena[top as usize].p();
    }
    root
}

fn detach<N: AvlNode>(arena: &mut [N], n: u32) {
    set_p(arena, n, None);
    set_l(arena, n, None);
    set_r(arena, n, None);
    update(arena, n);
}

fn insert_left<N: AvlNode>(arena: &mut [N], root: Option<u32>, n: u32, p: u32) -> Option<u32> {
    detach(arena, n);
    set_l(arena, p, Some(n));
    set_p(arena, n, Some(p));
    rebalance_up(arena, root, Some(p))
}

fn insert_right<N: AvlNode>(arena: &mut [N], root: Option<u32>, n: u32, p: u32) -> Option<u32> {
    detach(arena, n);
    set_r(arena, p, Some(n));
    set_p(arena, n, Some(p));
    rebalance_up(arena, root, Some(p))
}

/// Links `n` immediately before `anchor` in in-order position.
pub fn insert_before<N: AvlNode>(arena: &mut [N], root: Option<u32>, n: u32, anchor: u32) -> Option<u32> {
    match arena[anchor as usize].l() {
        None => insert_left(arena, root, n, anchor),
        Some(l) => {
            let p = last(arena, Some(l)).expect("non-empty subtree has a last node");
            insert_right(arena, root, n, p)
        }
    }
}

/// Links `n` immediately after `anchor` in in-order position.
pub fn insert_after<N: AvlNode>(arena: &mut [N], root: Option<u32>, n: u32, anchor: u32) -> Option<u32> {
    match arena[anchor as usize].r() {
        None => insert_right(arena, root, n, anchor),
        Some(r) => {
            let p = first(arena, Some(r)).expect("non-empty subtree has a first node");
            insert_left(arena, root, n, p)
        }
    }
}

/// Links `n` as the last node of the tree.
pub fn append<N: AvlNode>(arena: &mut [N], root: Option<u32>, n: u32) -> Option<u32> {
    match last(arena, root) {
        None => {
            detach(arena, n);
            Some(n)
        }
        Some(p) => insert_right(arena, root, n, p),
    }
}

/// Links `n` as the first node of the tree.
pub fn prepend<N: AvlNode>(arena: &mut [N], root: Option<u32>, n: u32) -> Option<u32> {
    match first(arena, root) {
        None => {
            detach(arena, n);
            Some(n)
        }
        Some(p) => insert_left(arena, root, n, p),
    }
}

/// Unlinks `n` from the tree and returns the new root.
///
/// A node with two children is replaced by its in-order predecessor or
/// successor, taken from whichever subtree is taller. The replacement node is
/// moved (not copied), so handles to it stay valid.
pub fn remove<N: AvlNode>(arena: &mut [N], root: Option<u32>, n: u32) -> Option<u32> {
    let p = arena[n as usize].p();
    let l = arena[n as usize].l();
    let r = arena[n as usize].r();

    let root = if let (Some(l), Some(r)) = (l, r) {
        let rep = if height(arena, Some(l)) > height(arena, Some(r)) {
            last(arena, Some(l))
        } else {
            first(arena, Some(r))
        }
        .expect("non-empty subtree has an extreme node");
        let rep_parent = arena[rep as usize]
            .p()
            .expect("replacement node sits below the removed node");
        let rep_child = arena[rep as usize].l().or(arena[rep as usize].r());

        if arena[rep_parent as usize].l() == Some(rep) {
            set_l(arena, rep_parent, rep_child);
        } else {
            set_r(arena, rep_parent, rep_child);
        }
        if let Some(c) = rep_child {
            set_p(arena, c, Some(rep_parent));
        }

        let nl = arena[n as usize].l();
        let nr = arena[n as usize].r();
        set_l(arena, rep, nl);
        set_r(arena, rep, nr);
        if let Some(x) = nl {
            set_p(arena, x, Some(rep));
        }
        if let Some(x) = nr {
            set_p(arena, x, Some(rep));
        }
        set_p(arena, rep, p);
        let root = replace_child(arena, root, p, n, Some(rep));

        let start = if rep_parent == n { rep } else { rep_parent };
        rebalance_up(arena, root, Some(start))
    } else {
        let c = l.or(r);
        if let Some(c) = c {
            set_p(arena, c, p);
        }
        let root = replace_child(arena, root, p, n, c);
        rebalance_up(arena, root, p)
    };

    detach(arena, n);
    root
}

/// Leftmost node under `root`.
pub fn first<N: Node>(arena: &[N], root: Option<u32>) -> Option<u32> {
    let mut curr = root?;
    while let Some(l) = arena[curr as usize].l() {
        curr = l;
    }
    Some(curr)
}

/// Rightmost node under `root`.
pub fn last<N: Node>(arena: &[N], root: Option<u32>) -> Option<u32> {
    let mut curr = root?;
    while let Some(r) = arena[curr as usize].r() {
        curr = r;
    }
    Some(curr)
}

/// In-order successor.
pub fn next<N: Node>(arena: &[N], mut curr: u32) -> Option<u32> {
    if let Some(r) = arena[curr as usize].r() {
        return first(arena, Some(r));
    }
    let mut p = arena[curr as usize].p();
    while let Some(pi) = p {
        if arena[pi as usize].r() == Some(curr) {
            curr = pi;
            p = arena[pi as usize].p();
        } else {
            return Some(pi);
        }
    }
    None
}

/// In-order predecessor.
pub fn prev<N: Node>(arena: &[N], mut curr: u32) -> Option<u32> {
    if let Some(l) = arena[curr as usize].l() {
        return last(arena, Some(l));
    }
    let mut p = arena[curr as usize].p();
    while let Some(pi) = p {
        if arena[pi as usize].l() == Some(curr) {
            curr = pi;
            p = arena[pi as usize].p();
        } else {
            return Some(pi);
        }
    }
    None
}

/// Checks parent links, cached heights and the AVL balance property.
pub fn assert_avl<N: AvlNode>(arena: &[N], root: Option<u32>) -> Result<(), String> {
    let Some(root) = root else {
        return Ok(());
    };
    if arena[root as usize].p().is_some() {
        return Err("Root has parent".to_string());
    }

    fn check<N: AvlNode>(arena: &[N], node: u32) -> Result<u32, String> {
        let l = arena[node as usize].l();
        let r = arena[node as usize].r();
        let mut lh = 0;
        let mut rh = 0;
        if let Some(l) = l {
            if arena[l as usize].p() != Some(node) {
                return Err(format!("Broken parent link on left child of {node}"));
            }
            lh = check(arena, l)?;
        }
        if let Some(r) = r {
            if arena[r as usize].p() != Some(node) {
                return Err(format!("Broken parent link on right child of {node}"));
            }
            rh = check(arena, r)?;
        }
        let h = 1 + lh.max(rh);
        if arena[node as usize].height() != h {
            return Err(format!(
                "Height mismatch at {node}: expected {h}, got {}",
                arena[node as usize].height()
            ));
        }
        if lh.abs_diff(rh) > 1 {
            return Err(format!("AVL balance violated at {node}"));
        }
        Ok(h)
    }

    check(arena, root).map(|_| ())
}
