//! BSP dungeon generation.
//!
//! Recursively partitions the grid into regions, carves one room per leaf
//! region, then connects sibling subtrees with corridors. The partition
//! tree is arena-indexed (nodes referenced by index, not links) and is
//! retained after generation for room lookups.
//!
//! Generation runs three strictly ordered passes over the same tree:
//! 1. `build_bsp` - split regions until no axis can fit two minimum regions
//! 2. `build_rooms` - carve one room per leaf, inset by random margins
//! 3. `build_path` - connect sibling subtrees, straight or zig-zag

use serde::{Deserialize, Serialize};

use super::{CellKind, Grid, Region};
use crate::rng::GameRng;
use crate::CoreError;

/// Index of a node in the partition tree arena
pub type NodeId = usize;

/// Caller-supplied generation parameters, all strictly positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Minimum width of a partition region
    pub min_region_width: i32,
    /// Minimum height of a partition region
    pub min_region_height: i32,
    /// Smallest inset of a room edge from its region edge
    pub min_room_margin: i32,
    /// Largest inset of a room edge from its region edge
    pub max_room_margin: i32,
}

impl GenerationParams {
    /// Reject parameter sets that cannot produce a valid map.
    ///
    /// Checked before any carving happens; the generator never silently
    /// produces a single giant unsplit region or a zero-area room.
    fn validate(&self, width: usize, height: usize) -> Result<(), CoreError> {
        let invalid = |reason: String| Err(CoreError::InvalidParams { reason });

        if self.min_region_width < 1
            || self.min_region_height < 1
            || self.min_room_margin < 1
            || self.max_room_margin < 1
        {
            return invalid("all parameters must be strictly positive".into());
        }
        if self.min_room_margin > self.max_room_margin {
            return invalid(format!(
                "min_room_margin {} exceeds max_room_margin {}",
                self.min_room_margin, self.max_room_margin
            ));
        }
        // Worst-case room: a minimum-size region with maximum margins on
        // both sides must still leave at least one floor cell.
        if self.min_region_width <= 2 * self.max_room_margin
            || self.min_region_height <= 2 * self.max_room_margin
        {
            return invalid(format!(
                "margins up to {} leave no room inside a {}x{} region",
                self.max_room_margin, self.min_region_width, self.min_region_height
            ));
        }
        // The root must be splittable on at least one axis.
        if (width as i32) < 2 * self.min_region_width
            && (height as i32) < 2 * self.min_region_height
        {
            return invalid(format!(
                "{}x{} grid cannot be split with minimum region {}x{}",
                width, height, self.min_region_width, self.min_region_height
            ));
        }
        Ok(())
    }
}

/// A node of the binary space partition tree.
///
/// Internal nodes hold a recorded split orientation and accumulated lists
/// of every room and corridor carved in their subtree; leaves hold the one
/// room carved inside their bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionNode {
    /// Region this node covers
    pub bounds: Region,
    /// First child (top or left half)
    pub left: Option<NodeId>,
    /// Second child (bottom or right half)
    pub right: Option<NodeId>,
    /// Split orientation; `None` for leaves
    pub split_is_horizontal: Option<bool>,
    /// Room carved in this leaf; set once, never reassigned
    pub room: Option<Region>,
    /// All rooms carved in this subtree, gathered bottom-up
    pub child_rooms: Vec<Region>,
    /// All corridor segments carved in this subtree, gathered bottom-up
    pub child_paths: Vec<Region>,
}

impl PartitionNode {
    fn new(bounds: Region) -> Self {
        Self {
            bounds,
            left: None,
            right: None,
            split_is_horizontal: None,
            room: None,
            child_rooms: Vec::new(),
            child_paths: Vec::new(),
        }
    }

    /// Check if this node was not split further
    pub fn is_leaf(&self) -> bool {
        self.left.is_none()
    }
}

/// The partition tree produced by generation.
///
/// Owns all nodes in an arena; children refer to their parents' entries by
/// index, so the tree serializes trivially.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<PartitionNode>,
    params: GenerationParams,
}

/// Generate a dungeon map.
///
/// The grid starts entirely wall; rooms and corridors are carved in place.
/// The returned tree is retained for queries such as [`Tree::random_room`]
/// and [`Tree::room_containing`]. Same seed, same parameters: same map.
pub fn generate(
    width: usize,
    height: usize,
    params: GenerationParams,
    rng: &mut GameRng,
) -> Result<(Grid, Tree), CoreError> {
    params.validate(width, height)?;

    let mut grid = Grid::new(width, height);
    let root_bounds = Region::new(0, 0, width as i32 - 1, height as i32 - 1);
    let mut tree = Tree {
        nodes: vec![PartitionNode::new(root_bounds)],
        params,
    };

    tree.build_bsp(Tree::ROOT, rng);
    tree.build_rooms(Tree::ROOT, &mut grid, rng);
    tree.build_path(Tree::ROOT, &mut grid, rng);

    Ok((grid, tree))
}

impl Tree {
    /// Index of the root node
    pub const ROOT: NodeId = 0;

    /// Get a node by index
    pub fn node(&self, id: NodeId) -> Option<&PartitionNode> {
        self.nodes.get(id)
    }

    /// The root node
    pub fn root(&self) -> &PartitionNode {
        &self.nodes[Self::ROOT]
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree holds only an unsplit root (never after a
    /// successful `generate`)
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// All leaf rooms
    pub fn rooms(&self) -> &[Region] {
        &self.root().child_rooms
    }

    /// All corridor segments
    pub fn paths(&self) -> &[Region] {
        &self.root().child_paths
    }

    /// Pick a uniformly random leaf room
    pub fn random_room(&self, rng: &mut GameRng) -> Option<Region> {
        rng.choose(self.rooms()).copied()
    }

    /// Find the leaf room containing a coordinate, descending through
    /// region bounds rather than scanning every room
    pub fn room_containing(&self, x: i32, y: i32) -> Option<Region> {
        let mut id = Self::ROOT;
        loop {
            let node = &self.nodes[id];
            if !node.bounds.contains(x, y) {
                return None;
            }
            match (node.left, node.right) {
                (Some(l), Some(r)) => {
                    id = if self.nodes[l].bounds.contains(x, y) { l } else { r };
                }
                _ => {
                    return node.room.filter(|room| room.contains(x, y));
                }
            }
        }
    }

    fn push(&mut self, bounds: Region) -> NodeId {
        self.nodes.push(PartitionNode::new(bounds));
        self.nodes.len() - 1
    }

    /// Partition pass: recursively split regions.
    ///
    /// A region stays a leaf iff neither axis can fit two minimum regions.
    /// When only one axis is splittable the split is forced onto that axis;
    /// when both are, the axis is chosen uniformly at random. The cut line
    /// is uniform in the range that leaves both children at least the
    /// minimum size, so the children exactly partition the parent.
    fn build_bsp(&mut self, id: NodeId, rng: &mut GameRng) {
        let bounds = self.nodes[id].bounds;
        let min_w = self.params.min_region_width;
        let min_h = self.params.min_region_height;

        let can_split_x = bounds.width() >= 2 * min_w;
        let can_split_y = bounds.height() >= 2 * min_h;

        let horizontal = match (can_split_y, can_split_x) {
            (false, false) => return,
            (true, false) => true,
            (false, true) => false,
            (true, true) => rng.one_in(2),
        };

        let (first, second) = if horizontal {
            let cut = rng.range(bounds.ly + min_h - 1, bounds.hy - min_h);
            (
                Region::new(bounds.lx, bounds.ly, bounds.hx, cut),
                Region::new(bounds.lx, cut + 1, bounds.hx, bounds.hy),
            )
        } else {
            let cut = rng.range(bounds.lx + min_w - 1, bounds.hx - min_w);
            (
                Region::new(bounds.lx, bounds.ly, cut, bounds.hy),
                Region::new(cut + 1, bounds.ly, bounds.hx, bounds.hy),
            )
        };

        let left = self.push(first);
        let right = self.push(second);
        let node = &mut self.nodes[id];
        node.left = Some(left);
        node.right = Some(right);
        node.split_is_horizontal = Some(horizontal);

        self.build_bsp(left, rng);
        self.build_bsp(right, rng);
    }

    /// Room pass: post-order traversal carving one room per leaf.
    ///
    /// Each room edge is inset from its region edge by an independently
    /// random margin in `[min_room_margin, max_room_margin]`; this is the
    /// only place room geometry is randomized. Internal nodes accumulate
    /// their children's room lists.
    fn build_rooms(&mut self, id: NodeId, grid: &mut Grid, rng: &mut GameRng) {
        if let (Some(l), Some(r)) = (self.nodes[id].left, self.nodes[id].right) {
            self.build_rooms(l, grid, rng);
            self.build_rooms(r, grid, rng);
            let mut rooms = self.nodes[l].child_rooms.clone();
            rooms.extend_from_slice(&self.nodes[r].child_rooms);
            self.nodes[id].child_rooms = rooms;
            return;
        }

        let bounds = self.nodes[id].bounds;
        let lo = self.params.min_room_margin;
        let hi = self.params.max_room_margin;
        let room = Region::new(
            bounds.lx + rng.range(lo, hi),
            bounds.ly + rng.range(lo, hi),
            bounds.hx - rng.range(lo, hi),
            bounds.hy - rng.range(lo, hi),
        );

        for x in room.lx..=room.hx {
            for y in room.ly..=room.hy {
                grid.carve(x, y, CellKind::Floor);
            }
        }

        let node = &mut self.nodes[id];
        node.room = Some(room);
        node.child_rooms = vec![room];
    }

    /// Path pass: post-order traversal connecting sibling subtrees.
    ///
    /// Candidate pairs are tried in priority order: existing corridor
    /// pairs first, then room pairs, both within the adjacency gap window.
    /// If no pair is adjacent within the window the gap bound is relaxed,
    /// shortest gap first, which guarantees the two subtrees end up
    /// connected.
    fn build_path(&mut self, id: NodeId, grid: &mut Grid, rng: &mut GameRng) {
        let (Some(l), Some(r)) = (self.nodes[id].left, self.nodes[id].right) else {
            return;
        };
        self.build_path(l, grid, rng);
        self.build_path(r, grid, rng);

        let Some(horizontal) = self.nodes[id].split_is_horizontal else {
            return;
        };

        let left_paths = self.nodes[l].child_paths.clone();
        let right_paths = self.nodes[r].child_paths.clone();
        let left_rooms = self.nodes[l].child_rooms.clone();
        let right_rooms = self.nodes[r].child_rooms.clone();

        let mut segments = first_connection(&left_paths, &right_paths, horizontal, &self.params, rng)
            .or_else(|| first_connection(&left_rooms, &right_rooms, horizontal, &self.params, rng))
            .or_else(|| {
                fallback_connection(&left_rooms, &right_rooms, horizontal, &self.params, rng)
            })
            .unwrap_or_default();

        for segment in &segments {
            for x in segment.lx..=segment.hx {
                for y in segment.ly..=segment.hy {
                    grid.carve(x, y, CellKind::Path);
                }
            }
        }

        let mut paths = left_paths;
        paths.extend(right_paths);
        paths.append(&mut segments);
        self.nodes[id].child_paths = paths;
    }
}

/// Swap the axes of a region, mapping a vertical-split connection problem
/// onto the horizontal-split one
fn transpose(r: &Region) -> Region {
    Region::new(r.ly, r.lx, r.hy, r.hx)
}

/// Try each pair in order and return the first successful connection
fn first_connection(
    from: &[Region],
    to: &[Region],
    horizontal: bool,
    params: &GenerationParams,
    rng: &mut GameRng,
) -> Option<Vec<Region>> {
    for a in from {
        for b in to {
            if let Some(segments) = connect_pair(a, b, horizontal, params, rng, true) {
                return Some(segments);
            }
        }
    }
    None
}

/// Relaxed-gap connection: try room pairs shortest gap first, ignoring the
/// adjacency window. Used only when no pair is adjacent within the window.
fn fallback_connection(
    from: &[Region],
    to: &[Region],
    horizontal: bool,
    params: &GenerationParams,
    rng: &mut GameRng,
) -> Option<Vec<Region>> {
    let gap_between = |a: &Region, b: &Region| -> i32 {
        let (a, b) = if horizontal {
            (*a, *b)
        } else {
            (transpose(a), transpose(b))
        };
        let (upper, lower) = if a.ly <= b.ly { (a, b) } else { (b, a) };
        lower.ly - upper.hy - 1
    };

    let mut pairs: Vec<(&Region, &Region)> =
        from.iter().flat_map(|a| to.iter().map(move |b| (a, b))).collect();
    pairs.sort_by_key(|&(a, b)| gap_between(a, b));

    for (a, b) in pairs {
        if let Some(segments) = connect_pair(a, b, horizontal, params, rng, false) {
            return Some(segments);
        }
    }
    None
}

/// Connect two regions across a split, if they are geometrically adjacent.
///
/// For a horizontal split (children stacked vertically) the regions must
/// overlap by at least one column and, when `enforce_gap_window` is set,
/// their vertical gap must fall within
/// `[2 * min_room_margin, 2 * max_room_margin]`. Overlapping pairs get a
/// straight single-width corridor at a uniformly random column of the
/// overlap; pairs offset entirely past each other get a three-segment
/// zig-zag whose stubs are always at least 2 cells long, so corridors
/// never touch a room corner. Returns the carved segments, which may be
/// empty when the regions already touch.
fn connect_pair(
    a: &Region,
    b: &Region,
    horizontal: bool,
    params: &GenerationParams,
    rng: &mut GameRng,
    enforce_gap_window: bool,
) -> Option<Vec<Region>> {
    if !horizontal {
        let segments =
            connect_vertically(&transpose(a), &transpose(b), params, rng, enforce_gap_window)?;
        return Some(segments.iter().map(transpose).collect());
    }
    connect_vertically(a, b, params, rng, enforce_gap_window)
}

/// The horizontal-split case: `a` and `b` are stacked vertically
fn connect_vertically(
    a: &Region,
    b: &Region,
    params: &GenerationParams,
    rng: &mut GameRng,
    enforce_gap_window: bool,
) -> Option<Vec<Region>> {
    let (upper, lower) = if a.hy < b.ly {
        (a, b)
    } else if b.hy < a.ly {
        (b, a)
    } else {
        // Regions overlap on the split axis; carved cells already touch.
        return if a.x_overlap(b).is_some() {
            Some(Vec::new())
        } else {
            None
        };
    };

    let gap = lower.ly - upper.hy - 1;
    if enforce_gap_window
        && !(2 * params.min_room_margin..=2 * params.max_room_margin).contains(&gap)
    {
        return None;
    }

    if let Some((lo, hi)) = upper.x_overlap(lower) {
        if gap == 0 {
            return Some(Vec::new());
        }
        let x = rng.range(lo, hi);
        return Some(vec![Region::new(x, upper.hy + 1, x, lower.ly - 1)]);
    }

    // No shared column: a straight corridor is geometrically impossible.
    // Both stubs need length >= 2, which needs a gap of at least 3.
    if gap < 3 {
        return None;
    }
    let upper_x = rng.range(upper.lx, upper.hx);
    let lower_x = rng.range(lower.lx, lower.hx);
    let join_y = rng.range(upper.hy + 2, lower.ly - 2);
    Some(vec![
        Region::new(upper_x, upper.hy + 1, upper_x, join_y),
        Region::new(upper_x.min(lower_x), join_y, upper_x.max(lower_x), join_y),
        Region::new(lower_x, join_y, lower_x, lower.ly - 1),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::CellKind;

    fn params() -> GenerationParams {
        GenerationParams {
            min_region_width: 6,
            min_region_height: 6,
            min_room_margin: 1,
            max_room_margin: 2,
        }
    }

    #[test]
    fn test_rejects_non_positive_params() {
        let mut p = params();
        p.min_room_margin = 0;
        assert!(matches!(
            generate(40, 30, p, &mut GameRng::new(1)),
            Err(CoreError::InvalidParams { .. })
        ));
    }

    #[test]
    fn test_rejects_inverted_margins() {
        let mut p = params();
        p.min_room_margin = 3;
        assert!(generate(40, 30, p, &mut GameRng::new(1)).is_err());
    }

    #[test]
    fn test_rejects_margins_that_swallow_rooms() {
        let mut p = params();
        p.max_room_margin = 3; // 6 - 2*3 leaves nothing
        assert!(generate(40, 30, p, &mut GameRng::new(1)).is_err());
    }

    #[test]
    fn test_rejects_unsplittable_root() {
        // 11x11 grid with minimum region 6: neither axis fits two regions
        assert!(matches!(
            generate(11, 11, params(), &mut GameRng::new(1)),
            Err(CoreError::InvalidParams { .. })
        ));
    }

    #[test]
    fn test_root_is_split_on_40x30() {
        let mut rng = GameRng::new(12345);
        let (_, tree) = generate(40, 30, params(), &mut rng).unwrap();
        assert!(!tree.root().is_leaf(), "40x30 root must be split");
        assert!(tree.root().split_is_horizontal.is_some());
        assert!(tree.len() >= 3);
    }

    #[test]
    fn test_children_exactly_partition_parent() {
        let mut rng = GameRng::new(99);
        let (_, tree) = generate(40, 30, params(), &mut rng).unwrap();

        for id in 0..tree.len() {
            let node = tree.node(id).unwrap();
            let (Some(l), Some(r)) = (node.left, node.right) else {
                continue;
            };
            let a = tree.node(l).unwrap().bounds;
            let b = tree.node(r).unwrap().bounds;
            let area = node.bounds.width() * node.bounds.height();
            assert_eq!(a.width() * a.height() + b.width() * b.height(), area);
            assert!(node.bounds.contains_region(&a));
            assert!(node.bounds.contains_region(&b));
            if node.split_is_horizontal == Some(true) {
                assert_eq!(a.hy + 1, b.ly);
            } else {
                assert_eq!(a.hx + 1, b.lx);
            }
        }
    }

    #[test]
    fn test_leaves_meet_minimum_size() {
        let mut rng = GameRng::new(7);
        let (_, tree) = generate(40, 30, params(), &mut rng).unwrap();
        for id in 0..tree.len() {
            let node = tree.node(id).unwrap();
            if node.is_leaf() {
                assert!(node.bounds.width() >= 6, "leaf narrower than minimum");
                assert!(node.bounds.height() >= 6, "leaf shorter than minimum");
            }
        }
    }

    #[test]
    fn test_every_leaf_room_strictly_inside_its_region() {
        let mut rng = GameRng::new(2024);
        let (_, tree) = generate(40, 30, params(), &mut rng).unwrap();
        let mut leaves = 0;
        for id in 0..tree.len() {
            let node = tree.node(id).unwrap();
            if !node.is_leaf() {
                assert!(node.room.is_none(), "internal nodes never carve rooms");
                continue;
            }
            leaves += 1;
            let room = node.room.expect("every leaf carves a room");
            assert!(room.is_valid());
            assert!(room.lx > node.bounds.lx);
            assert!(room.ly > node.bounds.ly);
            assert!(room.hx < node.bounds.hx);
            assert!(room.hy < node.bounds.hy);
        }
        assert!(leaves >= 2);
        assert_eq!(tree.rooms().len(), leaves);
    }

    #[test]
    fn test_border_stays_wall() {
        let mut rng = GameRng::new(5150);
        let (grid, _) = generate(40, 30, params(), &mut rng).unwrap();
        for x in 0..40 {
            assert_eq!(grid.kind(x, 0), Some(CellKind::Wall));
            assert_eq!(grid.kind(x, 29), Some(CellKind::Wall));
        }
        for y in 0..30 {
            assert_eq!(grid.kind(0, y), Some(CellKind::Wall));
            assert_eq!(grid.kind(39, y), Some(CellKind::Wall));
        }
    }

    #[test]
    fn test_same_seed_same_map() {
        let (grid_a, tree_a) = generate(40, 30, params(), &mut GameRng::new(11)).unwrap();
        let (grid_b, tree_b) = generate(40, 30, params(), &mut GameRng::new(11)).unwrap();
        assert_eq!(tree_a.rooms(), tree_b.rooms());
        assert_eq!(tree_a.paths(), tree_b.paths());
        for x in 0..40 {
            for y in 0..30 {
                assert_eq!(grid_a.kind(x, y), grid_b.kind(x, y));
            }
        }
    }

    #[test]
    fn test_room_containing() {
        let mut rng = GameRng::new(314);
        let (_, tree) = generate(40, 30, params(), &mut rng).unwrap();

        for room in tree.rooms() {
            let found = tree.room_containing(room.lx, room.ly);
            assert_eq!(found, Some(*room));
        }
        // Border is wall, never inside a room
        assert_eq!(tree.room_containing(0, 0), None);
        assert_eq!(tree.room_containing(-3, 4), None);
    }

    #[test]
    fn test_random_room_is_a_leaf_room() {
        let mut rng = GameRng::new(8);
        let (_, tree) = generate(40, 30, params(), &mut rng).unwrap();
        for _ in 0..20 {
            let room = tree.random_room(&mut rng).unwrap();
            assert!(tree.rooms().contains(&room));
        }
    }

    #[test]
    fn test_forced_split_on_single_axis() {
        // 40x11: only the x axis fits two minimum regions, so every split
        // must be vertical.
        let mut rng = GameRng::new(64);
        let (_, tree) = generate(40, 11, params(), &mut rng).unwrap();
        for id in 0..tree.len() {
            let node = tree.node(id).unwrap();
            if !node.is_leaf() {
                assert_eq!(node.split_is_horizontal, Some(false));
            }
        }
    }

    #[test]
    fn test_connect_pair_straight_within_overlap() {
        let mut rng = GameRng::new(1);
        let a = Region::new(2, 2, 8, 5);
        let b = Region::new(5, 9, 12, 12);
        let segments = connect_pair(&a, &b, true, &params(), &mut rng, true).unwrap();
        assert_eq!(segments.len(), 1);
        let s = segments[0];
        assert_eq!(s.lx, s.hx, "straight corridor is single-width");
        assert!((5..=8).contains(&s.lx));
        assert_eq!(s.ly, 6);
        assert_eq!(s.hy, 8);
    }

    #[test]
    fn test_connect_pair_zig_zag_without_overlap() {
        let mut rng = GameRng::new(1);
        // Offset entirely past each other, gap of 4 rows
        let a = Region::new(2, 2, 5, 5);
        let b = Region::new(9, 10, 12, 13);
        let segments = connect_pair(&a, &b, true, &params(), &mut rng, true).unwrap();
        assert_eq!(segments.len(), 3);

        let (stub_a, join, stub_b) = (segments[0], segments[1], segments[2]);
        assert!(stub_a.height() >= 2, "stub must clear the room corner");
        assert!(stub_b.height() >= 2, "stub must clear the room corner");
        assert_eq!(stub_a.hy, join.ly);
        assert_eq!(stub_b.ly, join.ly);
        assert!(join.x_overlap(&stub_a).is_some());
        assert!(join.x_overlap(&stub_b).is_some());
    }

    #[test]
    fn test_connect_pair_respects_gap_window() {
        let mut rng = GameRng::new(1);
        // Gap of 9 rows, way past 2 * max_room_margin = 4
        let a = Region::new(2, 2, 8, 5);
        let b = Region::new(5, 15, 12, 18);
        assert!(connect_pair(&a, &b, true, &params(), &mut rng, true).is_none());
        // The relaxed form still connects them
        assert!(connect_pair(&a, &b, true, &params(), &mut rng, false).is_some());
    }

    #[test]
    fn test_tree_serializes() {
        let mut rng = GameRng::new(21);
        let (_, tree) = generate(40, 30, params(), &mut rng).unwrap();
        let json = serde_json::to_string(&tree).unwrap();
        let restored: Tree = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.rooms(), tree.rooms());
        assert_eq!(restored.len(), tree.len());
    }
}
