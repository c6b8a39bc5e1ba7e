//! Pathfinding graph over the walkable cells of a grid.
//!
//! One graph node per non-wall cell, 8-directional edges of uniform
//! weight 1. BFS, Dijkstra and A* share a single frontier loop so the
//! termination and relaxation logic cannot drift between variants; only
//! the priority key differs.
//!
//! Diagonal moves cost the same as orthogonal ones. That makes BFS and
//! Dijkstra return identical path costs and is deliberate, not an
//! oversight: turn-based movement charges one turn per step regardless of
//! direction.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::dungeon::Grid;
use crate::Coord;

/// 8-directional adjacency offsets
const NEIGHBORS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Which search strategy to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum SearchAlgorithm {
    /// FIFO frontier; shortest path by edge count
    Bfs,
    /// Priority frontier ordered by accumulated cost
    Dijkstra,
    /// Priority frontier ordered by accumulated cost plus octile heuristic
    AStar,
}

/// A walkable cell and its weighted edges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Cell coordinate
    pub pos: Coord,
    /// Neighboring walkable cells and the cost to step there
    pub edges: HashMap<Coord, u32>,
}

/// Search output: the predecessor map plus how many nodes the search
/// expanded before reaching the goal
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Maps each reached coordinate to the coordinate it was reached from
    pub predecessors: HashMap<Coord, Coord>,
    /// Number of frontier nodes expanded
    pub visited: usize,
}

/// Weighted graph built once from a finished grid.
///
/// Immutable thereafter: if the grid is regenerated the caller must build
/// a new graph. Searching a stale graph against a new grid is a caller
/// error and surfaces only as wrong or missing paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    nodes: HashMap<Coord, GraphNode>,
    walls: HashSet<Coord>,
}

impl Graph {
    /// Build the graph from every non-wall cell of the grid
    pub fn build(grid: &Grid) -> Self {
        let mut nodes = HashMap::new();
        let mut walls = HashSet::new();

        for x in 0..grid.width() as i32 {
            for y in 0..grid.height() as i32 {
                if !grid.is_walkable(x, y) {
                    walls.insert((x, y));
                    continue;
                }
                let edges = NEIGHBORS
                    .iter()
                    .map(|(dx, dy)| (x + dx, y + dy))
                    .filter(|&(nx, ny)| grid.is_walkable(nx, ny))
                    .map(|n| (n, 1))
                    .collect();
                nodes.insert((x, y), GraphNode { pos: (x, y), edges });
            }
        }

        Self { nodes, walls }
    }

    /// Get a node by coordinate
    pub fn node(&self, pos: Coord) -> Option<&GraphNode> {
        self.nodes.get(&pos)
    }

    /// Check if a coordinate is a walkable node
    pub fn contains(&self, pos: Coord) -> bool {
        self.nodes.contains_key(&pos)
    }

    /// Number of walkable nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the grid had no walkable cells
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Cells excluded from the graph
    pub fn walls(&self) -> &HashSet<Coord> {
        &self.walls
    }

    /// Unweighted shortest path by edge count (FIFO frontier)
    pub fn bfs(&self, start: Coord, goal: Coord) -> Option<HashMap<Coord, Coord>> {
        self.search(start, goal, SearchAlgorithm::Bfs)
            .map(|r| r.predecessors)
    }

    /// Weighted shortest path (priority frontier by accumulated cost)
    pub fn dijkstra(&self, start: Coord, goal: Coord) -> Option<HashMap<Coord, Coord>> {
        self.search(start, goal, SearchAlgorithm::Dijkstra)
            .map(|r| r.predecessors)
    }

    /// Heuristic-guided weighted shortest path
    pub fn a_star(&self, start: Coord, goal: Coord) -> Option<HashMap<Coord, Coord>> {
        self.search(start, goal, SearchAlgorithm::AStar)
            .map(|r| r.predecessors)
    }

    /// Shared traversal for all three variants.
    ///
    /// Relaxes a neighbor only when the new cost strictly improves the best
    /// known cost, and terminates the moment the goal is popped from the
    /// frontier. Returns `None` when start or goal is not a walkable node,
    /// or when the goal is unreachable.
    pub fn search(
        &self,
        start: Coord,
        goal: Coord,
        algorithm: SearchAlgorithm,
    ) -> Option<SearchResult> {
        if !self.contains(start) || !self.contains(goal) {
            return None;
        }

        let mut predecessors = HashMap::new();
        let mut best_cost: HashMap<Coord, u32> = HashMap::new();
        let mut frontier = BinaryHeap::new();
        let mut order: u64 = 0;
        let mut visited = 0;

        best_cost.insert(start, 0);
        frontier.push(FrontierNode {
            priority: priority(algorithm, 0, start, goal),
            order,
            cost: 0,
            pos: start,
        });

        while let Some(current) = frontier.pop() {
            // Stale entry superseded by a cheaper relaxation
            if best_cost.get(&current.pos).is_some_and(|&c| current.cost > c) {
                continue;
            }
            visited += 1;
            if current.pos == goal {
                return Some(SearchResult {
                    predecessors,
                    visited,
                });
            }

            let Some(node) = self.nodes.get(&current.pos) else {
                continue;
            };
            for (&next, &weight) in &node.edges {
                let next_cost = current.cost + weight;
                if best_cost.get(&next).is_none_or(|&c| next_cost < c) {
                    best_cost.insert(next, next_cost);
                    predecessors.insert(next, current.pos);
                    order += 1;
                    frontier.push(FrontierNode {
                        priority: priority(algorithm, next_cost, next, goal),
                        order,
                        cost: next_cost,
                        pos: next,
                    });
                }
            }
        }

        None
    }
}

/// Priority key per variant. BFS uses a constant key, so the insertion
/// order tiebreak makes the frontier a plain FIFO queue.
fn priority(algorithm: SearchAlgorithm, cost: u32, pos: Coord, goal: Coord) -> u32 {
    match algorithm {
        SearchAlgorithm::Bfs => 0,
        SearchAlgorithm::Dijkstra => cost,
        SearchAlgorithm::AStar => cost + octile_distance(pos, goal),
    }
}

/// Octile distance: `dx + dy - min(dx, dy)` with both unit costs 1.
///
/// Matches the uniform edge weight, so the heuristic is admissible and
/// consistent.
fn octile_distance(a: Coord, b: Coord) -> u32 {
    let dx = (a.0 - b.0).unsigned_abs();
    let dy = (a.1 - b.1).unsigned_abs();
    dx + dy - dx.min(dy)
}

/// Walk the predecessor chain from `goal` back to the search start and
/// reverse it. The returned path excludes the start cell; it is empty
/// when start and goal coincide.
pub fn reconstruct_path(goal: Coord, predecessors: &HashMap<Coord, Coord>) -> Vec<Coord> {
    let mut path = Vec::new();
    let mut current = goal;
    while let Some(&prev) = predecessors.get(&current) {
        path.push(current);
        current = prev;
    }
    path.reverse();
    path
}

/// Frontier entry ordered for a min-heap on (priority, insertion order)
#[derive(Clone, Copy, Eq, PartialEq)]
struct FrontierNode {
    priority: u32,
    order: u64,
    cost: u32,
    pos: Coord,
}

impl Ord for FrontierNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for FrontierNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
