//! Incremental uniform-cost search over a weighted grid.

use std::collections::{BinaryHeap, HashMap};
use std::fmt;

use waygrid_core::Point;

use crate::traits::Traversal;

/// Sentinel cost meaning "impassable or not discovered".
pub const UNREACHABLE: f64 = f64::INFINITY;

/// Lifecycle of a single solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveState {
    /// The frontier still holds candidates; the goal has not settled.
    Active,
    /// The goal settled; a minimal-cost path can be reconstructed.
    Solved,
    /// The frontier ran dry before the goal settled; the goal is
    /// unreachable from the start.
    Exhausted,
}

/// Errors surfaced by the solver.
///
/// An unreachable goal is *not* an error — it is the [`SolveState::Exhausted`]
/// terminal state. These variants cover caller mistakes and grid contract
/// violations, which are reported rather than papered over.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    /// `step` was called after the search had already terminated.
    Finished,
    /// `path` was called before the goal settled.
    NotSolved,
    /// The grid reported a negative traversal cost. Uniform-cost search
    /// requires non-negative edge weights.
    NegativeCost { pos: Point, cost: f64 },
    /// The predecessor chain is corrupt (missing link or cycle).
    BrokenTrail { pos: Point },
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finished => write!(f, "step called on a finished solve"),
            Self::NotSolved => write!(f, "no path: the goal has not settled"),
            Self::NegativeCost { pos, cost } => {
                write!(f, "grid reported negative traversal cost {cost} at {pos}")
            }
            Self::BrokenTrail { pos } => {
                write!(f, "predecessor chain broken at {pos}")
            }
        }
    }
}

impl std::error::Error for SolveError {}

/// Frontier entry ordered so that `BinaryHeap` (a max-heap) pops the
/// cheapest node first, breaking cost ties on the smallest point in
/// row-major order.
#[derive(Clone, Copy)]
struct OpenNode {
    cost: f64,
    pos: Point,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.pos.cmp(&self.pos))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for OpenNode {}

/// Incremental least-cost path search between two cells of a weighted grid.
///
/// This is uniform-cost search (Dijkstra over non-negative weights): the
/// frontier always expands at the globally cheapest unsettled node, so a
/// node's cost is final the moment it settles. No heuristic is used.
///
/// The solver is driven one [`step`](Self::step) at a time, or to
/// completion with [`solve`](Self::solve). It borrows the grid for the
/// whole solve, so the grid cannot change underneath it.
///
/// Cost ties in the frontier are broken on the smallest point in
/// row-major order, which pins down a single path among several
/// equal-cost ones.
///
/// ```
/// use waygrid_core::Point;
/// use waygrid_paths::{PathSolver, Traversal};
///
/// struct Open;
///
/// impl Traversal for Open {
///     fn is_traversable(&self, p: Point) -> bool {
///         (0..4).contains(&p.x) && (0..4).contains(&p.y)
///     }
///     fn traversal_cost(&self, _p: Point) -> f64 {
///         1.0
///     }
///     fn traversable_neighbors(&self, p: Point, buf: &mut Vec<Point>) {
///         if !self.is_traversable(p) {
///             return;
///         }
///         buf.extend(p.neighbors_4().into_iter().filter(|&n| self.is_traversable(n)));
///     }
/// }
///
/// let grid = Open;
/// let mut solver = PathSolver::new(&grid, Point::ZERO, Point::new(3, 3));
/// assert!(solver.solve().unwrap());
/// assert_eq!(solver.path().unwrap().len(), 7);
/// ```
pub struct PathSolver<'g, G: Traversal> {
    grid: &'g G,
    start: Point,
    goal: Point,
    /// Best known cost of each discovered-but-unsettled cell. Cells
    /// absent from both this and `settled` are at infinity.
    tentative: HashMap<Point, f64>,
    /// Finalized costs. Entries never change once inserted.
    settled: HashMap<Point, f64>,
    /// Cheapest known edge into each discovered cell.
    came_from: HashMap<Point, Point>,
    /// Min-selection structure over `tentative`, with lazy deletion:
    /// superseded entries stay queued and are skipped on pop.
    open: BinaryHeap<OpenNode>,
    /// Node settled by the most recent step.
    current: Option<Point>,
    state: SolveState,
    nbuf: Vec<Point>,
}

impl<'g, G: Traversal> PathSolver<'g, G> {
    /// Bind a solver to a grid and endpoints.
    ///
    /// The start is seeded at cost zero unconditionally; an out-of-bounds
    /// or impassable endpoint is not rejected here and simply leads to an
    /// [`Exhausted`](SolveState::Exhausted) solve. A solve whose start
    /// equals its goal completes immediately.
    pub fn new(grid: &'g G, start: Point, goal: Point) -> Self {
        let mut solver = Self {
            grid,
            start,
            goal,
            tentative: HashMap::new(),
            settled: HashMap::new(),
            came_from: HashMap::new(),
            open: BinaryHeap::new(),
            current: None,
            state: SolveState::Active,
            nbuf: Vec::with_capacity(4),
        };
        solver.seed();
        solver
    }

    /// Restart with new endpoints on the same grid, clearing all
    /// intermediate state.
    pub fn reset(&mut self, start: Point, goal: Point) {
        self.start = start;
        self.goal = goal;
        self.tentative.clear();
        self.settled.clear();
        self.came_from.clear();
        self.open.clear();
        self.current = None;
        self.seed();
    }

    fn seed(&mut self) {
        self.state = SolveState::Active;
        if self.start == self.goal {
            // Trivial zero-step solve: the zero-cost path to the start is
            // already the answer.
            self.settled.insert(self.start, 0.0);
            self.current = Some(self.start);
            self.state = SolveState::Solved;
            return;
        }
        self.tentative.insert(self.start, 0.0);
        self.open.push(OpenNode {
            cost: 0.0,
            pos: self.start,
        });
    }

    /// The start cell of this solve.
    pub fn start(&self) -> Point {
        self.start
    }

    /// The goal cell of this solve.
    pub fn goal(&self) -> Point {
        self.goal
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SolveState {
        self.state
    }

    /// Whether the search has terminated: the goal settled, or the
    /// cheapest remaining frontier cost is infinite. Callers must not
    /// [`step`](Self::step) once this is true.
    pub fn is_complete(&self) -> bool {
        self.state != SolveState::Active
    }

    /// Whether the goal has settled. Distinguishes success from an
    /// exhausted-but-unreachable termination.
    pub fn is_solved(&self) -> bool {
        self.state == SolveState::Solved
    }

    /// The node settled by the most recent step, for visualization.
    pub fn current(&self) -> Option<Point> {
        self.current
    }

    /// Best known total cost to reach `p`: its settled cost, else its
    /// tentative cost, else [`UNREACHABLE`].
    pub fn cost_at(&self, p: Point) -> f64 {
        if let Some(&c) = self.settled.get(&p) {
            return c;
        }
        self.tentative.get(&p).copied().unwrap_or(UNREACHABLE)
    }

    /// Whether `p`'s cost has been finalized.
    pub fn is_settled(&self, p: Point) -> bool {
        self.settled.contains_key(&p)
    }

    /// Number of cells whose cost has been finalized.
    pub fn settled_count(&self) -> usize {
        self.settled.len()
    }

    /// Perform one relaxation iteration: settle the cheapest frontier
    /// node and relax its traversable, unsettled neighbours.
    ///
    /// Returns the node just settled, or `Ok(None)` if the frontier was
    /// empty. Calling this after [`is_complete`](Self::is_complete) is a
    /// usage error reported as [`SolveError::Finished`]; a negative edge
    /// weight from the grid is reported as [`SolveError::NegativeCost`].
    pub fn step(&mut self) -> Result<Option<Point>, SolveError> {
        if self.state != SolveState::Active {
            return Err(SolveError::Finished);
        }

        // Pop until a live entry surfaces. Entries whose cost no longer
        // matches the tentative map were superseded by a later improvement.
        let mut selected = None;
        while let Some(node) = self.open.pop() {
            match self.tentative.get(&node.pos) {
                Some(&c) if node.cost <= c => {
                    selected = Some((node.pos, c));
                    break;
                }
                _ => {}
            }
        }
        let Some((pos, cost)) = selected else {
            // Every discovered node already settled without reaching the
            // goal: the remaining frontier minimum is infinite.
            self.state = SolveState::Exhausted;
            return Ok(None);
        };

        self.tentative.remove(&pos);
        self.settled.insert(pos, cost);
        self.current = Some(pos);

        if pos == self.goal {
            self.state = SolveState::Solved;
            log::debug!(
                "goal {} settled at cost {} after {} nodes",
                pos,
                cost,
                self.settled.len()
            );
            return Ok(Some(pos));
        }

        self.nbuf.clear();
        self.grid.traversable_neighbors(pos, &mut self.nbuf);
        for i in 0..self.nbuf.len() {
            let np = self.nbuf[i];
            if self.settled.contains_key(&np) {
                continue;
            }
            let edge = self.grid.traversal_cost(np);
            if edge < 0.0 {
                return Err(SolveError::NegativeCost {
                    pos: np,
                    cost: edge,
                });
            }
            let candidate = cost + edge;
            let known = self.tentative.get(&np).copied().unwrap_or(UNREACHABLE);
            if candidate < known {
                self.tentative.insert(np, candidate);
                self.came_from.insert(np, pos);
                self.open.push(OpenNode {
                    cost: candidate,
                    pos: np,
                });
            }
        }

        if self.tentative.is_empty() {
            self.state = SolveState::Exhausted;
            log::debug!(
                "frontier exhausted after {} nodes; {} unreachable from {}",
                self.settled.len(),
                self.goal,
                self.start
            );
        }
        Ok(Some(pos))
    }

    /// Drive the search to termination and report whether the goal was
    /// reached. Safe to call again once terminated: the stored answer is
    /// returned without further mutation.
    pub fn solve(&mut self) -> Result<bool, SolveError> {
        while self.state == SolveState::Active {
            self.step()?;
        }
        Ok(self.is_solved())
    }

    /// Reconstruct the minimal-cost path, from start to goal inclusive.
    ///
    /// Valid only once [`is_solved`](Self::is_solved) is true; returns
    /// [`SolveError::NotSolved`] otherwise. A corrupt predecessor chain is
    /// detected and reported instead of looping.
    pub fn path(&self) -> Result<Vec<Point>, SolveError> {
        if self.state != SolveState::Solved {
            return Err(SolveError::NotSolved);
        }
        let mut path = vec![self.goal];
        let mut cur = self.goal;
        while cur != self.start {
            let Some(&prev) = self.came_from.get(&cur) else {
                return Err(SolveError::BrokenTrail { pos: cur });
            };
            path.push(prev);
            cur = prev;
            // A finalized chain can never be longer than the settled set.
            if path.len() > self.settled.len() {
                return Err(SolveError::BrokenTrail { pos: cur });
            }
        }
        path.reverse();
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Test grid parsed from ASCII rows: a digit is that entry cost, `#`
    /// is impassable.
    struct CostMap {
        width: i32,
        height: i32,
        cells: Vec<f64>,
    }

    impl CostMap {
        fn parse(rows: &[&str]) -> Self {
            let height = rows.len() as i32;
            let width = rows[0].len() as i32;
            let mut cells = Vec::with_capacity((width * height) as usize);
            for row in rows {
                assert_eq!(row.len() as i32, width, "ragged test map");
                for ch in row.chars() {
                    match ch {
                        '#' => cells.push(f64::INFINITY),
                        d => cells.push(d.to_digit(10).unwrap() as f64),
                    }
                }
            }
            Self {
                width,
                height,
                cells,
            }
        }

        fn idx(&self, p: Point) -> usize {
            (p.y * self.width + p.x) as usize
        }

        fn traversable_count(&self) -> usize {
            self.cells.iter().filter(|c| c.is_finite()).count()
        }
    }

    impl Traversal for CostMap {
        fn is_traversable(&self, p: Point) -> bool {
            p.x >= 0
                && p.y >= 0
                && p.x < self.width
                && p.y < self.height
                && self.cells[self.idx(p)].is_finite()
        }

        fn traversal_cost(&self, p: Point) -> f64 {
            if p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height {
                self.cells[self.idx(p)]
            } else {
                f64::INFINITY
            }
        }

        fn traversable_neighbors(&self, p: Point, buf: &mut Vec<Point>) {
            if !self.is_traversable(p) {
                return;
            }
            for n in p.neighbors_4() {
                if self.is_traversable(n) {
                    buf.push(n);
                }
            }
        }
    }

    fn path_cost(map: &CostMap, path: &[Point]) -> f64 {
        // Entering the start is free; each subsequent cell charges its
        // entry cost.
        path[1..].iter().map(|&p| map.traversal_cost(p)).sum()
    }

    fn manhattan_len(a: Point, b: Point) -> i32 {
        crate::distance::manhattan(a, b) + 1
    }

    /// Minimum cost over all simple paths, by exhaustive enumeration.
    fn brute_force_cost(map: &CostMap, start: Point, goal: Point) -> Option<f64> {
        fn go(
            map: &CostMap,
            cur: Point,
            goal: Point,
            visited: &mut HashSet<Point>,
            acc: f64,
            best: &mut Option<f64>,
        ) {
            if cur == goal {
                *best = Some(best.map_or(acc, |b: f64| b.min(acc)));
                return;
            }
            let mut buf = Vec::new();
            map.traversable_neighbors(cur, &mut buf);
            for n in buf {
                if visited.insert(n) {
                    go(map, n, goal, visited, acc + map.traversal_cost(n), best);
                    visited.remove(&n);
                }
            }
        }
        let mut best = None;
        let mut visited = HashSet::new();
        visited.insert(start);
        go(map, start, goal, &mut visited, 0.0, &mut best);
        best
    }

    #[test]
    fn uniform_grid_shortest_path() {
        let map = CostMap::parse(&["111", "111", "111"]);
        let mut solver = PathSolver::new(&map, Point::ZERO, Point::new(2, 2));
        assert!(solver.solve().unwrap());
        let path = solver.path().unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(
            path.len() as i32,
            manhattan_len(Point::ZERO, Point::new(2, 2))
        );
        assert_eq!(solver.cost_at(Point::new(2, 2)), 4.0);
        assert_eq!(path_cost(&map, &path), 4.0);
        // Row-major tie-break pins down this exact path.
        assert_eq!(
            path,
            vec![
                Point::new(0, 0),
                Point::new(1, 0),
                Point::new(2, 0),
                Point::new(2, 1),
                Point::new(2, 2),
            ]
        );
    }

    #[test]
    fn routes_around_blocked_center() {
        let map = CostMap::parse(&["111", "1#1", "111"]);
        let mut solver = PathSolver::new(&map, Point::ZERO, Point::new(2, 2));
        assert!(solver.solve().unwrap());
        let path = solver.path().unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path_cost(&map, &path), 4.0);
        assert!(!path.contains(&Point::new(1, 1)));
    }

    #[test]
    fn start_equals_goal_is_trivially_solved() {
        let map = CostMap::parse(&["111", "111"]);
        let p = Point::new(1, 1);
        let mut solver = PathSolver::new(&map, p, p);
        assert!(solver.is_solved());
        assert!(solver.is_complete());
        assert_eq!(solver.path().unwrap(), vec![p]);
        assert_eq!(solver.cost_at(p), 0.0);
        // Completion is already stored; solving again changes nothing.
        assert!(solver.solve().unwrap());
    }

    #[test]
    fn prefers_cheap_detour_over_expensive_direct_route() {
        let map = CostMap::parse(&["15551", "11111"]);
        let mut solver = PathSolver::new(&map, Point::ZERO, Point::new(4, 0));
        assert!(solver.solve().unwrap());
        let path = solver.path().unwrap();
        assert_eq!(solver.cost_at(Point::new(4, 0)), 6.0);
        assert!(path.contains(&Point::new(2, 1)));
        assert!(!path.contains(&Point::new(2, 0)));
        assert_eq!(path_cost(&map, &path), 6.0);
    }

    #[test]
    fn walled_off_goal_exhausts_without_error() {
        let map = CostMap::parse(&["11#1", "11#1", "11#1"]);
        let mut solver = PathSolver::new(&map, Point::ZERO, Point::new(3, 1));
        assert!(!solver.solve().unwrap());
        assert!(solver.is_complete());
        assert!(!solver.is_solved());
        assert_eq!(solver.state(), SolveState::Exhausted);
        assert_eq!(solver.cost_at(Point::new(3, 1)), UNREACHABLE);
        assert_eq!(solver.path(), Err(SolveError::NotSolved));
    }

    #[test]
    fn matches_brute_force_on_weighted_maps() {
        let maps = [
            CostMap::parse(&["1317", "1#19", "2111"]),
            CostMap::parse(&["912", "151", "219"]),
            CostMap::parse(&["1111", "9991", "1111", "1999"]),
        ];
        for map in &maps {
            let goal = Point::new(map.width - 1, map.height - 1);
            let mut solver = PathSolver::new(map, Point::ZERO, goal);
            assert!(solver.solve().unwrap());
            let expected = brute_force_cost(map, Point::ZERO, goal).unwrap();
            assert_eq!(solver.cost_at(goal), expected);
            assert_eq!(path_cost(map, &solver.path().unwrap()), expected);
        }
    }

    #[test]
    fn settled_costs_never_change() {
        let map = CostMap::parse(&["1317", "1#19", "2111"]);
        let mut solver = PathSolver::new(&map, Point::ZERO, Point::new(3, 2));
        let mut finalized: Vec<(Point, f64)> = Vec::new();
        while !solver.is_complete() {
            let settled = solver.step().unwrap();
            for &(p, c) in &finalized {
                assert_eq!(solver.cost_at(p), c);
                assert!(solver.is_settled(p));
            }
            if let Some(p) = settled {
                finalized.push((p, solver.cost_at(p)));
            }
        }
    }

    #[test]
    fn terminates_within_traversable_cell_count() {
        let map = CostMap::parse(&["11111", "1#1#1", "11111", "1#1#1"]);
        let mut solver = PathSolver::new(&map, Point::ZERO, Point::new(4, 3));
        let mut steps = 0;
        while !solver.is_complete() {
            solver.step().unwrap();
            steps += 1;
        }
        assert!(steps <= map.traversable_count());
    }

    #[test]
    fn solve_is_idempotent() {
        let map = CostMap::parse(&["151", "111"]);
        let mut solver = PathSolver::new(&map, Point::ZERO, Point::new(2, 0));
        let first = solver.solve().unwrap();
        let path = solver.path().unwrap();
        let settled = solver.settled_count();
        assert_eq!(solver.solve().unwrap(), first);
        assert_eq!(solver.path().unwrap(), path);
        assert_eq!(solver.settled_count(), settled);
    }

    #[test]
    fn equal_cost_ties_break_deterministically() {
        let map = CostMap::parse(&["1111", "1111", "1111"]);
        let goal = Point::new(3, 2);
        let mut a = PathSolver::new(&map, Point::ZERO, goal);
        a.solve().unwrap();
        let first = a.path().unwrap();

        let mut b = PathSolver::new(&map, Point::ZERO, goal);
        b.solve().unwrap();
        assert_eq!(b.path().unwrap(), first);

        a.reset(Point::ZERO, goal);
        a.solve().unwrap();
        assert_eq!(a.path().unwrap(), first);
    }

    #[test]
    fn step_after_termination_is_an_error() {
        let map = CostMap::parse(&["11"]);
        let mut solver = PathSolver::new(&map, Point::ZERO, Point::new(1, 0));
        assert!(solver.solve().unwrap());
        assert_eq!(solver.step(), Err(SolveError::Finished));
    }

    #[test]
    fn path_before_solved_is_an_error() {
        let map = CostMap::parse(&["111", "111"]);
        let solver = PathSolver::new(&map, Point::ZERO, Point::new(2, 1));
        assert_eq!(solver.path(), Err(SolveError::NotSolved));
    }

    #[test]
    fn negative_cost_is_surfaced() {
        let mut map = CostMap::parse(&["111", "111"]);
        let bad = Point::new(1, 0);
        let i = map.idx(bad);
        map.cells[i] = -1.0;
        let mut solver = PathSolver::new(&map, Point::ZERO, Point::new(2, 1));
        assert_eq!(
            solver.solve(),
            Err(SolveError::NegativeCost {
                pos: bad,
                cost: -1.0
            })
        );
    }

    #[test]
    fn out_of_bounds_start_fails_softly() {
        let map = CostMap::parse(&["11", "11"]);
        let mut solver = PathSolver::new(&map, Point::new(-3, -3), Point::new(1, 1));
        assert!(!solver.solve().unwrap());
        assert_eq!(solver.state(), SolveState::Exhausted);
    }

    #[test]
    fn impassable_start_fails_softly() {
        let map = CostMap::parse(&["#11", "111"]);
        let mut solver = PathSolver::new(&map, Point::ZERO, Point::new(2, 0));
        assert!(!solver.solve().unwrap());
        assert!(solver.is_complete());
        assert!(!solver.is_solved());
    }

    #[test]
    fn partial_stepping_exposes_costs() {
        let map = CostMap::parse(&["111", "111", "111"]);
        let mut solver = PathSolver::new(&map, Point::ZERO, Point::new(2, 2));
        let settled = solver.step().unwrap();
        assert_eq!(settled, Some(Point::ZERO));
        assert_eq!(solver.current(), Some(Point::ZERO));
        assert!(solver.is_settled(Point::ZERO));
        assert_eq!(solver.cost_at(Point::ZERO), 0.0);
        // Both start neighbours hold a tentative cost of 1.
        assert_eq!(solver.cost_at(Point::new(1, 0)), 1.0);
        assert_eq!(solver.cost_at(Point::new(0, 1)), 1.0);
        assert!(!solver.is_settled(Point::new(1, 0)));
        // Undiscovered cells report the sentinel.
        assert_eq!(solver.cost_at(Point::new(2, 2)), UNREACHABLE);
    }

    #[test]
    fn reset_rebinds_endpoints() {
        let map = CostMap::parse(&["111", "1#1", "111"]);
        let mut solver = PathSolver::new(&map, Point::ZERO, Point::new(2, 2));
        assert!(solver.solve().unwrap());
        solver.reset(Point::new(2, 0), Point::new(0, 2));
        assert!(!solver.is_complete());
        assert!(solver.solve().unwrap());
        let path = solver.path().unwrap();
        assert_eq!(path.first(), Some(&Point::new(2, 0)));
        assert_eq!(path.last(), Some(&Point::new(0, 2)));
    }
}
