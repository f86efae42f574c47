//! Pathfinding for weighted tile grids.
//!
//! This crate provides an incremental uniform-cost (Dijkstra-style) path
//! search over a 2D grid in which every cell carries a non-negative entry
//! cost and some cells are impassable:
//!
//! - [`Traversal`] — the narrow query contract a grid implements
//!   (traversability, entry cost, neighbour enumeration)
//! - [`PathSolver`] — the search itself, driven one [`PathSolver::step`]
//!   at a time or to completion with [`PathSolver::solve`]
//!
//! The solver settles the globally cheapest frontier node each step, so
//! settled costs are final; no heuristic is involved. An unreachable goal
//! is a legitimate terminal outcome ([`SolveState::Exhausted`]), while
//! caller mistakes and grid contract violations surface as [`SolveError`].

mod distance;
mod solver;
mod traits;

pub use distance::manhattan;
pub use solver::{PathSolver, SolveError, SolveState, UNREACHABLE};
pub use traits::Traversal;
