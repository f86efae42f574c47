//! **waygrid-core** — geometry primitives for tile grids.
//!
//! This crate provides the foundational [`Point`] type used across the
//! *waygrid* ecosystem: an integer cell coordinate with the equality,
//! hashing, and ordering guarantees the pathfinding crates rely on.

pub mod geom;

pub use geom::Point;
