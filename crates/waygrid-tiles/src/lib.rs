//! **waygrid-tiles** — tile-grid terrain for the waygrid pathfinding crates.
//!
//! A [`TileMap`] stores [`Tile`] terrain kinds, answers the
//! [`Traversal`](waygrid_paths::Traversal) queries the path solver
//! consumes, and can be built from ASCII art or random generation.

pub mod map;
pub mod tile;

pub use map::{TileMap, TileMapError};
pub use tile::Tile;
