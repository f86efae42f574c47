//! Tile map storage, parsing, and generation.

use std::fmt;

use rand::Rng;
use waygrid_core::Point;
use waygrid_paths::Traversal;

use crate::tile::Tile;

/// A rectangular map of [`Tile`] cells in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileMap {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl TileMap {
    /// Create a map of the given size, filled with floor.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            tiles: vec![Tile::default(); (width * height) as usize],
        }
    }

    /// Parse a map from ASCII art, one line per row.
    ///
    /// Recognized characters are the tile runes (`.` floor, `"` grass,
    /// `~` water, `#` wall). All rows must have the same width.
    pub fn parse(s: &str) -> Result<Self, TileMapError> {
        let s = s.trim();
        let mut tiles = Vec::new();
        let mut width = -1;
        let mut height = 0;
        for (line_no, line) in s.lines().enumerate() {
            let mut w = 0;
            for ch in line.chars() {
                let Some(tile) = Tile::from_rune(ch) else {
                    return Err(TileMapError::UnknownRune {
                        ch,
                        pos: Point::new(w, line_no as i32),
                    });
                };
                tiles.push(tile);
                w += 1;
            }
            if width >= 0 && w != width {
                return Err(TileMapError::RaggedRows { line: line_no });
            }
            width = w;
            height += 1;
        }
        Ok(Self {
            width: width.max(0),
            height,
            tiles,
        })
    }

    /// Width of the map in cells.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height of the map in cells.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Whether `p` is within map bounds.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }

    fn idx(&self, p: Point) -> usize {
        (p.y * self.width + p.x) as usize
    }

    /// Get the tile at a point, or `None` if out of bounds.
    pub fn at(&self, p: Point) -> Option<Tile> {
        if !self.contains(p) {
            return None;
        }
        Some(self.tiles[self.idx(p)])
    }

    /// Set the tile at a point. Does nothing if out of bounds.
    pub fn set(&mut self, p: Point, tile: Tile) {
        if !self.contains(p) {
            return;
        }
        let i = self.idx(p);
        self.tiles[i] = tile;
    }

    /// Fill the entire map with the given tile.
    pub fn fill(&mut self, tile: Tile) {
        self.tiles.fill(tile);
    }

    /// Iterate over `(Point, Tile)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Point, Tile)> + '_ {
        let width = self.width;
        self.tiles.iter().enumerate().map(move |(i, &t)| {
            let i = i as i32;
            (Point::new(i % width, i / width), t)
        })
    }

    /// Re-roll every cell's terrain.
    ///
    /// `floor_chance` is a percentage; the remainder cascades into water,
    /// grass, and wall rolls.
    pub fn randomize(&mut self, rng: &mut impl Rng, floor_chance: u32) {
        for t in self.tiles.iter_mut() {
            *t = if rng.random_range(0..100) < floor_chance {
                Tile::Floor
            } else if rng.random_range(0..90) < floor_chance {
                Tile::Water
            } else if rng.random_range(0..80) < floor_chance {
                Tile::Grass
            } else {
                Tile::Wall
            };
        }
    }

    /// Find a random traversable position, if one can be found.
    pub fn random_traversable(&self, rng: &mut impl Rng) -> Option<Point> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        for _ in 0..1000 {
            let p = Point::new(
                rng.random_range(0..self.width),
                rng.random_range(0..self.height),
            );
            if self.at(p).is_some_and(Tile::is_traversable) {
                return Some(p);
            }
        }
        None
    }
}

impl fmt::Display for TileMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let t = self.tiles[(y * self.width + x) as usize];
                write!(f, "{}", t.rune())?;
            }
            if y + 1 < self.height {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl Traversal for TileMap {
    fn is_traversable(&self, p: Point) -> bool {
        self.at(p).is_some_and(Tile::is_traversable)
    }

    fn traversal_cost(&self, p: Point) -> f64 {
        self.at(p).map_or(f64::INFINITY, Tile::cost)
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

/// Errors that can occur when parsing a map from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileMapError {
    /// Rows have inconsistent widths.
    RaggedRows { line: usize },
    /// A character with no terrain meaning was found.
    UnknownRune { ch: char, pos: Point },
}

impl fmt::Display for TileMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RaggedRows { line } => {
                write!(f, "map row {line} differs in width from earlier rows")
            }
            Self::UnknownRune { ch, pos } => {
                write!(f, "map contains unknown rune {ch:?} at {pos}")
            }
        }
    }
}

impl std::error::Error for TileMapError {}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn tilemap_round_trip() {
        let m = TileMap::parse(".#~\"\n....").unwrap();
        let json = serde_json::to_string(&m).unwrap();
        let back: TileMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
