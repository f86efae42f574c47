//! Terrain kinds and their properties.

/// A terrain kind occupying one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tile {
    #[default]
    Floor,
    Grass,
    Water,
    Wall,
}

impl Tile {
    /// Whether this terrain may be entered by a path.
    pub const fn is_traversable(self) -> bool {
        matches!(self, Tile::Floor | Tile::Grass)
    }

    /// Cost of entering a cell of this terrain. Infinite for terrain
    /// that cannot be entered at all.
    pub const fn cost(self) -> f64 {
        match self {
            Tile::Floor => 1.0,
            Tile::Grass => 3.0,
            Tile::Water | Tile::Wall => f64::INFINITY,
        }
    }

    /// Character representation of the terrain.
    pub const fn rune(self) -> char {
        match self {
            Tile::Floor => '.',
            Tile::Grass => '"',
            Tile::Water => '~',
            Tile::Wall => '#',
        }
    }

    /// Parse a terrain character, the inverse of [`rune`](Self::rune).
    pub const fn from_rune(ch: char) -> Option<Self> {
        match ch {
            '.' => Some(Tile::Floor),
            '"' => Some(Tile::Grass),
            '~' => Some(Tile::Water),
            '#' => Some(Tile::Wall),
            _ => None,
        }
    }
}
