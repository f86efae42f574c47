use waygrid_core::Point;

/// Read-only query contract between the solver and a tile grid.
///
/// The solver never mutates the grid; a grid must answer the same way for
/// the whole duration of a solve.
pub trait Traversal {
    /// Whether `p` is an in-bounds cell that may be entered.
    fn is_traversable(&self, p: Point) -> bool;

    /// Cost of entering `p`. Must be non-negative for traversable cells.
    /// Implementations may return `f64::INFINITY` for impassable ones.
    fn traversal_cost(&self, p: Point) -> f64;

    /// Append the in-bounds, traversable cardinal neighbours of `p` into
    /// `buf`. Appends nothing when `p` itself is not traversable. The
    /// caller clears `buf` before calling.
    fn traversable_neighbors(&self, p: Point, buf: &mut Vec<Point>);
}
