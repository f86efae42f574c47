//! Sunshine — a terminal demo of the waygrid path solver.
//!
//! Rolls a random tile map, picks a start and a far-away goal, drives the
//! solver one step at a time, and prints the resulting cost field and
//! path. Pass a floor percentage to control map density:
//!
//! ```text
//! sunshine [floor-chance]
//! ```

use std::collections::HashSet;
use std::env;
use std::process::ExitCode;

use waygrid_core::Point;
use waygrid_paths::{PathSolver, SolveState, manhattan};
use waygrid_tiles::{Tile, TileMap};

const MAP_WIDTH: i32 = 20;
const MAP_HEIGHT: i32 = 12;

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    env_logger::init();

    let floor_chance: u32 = match env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 50,
    };

    let mut rng = rand::rng();
    let mut map = TileMap::new(MAP_WIDTH, MAP_HEIGHT);
    map.randomize(&mut rng, floor_chance);

    let open = map.iter().filter(|(_, t)| t.is_traversable()).count();
    log::info!(
        "rolled a {MAP_WIDTH}x{MAP_HEIGHT} map with {open} traversable cells ({floor_chance}% floor chance)"
    );

    let Some(start) = map.random_traversable(&mut rng) else {
        println!("map has no traversable cells, nothing to solve");
        println!("{map}");
        return Ok(ExitCode::from(1));
    };
    let goal = farthest_traversable(&map, start);

    let mut solver = PathSolver::new(&map, start, goal);
    let mut steps = 0;
    while !solver.is_complete() {
        solver.step()?;
        steps += 1;
    }

    println!(
        "start {}, goal {} ({} apart)",
        solver.start(),
        solver.goal(),
        manhattan(start, goal)
    );
    println!();
    println!("{}", render_costs(&map, &solver));

    match solver.state() {
        SolveState::Solved => {
            let path = solver.path()?;
            println!("{}", render_path(&map, &path));
            println!(
                "solved in {steps} steps: {} cells, total cost {}",
                path.len(),
                solver.cost_at(goal)
            );
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            println!("{}", render_path(&map, &[]));
            println!("goal unreachable; frontier exhausted after {steps} steps");
            Ok(ExitCode::from(1))
        }
    }
}

/// The traversable cell farthest from `from`, by grid distance.
fn farthest_traversable(map: &TileMap, from: Point) -> Point {
    map.iter()
        .filter(|(_, t)| t.is_traversable())
        .map(|(p, _)| p)
        .max_by_key(|&p| manhattan(from, p))
        .unwrap_or(from)
}

/// Render each cell's best-known cost, `·` where nothing was discovered.
fn render_costs(map: &TileMap, solver: &PathSolver<'_, TileMap>) -> String {
    let mut out = String::new();
    for y in 0..map.height() {
        for x in 0..map.width() {
            let c = solver.cost_at(Point::new(x, y));
            if c.is_finite() {
                out.push_str(&format!("{:>4}", c as i64));
            } else {
                out.push_str("   ·");
            }
        }
        out.push('\n');
    }
    out
}

/// Render the terrain with the path overlaid.
fn render_path(map: &TileMap, path: &[Point]) -> String {
    let on_path: HashSet<Point> = path.iter().copied().collect();
    let mut out = String::new();
    for y in 0..map.height() {
        for x in 0..map.width() {
            let p = Point::new(x, y);
            let ch = if path.first() == Some(&p) {
                '@'
            } else if path.last() == Some(&p) {
                '>'
            } else if on_path.contains(&p) {
                '*'
            } else {
                map.at(p).map_or(' ', Tile::rune)
            };
            out.push(ch);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn farthest_traversable_prefers_distance() {
        let map = TileMap::parse("...#.").unwrap();
        // The far-right floor cell is behind a wall but still the most
        // distant candidate; reachability is the solver's concern.
        assert_eq!(
            farthest_traversable(&map, Point::ZERO),
            Point::new(4, 0)
        );
    }

    #[test]
    fn render_path_marks_endpoints() {
        let map = TileMap::parse("...").unwrap();
        let path = [Point::new(0, 0), Point::new(1, 0), Point::new(2, 0)];
        assert_eq!(render_path(&map, &path), "@*>\n");
    }

    #[test]
    fn render_costs_uses_dot_for_undiscovered() {
        let map = TileMap::parse(".#").unwrap();
        let solver = PathSolver::new(&map, Point::ZERO, Point::new(0, 5));
        let rendered = render_costs(&map, &solver);
        assert!(rendered.contains('0'));
        assert!(rendered.contains('·'));
    }
}
