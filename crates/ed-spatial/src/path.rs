//! Grid routing.
//!
//! Standard Dijkstra over the 4-connected walkable tiles.  Every step costs
//! 1, so this is a breadth-first search in effect, but the heap form keeps
//! the tie-break explicit: entries are ordered by `(cost, y, x)`, which makes
//! the returned path a pure function of the map and the endpoints.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ed_core::Tile;

use crate::Maze;

/// Shortest walkable path from `from` to `to`, both ends included.
///
/// `from` may itself be a collision tile (actors occasionally spawn on
/// furniture); `to` must be walkable.  Returns `None` when `to` is blocked,
/// out of bounds, or unreachable.
pub fn find_path(maze: &Maze, from: Tile, to: Tile) -> Option<Vec<Tile>> {
    if !maze.in_bounds(from) || !maze.is_walkable(to) {
        return None;
    }
    if from == to {
        return Some(vec![from]);
    }

    let width = maze.width as usize;
    let n = width * maze.height as usize;
    let idx = |t: Tile| t.y as usize * width + t.x as usize;

    // dist[v] = best known cost to reach v.
    let mut dist = vec![u32::MAX; n];
    // prev[v] = tile that reached v.
    let mut prev: Vec<Option<Tile>> = vec![None; n];

    dist[idx(from)] = 0;

    // Min-heap on (cost, y, x); Reverse turns the max-heap around.
    let mut heap: BinaryHeap<Reverse<(u32, u32, u32)>> = BinaryHeap::new();
    heap.push(Reverse((0, from.y, from.x)));

    while let Some(Reverse((cost, y, x))) = heap.pop() {
        let tile = Tile::new(x, y);
        if tile == to {
            return Some(reconstruct(&prev, idx, from, to));
        }

        // Skip stale heap entries.
        if cost > dist[idx(tile)] {
            continue;
        }

        for next in neighbours(maze, tile) {
            let new_cost = cost.saturating_add(1);
            if new_cost < dist[idx(next)] {
                dist[idx(next)] = new_cost;
                prev[idx(next)] = Some(tile);
                heap.push(Reverse((new_cost, next.y, next.x)));
            }
        }
    }

    None
}

/// Walkable orthogonal neighbours, in up/left/right/down order.
fn neighbours(maze: &Maze, tile: Tile) -> impl Iterator<Item = Tile> + '_ {
    let candidates = [
        tile.y.checked_sub(1).map(|y| Tile::new(tile.x, y)),
        tile.x.checked_sub(1).map(|x| Tile::new(x, tile.y)),
        Some(Tile::new(tile.x + 1, tile.y)),
        Some(Tile::new(tile.x, tile.y + 1)),
    ];
    candidates.into_iter().flatten().filter(move |t| maze.is_walkable(*t))
}

fn reconstruct(prev: &[Option<Tile>], idx: impl Fn(Tile) -> usize, from: Tile, to: Tile) -> Vec<Tile> {
    let mut path = vec![to];
    let mut cur = to;
    while cur != from {
        match prev[idx(cur)] {
            Some(p) => {
                path.push(p);
                cur = p;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// Length in steps of the shortest path, `None` when unreachable.
pub fn path_len(maze: &Maze, from: Tile, to: Tile) -> Option<usize> {
    find_path(maze, from, to).map(|p| p.len() - 1)
}
