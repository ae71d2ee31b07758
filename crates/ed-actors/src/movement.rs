//! Plan → next tile.
//!
//! An actor keeps walking a cached `planned_path` until it is used up.  When
//! the cache is empty the plan is turned into candidate tiles, a couple of
//! candidates are sampled, tiles already holding another actor are avoided
//! where possible, and the shortest path wins (first candidate on ties).
//! Each tick the actor advances up to `tiles_per_step` tiles along it.

use ed_core::Tile;
use ed_spatial::find_path;
use tracing::trace;

use crate::context::TickContext;
use crate::plan::{Movement, Plan};
use crate::scratch::CommonScratch;

/// Resolve `common.next_step` into this tick's tile.  `None` when the actor
/// has not been placed on the map.
pub fn resolve(name: &str, common: &mut CommonScratch, ctx: &mut TickContext<'_>) -> Option<Movement> {
    let from = common.curr_tile?;

    if common.planned_path.is_empty() {
        let candidates = candidates(from, common, ctx);
        if !candidates.is_empty() {
            let picked = sample(candidates, ctx);
            let picked = avoid_occupied(name, picked, ctx);
            if let Some(path) = shortest(from, &picked, ctx) {
                common.planned_path = path.into_iter().skip(1).collect();
                common.act_path_set = true;
            }
        }
    }

    let n = ctx.config.tiles_per_step().min(common.planned_path.len());
    let tile = if n > 0 {
        let tile = common.planned_path[n - 1];
        common.planned_path.drain(..n);
        tile
    } else {
        from
    };
    trace!(actor = name, %from, to = %tile, "move");

    let description = format!(
        "{} @ {}",
        common.act_description,
        common.act_address.as_deref().unwrap_or_default()
    );
    Some(Movement { tile, pronunciatio: common.act_pronunciatio.clone(), description })
}

fn candidates(from: Tile, common: &mut CommonScratch, ctx: &TickContext<'_>) -> Vec<Tile> {
    let Some(plan) = common.next_step.clone() else { return Vec::new() };
    match plan {
        Plan::Wait(_) => Vec::new(),
        Plan::GoToTile(t) if t == from => Vec::new(),
        Plan::GoToTile(t) => vec![t],
        Plan::GoToAddress(_) if common.act_path_set => Vec::new(),
        Plan::GoToAddress(address) => ctx.ledger.maze.resolve_address(&address),
        Plan::Approach(target) => {
            let Some(other) = ctx.roster.get(&target) else {
                common.clear_plan();
                common.act_description = format!("{target} is no longer in the simulation.");
                return Vec::new();
            };
            if other.scratch.common.is_chatting() {
                common.act_description = format!("Waiting to interact with {target}.");
                return Vec::new();
            }
            let Some(to) = other.tile() else { return Vec::new() };
            match find_path(&ctx.ledger.maze, from, to) {
                Some(path) if path.len() <= 2 => path.last().copied().into_iter().collect(),
                Some(path) => vec![path[path.len() / 2]],
                None => Vec::new(),
            }
        }
    }
}

/// Fewer than four candidates: all of them, shuffled.  Otherwise two.
fn sample(mut candidates: Vec<Tile>, ctx: &mut TickContext<'_>) -> Vec<Tile> {
    if candidates.len() < 4 {
        ctx.rng.shuffle(&mut candidates);
        candidates
    } else {
        ctx.rng.choose_multiple(&candidates, 2)
    }
}

/// Drop tiles with an actor's event on them, unless that drops every tile.
fn avoid_occupied(name: &str, candidates: Vec<Tile>, ctx: &TickContext<'_>) -> Vec<Tile> {
    let is_actor = |subject: &str| subject == name || ctx.roster.contains(subject);
    let free: Vec<Tile> = candidates
        .iter()
        .copied()
        .filter(|t| !ctx.ledger.maze.has_subject_matching(*t, is_actor))
        .collect();
    if free.is_empty() { candidates } else { free }
}

fn shortest(from: Tile, candidates: &[Tile], ctx: &TickContext<'_>) -> Option<Vec<Tile>> {
    let mut best: Option<Vec<Tile>> = None;
    for to in candidates {
        let Some(path) = find_path(&ctx.ledger.maze, from, *to) else { continue };
        if best.as_ref().is_none_or(|b| path.len() < b.len()) {
            best = Some(path);
        }
    }
    best
}
