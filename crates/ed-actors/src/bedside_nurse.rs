//! Bedside nurse: pager first, then the bedside waiting queue, then idle
//! rounds in its zone.

use chrono::NaiveDateTime;
use ed_core::{minutes, minutes_between, name_ordinal, timestamp};
use ed_spatial::DIAGNOSTIC_ROOM;
use tracing::{debug, info};

use crate::actor::Actor;
use crate::context::TickContext;
use crate::metrics::{ActionLogEntry, InteractionEntry};
use crate::patient;
use crate::plan::{Plan, places};
use crate::scratch::{BedsideNurseScratch, CommonScratch};
use crate::state::{Occupied, PatientState};

pub(crate) fn plan(actor: &mut Actor, ctx: &mut TickContext<'_>) {
    let Some((name, common, n)) = actor.bedside_nurse_parts() else { return };
    let now = ctx.now;
    common.act_pronunciatio = "☁️".into();

    if n.occupied.patient().is_some_and(|p| !ctx.roster.contains(p)) {
        debug!(nurse = name, occupied = ?n.occupied, "patient gone; clearing");
        n.set_occupied(Occupied::Idle, now);
        common.clear_plan();
        common.end_chat();
    }

    update_state_durations(name, n, ctx, now);
    log_new_interaction(name, common, n, ctx, now);

    if let Some(end) = common.time_to_next {
        if now >= end {
            common.time_to_next = None;
            match n.occupied.clone() {
                Occupied::Testing(p) => {
                    ctx.ledger.remove_from_zone(DIAGNOSTIC_ROOM, &p);
                    common.set_plan(Plan::Approach(p.clone()));
                    n.set_occupied(Occupied::Attending(p), now);
                }
                Occupied::Resting => n.set_occupied(Occupied::Idle, now),
                _ => {}
            }
        } else if n.occupied == Occupied::Resting && has_waiting_patients(ctx) {
            debug!(nurse = name, "rest cut short");
            n.set_occupied(Occupied::Idle, now);
            common.time_to_next = None;
            common.act_path_set = false;
        }
    }

    if n.occupied == Occupied::Idle {
        answer_pager(name, common, n, ctx);
    }

    if !common.is_chatting() {
        match n.occupied.clone() {
            Occupied::Idle => scan_waiting(name, common, n, ctx),
            Occupied::Resting => {}
            occupied => {
                let patient = occupied.patient().unwrap_or_default();
                let info = ctx.roster.get(patient).and_then(Actor::patient);
                match info {
                    None => n.set_occupied(Occupied::Idle, now),
                    Some(p) if p.state == PatientState::Leaving => n.set_occupied(Occupied::Idle, now),
                    Some(p) => {
                        let arena = common.curr_tile.and_then(|t| ctx.ledger.maze.arena_of(t));
                        let arrived = matches!(occupied, Occupied::Transfer(_))
                            && arena.is_some_and(|a| p.next_room.as_deref().is_some_and(|room| room.contains(a)));
                        if arrived {
                            let in_diagnostics = arena == Some(DIAGNOSTIC_ROOM);
                            if in_diagnostics {
                                let end = now + minutes(ctx.config.surged_testing_time());
                                if let Some(p) = ctx.roster.get_mut(patient).and_then(Actor::patient_mut) {
                                    p.testing_end_time = Some(end);
                                }
                            }
                            set_to_resting(common, n, ctx, now);
                        }
                    }
                }
            }
        }

        if let Some(plan) = &common.next_step {
            common.act_address = Some(plan.to_string());
            common.act_description = match &n.occupied {
                Occupied::Transfer(p)  => format!("Escorting {p} to room"),
                Occupied::Testing(p)   => format!("Waiting for {p}'s test"),
                Occupied::Resting      => "Resting between tasks".to_string(),
                Occupied::Attending(p) => format!("Going to {p}"),
                Occupied::Idle         => common.act_description.clone(),
            };
        } else if n.occupied.is_free() && common.planned_path.is_empty() && !idle_round(name, common, ctx, now) {
            if common.act_description.is_empty() {
                common.act_description = "Standing by".into();
            }
        }
    }

    log_action_decision(name, common, n, ctx, now);
}

fn has_waiting_patients(ctx: &TickContext<'_>) -> bool {
    !ctx.ledger.queues.bedside_nurse_waiting.is_empty() || !ctx.ledger.queues.pager.is_empty()
}

fn set_to_resting(common: &mut CommonScratch, n: &mut BedsideNurseScratch, ctx: &TickContext<'_>, now: NaiveDateTime) {
    n.set_occupied(Occupied::Resting, now);
    common.clear_plan();
    common.act_path_set = true;
    common.time_to_next = Some(now + minutes(ctx.config.surged_bedside_resting_time()));
}

// ── Pager and waiting queue ───────────────────────────────────────────────────

/// Resuscitation patients are placed even when every bed is taken.
fn answer_pager(name: &str, common: &mut CommonScratch, n: &mut BedsideNurseScratch, ctx: &mut TickContext<'_>) {
    let Some(front) = ctx.ledger.queues.pager.front().map(|e| e.name.clone()) else { return };
    let Some(zone) = ctx.roster.get(&front).and_then(Actor::patient).map(|p| p.next_room.clone()) else {
        ctx.ledger.queues.pager.pop_front();
        return;
    };
    if let Some(zone) = &zone {
        if let Some(bed) = ctx.ledger.reserve_bed_overriding(&front, zone) {
            if let Some(p) = ctx.roster.get_mut(&front).and_then(Actor::patient_mut) {
                p.bed_assignment = Some(bed);
            }
        }
    }
    ctx.ledger.queues.pager.pop_front();
    info!(nurse = name, patient = %front, "answered page");
    take_patient(name, common, n, &front, ctx);
}

/// One pass over the waiting queue: the first patient whose zone has room is
/// taken; every other live entry moves one step up (never below 3).
fn scan_waiting(name: &str, common: &mut CommonScratch, n: &mut BedsideNurseScratch, ctx: &mut TickContext<'_>) {
    let entries: Vec<String> = ctx.ledger.queues.bedside_nurse_waiting.names();
    let mut dropped: Vec<String> = Vec::new();
    let mut passed_over: Vec<String> = Vec::new();
    let mut selected: Option<String> = None;

    for entry in entries {
        let Some(p) = ctx.roster.get(&entry).and_then(Actor::patient) else {
            dropped.push(entry);
            continue;
        };
        let Some(zone) = p.next_room.clone() else {
            dropped.push(entry);
            continue;
        };
        if !matches!(p.state, PatientState::WaitingForNurse | PatientState::WaitingForTest) {
            dropped.push(entry);
            continue;
        }
        if selected.is_none() && ctx.ledger.zone_has_space(&zone) {
            let tracked = ctx.ledger.beds.contains_key(&zone);
            let bed = ctx.ledger.reserve_bed(&entry, &zone, p.bed_assignment);
            if tracked && bed.is_none() {
                continue;
            }
            if let Some(bed) = bed {
                if let Some(p) = ctx.roster.get_mut(&entry).and_then(Actor::patient_mut) {
                    p.bed_assignment = Some(bed);
                }
            }
            selected = Some(entry);
        } else {
            passed_over.push(entry);
        }
    }

    let queue = &mut ctx.ledger.queues.bedside_nurse_waiting;
    queue.retain(|e| !dropped.contains(&e.name) && selected.as_deref() != Some(e.name.as_str()));
    queue.reprioritize(|who, p| if p > 3.0 && passed_over.iter().any(|o| o == who) { p - 1.0 } else { p });

    if let Some(patient) = selected {
        debug!(nurse = name, patient = %patient, "picked from waiting queue");
        take_patient(name, common, n, &patient, ctx);
    }
}

/// Shared pick-up: log, admit to the zone, move the patient on, start the
/// transfer.
fn take_patient(name: &str, common: &mut CommonScratch, n: &mut BedsideNurseScratch, patient: &str, ctx: &mut TickContext<'_>) {
    let now = ctx.now;
    common.end_chat();
    ctx.metrics
        .bedside_nurse_mut(name)
        .patients_attended
        .push((patient.to_string(), timestamp::format(&now)));

    let plan = ctx.with_actor(patient, |pa, ctx| {
        pa.scratch.common.end_chat();
        let (state, next_room) = match pa.patient() {
            Some(p) => (p.state, p.next_room.clone()),
            None => return None,
        };
        if let Some(zone) = &next_room {
            ctx.ledger.admit_to_zone(zone, patient);
        }
        match state {
            PatientState::WaitingForNurse => {
                patient::escort_to_bed(pa, ctx.ledger, now);
                pa.scratch.common.next_step.clone()
            }
            PatientState::WaitingForTest => {
                let room = next_room.unwrap_or_else(|| DIAGNOSTIC_ROOM.to_string());
                Some(Plan::GoToAddress(ctx.ledger.maze.address(&format!("{room}:chair"))))
            }
            _ => Some(Plan::Approach(patient.to_string())),
        }
    });

    match plan.flatten() {
        Some(plan) => common.set_plan(plan),
        None => common.set_plan(Plan::Approach(patient.to_string())),
    }
    common.act_path_set = false;
    n.set_occupied(Occupied::Transfer(patient.to_string()), now);
}

// ── Idle behavior ─────────────────────────────────────────────────────────────

/// Even ordinals cover the minor injuries zone, odd ones the major.
pub fn assigned_zone(name: &str) -> &'static str {
    if name_ordinal(name) % 2 == 0 { places::MINOR_INJURIES } else { places::MAJOR_INJURIES }
}

/// Check on the most acute patient of the zone, else wander in it.  Gated
/// by `bedside_idle_move_minutes`.
fn idle_round(name: &str, common: &mut CommonScratch, ctx: &mut TickContext<'_>, now: NaiveDateTime) -> bool {
    let cooldown = ctx.config.bedside_idle_move_minutes;
    if common.last_idle_move_time.is_some_and(|t| minutes_between(t, now) < cooldown) {
        return false;
    }
    let zone = assigned_zone(name);

    let most_acute = ctx
        .ledger
        .zone(zone)
        .into_iter()
        .flat_map(|z| z.current_patients.iter())
        .filter_map(|p| {
            let acuity = ctx.roster.get(p)?.patient()?.ctas.map_or(5, |a| a.0);
            Some((acuity, p.clone()))
        })
        .min_by_key(|(acuity, _)| *acuity);
    if let Some((_, patient)) = most_acute {
        common.act_description = format!("Monitoring {patient}");
        common.set_plan(Plan::Approach(patient));
        common.last_idle_move_time = Some(now);
        return true;
    }

    let spots = ctx.ledger.maze.addresses_containing(&ctx.ledger.maze.address(zone));
    let Some(spot) = ctx.rng.choose(&spots).cloned() else { return false };
    common.act_description = "Standing by".into();
    common.act_address = Some(spot.clone());
    common.set_plan(Plan::GoToAddress(spot));
    common.last_idle_move_time = Some(now);
    true
}

// ── Logging ───────────────────────────────────────────────────────────────────

fn update_state_durations(name: &str, n: &mut BedsideNurseScratch, ctx: &mut TickContext<'_>, now: NaiveDateTime) {
    if let (Some(prev), Some(since)) = (&n.last_state_label, n.last_state_update_time) {
        let elapsed = minutes_between(since, now).max(0.0);
        *ctx.metrics.bedside_nurse_mut(name).state_durations.entry(prev.clone()).or_insert(0.0) += elapsed;
    }
    n.last_state_label = Some(n.occupied.label().to_string());
    n.last_state_update_time = Some(now);
}

fn log_new_interaction(
    name:   &str,
    common: &CommonScratch,
    n:      &mut BedsideNurseScratch,
    ctx:    &mut TickContext<'_>,
    now:    NaiveDateTime,
) {
    if let Some(other) = &common.chatting_with {
        if n.prev_chat_partner.as_ref() != Some(other) {
            let other_role = ctx.roster.get(other).map(|a| a.role().key().to_string());
            ctx.metrics.bedside_nurse_mut(name).interactions.push(InteractionEntry {
                time:             timestamp::format(&now),
                other_persona:    other.clone(),
                other_role,
                interaction_type: "CHAT_START".into(),
                state:            n.occupied.label().into(),
            });
        }
    }
    n.prev_chat_partner = common.chatting_with.clone();
}

fn log_action_decision(
    name:   &str,
    common: &CommonScratch,
    n:      &mut BedsideNurseScratch,
    ctx:    &mut TickContext<'_>,
    now:    NaiveDateTime,
) {
    let Some(plan) = &common.next_step else { return };
    let text = plan.to_string();
    if n.last_action_plan.as_deref() == Some(text.as_str()) {
        return;
    }
    let (action_type, target_persona) = match plan {
        Plan::Approach(target) => ("GO_TO_PERSONA", Some(target.clone())),
        Plan::GoToTile(_)      => ("GO_TO_TILE", None),
        _                      => ("MOVE", None),
    };
    let target_role = target_persona
        .as_deref()
        .and_then(|t| ctx.roster.get(t))
        .map(|a| a.role().key().to_string());
    ctx.metrics.bedside_nurse_mut(name).action_log.push(ActionLogEntry {
        time:        timestamp::format(&now),
        plan:        text.clone(),
        state:       n.occupied.label().into(),
        action_type: action_type.into(),
        target_persona,
        target_role,
    });
    n.last_action_plan = Some(text);
}
