//! Triage nurse: pulls patients into the triage room and hands them on.

use ed_core::{Tile, name_ordinal, timestamp};
use ed_spatial::Maze;
use tracing::{debug, info};

use crate::actor::Actor;
use crate::context::TickContext;
use crate::patient;
use crate::plan::{Plan, places};
use crate::state::PatientState;

pub(crate) fn plan(actor: &mut Actor, ctx: &mut TickContext<'_>) {
    let Some((name, common, t)) = actor.triage_nurse_parts() else { return };

    if t.chatting_patient.as_deref().is_some_and(|p| !ctx.roster.contains(p)) {
        debug!(nurse = name, patient = ?t.chatting_patient, "clearing stale triage patient");
        t.chatting_patient = None;
        ctx.ledger.triage_patients = ctx.ledger.triage_patients.saturating_sub(1);
    }

    if common.is_chatting() {
        common.act_pronunciatio = "💬".into();
        return;
    }

    if let Some(patient) = t.chatting_patient.take() {
        hand_off(name, &patient, ctx);
    }
    admit_next(name, ctx);

    let computer = ctx.ledger.maze.address(places::TRIAGE_COMPUTER);
    common.act_address = Some(computer.clone());
    common.act_description = "triaging at the computer".into();
    common.act_pronunciatio = "💻".into();
    common.set_plan(Plan::GoToAddress(computer));
}

/// Queue a triaged patient for a doctor and for a bed.  Resuscitation cases
/// page a nurse; everyone else joins the bedside waiting queue.
fn hand_off(nurse: &str, patient: &str, ctx: &mut TickContext<'_>) {
    ctx.ledger.triage_patients = ctx.ledger.triage_patients.saturating_sub(1);
    let Some(p) = ctx.roster.get(patient).and_then(Actor::patient) else { return };
    if p.state == PatientState::Leaving {
        return;
    }
    let acuity = p.acuity();
    let key = acuity.priority(ctx.config.priority_factor);
    let queues = &mut ctx.ledger.queues;
    queues.doctor_global.push(key, patient);
    if acuity.is_resuscitation() {
        queues.pager.push(key, patient);
    } else {
        queues.bedside_nurse_waiting.push(key, patient);
    }
    ctx.metrics
        .triage_nurse
        .entry(nurse.to_string())
        .or_default()
        .patients_triaged
        .push((patient.to_string(), timestamp::format(&ctx.now)));
    info!(nurse, patient, %acuity, paged = acuity.is_resuscitation(), "triaged");
}

/// Bring the longest-waiting patient in when a triage chair is free.
fn admit_next(nurse: &str, ctx: &mut TickContext<'_>) {
    if ctx.ledger.triage_patients >= ctx.ledger.triage_capacity {
        return;
    }
    let Some(entry) = ctx.ledger.queues.triage_queue.pop_front() else { return };
    let admitted = ctx.roster.get_mut(&entry.name).is_some_and(|p| patient::to_triage(p, nurse));
    if admitted {
        ctx.ledger.triage_patients += 1;
        debug!(nurse, patient = %entry.name, "called into triage");
    }
}

/// Triage chairs are shared out by the nurse's ordinal.
pub fn spawn_tile(name: &str, maze: &Maze) -> Option<Tile> {
    let chairs = maze.resolve_address(&maze.address(places::TRIAGE_CHAIR));
    if chairs.is_empty() {
        return None;
    }
    Some(chairs[name_ordinal(name) as usize % chairs.len()])
}
