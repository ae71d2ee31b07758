//! Ledger upkeep run once per step after every actor has moved.
//!
//! | Pass                          | Effect                                                   |
//! |-------------------------------|----------------------------------------------------------|
//! | [`enqueue_ready_assessments`] | Patients past their assessment gate join the assessment queue |
//! | [`rescue_orphans`]            | Patients no queue or staff member holds are re-queued    |
//! | [`age_global_queue`]          | Periodic priority aging of the global doctor queue       |
//! | [`boost_overdue`]             | Patients past their stage budget move up their queue     |
//! | [`triage_timeouts`]           | Stalled triage hand-offs go straight to the nurse queue  |
//! | [`preload_departures`]        | Filler patients leave once their departure time is due   |

use chrono::NaiveDateTime;
use ed_actors::{Actor, Occupied, PatientState, Plan, RoleScratch, Scratch, TickContext, doctor, places};
use ed_core::{Role, minutes_between};
use ed_spatial::PriorityQueue;
use tracing::{debug, info, warn};

/// States counted against the stage-1 budget.
const STAGE1: [PatientState; 4] = [
    PatientState::WaitingForTriage,
    PatientState::Triage,
    PatientState::WaitingForNurse,
    PatientState::WaitingForFirstAssessment,
];

/// States counted against the stage-2 budget.
const STAGE2: [PatientState; 4] = [
    PatientState::WaitingForTest,
    PatientState::GoingForTest,
    PatientState::WaitingForResult,
    PatientState::WaitingForDoctor,
];

const RESCUABLE: [PatientState; 5] = [
    PatientState::WaitingForNurse,
    PatientState::WaitingForFirstAssessment,
    PatientState::WaitingForTest,
    PatientState::WaitingForResult,
    PatientState::WaitingForDoctor,
];

/// `true` when at least `interval` minutes have passed since `last`, or the
/// pass never ran.
fn due(last: Option<NaiveDateTime>, now: NaiveDateTime, interval: f64) -> bool {
    last.is_none_or(|t| minutes_between(t, now) >= interval)
}

// ── Assessment queue ──────────────────────────────────────────────────────────

/// Push every patient whose initial-assessment gate has opened onto the
/// assessment queue, and drop entries that no longer wait for one.
pub fn enqueue_ready_assessments(ctx: &mut TickContext<'_>) -> usize {
    let pf = ctx.config.priority_factor;
    let now = ctx.now;
    let roster = &*ctx.roster;
    let queue = &mut ctx.ledger.queues.assessment_queue;

    let awaiting = |a: &Actor| {
        a.patient().is_some_and(|p| {
            p.state == PatientState::WaitingForFirstAssessment && !p.targets.initial_assessment_done
        })
    };
    queue.retain(|e| roster.get(&e.name).is_some_and(awaiting));

    let mut added = 0;
    for actor in roster.by_role(Role::Patient).filter(|a| awaiting(*a)) {
        let Some(p) = actor.patient() else { continue };
        if p.targets.initial_assessment_ready_at.is_some_and(|t| now >= t)
            && queue.push(p.acuity().priority(pf), &actor.name)
        {
            added += 1;
        }
    }
    added
}

// ── Orphan rescue ─────────────────────────────────────────────────────────────

/// Re-queue waiting patients nobody will otherwise pick up: a patient whose
/// assigned doctor has left goes back to the global doctor queue, and one
/// waiting for a nurse that no nurse holds goes back to the nurse queue (the
/// pager for resuscitation cases).
pub fn rescue_orphans(ctx: &mut TickContext<'_>) -> usize {
    let pf = ctx.config.priority_factor;
    let mut rescued = 0;

    for name in ctx.roster.names() {
        let Some(p) = ctx.roster.get(&name).and_then(Actor::patient) else { continue };
        if !RESCUABLE.contains(&p.state) || p.left_without_being_seen {
            continue;
        }
        let state = p.state;
        let acuity = p.acuity();
        let key = acuity.priority(pf);

        if let Some(doc) = p.assigned_doctor.clone() {
            if ctx.roster.get(&doc).is_some_and(|a| a.role() == Role::Doctor) {
                continue;
            }
            warn!(patient = %name, doctor = %doc, "assigned doctor is gone");
            if let Some(p) = ctx.roster.get_mut(&name).and_then(Actor::patient_mut) {
                p.assigned_doctor = None;
                p.in_queue = false;
            }
        }

        let queues = &mut ctx.ledger.queues;
        if state == PatientState::WaitingForNurse {
            let claimed = ctx
                .roster
                .by_role(Role::BedsideNurse)
                .any(|n| n.bedside_nurse().and_then(|b| b.occupied.patient()) == Some(name.as_str()));
            if claimed || queues.bedside_nurse_waiting.contains(&name) || queues.pager.contains(&name) {
                continue;
            }
            if acuity.is_resuscitation() {
                queues.pager.push(key, &name);
            } else {
                queues.bedside_nurse_waiting.push(key, &name);
            }
            info!(patient = %name, paged = acuity.is_resuscitation(), "rescued into the nurse queue");
            rescued += 1;
        } else if queues.doctor_global.push(key, &name) {
            info!(patient = %name, %state, "rescued into the doctor queue");
            rescued += 1;
        }
    }
    rescued
}

// ── Aging ─────────────────────────────────────────────────────────────────────

/// Lower every priority in the global doctor queue by the aging decrement
/// (floored at 1) once per aging interval.
pub fn age_global_queue(ctx: &mut TickContext<'_>, last: &mut Option<NaiveDateTime>) -> bool {
    let queue = &mut ctx.ledger.queues.doctor_global;
    if queue.is_empty() || !due(*last, ctx.now, ctx.config.global_queue_aging_interval_minutes) {
        return false;
    }
    *last = Some(ctx.now);
    queue.age(ctx.config.doctor_queue_aging_decrement);
    debug!(queued = queue.len(), "global doctor queue aged");
    true
}

// ── Priority boost ────────────────────────────────────────────────────────────

/// Divide `name`'s priority in `queue` by `factor`, truncated and floored
/// at 1.  `false` when `name` is not queued there.
fn boost_in(queue: &mut PriorityQueue, name: &str, factor: f64) -> bool {
    if !queue.contains(name) {
        return false;
    }
    queue.reprioritize(|n, p| if n == name { (p / factor).trunc().max(1.0) } else { p });
    true
}

/// Once per boost interval, every patient who has spent longer in the
/// current stage than its budget moves up.  The priority is divided by
/// `actual / budget` in the first queue holding the patient: the global
/// doctor queue, the assigned doctor's waitlist, then the nurse queue.
pub fn boost_overdue(ctx: &mut TickContext<'_>, last: &mut Option<NaiveDateTime>) -> usize {
    if !due(*last, ctx.now, ctx.config.priority_boost_interval_minutes) {
        return 0;
    }
    *last = Some(ctx.now);

    let mut boosted = 0;
    for name in ctx.roster.names() {
        let Some(p) = ctx.roster.get(&name).and_then(Actor::patient) else { continue };
        let (states, budget) = if STAGE1.contains(&p.state) {
            (&STAGE1, p.targets.stage1_total())
        } else if STAGE2.contains(&p.state) {
            (&STAGE2, p.targets.stage2_total())
        } else {
            continue;
        };
        let Some(record) = ctx.metrics.patient.get(&name) else { continue };
        let actual: f64 = states.iter().map(|s| record.minutes_in_state(*s)).sum();
        if budget <= 0.0 || actual <= budget {
            continue;
        }
        let factor = actual / budget;
        let doctor = p.assigned_doctor.clone();

        let hit = boost_in(&mut ctx.ledger.queues.doctor_global, &name, factor)
            || doctor
                .as_deref()
                .and_then(|d| ctx.roster.get_mut(d))
                .and_then(Actor::doctor_mut)
                .is_some_and(|d| boost_in(&mut d.assigned_patients_waitlist, &name, factor))
            || boost_in(&mut ctx.ledger.queues.bedside_nurse_waiting, &name, factor);
        if hit {
            debug!(patient = %name, factor, "overdue patient boosted");
            boosted += 1;
        }
    }
    boosted
}

// ── Triage timeout ────────────────────────────────────────────────────────────

/// A patient stuck in triage for `triage_timeout_minutes` is sent on to the
/// nurse queue as if triage had finished, and the triage nurse is freed.
pub fn triage_timeouts(ctx: &mut TickContext<'_>) -> usize {
    let limit = ctx.config.triage_timeout_minutes;
    let pf = ctx.config.priority_factor;
    let chair = ctx.ledger.maze.address(places::WAITING_ROOM_CHAIR);
    let mut timed_out = 0;

    for name in ctx.roster.names() {
        if !ctx.roster.get(&name).and_then(Actor::patient).is_some_and(|p| p.state == PatientState::Triage) {
            continue;
        }
        let waited = ctx.metrics.patient.get(&name).map_or(0.0, |r| r.minutes_in_state(PatientState::Triage));
        if waited < limit {
            continue;
        }

        let Some((_, common, p)) = ctx.roster.get_mut(&name).and_then(Actor::patient_parts) else { continue };
        p.state = PatientState::WaitingForNurse;
        if p.next_room.is_none() {
            p.next_room = p.injuries_zone.clone();
        }
        common.end_chat();
        common.set_plan(Plan::GoToAddress(chair.clone()));
        let acuity = p.acuity();
        let key = acuity.priority(pf);

        ctx.ledger.triage_patients = ctx.ledger.triage_patients.saturating_sub(1);
        let queues = &mut ctx.ledger.queues;
        queues.triage_queue.remove(&name);
        queues.doctor_global.push(key, &name);
        if acuity.is_resuscitation() {
            queues.pager.push(key, &name);
        } else {
            queues.bedside_nurse_waiting.push(key, &name);
        }

        for nurse in ctx.roster.iter_mut() {
            let Some((_, common, t)) = nurse.triage_nurse_parts() else { continue };
            if t.chatting_patient.as_deref() == Some(name.as_str()) {
                t.chatting_patient = None;
            }
            if common.chatting_with.as_deref() == Some(name.as_str()) {
                common.end_chat();
            }
        }
        warn!(patient = %name, waited, "triage timed out; sent to the nurse queue");
        timed_out += 1;
    }
    timed_out
}

// ── Filler departures ─────────────────────────────────────────────────────────

/// Filler patients whose departure time has come head for the exit after
/// letting go of their bed, queues, and staff.
pub fn preload_departures(ctx: &mut TickContext<'_>) -> usize {
    let now = ctx.now;
    let exit = ctx.ledger.maze.address(places::EXIT);
    let mut departed = 0;

    for name in ctx.roster.names() {
        let is_due = ctx.roster.get(&name).and_then(Actor::patient).is_some_and(|p| {
            p.exempt_from_data_collection
                && p.state != PatientState::Leaving
                && p.preload_departure_at.is_some_and(|t| now >= t)
        });
        if !is_due {
            continue;
        }
        let Some(mut actor) = ctx.roster.take(&name) else { continue };
        ctx.ledger.remove_everywhere(&name);

        if let Some((_, common, p)) = actor.patient_parts() {
            if let Some(doc) = p.assigned_doctor.take() {
                if let Some(d) = ctx.roster.get_mut(&doc).and_then(Actor::doctor_mut) {
                    doctor::release_patient(&doc, d, &name, ctx.ledger, ctx.config);
                }
            }
            p.bed_assignment = None;
            p.in_queue = false;
            p.preload_departure_at = None;
            p.state = PatientState::Leaving;
            common.end_chat();
            common.set_plan(Plan::GoToAddress(exit.clone()));
        }

        for other in ctx.roster.iter_mut() {
            let Scratch { common, role } = &mut other.scratch;
            if common.chatting_with.as_deref() == Some(name.as_str()) {
                common.end_chat();
            }
            match role {
                RoleScratch::BedsideNurse(n) if n.occupied.patient() == Some(name.as_str()) => {
                    n.occupied = Occupied::Idle;
                    common.clear_plan();
                }
                RoleScratch::Doctor(d) => {
                    if d.chatting_patient.as_deref() == Some(name.as_str()) {
                        d.chatting_patient = None;
                    }
                    if common.next_step.as_ref().and_then(Plan::approach_target) == Some(name.as_str()) {
                        common.clear_plan();
                    }
                }
                RoleScratch::TriageNurse(t) if t.chatting_patient.as_deref() == Some(name.as_str()) => {
                    t.chatting_patient = None;
                }
                _ => {}
            }
        }

        ctx.roster.insert(actor);
        info!(patient = %name, "filler patient departing");
        departed += 1;
    }
    departed
}
