//! Doctor: claims bed-ready patients, works its waitlist, and rounds when
//! idle.
//!
//! Assessment and disposition are applied the moment a patient is popped
//! from the waitlist; the walk to the bedside and the conversation that
//! follows are for show.

use chrono::NaiveDateTime;
use ed_core::{SimConfig, minutes, minutes_between};
use ed_spatial::Ledger;
use tracing::{debug, info};

use crate::actor::Actor;
use crate::context::TickContext;
use crate::patient;
use crate::plan::{Plan, places};
use crate::roster::Roster;
use crate::scratch::{CommonScratch, DoctorScratch};
use crate::state::PatientState;

pub(crate) fn plan(actor: &mut Actor, ctx: &mut TickContext<'_>) {
    let Some((name, common, d)) = actor.doctor_parts() else { return };
    let now = ctx.now;
    common.act_pronunciatio = "🩺".into();

    let roster = &*ctx.roster;
    let live = |p: &str| roster.get(p).and_then(Actor::patient).is_some_and(|s| s.state != PatientState::Leaving);
    d.assigned_patients.retain(|p| live(p));
    d.assigned_patients_waitlist.retain(|e| live(&e.name));
    if common.next_step.as_ref().and_then(Plan::approach_target).is_some_and(|t| !roster.contains(t)) {
        common.clear_plan();
    }

    let max = ctx.config.max_patients_assigned_doctor;
    if active_count(d, ctx.roster) < max && !ctx.ledger.queues.doctor_global.is_empty() {
        claim(name, d, ctx);
        if active_count(d, ctx.roster) < max {
            ctx.ledger.mark_doctor_accepting(name);
        }
    }

    if common.time_to_next.is_some() {
        if common.timer_expired(now) {
            common.time_to_next = None;
        }
        return;
    }
    if common.is_chatting() {
        return;
    }

    age_waitlist(d, ctx.config, now);

    let approaching = common.next_step.as_ref().and_then(Plan::approach_target).is_some();
    if d.chatting_patient.take().is_some() {
        common.time_to_next = Some(now + minutes(ctx.config.surged_doctor_resting_time()));
    } else if !approaching {
        if let Some(entry) = d.assigned_patients_waitlist.pop_front() {
            ctx.metrics
                .doctor
                .entry(name.to_string())
                .or_default()
                .patients_attended
                .push((entry.priority, entry.name.clone()));
            common.set_plan(Plan::Approach(entry.name.clone()));
            info!(doctor = name, patient = %entry.name, priority = entry.priority, "seeing patient");
            ctx.with_actor(&entry.name, |pa, ctx| {
                patient::do_initial_assessment(pa, ctx);
                patient::do_disposition(pa, Some((name, &mut *d)), ctx);
            });
        }
    }

    if let Some(target) = common.next_step.as_ref().and_then(Plan::approach_target).map(str::to_string) {
        common.act_description = format!("Seeing {target}");
        common.act_address = Some(target);
    } else if idle_round(common, ctx, now) {
        common.act_description = "Rounding".into();
    }
}

/// Patients not yet disposed.
fn active_count(d: &DoctorScratch, roster: &Roster) -> usize {
    d.assigned_patients
        .iter()
        .filter(|p| roster.get(p).and_then(Actor::patient).is_some_and(|s| !s.state.past_disposition()))
        .count()
}

/// Take the first bed-ready patient from the global queue.  Entries whose
/// patient is gone are dropped; patients still waiting for a nurse are
/// skipped.  A claimed patient whose result is already back goes onto the
/// waitlist at once.
fn claim(name: &str, d: &mut DoctorScratch, ctx: &mut TickContext<'_>) {
    let mut selected = None;
    for entry in ctx.ledger.queues.doctor_global.names() {
        match ctx.roster.get(&entry).and_then(Actor::patient) {
            None => {
                ctx.ledger.queues.doctor_global.remove(&entry);
            }
            Some(p) if p.state.doctor_ready() => {
                selected = Some(entry);
                break;
            }
            Some(_) => {}
        }
    }
    let Some(patient) = selected else { return };
    ctx.ledger.queues.doctor_global.remove(&patient);

    d.assign_patient(&patient);
    let pf = ctx.config.priority_factor;
    if let Some(p) = ctx.roster.get_mut(&patient).and_then(Actor::patient_mut) {
        p.assigned_doctor = Some(name.to_string());
        match p.state {
            // Result already back: straight onto the waitlist at the rejoin key.
            PatientState::WaitingForDoctor => {
                d.assigned_patients_waitlist.push(p.acuity().priority(pf / 2.0), &patient);
                p.in_queue = true;
            }
            // Rejoins from the bedside once the assessment gate opens.
            PatientState::WaitingForFirstAssessment => p.in_queue = false,
            _ => {}
        }
    }
    debug!(doctor = name, patient = %patient, "claimed");
    if active_count(d, ctx.roster) >= ctx.config.max_patients_assigned_doctor {
        ctx.ledger.unmark_doctor_accepting(name);
    }
}

/// Lower every waitlist key by the configured decrement (floor 1) once per
/// aging interval.
fn age_waitlist(d: &mut DoctorScratch, config: &SimConfig, now: NaiveDateTime) {
    if d.assigned_patients_waitlist.is_empty() {
        return;
    }
    let due = d
        .last_queue_aging_time
        .is_none_or(|t| minutes_between(t, now) >= config.doctor_queue_aging_interval_minutes);
    if due {
        d.last_queue_aging_time = Some(now);
        d.assigned_patients_waitlist.age(config.doctor_queue_aging_decrement);
    }
}

fn idle_round(common: &mut CommonScratch, ctx: &mut TickContext<'_>, now: NaiveDateTime) -> bool {
    let cooldown = ctx.config.doctor_idle_move_minutes;
    if common.last_idle_move_time.is_some_and(|t| minutes_between(t, now) < cooldown) {
        return false;
    }
    let spots = ctx.ledger.maze.addresses_containing(&ctx.ledger.maze.address(places::MAJOR_INJURIES));
    let Some(spot) = ctx.rng.choose(&spots).cloned() else { return false };
    common.act_address = Some(spot.clone());
    common.set_plan(Plan::GoToAddress(spot));
    common.last_idle_move_time = Some(now);
    true
}

/// Drop `patient` from the doctor and reopen the doctor to new patients
/// when it falls below the cap.
pub fn release_patient(doctor: &str, d: &mut DoctorScratch, patient: &str, ledger: &mut Ledger, config: &SimConfig) {
    d.remove_patient(patient);
    if d.assigned_patients.len() < config.max_patients_assigned_doctor {
        ledger.mark_doctor_accepting(doctor);
    }
}
