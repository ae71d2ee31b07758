//! Patient flow.
//!
//! ```text
//! WAITING_FOR_TRIAGE → TRIAGE → WAITING_FOR_NURSE → WAITING_FOR_FIRST_ASSESSMENT
//!   → WAITING_FOR_TEST → GOING_FOR_TEST → WAITING_FOR_RESULT      (tested)
//!   → WAITING_FOR_RESULT                                           (untested)
//!   → WAITING_FOR_DOCTOR → WAITING_FOR_EXIT | ADMITTED_BOARDING | DISCHARGED_WAITING
//!   → LEAVING
//! ```
//!
//! Staff drive the hand-offs (triage, escort, assessment, disposition); the
//! patient drives its own timers (test, result, exit, boarding, linger) and
//! the walkout check.  Every transition function here checks the current
//! state first and returns `false` when it has nothing to do.

use chrono::NaiveDateTime;
use ed_core::{SimConfig, Tile, minutes};
use ed_spatial::{DIAGNOSTIC_ROOM, Ledger};
use tracing::{debug, info};

use crate::actor::Actor;
use crate::context::TickContext;
use crate::metrics::{DataCollection, LingerRecord, WalkoutRecord};
use crate::plan::{Plan, places};
use crate::roster::Roster;
use crate::scratch::{CommonScratch, DoctorScratch, PatientScratch};
use crate::state::PatientState;
use crate::doctor;

// ── Tick ──────────────────────────────────────────────────────────────────────

pub(crate) fn plan(actor: &mut Actor, ctx: &mut TickContext<'_>) {
    let Some((name, common, p)) = actor.patient_parts() else { return };
    let now = ctx.now;

    let arena = common.curr_tile.and_then(|t| ctx.ledger.maze.arena_of(t)).map(str::to_string);
    let record = ctx.metrics.patient_mut(name);
    record.add_time(arena.as_deref(), p.state, ctx.config.minutes_per_step());
    let waited = record.minutes_in_state(p.state);

    if p.state == PatientState::Leaving {
        release_bed(name, p, ctx.ledger);
    }

    if should_check_walkout(common, p, waited, ctx.config) {
        p.walkout_last_check_minute = waited;
        if ctx.rng.random::<f64>() <= ctx.config.patient_walkout_probability {
            walk_out(name, common, p, waited, ctx);
        }
    }

    if p.lingering_after_discharge && !p.linger_recorded {
        ctx.metrics.patient_mut(name).lingered_after_discharge = LingerRecord {
            occurred:                  true,
            decided_at:                p.linger_started_at,
            expected_duration_minutes: p.linger_duration_minutes,
            ended_at:                  None,
        };
        p.linger_recorded = true;
    }
    if p.lingering_after_discharge
        && p.state == PatientState::DischargedWaiting
        && p.linger_end_time.is_some_and(|end| now >= end)
    {
        release_bed(name, p, ctx.ledger);
        p.lingering_after_discharge = false;
        p.state = PatientState::Leaving;
        head_for_exit(common, ctx.ledger);
        ctx.metrics.patient_mut(name).lingered_after_discharge.ended_at = Some(now);
        debug!(patient = name, "linger over");
    }

    match common.chatting_with.clone() {
        Some(partner) => {
            common.set_plan(Plan::Approach(partner.clone()));
            common.act_address = Some(partner);
        }
        None => {
            progress(name, common, p, ctx);
            common.act_address = common.next_step.as_ref().map(ToString::to_string);
        }
    }

    common.act_pronunciatio = p.state.indicator().to_string();
    common.act_description = p.state.key().to_lowercase().replace('_', " ");
}

fn should_check_walkout(common: &CommonScratch, p: &PatientScratch, waited: f64, config: &SimConfig) -> bool {
    config.patient_walkout_probability > 0.0
        && !p.left_without_being_seen
        && p.state.walkout_eligible()
        && !common.is_chatting()
        && common.time_to_next.is_none()
        && waited - p.walkout_last_check_minute >= config.patient_walkout_check_minutes
}

/// Timer-driven and doctor-gated progress while not in conversation.
fn progress(name: &str, common: &mut CommonScratch, p: &mut PatientScratch, ctx: &mut TickContext<'_>) {
    let now = ctx.now;
    let pf = ctx.config.priority_factor;

    if p.assigned_doctor.as_deref().is_some_and(|d| !ctx.roster.contains(d)) {
        debug!(patient = name, doctor = ?p.assigned_doctor, "clearing stale doctor");
        p.assigned_doctor = None;
        p.in_queue = false;
    }
    let result_back = common.timer_expired(now);

    match (p.state, p.assigned_doctor.clone()) {
        (PatientState::WaitingForTriage, _) if common.next_step.is_none() => {
            common.set_plan(Plan::GoToAddress(ctx.ledger.maze.address(places::WAITING_ROOM_CHAIR)));
        }
        (PatientState::WaitingForResult, None) if result_back => {
            p.state = PatientState::WaitingForDoctor;
            common.time_to_next = None;
            ctx.ledger.queues.doctor_global.push(p.acuity().priority(pf / 2.0), name);
            debug!(patient = name, "result back without a doctor; queued globally");
        }
        (PatientState::WaitingForResult, Some(doc)) if result_back => {
            let ready = p.targets.disposition_ready_at.is_none_or(|t| now >= t);
            if ready {
                if let Some(d) = ctx.roster.get_mut(&doc).and_then(Actor::doctor_mut) {
                    d.assigned_patients_waitlist.push(p.acuity().priority(pf / 2.0), name);
                }
                p.state = PatientState::WaitingForDoctor;
                common.time_to_next = None;
            }
        }
        (PatientState::WaitingForFirstAssessment, Some(doc)) => {
            let bed = target_bed(name, p, ctx.ledger);
            let ready = p.targets.initial_assessment_ready_at.is_none_or(|t| now >= t);
            if ready && !p.in_queue && bed.is_some() && bed == common.curr_tile {
                p.in_queue = true;
                if let Some(d) = ctx.roster.get_mut(&doc).and_then(Actor::doctor_mut) {
                    d.assigned_patients_waitlist.push(p.acuity().priority(pf), name);
                }
            }
        }
        (PatientState::WaitingForTest, _) => {
            let has_room = ctx.ledger.zone(DIAGNOSTIC_ROOM).is_some_and(|z| z.occupancy() < z.capacity);
            if has_room && ctx.ledger.admit_to_zone(DIAGNOSTIC_ROOM, name) {
                common.set_plan(Plan::GoToAddress(ctx.ledger.maze.address(places::DIAGNOSTIC_TABLE)));
                p.next_room = Some(DIAGNOSTIC_ROOM.to_string());
                p.state = PatientState::GoingForTest;
                p.testing_end_time = Some(now + minutes(ctx.config.surged_testing_time()));
                ctx.ledger.queues.bedside_nurse_waiting.remove(name);
            }
        }
        (PatientState::GoingForTest, _) => match p.testing_end_time {
            None => p.testing_end_time = Some(now + minutes(ctx.config.surged_testing_time())),
            Some(end) if now >= end => finish_test(name, common, p, ctx),
            Some(_) => {}
        },
        (PatientState::WaitingForExit, _) if p.targets.exit_ready_at.is_some_and(|t| now >= t) => {
            depart(name, common, p, ctx.ledger);
        }
        (PatientState::AdmittedBoarding, _) if p.admission_boarding_end.is_some_and(|t| now >= t) => {
            depart(name, common, p, ctx.ledger);
        }
        _ => {}
    }
}

fn finish_test(name: &str, common: &mut CommonScratch, p: &mut PatientScratch, ctx: &mut TickContext<'_>) {
    let now = ctx.now;
    ctx.ledger.remove_from_zone(DIAGNOSTIC_ROOM, name);
    p.testing_end_time = None;
    let zone = p.injuries_zone.clone();
    let plan = bed_plan(name, p, ctx.ledger, zone.as_deref());
    common.set_plan(plan);
    p.next_room = p.injuries_zone.clone();
    common.time_to_next = Some(now + minutes(ctx.config.surged_testing_result_time()));
    p.state = PatientState::WaitingForResult;
    p.targets.apply_stage2_surge(now);
}

fn depart(name: &str, common: &mut CommonScratch, p: &mut PatientScratch, ledger: &mut Ledger) {
    p.state = PatientState::Leaving;
    release_bed(name, p, ledger);
    head_for_exit(common, ledger);
    debug!(patient = name, "leaving");
}

// ── Beds and routes ───────────────────────────────────────────────────────────

/// Reserve (idempotently) a bed in the patient's injuries zone.
pub(crate) fn target_bed(name: &str, p: &mut PatientScratch, ledger: &mut Ledger) -> Option<Tile> {
    let zone = p.injuries_zone.clone()?;
    target_bed_in(name, p, ledger, &zone)
}

fn target_bed_in(name: &str, p: &mut PatientScratch, ledger: &mut Ledger, zone: &str) -> Option<Tile> {
    let bed = ledger.reserve_bed(name, zone, p.bed_assignment)?;
    p.bed_assignment = Some(bed);
    Some(bed)
}

/// Go to a reserved bed in `zone`, or to any bed of the zone when none can
/// be reserved.
pub(crate) fn bed_plan(name: &str, p: &mut PatientScratch, ledger: &mut Ledger, zone: Option<&str>) -> Plan {
    let zone = zone.unwrap_or(places::WAITING_ROOM);
    match target_bed_in(name, p, ledger, zone) {
        Some(bed) => Plan::GoToTile(bed),
        None => Plan::GoToAddress(ledger.maze.address(&format!("{zone}:bed"))),
    }
}

/// Free the bed and the injuries-zone slot.  Safe to repeat.
pub(crate) fn release_bed(name: &str, p: &mut PatientScratch, ledger: &mut Ledger) {
    ledger.release_bed(name, None);
    if let Some(zone) = &p.injuries_zone {
        ledger.remove_from_zone(zone, name);
    }
    p.bed_assignment = None;
}

pub(crate) fn head_for_exit(common: &mut CommonScratch, ledger: &Ledger) {
    common.set_plan(Plan::GoToAddress(ledger.maze.address(places::EXIT)));
}

// ── Walkout ───────────────────────────────────────────────────────────────────

fn walk_out(name: &str, common: &mut CommonScratch, p: &mut PatientScratch, waited: f64, ctx: &mut TickContext<'_>) {
    let now = ctx.now;
    info!(patient = name, state = %p.state, waited, "left without being seen");

    p.left_without_being_seen = true;
    p.left_without_being_seen_time = Some(now);
    p.left_without_being_seen_state = Some(p.state);
    p.left_without_being_seen_wait_minutes = Some(waited);
    p.walkout_recorded = true;
    ctx.metrics.patient_mut(name).left_department_by_choice = WalkoutRecord {
        occurred:     true,
        state:        Some(p.state),
        wait_minutes: Some(waited),
        timestamp:    Some(now),
    };

    if p.state == PatientState::Triage {
        ctx.ledger.triage_patients = ctx.ledger.triage_patients.saturating_sub(1);
    }
    ctx.ledger.remove_everywhere(name);
    p.bed_assignment = None;
    detach_from_doctor(name, p, None, ctx.roster, ctx.ledger, ctx.config);
    p.state = PatientState::Leaving;
    head_for_exit(common, ctx.ledger);
}

/// Remove the patient from its assigned doctor.  `acting` is the doctor
/// currently out of the roster, if any.
fn detach_from_doctor(
    name:    &str,
    p:       &mut PatientScratch,
    acting:  Option<(&str, &mut DoctorScratch)>,
    roster:  &mut Roster,
    ledger:  &mut Ledger,
    config:  &SimConfig,
) {
    let Some(doc) = p.assigned_doctor.clone() else { return };
    match acting {
        Some((acting_name, d)) if acting_name == doc => {
            doctor::release_patient(acting_name, d, name, ledger, config);
        }
        _ => {
            if let Some(d) = roster.get_mut(&doc).and_then(Actor::doctor_mut) {
                doctor::release_patient(&doc, d, name, ledger, config);
            }
        }
    }
}

// ── Staff-driven transitions ──────────────────────────────────────────────────

/// Called by the triage nurse when it pulls the patient from the queue.
pub fn to_triage(patient: &mut Actor, nurse: &str) -> bool {
    let Some((_, common, p)) = patient.patient_parts() else { return false };
    if p.state != PatientState::WaitingForTriage {
        return false;
    }
    common.set_plan(Plan::Approach(nurse.to_string()));
    p.state = PatientState::Triage;
    true
}

/// Nurse escort: `WAITING_FOR_NURSE → WAITING_FOR_FIRST_ASSESSMENT`.  The
/// patient heads for its bed and the stage-1 surge extra starts counting.
pub fn escort_to_bed(patient: &mut Actor, ledger: &mut Ledger, now: NaiveDateTime) -> bool {
    let Some((name, common, p)) = patient.patient_parts() else { return false };
    if p.state != PatientState::WaitingForNurse || p.next_room.is_none() {
        return false;
    }
    p.next_room = p.injuries_zone.clone();
    let zone = p.injuries_zone.clone();
    let plan = bed_plan(name, p, ledger, zone.as_deref());
    common.set_plan(plan);
    p.state = PatientState::WaitingForFirstAssessment;
    p.targets.apply_stage1_surge(now);
    true
}

/// First doctor visit.  Decides between testing and a straight result wait.
pub fn do_initial_assessment(patient: &mut Actor, ctx: &mut TickContext<'_>) -> bool {
    let now = ctx.now;
    let Some((name, common, p)) = patient.patient_parts() else { return false };
    if p.state != PatientState::WaitingForFirstAssessment {
        return false;
    }
    common.act_path_set = false;
    p.targets.initial_assessment_done = true;
    p.in_queue = false;
    let stage2 = *p.targets.stage2_minutes.get_or_insert(0.0);
    p.targets.disposition_ready_at = Some(now + minutes(stage2));

    if ctx.rng.random::<f64>() < ctx.config.testing_probability(p.acuity()) {
        p.state = PatientState::WaitingForTest;
        p.next_room = Some(DIAGNOSTIC_ROOM.to_string());
    } else {
        p.state = PatientState::WaitingForResult;
        common.time_to_next = Some(now);
        p.targets.apply_stage2_surge(now);
    }
    debug!(patient = name, state = %p.state, "initial assessment done");
    true
}

/// Disposition visit: admit, discharge, or discharge-and-linger.
pub fn do_disposition(
    patient: &mut Actor,
    doctor:  Option<(&str, &mut DoctorScratch)>,
    ctx:     &mut TickContext<'_>,
) -> bool {
    let now = ctx.now;
    let Some((name, common, p)) = patient.patient_parts() else { return false };
    if p.state != PatientState::WaitingForDoctor {
        return false;
    }
    detach_from_doctor(name, p, doctor, ctx.roster, ctx.ledger, ctx.config);
    common.act_path_set = false;
    p.targets.disposition_done = true;
    let zone = p.injuries_zone.clone().unwrap_or_else(|| places::WAITING_ROOM.to_string());

    let config = ctx.config;
    if config.simulate_hospital_admission && !config.admission_probability_by_ctas.is_empty() {
        let admit = config.admission_probability(p.acuity());
        if ctx.rng.random::<f64>() < admit {
            let boarding = ctx.rng.uniform(config.admission_boarding_minutes_min, config.admission_boarding_minutes_max);
            p.admitted_to_hospital = true;
            p.admission_boarding_start = Some(now);
            p.admission_boarding_end = Some(now + minutes(boarding));
            p.state = PatientState::AdmittedBoarding;
            common.set_plan(Plan::GoToAddress(ctx.ledger.maze.address(&format!("{zone}:bed"))));
            info!(patient = name, boarding_minutes = boarding, "admitted to hospital");
            return true;
        }
    }

    let stage3 = *p.targets.stage3_minutes.get_or_insert(0.0);
    p.targets.exit_ready_at = Some(now + minutes(stage3));
    p.state = PatientState::WaitingForExit;
    common.set_plan(Plan::GoToAddress(ctx.ledger.maze.address(&format!("{zone}:bed"))));

    let linger = config.patient_post_discharge_linger_probability;
    if linger > 0.0 && ctx.rng.random::<f64>() <= linger {
        stay_after_discharge(name, common, p, ctx.ledger, config, now);
    }
    debug!(patient = name, state = %p.state, "disposition done");
    true
}

fn stay_after_discharge(
    name:   &str,
    common: &mut CommonScratch,
    p:      &mut PatientScratch,
    ledger: &mut Ledger,
    config: &SimConfig,
    now:    NaiveDateTime,
) {
    p.state = PatientState::DischargedWaiting;
    let zone = p.injuries_zone.clone();
    let plan = bed_plan(name, p, ledger, zone.as_deref());
    common.set_plan(plan);
    p.lingering_after_discharge = true;
    p.linger_started_at = Some(now);
    let duration = config.patient_post_discharge_linger_minutes;
    if duration > 0.0 {
        p.linger_duration_minutes = Some(duration);
        p.linger_end_time = Some(now + minutes(duration));
    } else {
        p.linger_duration_minutes = None;
        p.linger_end_time = None;
    }
    p.linger_recorded = false;
}

// ── Metrics ───────────────────────────────────────────────────────────────────

/// Record tiles walked this tick against the pre-move state and area.
pub fn record_travel(
    metrics:  &mut DataCollection,
    name:     &str,
    state:    PatientState,
    area:     Option<&str>,
    from:     Tile,
    to:       Tile,
    config:   &SimConfig,
) {
    if from == to {
        return;
    }
    let tiles = u64::from(from.manhattan(to).max(1));
    let travel = tiles as f64 * config.travel_minutes_per_tile();
    metrics.patient_mut(name).add_travel(tiles, travel, state, area);
}
