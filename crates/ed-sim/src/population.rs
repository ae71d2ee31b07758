//! Bringing actors into the department: arrivals, staffing, and the
//! one-time start-up fill of beds and waiting room.

use chrono::Timelike;
use ed_actors::{Actor, CommonScratch, DataCollection, PatientScratch, PatientState, Plan, Roster, TickContext, places, triage_nurse};
use ed_core::{Role, Tile, minutes};
use ed_sampler::{ArrivalCurve, Diagnosis, DiagnosisCatalog};
use ed_spatial::{Ledger, TileEvent};
use tracing::{debug, info, warn};

/// States a filler patient may start in.
const FILLER_STATES: [PatientState; 4] = [
    PatientState::WaitingForFirstAssessment,
    PatientState::WaitingForTest,
    PatientState::WaitingForResult,
    PatientState::WaitingForDoctor,
];

/// Earliest a filler patient departs, in minutes.
const PRELOAD_MIN_MINUTES: f64 = 30.0;

// ── Names and placement ───────────────────────────────────────────────────────

/// `"<Role> <n>"` with `n` one past the role's registered count, skipping
/// any name still in use.
pub fn next_name(role: Role, roster: &Roster, metrics: &DataCollection) -> String {
    let mut n = metrics.role_count(role) as u32 + 1;
    loop {
        let name = role.actor_name(n);
        if !roster.contains(&name) && !is_registered(metrics, role, &name) {
            return name;
        }
        n += 1;
    }
}

fn is_registered(metrics: &DataCollection, role: Role, name: &str) -> bool {
    match role {
        Role::Patient      => metrics.patient.contains_key(name),
        Role::TriageNurse  => metrics.triage_nurse.contains_key(name),
        Role::BedsideNurse => metrics.bedside_nurse.contains_key(name),
        Role::Doctor       => metrics.doctor.contains_key(name),
    }
}

/// A random spawn tile of `arena`.
fn spawn_tile(ctx: &mut TickContext<'_>, arena: &str) -> Option<Tile> {
    let tiles = ctx.ledger.maze.resolve_address(&format!("{}{arena}", places::SPAWN_PREFIX));
    ctx.rng.choose(&tiles).copied()
}

fn place(ledger: &mut Ledger, roster: &mut Roster, actor: Actor) {
    if let Some(tile) = actor.tile() {
        ledger.maze.add_event(tile, TileEvent::idle(actor.name.clone()));
    }
    roster.insert(actor);
}

fn apply_diagnosis(common: &mut CommonScratch, p: &mut PatientScratch, diagnosis: Option<&Diagnosis>) {
    let Some(d) = diagnosis else { return };
    p.icd = Some(d.icd_code.clone());
    p.ctas = Some(d.acuity());
    p.injuries_zone = Some(d.zone.clone());
    common.description = d.symptoms.clone();
}

fn record_identity(metrics: &mut DataCollection, name: &str, p: &PatientScratch) {
    let record = metrics.patient_mut(name);
    record.icd_code = p.icd.clone();
    record.ctas_score = p.ctas;
    record.injuries_zone = p.injuries_zone.clone();
    record.exempt_from_data_collection = p.exempt_from_data_collection;
}

// ── Staff ─────────────────────────────────────────────────────────────────────

/// Add one staff member of `role` at its station.  `None` when the map has
/// no spawn tile for the role.
pub fn spawn_staff(ctx: &mut TickContext<'_>, role: Role) -> Option<String> {
    let name = next_name(role, ctx.roster, ctx.metrics);
    let tile = match role {
        Role::TriageNurse  => triage_nurse::spawn_tile(&name, &ctx.ledger.maze),
        Role::BedsideNurse => spawn_tile(ctx, places::MINOR_INJURIES),
        Role::Doctor       => spawn_tile(ctx, places::MAJOR_INJURIES),
        Role::Patient      => spawn_tile(ctx, places::EXIT),
    };
    let Some(tile) = tile else {
        warn!(actor = %name, %role, "no spawn tile for role");
        return None;
    };

    ctx.metrics.register(&name, role, false);
    if role == Role::Doctor {
        ctx.ledger.mark_doctor_accepting(&name);
    }
    place(ctx.ledger, ctx.roster, Actor::new(&name, role, tile));
    info!(actor = %name, %role, %tile, "staff arrived");
    Some(name)
}

/// Bring every staff role up to its configured count: doctors, bedside
/// nurses, then triage nurses.  Returns how many were added.
pub fn top_up_staff(ctx: &mut TickContext<'_>) -> usize {
    let targets = [
        (Role::Doctor,       ctx.config.doctor_starting_amount),
        (Role::BedsideNurse, ctx.config.bedside_starting_amount),
        (Role::TriageNurse,  ctx.config.triage_starting_amount),
    ];
    let mut added = 0;
    for (role, target) in targets {
        while ctx.roster.count(role) < target as usize {
            if spawn_staff(ctx, role).is_none() {
                break;
            }
            added += 1;
        }
    }
    added
}

// ── Patients ──────────────────────────────────────────────────────────────────

/// A new walk-in at the exit door, queued for triage.
pub fn spawn_patient(ctx: &mut TickContext<'_>, catalog: &DiagnosisCatalog) -> Option<String> {
    let Some(tile) = spawn_tile(ctx, places::EXIT) else {
        warn!("no exit spawn tile; patient not created");
        return None;
    };
    let name = next_name(Role::Patient, ctx.roster, ctx.metrics);
    let surge = ctx.surge();
    let now = ctx.now;
    let diagnosis = catalog.sample(ctx.rng).cloned();

    let mut actor = Actor::new(&name, Role::Patient, tile);
    let (_, common, p) = actor.patient_parts()?;
    apply_diagnosis(common, p, diagnosis.as_ref());
    let acuity = p.acuity();
    p.targets.assign(ctx.waits, ctx.rng, acuity, now, surge);

    ctx.metrics.register(&name, Role::Patient, false);
    record_identity(ctx.metrics, &name, p);
    ctx.ledger.queues.triage_queue.push(0.0, &name);
    info!(patient = %name, ctas = %acuity, zone = ?p.injuries_zone, "patient arrived");

    place(ctx.ledger, ctx.roster, actor);
    Some(name)
}

/// Accumulate the hour's arrival rate; once the accumulator reaches 1, spend
/// it on one new patient.
pub fn arrival(
    ctx:       &mut TickContext<'_>,
    catalog:   &DiagnosisCatalog,
    curve:     &ArrivalCurve,
    threshold: &mut f64,
) -> Option<String> {
    if *threshold >= 1.0 {
        *threshold -= 1.0;
        return spawn_patient(ctx, catalog);
    }
    *threshold += curve.per_step(ctx.now.hour(), ctx.config.sec_per_step, ctx.config.patient_rate_modifier);
    None
}

/// `n` walk-ins placed at once, e.g. a waiting room that is already busy
/// when the run starts.
pub fn preload_waiting_room(ctx: &mut TickContext<'_>, catalog: &DiagnosisCatalog, n: u32) -> Vec<String> {
    let names: Vec<String> = (0..n).filter_map(|_| spawn_patient(ctx, catalog)).collect();
    if !names.is_empty() {
        info!(patients = names.len(), "waiting room preloaded");
    }
    names
}

// ── Filler patients ───────────────────────────────────────────────────────────

/// Occupy `fill_injuries` of the minor and major zone capacity with filler
/// patients already in bed.  Returns how many were placed.
pub fn fill_beds(ctx: &mut TickContext<'_>, catalog: &DiagnosisCatalog) -> usize {
    let fill = ctx.config.fill_injuries;
    if fill <= 0.0 {
        return 0;
    }
    let mut placed = 0;
    for zone in [places::MINOR_INJURIES, places::MAJOR_INJURIES] {
        let Some(z) = ctx.ledger.zone(zone) else { continue };
        let available = ctx.ledger.beds.get(zone).map_or(0, |b| b.available.len());
        let target = (z.capacity as f64 * fill).floor() as usize;
        let wanted = target.saturating_sub(z.occupancy()).min(available);
        for _ in 0..wanted {
            if add_patient_in_bed(ctx, catalog, zone).is_some() {
                placed += 1;
            }
        }
        debug!(zone, wanted, "zone filled");
    }
    info!(placed, fill, "beds filled");
    placed
}

/// One filler patient in a free bed of `zone`, partway through treatment
/// and exempt from exports.  A random accepting doctor takes the patient;
/// with none accepting it waits in the global doctor queue instead.
pub fn add_patient_in_bed(ctx: &mut TickContext<'_>, catalog: &DiagnosisCatalog, zone: &str) -> Option<String> {
    let now = ctx.now;
    let pf = ctx.config.priority_factor;
    let surge = ctx.surge();
    let name = next_name(Role::Patient, ctx.roster, ctx.metrics);
    let bed = ctx.ledger.reserve_bed(&name, zone, None)?;
    ctx.ledger.admit_to_zone(zone, &name);

    let candidates: Vec<&Diagnosis> = catalog.for_zone(zone).collect();
    let weights: Vec<f64> = candidates.iter().map(|d| d.normalized_fraction).collect();
    let diagnosis = match ctx.rng.weighted_index(&weights) {
        Ok(i) => candidates.get(i).copied(),
        Err(_) => catalog.sample(ctx.rng),
    }
    .cloned();
    let state = ctx.rng.choose(&FILLER_STATES).copied().unwrap_or_default();
    let doctor = ctx.rng.choose(&ctx.ledger.doctors_accepting).cloned();
    let result_wait = ctx.rng.gen_range(1..=(ctx.config.testing_result_time as i64).max(1));
    let window = (ctx.config.preload_departure_window_hours * 60.0).max(PRELOAD_MIN_MINUTES);
    let departure = ctx.rng.uniform(PRELOAD_MIN_MINUTES, window);

    let mut actor = Actor::new(&name, Role::Patient, bed);
    let (_, common, p) = actor.patient_parts()?;
    apply_diagnosis(common, p, diagnosis.as_ref());
    p.exempt_from_data_collection = true;
    p.injuries_zone = Some(zone.to_string());
    p.next_room = Some(zone.to_string());
    p.bed_assignment = Some(bed);
    let acuity = p.acuity();
    p.targets.assign(ctx.waits, ctx.rng, acuity, now, surge);
    p.preload_departure_at = Some(now + minutes(departure));
    common.set_plan(Plan::GoToTile(bed));

    let key = acuity.priority(pf);
    let mut waitlist_key = None;
    match &doctor {
        Some(doc) => {
            p.assigned_doctor = Some(doc.clone());
            p.state = state;
        }
        None => {
            p.state = PatientState::WaitingForFirstAssessment;
            ctx.ledger.queues.doctor_global.push(key, &name);
        }
    }
    match p.state {
        PatientState::WaitingForFirstAssessment if doctor.is_some() => {
            if p.targets.initial_assessment_ready_at.is_some_and(|t| t <= now) {
                p.in_queue = true;
                waitlist_key = Some(key);
            }
        }
        PatientState::WaitingForTest | PatientState::WaitingForResult => {
            p.state = PatientState::WaitingForResult;
            p.targets.initial_assessment_done = true;
            common.time_to_next = Some(now + minutes(result_wait as f64));
            p.targets.disposition_ready_at = Some(now + minutes(p.targets.stage2_total()));
        }
        PatientState::WaitingForDoctor => {
            p.targets.initial_assessment_done = true;
            p.targets.disposition_ready_at = Some(now);
            p.in_queue = true;
            waitlist_key = Some(acuity.priority(pf / 2.0));
        }
        _ => {}
    }

    ctx.metrics.register(&name, Role::Patient, true);
    record_identity(ctx.metrics, &name, p);
    debug!(patient = %name, zone, %bed, state = %p.state, doctor = ?doctor, "filler patient placed");

    if let Some(doc) = &doctor {
        if let Some(d) = ctx.roster.get_mut(doc).and_then(Actor::doctor_mut) {
            d.assign_patient(&name);
            if let Some(k) = waitlist_key {
                d.assigned_patients_waitlist.push(k, &name);
            }
            if d.assigned_patients.len() >= ctx.config.max_patients_assigned_doctor {
                ctx.ledger.unmark_doctor_accepting(doc);
            }
        }
    }

    place(ctx.ledger, ctx.roster, actor);
    Some(name)
}
