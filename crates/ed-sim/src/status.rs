//! Periodic status report (`sim_status.json` and `sim_status.txt`).

use std::collections::BTreeMap;

use ed_actors::{Actor, Occupied};
use ed_core::{Role, timestamp};
use ed_spatial::QueueName;
use serde::Serialize;

use crate::Sim;

/// Queues shown in the report, in display order.
const REPORTED_QUEUES: [QueueName; 4] = [
    QueueName::Triage,
    QueueName::BedsideNurseWaiting,
    QueueName::Pager,
    QueueName::DoctorGlobal,
];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ZoneOccupancy {
    pub current:  usize,
    pub capacity: usize,
}

/// Snapshot of department load at one step.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimStatus {
    pub step:             u64,
    pub sim_time:         String,
    pub elapsed_hours:    u64,
    pub elapsed_mins:     u32,
    pub current_patients: usize,
    pub total_patients:   usize,
    /// Departed without walking out.
    pub completed:        usize,
    /// Every departed patient, walkouts included.
    pub left_ed:          usize,
    pub patient_states:   BTreeMap<String, usize>,
    pub zone_occupancy:   BTreeMap<String, ZoneOccupancy>,
    pub queues:           BTreeMap<String, usize>,
    pub nurse_status:     BTreeMap<String, usize>,
    pub doctor_assigned:  BTreeMap<String, usize>,
    pub doctors_total:    usize,
    pub doctors_accepting: usize,
    pub doctor_max_patients: usize,
}

fn nurse_label(occupied: &Occupied) -> &'static str {
    match occupied {
        Occupied::Idle         => "Available",
        Occupied::Resting      => "Resting",
        Occupied::Transfer(_)  => "Transferring",
        Occupied::Attending(_) => "Monitoring",
        Occupied::Testing(_)   => "Other",
    }
}

impl SimStatus {
    pub fn collect(sim: &Sim) -> Self {
        let (days, hours, mins) = sim.clock.elapsed_dhm();

        let mut patient_states = BTreeMap::new();
        for p in sim.roster.by_role(Role::Patient).filter_map(Actor::patient) {
            *patient_states.entry(p.state.key().to_string()).or_insert(0) += 1;
        }
        let current_patients = sim.roster.count(Role::Patient);
        let total_patients = sim.metrics.patient.len();
        let departed: Vec<_> = sim
            .metrics
            .patient
            .iter()
            .filter(|(name, _)| !sim.roster.contains(name))
            .map(|(_, record)| record)
            .collect();
        let walkouts = departed.iter().filter(|r| r.left_department_by_choice.occurred).count();

        let zone_occupancy = sim
            .ledger
            .zones
            .iter()
            .map(|(name, z)| (name.clone(), ZoneOccupancy { current: z.occupancy(), capacity: z.capacity }))
            .collect();
        let queues = REPORTED_QUEUES
            .iter()
            .map(|q| (q.key().to_string(), sim.ledger.queues.get(*q).len()))
            .collect();

        let mut nurse_status = BTreeMap::new();
        for n in sim.roster.by_role(Role::BedsideNurse).filter_map(Actor::bedside_nurse) {
            *nurse_status.entry(nurse_label(&n.occupied).to_string()).or_insert(0) += 1;
        }
        let doctor_assigned = sim
            .roster
            .by_role(Role::Doctor)
            .filter_map(|a| a.doctor().map(|d| (a.name.clone(), d.assigned_patients.len())))
            .collect();

        SimStatus {
            step: sim.clock.step.0,
            sim_time: timestamp::format(&sim.clock.now),
            elapsed_hours: days * 24 + u64::from(hours),
            elapsed_mins: mins,
            current_patients,
            total_patients,
            completed: departed.len() - walkouts,
            left_ed: departed.len(),
            patient_states,
            zone_occupancy,
            queues,
            nurse_status,
            doctor_assigned,
            doctors_total: sim.roster.count(Role::Doctor),
            doctors_accepting: sim.ledger.doctors_accepting.len(),
            doctor_max_patients: sim.config.max_patients_assigned_doctor,
        }
    }

    /// Human-readable form of the report.
    pub fn to_text(&self) -> String {
        let mut lines = vec![
            "=== ED SIMULATION STATUS ===".to_string(),
            format!("Step: {}", self.step),
            format!("Sim time: {} (elapsed {}h {}m)", self.sim_time, self.elapsed_hours, self.elapsed_mins),
            format!(
                "Patients: {} current, {} total, {} completed, {} left",
                self.current_patients, self.total_patients, self.completed, self.left_ed
            ),
            String::new(),
            "PATIENT STATES".to_string(),
        ];
        lines.extend(self.patient_states.iter().map(|(k, v)| format!("  {k}: {v}")));

        lines.push(String::new());
        lines.push("ZONE OCCUPANCY".to_string());
        lines.extend(self.zone_occupancy.iter().map(|(k, z)| format!("  {k}: {}/{}", z.current, z.capacity)));

        lines.push(String::new());
        lines.push("QUEUES".to_string());
        lines.extend(self.queues.iter().map(|(k, v)| format!("  {k}: {v}")));

        lines.push(String::new());
        lines.push("BEDSIDE NURSES".to_string());
        lines.extend(self.nurse_status.iter().map(|(k, v)| format!("  {k}: {v}")));

        lines.push(String::new());
        lines.push(format!("DOCTORS ({} accepting of {})", self.doctors_accepting, self.doctors_total));
        lines.extend(
            self.doctor_assigned
                .iter()
                .map(|(k, v)| format!("  {k}: {v}/{}", self.doctor_max_patients)),
        );
        lines.push(String::new());
        lines.join("\n")
    }
}
