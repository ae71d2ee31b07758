//! Unit tests for ed-actors.

#[cfg(test)]
mod helpers {
    use chrono::{NaiveDate, NaiveDateTime};
    use ed_core::{Acuity, Role, SimConfig, SimRng, Tile};
    use ed_sampler::WaitConfig;
    use ed_spatial::{Ledger, MazeLayout};

    use crate::{Actor, DataCollection, Movement, PatientState, Roster, TickContext};

    pub fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    pub struct World {
        pub ledger:  Ledger,
        pub roster:  Roster,
        pub metrics: DataCollection,
        pub rng:     SimRng,
        pub config:  SimConfig,
        pub waits:   WaitConfig,
    }

    impl World {
        pub fn new() -> Self {
            World {
                ledger:  Ledger::from_layout(&MazeLayout::demo().unwrap(), None),
                roster:  Roster::new(),
                metrics: DataCollection::default(),
                rng:     SimRng::new(7),
                config:  SimConfig::default(),
                waits:   WaitConfig::builtin().unwrap(),
            }
        }

        pub fn ctx(&mut self) -> TickContext<'_> {
            TickContext {
                ledger:  &mut self.ledger,
                roster:  &mut self.roster,
                metrics: &mut self.metrics,
                rng:     &mut self.rng,
                config:  &self.config,
                waits:   &self.waits,
                now:     now(),
            }
        }

        pub fn staff(&mut self, name: &str, role: Role, tile: Tile) {
            self.metrics.register(name, role, false);
            self.roster.insert(Actor::new(name, role, tile));
        }

        pub fn patient(&mut self, name: &str, state: PatientState, ctas: u8, zone: &str, tile: Tile) {
            let mut actor = Actor::new(name, Role::Patient, tile);
            let p = actor.patient_mut().unwrap();
            p.state = state;
            p.ctas = Some(Acuity(ctas));
            p.injuries_zone = Some(zone.to_string());
            self.metrics.register(name, Role::Patient, false);
            self.roster.insert(actor);
        }

        /// Advance one actor exactly as the orchestrator would.
        pub fn tick(&mut self, name: &str) -> Option<Movement> {
            let mut actor = self.roster.take(name)?;
            let movement = actor.advance(&mut self.ctx());
            if let Some(m) = &movement {
                actor.scratch.common.curr_tile = Some(m.tile);
            }
            self.roster.insert(actor);
            movement
        }

        pub fn state_of(&self, name: &str) -> PatientState {
            self.roster.get(name).and_then(Actor::patient).unwrap().state
        }
    }
}

#[cfg(test)]
mod triage {
    use ed_core::{Role, Tile};

    use super::helpers::World;
    use crate::PatientState;

    fn world_with_triaged(ctas: u8, zone: &str) -> World {
        let mut w = World::new();
        w.staff("Triage Nurse 1", Role::TriageNurse, Tile::new(8, 1));
        w.patient("Patient 1", PatientState::WaitingForNurse, ctas, zone, Tile::new(7, 1));
        let (_, _, t) = w.roster.get_mut("Triage Nurse 1").unwrap().triage_nurse_parts().unwrap();
        t.chatting_patient = Some("Patient 1".into());
        w.ledger.triage_patients = 1;
        w
    }

    #[test]
    fn resuscitation_goes_to_the_pager() {
        let mut w = world_with_triaged(1, "trauma room");
        w.tick("Triage Nurse 1");
        let q = &w.ledger.queues;
        assert!(q.pager.contains("Patient 1"));
        assert!(q.doctor_global.contains("Patient 1"));
        assert!(!q.bedside_nurse_waiting.contains("Patient 1"));
        assert_eq!(w.ledger.triage_patients, 0);
        assert_eq!(w.metrics.triage_nurse["Triage Nurse 1"].patients_triaged.len(), 1);
    }

    #[test]
    fn others_wait_for_a_bedside_nurse() {
        let mut w = world_with_triaged(3, "minor injuries zone");
        w.tick("Triage Nurse 1");
        let q = &w.ledger.queues;
        assert_eq!(q.bedside_nurse_waiting.priority_of("Patient 1"), Some(9.0));
        assert!(!q.pager.contains("Patient 1"));
    }

    #[test]
    fn admits_only_while_chairs_are_free() {
        let mut w = World::new();
        w.staff("Triage Nurse 1", Role::TriageNurse, Tile::new(8, 1));
        w.patient("Patient 1", PatientState::WaitingForTriage, 3, "minor injuries zone", Tile::new(1, 1));
        w.ledger.queues.triage_queue.push(0.0, "Patient 1");
        w.ledger.triage_patients = w.ledger.triage_capacity;
        w.tick("Triage Nurse 1");
        assert_eq!(w.state_of("Patient 1"), PatientState::WaitingForTriage);

        w.ledger.triage_patients = 0;
        w.tick("Triage Nurse 1");
        assert_eq!(w.state_of("Patient 1"), PatientState::Triage);
        assert_eq!(w.ledger.triage_patients, 1);
        assert!(w.ledger.queues.triage_queue.is_empty());
    }

    #[test]
    fn spawn_tiles_cycle_through_chairs() {
        let w = World::new();
        let a = crate::triage_nurse::spawn_tile("Triage Nurse 1", &w.ledger.maze).unwrap();
        let b = crate::triage_nurse::spawn_tile("Triage Nurse 2", &w.ledger.maze).unwrap();
        assert_ne!(a, b);
    }
}

#[cfg(test)]
mod bedside {
    use ed_core::{Role, Tile};

    use super::helpers::World;
    use crate::{Actor, Occupied, PatientState};

    #[test]
    fn pager_places_patient_past_capacity() {
        let mut w = World::new();
        w.ledger.reserve_bed("Patient 90", "trauma room", None).unwrap();
        w.ledger.reserve_bed("Patient 91", "trauma room", None).unwrap();
        assert!(!w.ledger.zone_has_space("trauma room"));

        w.staff("Bedside Nurse 1", Role::BedsideNurse, Tile::new(17, 3));
        w.patient("Patient 1", PatientState::WaitingForNurse, 1, "trauma room", Tile::new(1, 3));
        w.roster.get_mut("Patient 1").unwrap().patient_mut().unwrap().next_room = Some("trauma room".into());
        w.ledger.queues.pager.push(3.0, "Patient 1");

        w.tick("Bedside Nurse 1");

        assert!(w.ledger.queues.pager.is_empty());
        let patient = w.roster.get("Patient 1").and_then(Actor::patient).unwrap();
        assert!(patient.bed_assignment.is_some());
        assert_eq!(patient.state, PatientState::WaitingForFirstAssessment);
        assert_eq!(w.ledger.find_patient_zone("Patient 1"), Some("trauma room"));
        let nurse = w.roster.get("Bedside Nurse 1").and_then(Actor::bedside_nurse).unwrap();
        assert_eq!(nurse.occupied, Occupied::Transfer("Patient 1".into()));
        assert_eq!(w.metrics.bedside_nurse["Bedside Nurse 1"].patients_attended.len(), 1);
    }

    #[test]
    fn waiting_queue_skips_full_zones_and_bumps_them() {
        let mut w = World::new();
        for i in 0..2 {
            w.ledger.reserve_bed(&format!("Patient 9{i}"), "trauma room", None).unwrap();
        }
        w.staff("Bedside Nurse 1", Role::BedsideNurse, Tile::new(17, 3));
        w.patient("Patient 1", PatientState::WaitingForNurse, 2, "trauma room", Tile::new(1, 3));
        w.patient("Patient 2", PatientState::WaitingForNurse, 4, "minor injuries zone", Tile::new(3, 3));
        for name in ["Patient 1", "Patient 2"] {
            let p = w.roster.get_mut(name).unwrap().patient_mut().unwrap();
            p.next_room = p.injuries_zone.clone();
        }
        w.ledger.queues.bedside_nurse_waiting.push(6.0, "Patient 1");
        w.ledger.queues.bedside_nurse_waiting.push(12.0, "Patient 2");
        w.ledger.queues.bedside_nurse_waiting.push(1.0, "Patient 77");

        w.tick("Bedside Nurse 1");

        let q = &w.ledger.queues.bedside_nurse_waiting;
        assert!(!q.contains("Patient 77"));
        assert!(!q.contains("Patient 2"));
        assert_eq!(q.priority_of("Patient 1"), Some(5.0));
        assert_eq!(w.state_of("Patient 2"), PatientState::WaitingForFirstAssessment);
    }

    #[test]
    fn nurse_forgets_a_patient_who_left() {
        let mut w = World::new();
        w.staff("Bedside Nurse 1", Role::BedsideNurse, Tile::new(17, 3));
        let nurse = w.roster.get_mut("Bedside Nurse 1").unwrap();
        let (_, _, n) = nurse.bedside_nurse_parts().unwrap();
        n.occupied = Occupied::Transfer("Patient 5".into());
        w.tick("Bedside Nurse 1");
        let n = w.roster.get("Bedside Nurse 1").and_then(Actor::bedside_nurse).unwrap();
        assert!(n.occupied.is_free());
    }

    #[test]
    fn zones_alternate_by_ordinal() {
        use crate::bedside_nurse::assigned_zone;
        assert_ne!(assigned_zone("Bedside Nurse 1"), assigned_zone("Bedside Nurse 2"));
    }
}

#[cfg(test)]
mod doctor {
    use ed_core::{Role, Tile};

    use super::helpers::World;
    use crate::{Actor, PatientState, Plan};

    #[test]
    fn claims_only_bed_ready_patients() {
        let mut w = World::new();
        w.staff("Doctor 1", Role::Doctor, Tile::new(9, 8));
        w.patient("Patient 1", PatientState::WaitingForNurse, 2, "major injuries zone", Tile::new(1, 1));
        w.patient("Patient 2", PatientState::WaitingForFirstAssessment, 3, "major injuries zone", Tile::new(1, 7));
        w.ledger.queues.doctor_global.push(6.0, "Patient 1");
        w.ledger.queues.doctor_global.push(9.0, "Patient 2");
        w.ledger.queues.doctor_global.push(1.0, "Patient 404");

        w.tick("Doctor 1");

        let d = w.roster.get("Doctor 1").and_then(Actor::doctor).unwrap();
        assert_eq!(d.assigned_patients, vec!["Patient 2".to_string()]);
        let global = &w.ledger.queues.doctor_global;
        assert!(global.contains("Patient 1"));
        assert!(!global.contains("Patient 2"));
        assert!(!global.contains("Patient 404"));
        assert_eq!(
            w.roster.get("Patient 2").and_then(Actor::patient).unwrap().assigned_doctor.as_deref(),
            Some("Doctor 1")
        );
        assert!(w.ledger.doctors_accepting.contains(&"Doctor 1".to_string()));
    }

    #[test]
    fn stops_accepting_at_the_cap() {
        let mut w = World::new();
        w.config.max_patients_assigned_doctor = 1;
        w.staff("Doctor 1", Role::Doctor, Tile::new(9, 8));
        w.patient("Patient 1", PatientState::WaitingForResult, 3, "major injuries zone", Tile::new(1, 7));
        w.ledger.queues.doctor_global.push(4.5, "Patient 1");
        w.ledger.mark_doctor_accepting("Doctor 1");
        w.tick("Doctor 1");
        assert!(!w.ledger.doctors_accepting.contains(&"Doctor 1".to_string()));
    }

    #[test]
    fn popping_the_waitlist_disposes_and_approaches() {
        let mut w = World::new();
        w.staff("Doctor 1", Role::Doctor, Tile::new(9, 8));
        w.patient("Patient 1", PatientState::WaitingForDoctor, 3, "major injuries zone", Tile::new(1, 7));
        w.roster.get_mut("Patient 1").unwrap().patient_mut().unwrap().assigned_doctor = Some("Doctor 1".into());
        let doc = w.roster.get_mut("Doctor 1").unwrap().doctor_mut().unwrap();
        doc.assign_patient("Patient 1");
        doc.assigned_patients_waitlist.push(4.5, "Patient 1");

        w.tick("Doctor 1");

        assert_eq!(w.state_of("Patient 1"), PatientState::WaitingForExit);
        let doctor = w.roster.get("Doctor 1").unwrap();
        assert_eq!(doctor.scratch.common.next_step, Some(Plan::Approach("Patient 1".into())));
        assert!(doctor.doctor().unwrap().assigned_patients.is_empty());
        // One aging pass (-2) runs before the pop.
        assert_eq!(w.metrics.doctor["Doctor 1"].patients_attended, vec![(2.5, "Patient 1".to_string())]);
    }
}

#[cfg(test)]
mod patient {
    use ed_core::{Role, Tile};

    use super::helpers::World;
    use crate::{Actor, PatientState, patient};

    #[test]
    fn disposition_is_idempotent() {
        let mut w = World::new();
        w.staff("Doctor 1", Role::Doctor, Tile::new(9, 8));
        w.patient("Patient 1", PatientState::WaitingForDoctor, 4, "minor injuries zone", Tile::new(13, 1));
        w.roster.get_mut("Patient 1").unwrap().patient_mut().unwrap().assigned_doctor = Some("Doctor 1".into());
        w.roster.get_mut("Doctor 1").unwrap().doctor_mut().unwrap().assign_patient("Patient 1");

        let mut ctx = w.ctx();
        let first = ctx.with_actor("Patient 1", |pa, ctx| patient::do_disposition(pa, None, ctx));
        let second = ctx.with_actor("Patient 1", |pa, ctx| patient::do_disposition(pa, None, ctx));
        assert_eq!(first, Some(true));
        assert_eq!(second, Some(false));

        let p = w.roster.get("Patient 1").and_then(Actor::patient).unwrap();
        assert_eq!(p.state, PatientState::WaitingForExit);
        assert!(p.targets.disposition_done);
        assert!(p.targets.exit_ready_at.is_some());
        assert!(w.roster.get("Doctor 1").and_then(Actor::doctor).unwrap().assigned_patients.is_empty());
    }

    #[test]
    fn admission_boards_before_leaving() {
        let mut w = World::new();
        w.config.simulate_hospital_admission = true;
        w.config.admission_probability_by_ctas.insert("2".into(), 1.0);
        w.patient("Patient 1", PatientState::WaitingForDoctor, 2, "major injuries zone", Tile::new(1, 7));
        let mut ctx = w.ctx();
        ctx.with_actor("Patient 1", |pa, ctx| patient::do_disposition(pa, None, ctx));
        let p = w.roster.get("Patient 1").and_then(Actor::patient).unwrap();
        assert_eq!(p.state, PatientState::AdmittedBoarding);
        let (start, end) = (p.admission_boarding_start.unwrap(), p.admission_boarding_end.unwrap());
        let boarded = ed_core::minutes_between(start, end);
        assert!((60.0..=480.0).contains(&boarded), "{boarded}");
    }

    #[test]
    fn walkout_clears_every_trace() {
        let mut w = World::new();
        w.config.patient_walkout_probability = 1.0;
        w.config.patient_walkout_check_minutes = 0.0;
        w.patient("Patient 1", PatientState::WaitingForNurse, 4, "minor injuries zone", Tile::new(1, 1));
        w.ledger.queues.bedside_nurse_waiting.push(12.0, "Patient 1");
        w.ledger.queues.doctor_global.push(12.0, "Patient 1");
        w.ledger.admit_to_zone("minor injuries zone", "Patient 1");
        w.ledger.reserve_bed("Patient 1", "minor injuries zone", None).unwrap();

        w.tick("Patient 1");

        assert_eq!(w.state_of("Patient 1"), PatientState::Leaving);
        assert!(w.ledger.is_absent("Patient 1"));
        let record = &w.metrics.patient["Patient 1"].left_department_by_choice;
        assert!(record.occurred);
        assert_eq!(record.state, Some(PatientState::WaitingForNurse));
        let p = w.roster.get("Patient 1").and_then(Actor::patient).unwrap();
        assert!(p.left_without_being_seen);
    }

    #[test]
    fn result_without_doctor_queues_globally() {
        let mut w = World::new();
        w.patient("Patient 1", PatientState::WaitingForResult, 4, "minor injuries zone", Tile::new(13, 1));
        w.roster.get_mut("Patient 1").unwrap().scratch.common.time_to_next = Some(super::helpers::now());
        w.tick("Patient 1");
        assert_eq!(w.state_of("Patient 1"), PatientState::WaitingForDoctor);
        assert_eq!(w.ledger.queues.doctor_global.priority_of("Patient 1"), Some(6.0));
    }

    #[test]
    fn test_waits_for_a_free_table() {
        let mut w = World::new();
        for i in 0..3 {
            w.ledger.admit_to_zone(ed_spatial::DIAGNOSTIC_ROOM, &format!("Patient 9{i}"));
        }
        w.patient("Patient 1", PatientState::WaitingForTest, 3, "major injuries zone", Tile::new(1, 7));
        w.tick("Patient 1");
        assert_eq!(w.state_of("Patient 1"), PatientState::WaitingForTest);

        w.ledger.remove_from_zone(ed_spatial::DIAGNOSTIC_ROOM, "Patient 90");
        w.tick("Patient 1");
        assert_eq!(w.state_of("Patient 1"), PatientState::GoingForTest);
        assert!(w.roster.get("Patient 1").and_then(Actor::patient).unwrap().testing_end_time.is_some());
    }
}

#[cfg(test)]
mod movement {
    use ed_core::{Role, Tile};

    use super::helpers::World;
    use crate::{Plan, PatientState, places};

    #[test]
    fn walks_to_an_address_and_stays() {
        let mut w = World::new();
        w.patient("Patient 1", PatientState::WaitingForTriage, 3, "minor injuries zone", Tile::new(0, 5));
        let chairs = w.ledger.maze.resolve_address(&w.ledger.maze.address(places::WAITING_ROOM_CHAIR));

        let first = w.tick("Patient 1").unwrap();
        assert!(chairs.contains(&first.tile), "{}", first.tile);
        let second = w.tick("Patient 1").unwrap();
        assert_eq!(second.tile, first.tile);
    }

    #[test]
    fn travel_speed_limits_tiles_per_step() {
        let mut w = World::new();
        w.config.travel_seconds_per_tile = Some(60.0);
        w.patient("Patient 1", PatientState::WaitingForTriage, 3, "minor injuries zone", Tile::new(0, 5));
        let step = w.tick("Patient 1").unwrap();
        assert_eq!(step.tile.manhattan(Tile::new(0, 5)), 1);
    }

    #[test]
    fn approach_to_a_missing_actor_clears_the_plan() {
        let mut w = World::new();
        w.staff("Doctor 1", Role::Doctor, Tile::new(9, 8));
        w.roster.get_mut("Doctor 1").unwrap().scratch.common.set_plan(Plan::Approach("Patient 8".into()));
        let step = w.tick("Doctor 1").unwrap();
        let doctor = w.roster.get("Doctor 1").unwrap();
        assert_ne!(doctor.scratch.common.next_step, Some(Plan::Approach("Patient 8".into())));
        assert!(w.ledger.maze.is_walkable(step.tile));
    }

    #[test]
    fn unplaced_actor_does_not_move() {
        let mut w = World::new();
        w.patient("Patient 1", PatientState::WaitingForTriage, 3, "minor injuries zone", Tile::new(0, 5));
        w.roster.get_mut("Patient 1").unwrap().scratch.common.curr_tile = None;
        assert!(w.tick("Patient 1").is_none());
    }
}

#[cfg(test)]
mod encounter {
    use ed_core::{Role, Tile};

    use super::helpers::World;
    use crate::{Actor, NoopTextGenerator, PatientState, Plan, start_encounter, wants_to_chat};

    #[test]
    fn triage_conversation_moves_patient_on() {
        let mut w = World::new();
        w.staff("Triage Nurse 1", Role::TriageNurse, Tile::new(8, 1));
        w.patient("Patient 1", PatientState::Triage, 3, "major injuries zone", Tile::new(7, 1));

        let mut ctx = w.ctx();
        assert!(start_encounter("Triage Nurse 1", "Patient 1", &mut ctx, &NoopTextGenerator));
        assert!(!start_encounter("Triage Nurse 1", "Patient 1", &mut ctx, &NoopTextGenerator));

        let p = w.roster.get("Patient 1").unwrap();
        assert!(p.scratch.common.is_chatting());
        assert_eq!(p.patient().unwrap().state, PatientState::WaitingForNurse);
        assert_eq!(p.patient().unwrap().next_room.as_deref(), Some("major injuries zone"));
        let nurse = w.roster.get("Triage Nurse 1").unwrap();
        assert_eq!(nurse.scratch.common.chatting_with.as_deref(), Some("Patient 1"));
    }

    #[test]
    fn too_far_apart_to_talk() {
        let mut w = World::new();
        w.staff("Triage Nurse 1", Role::TriageNurse, Tile::new(8, 1));
        w.patient("Patient 1", PatientState::Triage, 3, "major injuries zone", Tile::new(20, 7));
        let mut ctx = w.ctx();
        assert!(!start_encounter("Triage Nurse 1", "Patient 1", &mut ctx, &NoopTextGenerator));
        assert_eq!(w.state_of("Patient 1"), PatientState::Triage);
    }

    #[test]
    fn doctor_drops_approach_when_it_chats() {
        let mut doctor = Actor::new("Doctor 1", Role::Doctor, Tile::new(1, 7));
        doctor.scratch.common.set_plan(Plan::Approach("Patient 1".into()));
        let patient = Actor::new("Patient 1", Role::Patient, Tile::new(1, 8));
        let stranger = Actor::new("Patient 2", Role::Patient, Tile::new(1, 8));
        assert!(!wants_to_chat(&mut doctor, &stranger));
        assert!(doctor.scratch.common.next_step.is_some());
        assert!(wants_to_chat(&mut doctor, &patient));
        assert!(doctor.scratch.common.next_step.is_none());
    }
}

#[cfg(test)]
mod scratch {
    use ed_core::{Acuity, Role, Tile};

    use crate::{Actor, Occupied, PatientState};

    #[test]
    fn patient_scratch_uses_persisted_keys() {
        let mut actor = Actor::new("Patient 1", Role::Patient, Tile::new(1, 1));
        let p = actor.patient_mut().unwrap();
        p.icd = Some("R07.4".into());
        p.ctas = Some(Acuity(2));
        p.state = PatientState::WaitingForNurse;

        let json = serde_json::to_value(&actor).unwrap();
        assert_eq!(json["scratch"]["ICD"], "R07.4");
        assert_eq!(json["scratch"]["state"], "WAITING_FOR_NURSE");
        let back: Actor = serde_json::from_value(json).unwrap();
        assert_eq!(back, actor);
    }

    #[test]
    fn occupied_marker_survives_a_save() {
        let mut actor = Actor::new("Bedside Nurse 1", Role::BedsideNurse, Tile::new(17, 3));
        let (_, _, n) = actor.bedside_nurse_parts().unwrap();
        n.occupied = Occupied::Testing("Patient 3".into());
        let back: Actor = serde_json::from_str(&serde_json::to_string(&actor).unwrap()).unwrap();
        assert_eq!(back.bedside_nurse().unwrap().occupied, Occupied::Testing("Patient 3".into()));
        assert_eq!(back.role(), Role::BedsideNurse);
    }
}
