//! Unit tests for ed-persist.

#[cfg(test)]
mod helpers {
    use chrono::{NaiveDate, NaiveDateTime};
    use ed_actors::{Actor, DataCollection, PatientState};
    use ed_core::{Acuity, Role, SimConfig, Tile};
    use ed_spatial::{Ledger, MazeLayout, QueueName};

    use crate::SimMeta;

    pub fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 2, 13).unwrap().and_hms_opt(6, 0, 0).unwrap()
    }

    pub fn ledger() -> Ledger {
        let mut ledger = Ledger::from_layout(&MazeLayout::demo().unwrap(), None);
        ledger.reserve_bed("Patient 1", "major injuries zone", None).unwrap();
        ledger.admit_to_zone("major injuries zone", "Patient 1");
        ledger.queues.get_mut(QueueName::DoctorGlobal).push(6.0, "Patient 1");
        ledger.queues.get_mut(QueueName::Triage).push(9.0, "Patient 2");
        ledger
    }

    pub fn actors() -> Vec<Actor> {
        let mut p = Actor::new("Patient 1", Role::Patient, Tile::new(3, 5));
        {
            let s = p.patient_mut().unwrap();
            s.state = PatientState::WaitingForFirstAssessment;
            s.ctas = Some(Acuity(2));
            s.injuries_zone = Some("major injuries zone".into());
            s.targets.stage1_minutes = Some(42.5);
            s.targets.initial_assessment_ready_at = Some(start());
        }
        let d = Actor::new("Doctor 1", Role::Doctor, Tile::new(9, 8));
        vec![d, p]
    }

    pub fn metrics() -> DataCollection {
        let mut m = DataCollection::default();
        m.register("Patient 1", Role::Patient, false);
        m.register("Doctor 1", Role::Doctor, false);
        m.patient_mut("Patient 1").add_time(Some("waiting room"), PatientState::WaitingForTriage, 3.0);
        m
    }

    pub fn meta(actors: &[Actor]) -> SimMeta {
        let mut meta = SimMeta::new(start(), SimConfig { seed: 11, ..Default::default() });
        meta.step = 4;
        meta.persona_names = actors.iter().map(|a| (a.name.clone(), a.role())).collect();
        meta
    }
}

#[cfg(test)]
mod atomic {
    use std::fs;

    use crate::{read_json, write_json_atomic};

    #[test]
    fn write_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/doc.json");
        write_json_atomic(&path, &vec![1, 2, 3]).unwrap();
        write_json_atomic(&path, &vec![4]).unwrap();
        let back: Vec<i32> = read_json(&path).unwrap();
        assert_eq!(back, vec![4]);
        let files: Vec<_> = fs::read_dir(dir.path().join("nested")).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn unreadable_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(read_json::<serde_json::Value>(&path).is_err());
    }
}

#[cfg(test)]
mod recovery {
    use std::fs;

    use ed_core::Tile;

    use crate::{Environment, EnvironmentEntry, SimStorage};

    fn env(x: u32) -> Environment {
        [("Patient 1".to_string(), EnvironmentEntry::new("Emergency Department", Tile::new(x, 5)))]
            .into_iter()
            .collect()
    }

    #[test]
    fn corrupt_step_falls_back_two_steps() {
        let dir = tempfile::tempdir().unwrap();
        let s = SimStorage::create(dir.path(), "run").unwrap();
        s.write_environment(3, &env(3)).unwrap();
        fs::write(s.environment_path(5), "{ truncated").unwrap();

        let load = s.load_environment(5);
        assert_eq!(load.from_step, Some(3));
        assert_eq!(load.positions["Patient 1"].tile(), Tile::new(3, 5));
    }

    #[test]
    fn nothing_valid_gives_empty_positions() {
        let dir = tempfile::tempdir().unwrap();
        let s = SimStorage::create(dir.path(), "run").unwrap();
        fs::write(s.environment_path(0), "[]x").unwrap();
        let load = s.load_environment(2);
        assert_eq!(load.from_step, None);
        assert!(load.positions.is_empty());
    }

    #[test]
    fn step_artifacts_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let s = SimStorage::create(dir.path(), "run").unwrap();
        s.write_environment(7, &env(1)).unwrap();
        s.write_environment(8, &env(1)).unwrap();
        s.write_movement(7, &Default::default()).unwrap();
        s.remove_step_artifacts(7);
        assert!(!s.environment_path(8).exists());
        assert!(!s.movement_path(7).exists());
        // The positions the step started from survive.
        assert!(s.environment_path(7).exists());
        // Already gone: still fine.
        s.remove_step_artifacts(7);
    }
}

#[cfg(test)]
mod round_trip {
    use std::fs;

    use ed_core::Tile;

    use super::helpers::*;
    use crate::{Environment, EnvironmentEntry, SimStorage};

    #[test]
    fn save_load_save_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let actors = actors();
        let a = SimStorage::create(dir.path(), "a").unwrap();
        a.save_run(&meta(&actors), &ledger().snapshot(), &metrics(), &actors).unwrap();

        let snap = a.load_run().unwrap();
        let b = SimStorage::create(dir.path(), "b").unwrap();
        let ledger = snap.ledger.clone().unwrap();
        b.save_run(&snap.meta, &ledger, &snap.metrics, &snap.actors).unwrap();

        for rel in [
            "reverie/meta.json",
            "reverie/maze_status.json",
            "reverie/data_collection.json",
            "personas/Patient 1/scratch.json",
            "personas/Doctor 1/scratch.json",
        ] {
            let left = fs::read(a.dir().join(rel)).unwrap();
            let right = fs::read(b.dir().join(rel)).unwrap();
            assert_eq!(left, right, "{rel}");
        }
        assert_eq!(snap.actors.len(), 2);
        assert_eq!(snap.meta.config.seed, 11);
    }

    #[test]
    fn environment_overrides_scratch_tiles() {
        let dir = tempfile::tempdir().unwrap();
        let actors = actors();
        let s = SimStorage::create(dir.path(), "run").unwrap();
        s.save_run(&meta(&actors), &ledger().snapshot(), &metrics(), &actors).unwrap();
        let env: Environment =
            [("Patient 1".to_string(), EnvironmentEntry::new("Emergency Department", Tile::new(12, 4)))]
                .into_iter()
                .collect();
        s.write_environment(4, &env).unwrap();

        let snap = s.load_run().unwrap();
        let tile = |n: &str| snap.actors.iter().find(|a| a.name == n).and_then(|a| a.tile());
        assert_eq!(tile("Patient 1"), Some(Tile::new(12, 4)));
        assert_eq!(tile("Doctor 1"), Some(Tile::new(9, 8)));
    }

    #[test]
    fn missing_scratch_gets_an_empty_record() {
        let dir = tempfile::tempdir().unwrap();
        let actors = actors();
        let s = SimStorage::create(dir.path(), "run").unwrap();
        s.save_run(&meta(&actors), &ledger().snapshot(), &metrics(), &actors).unwrap();
        fs::remove_file(s.scratch_path("Doctor 1")).unwrap();
        let snap = s.load_run().unwrap();
        let doc = snap.actors.iter().find(|a| a.name == "Doctor 1").unwrap();
        assert!(doc.doctor().is_some());
        assert!(doc.tile().is_none());
    }
}

#[cfg(test)]
mod runs {
    use crate::{PersistError, SimMeta, SimStorage};

    use super::helpers::start;

    #[test]
    fn fork_copies_and_discard_removes() {
        let dir = tempfile::tempdir().unwrap();
        let origin = SimStorage::create(dir.path(), "base").unwrap();
        origin.save_meta(&SimMeta::new(start(), Default::default())).unwrap();

        let fork = SimStorage::fork(dir.path(), "base", "copy").unwrap();
        assert!(fork.meta_path().exists());
        assert!(matches!(SimStorage::fork(dir.path(), "base", "copy"), Err(PersistError::RunExists(_))));
        assert!(matches!(SimStorage::open(dir.path(), "nope"), Err(PersistError::MissingRun(_))));

        let path = fork.dir().to_path_buf();
        fork.discard().unwrap();
        assert!(!path.exists());
        assert!(origin.meta_path().exists());
    }

    #[test]
    fn partial_meta_uses_config_defaults() {
        let meta: SimMeta = serde_json::from_str(
            r#"{"start_date": "February 13, 2023, 06:00:00",
                "curr_time": "February 13, 2023, 07:00:00",
                "patient_rate_modifier": 1.5}"#,
        )
        .unwrap();
        assert_eq!(meta.step, 0);
        assert_eq!(meta.config.patient_rate_modifier, 1.5);
        assert_eq!(meta.config.priority_factor, 3.0);
        assert_eq!(meta.maze_name, "Emergency Department");
    }

    #[test]
    fn command_log_ids_increase() {
        let dir = tempfile::tempdir().unwrap();
        let s = SimStorage::create(dir.path(), "run").unwrap();
        assert_eq!(s.log_command("run 5", "ok", "t0".into()).unwrap(), 1);
        assert_eq!(s.log_command("save", "ok", "t1".into()).unwrap(), 2);
    }
}
