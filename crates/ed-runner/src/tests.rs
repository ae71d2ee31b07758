//! Tests for the runner's flag parsing and sessions.

#[cfg(test)]
mod args_tests {
    use std::path::PathBuf;

    use crate::args::RunnerArgs;

    fn parse(flags: &[&str]) -> anyhow::Result<RunnerArgs> {
        RunnerArgs::parse_from(std::iter::once("ed-runner").chain(flags.iter().copied()))
    }

    #[test]
    fn defaults() {
        let a = parse(&["--target", "monday"]).unwrap();
        assert_eq!(a.target, "monday");
        assert_eq!(a.storage, PathBuf::from("storage"));
        assert_eq!(a.origin, None);
        assert!(!a.headless);
        assert!(a.write_movement);
        assert_eq!(a.steps, None);
    }

    #[test]
    fn every_flag() {
        let a = parse(&[
            "--target", "b", "--origin", "a", "--storage", "/tmp/runs", "--config", "c.json",
            "--start", "March 01, 2024, 08:00:00", "--sec-per-step", "30", "--steps", "120", "--headless",
        ])
        .unwrap();
        assert_eq!(a.origin.as_deref(), Some("a"));
        assert_eq!(a.storage, PathBuf::from("/tmp/runs"));
        assert_eq!(a.config, Some(PathBuf::from("c.json")));
        assert_eq!(a.start.map(|t| t.to_string()), Some("2024-03-01 08:00:00".to_string()));
        assert_eq!(a.sec_per_step, Some(30));
        assert_eq!(a.steps, Some(120));
        assert!(a.headless);
        assert!(!a.write_movement);
    }

    #[test]
    fn headless_can_keep_movement() {
        let a = parse(&["--target", "x", "--headless", "--write-movement"]).unwrap();
        assert!(a.headless && a.write_movement);
    }

    #[test]
    fn bad_flags_are_errors() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--target"]).is_err());
        assert!(parse(&["--target", "x", "--steps", "many"]).is_err());
        assert!(parse(&["--target", "x", "--start", "tomorrow"]).is_err());
        assert!(parse(&["--target", "x", "--fast"]).is_err());
        assert!(parse(&["--target", "x", "--sec-per-step", "0"]).is_err());
    }
}

#[cfg(test)]
mod session_tests {
    use std::path::Path;

    use chrono::NaiveDate;
    use ed_core::SimConfig;
    use ed_persist::{SimMeta, write_json_atomic};
    use ed_sim::NoopObserver;

    use crate::args::RunnerArgs;
    use crate::session::{PROMPT, command_loop, open_sim, run_fixed};

    fn args(storage: &Path, target: &str) -> RunnerArgs {
        RunnerArgs {
            target:         target.into(),
            origin:         None,
            storage:        storage.to_path_buf(),
            config:         None,
            start:          NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(8, 0, 0),
            sec_per_step:   None,
            steps:          None,
            headless:       true,
            write_movement: false,
        }
    }

    #[test]
    fn new_run_reads_its_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        let config = SimConfig { seed: 77, doctor_starting_amount: 3, ..Default::default() };
        write_json_atomic(&config_path, &config).unwrap();

        let mut a = args(dir.path(), "fresh");
        a.config = Some(config_path);
        a.sec_per_step = Some(30);
        let sim = open_sim(&a).unwrap();
        assert_eq!(sim.config.seed, 77);
        assert_eq!(sim.config.sec_per_step, 30);
        assert_eq!(sim.roster.count(ed_core::Role::Doctor), 3);
    }

    #[test]
    fn fixed_run_saves_and_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let a = args(dir.path(), "day");
        let mut sim = open_sim(&a).unwrap();
        let out = run_fixed(&mut sim, 4, &mut NoopObserver).unwrap();
        assert!(out.contains("finished"));

        let resumed = open_sim(&a).unwrap();
        assert_eq!(resumed.clock.step.0, 4);
        assert_eq!(resumed.roster.names(), sim.roster.names());
    }

    #[test]
    fn fork_copies_the_origin() {
        let dir = tempfile::tempdir().unwrap();
        let mut sim = open_sim(&args(dir.path(), "base")).unwrap();
        run_fixed(&mut sim, 2, &mut NoopObserver).unwrap();

        let mut a = args(dir.path(), "branch");
        a.origin = Some("base".into());
        let forked = open_sim(&a).unwrap();
        assert_eq!(forked.clock.step.0, 2);
        assert_eq!(forked.storage.code(), "branch");
        assert_eq!(forked.meta().fork_sim_code.as_deref(), Some("base"));
        assert!(dir.path().join("base").exists());
    }

    #[test]
    fn command_loop_reports_errors_and_stops_on_finish() {
        let dir = tempfile::tempdir().unwrap();
        let mut sim = open_sim(&args(dir.path(), "loop")).unwrap();
        let input = "run 2\n\ndance\nprint current time\nfin\nrun 5\n";
        let mut out = Vec::new();
        command_loop(&mut sim, &mut NoopObserver, input.as_bytes(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Error: Unknown command: dance"));
        assert!(text.contains("step 2"));
        assert!(text.contains("finished"));
        // Nothing after `fin` runs.
        assert_eq!(sim.clock.step.0, 2);
        assert_eq!(text.matches(PROMPT).count(), 5);
        assert!(sim.storage.meta_path().exists());
    }

    #[test]
    fn end_of_input_saves() {
        let dir = tempfile::tempdir().unwrap();
        let mut sim = open_sim(&args(dir.path(), "eof")).unwrap();
        command_loop(&mut sim, &mut NoopObserver, "run 1\n".as_bytes(), Vec::new()).unwrap();
        let meta: SimMeta = ed_persist::read_json(&sim.storage.meta_path()).unwrap();
        assert_eq!(meta.step, 1);
    }
}
