//! Integration tests for ed-output.

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use crate::csv::{CsvWriter, TICK_SUMMARY_FILE, ZONE_OCCUPANCY_FILE};
    use crate::row::{TickSummaryRow, ZoneOccupancyRow};
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn summary_row(step: u64) -> TickSummaryRow {
        TickSummaryRow {
            step,
            sim_time:           format!("step {step}"),
            patients:           4,
            staff:              3,
            arrivals:           1,
            departures:         0,
            moved:              5,
            encounters:         0,
            rescued:            0,
            timed_out:          0,
            boosted:            2,
            preload_departures: 0,
            triage_queue:       1,
            doctor_global:      2,
        }
    }

    fn zone_row(step: u64, zone: &str) -> ZoneOccupancyRow {
        ZoneOccupancyRow { step, zone: zone.into(), current: 1, capacity: 5 }
    }

    fn read(path: &std::path::Path) -> (Vec<String>, Vec<csv::StringRecord>) {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        let headers = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        let rows = rdr.records().map(|r| r.unwrap()).collect();
        (headers, rows)
    }

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        assert!(dir.path().join(TICK_SUMMARY_FILE).exists());
        assert!(dir.path().join(ZONE_OCCUPANCY_FILE).exists());
    }

    #[test]
    fn csv_tick_summary_round_trip() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_tick_summary(&summary_row(3)).unwrap();
        w.finish().unwrap();

        let (headers, rows) = read(&dir.path().join(TICK_SUMMARY_FILE));
        assert_eq!(&headers[..3], ["step", "sim_time", "patients"]);
        assert_eq!(headers.len(), 14);
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "3");
        assert_eq!(&rows[0][1], "step 3");
        assert_eq!(&rows[0][10], "2"); // boosted
    }

    #[test]
    fn csv_zone_rows() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_zone_occupancy(&[zone_row(0, "trauma room"), zone_row(0, "minor injuries zone")]).unwrap();
        w.finish().unwrap();

        let (headers, rows) = read(&dir.path().join(ZONE_OCCUPANCY_FILE));
        assert_eq!(headers, ["step", "zone", "current", "capacity"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][1], "minor injuries zone");
    }

    #[test]
    fn reopened_writer_appends_without_second_header() {
        let dir = tmp();
        {
            let mut w = CsvWriter::new(dir.path()).unwrap();
            w.write_tick_summary(&summary_row(0)).unwrap();
            w.finish().unwrap();
        }
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_tick_summary(&summary_row(1)).unwrap();
        w.finish().unwrap();

        let (headers, rows) = read(&dir.path().join(TICK_SUMMARY_FILE));
        assert_eq!(headers[0], "step");
        assert_eq!(rows.iter().map(|r| r[0].to_string()).collect::<Vec<_>>(), ["0", "1"]);
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }
}

#[cfg(test)]
mod export_tests {
    use std::collections::BTreeMap;

    use ed_actors::{DataCollection, PatientRecord, PatientState};
    use ed_core::Acuity;

    use crate::export::{
        AREA_TIMES_FILE, COMPLETED_STAGE_FILE, CTAS_SUMMARY_FILE, ED_METRICS_FILE, STATE_TIMES_FILE,
        completed_stage_row, ed_metrics_row, export_analysis, travel_adjusted,
    };

    fn record(ctas: u8, states: &[(PatientState, f64)], areas: &[(&str, f64)]) -> PatientRecord {
        let mut r = PatientRecord {
            ctas_score:    Some(Acuity(ctas)),
            injuries_zone: Some("minor injuries zone".into()),
            icd_code:      Some("S01".into()),
            ..Default::default()
        };
        for (s, m) in states {
            r.add_time(None, *s, *m);
        }
        for (a, m) in areas {
            r.time_spent_area.insert(a.to_string(), *m);
        }
        r
    }

    fn completed(ctas: u8, stage1: f64) -> PatientRecord {
        let mut r = record(
            ctas,
            &[
                (PatientState::WaitingForTriage, stage1),
                (PatientState::WaitingForDoctor, 20.0),
                (PatientState::Leaving, 2.0),
            ],
            &[("waiting room", stage1)],
        );
        r.stage1_minutes = Some(30.0);
        r.stage2_minutes = Some(60.0);
        r.stage3_minutes = Some(15.0);
        r
    }

    #[test]
    fn travel_is_taken_out_except_when_leaving() {
        let mut r = record(3, &[(PatientState::WaitingForNurse, 10.0), (PatientState::Leaving, 3.0)], &[
            ("waiting room", 4.0),
        ]);
        r.travel_time_state.insert("WAITING_FOR_NURSE".into(), 2.5);
        r.travel_time_state.insert("LEAVING".into(), 3.0);
        r.travel_time_area.insert("waiting room".into(), 6.0);

        let adjusted = travel_adjusted(&r);
        assert_eq!(adjusted.minutes_in_state(PatientState::WaitingForNurse), 7.5);
        assert_eq!(adjusted.minutes_in_state(PatientState::Leaving), 3.0);
        assert_eq!(adjusted.time_spent_area["waiting room"], 0.0);
        // The stored record is untouched.
        assert_eq!(r.minutes_in_state(PatientState::WaitingForNurse), 10.0);
    }

    #[test]
    fn completed_rows_need_all_three_stages() {
        assert!(completed_stage_row("Patient 1", &completed(3, 10.0)).is_some());

        let unfinished = record(3, &[(PatientState::WaitingForTriage, 5.0)], &[]);
        assert!(completed_stage_row("Patient 2", &unfinished).is_none());

        let mut walked = completed(3, 10.0);
        walked.left_department_by_choice.occurred = true;
        assert!(completed_stage_row("Patient 3", &walked).is_none());

        let row = completed_stage_row("Patient 1", &completed(2, 10.0)).unwrap();
        assert_eq!((row.real_stage1_minutes, row.real_stage2_minutes, row.real_stage3_minutes), (10.0, 20.0, 2.0));
        assert_eq!(row.original_stage2_minutes, Some(60.0));
        assert_eq!(row.ctas, 2);
    }

    #[test]
    fn metrics_row_sums_the_right_states() {
        let mut r = record(
            4,
            &[
                (PatientState::WaitingForTriage, 5.0),
                (PatientState::WaitingForFirstAssessment, 10.0),
                (PatientState::WaitingForTest, 3.0),
                (PatientState::WaitingForResult, 7.0),
                (PatientState::AdmittedBoarding, 40.0),
            ],
            &[],
        );
        r.left_department_by_choice.occurred = false;
        r.left_department_by_choice.wait_minutes = Some(99.0);

        let row = ed_metrics_row("Patient 9", &r);
        assert_eq!(row.door_to_doctor_minutes, 15.0);
        assert_eq!(row.treatment_time_minutes, 10.0);
        assert_eq!(row.boarding_time_minutes, 40.0);
        assert_eq!(row.length_of_stay_minutes, 65.0);
        assert_eq!(row.lwbs_wait_minutes, None);
        assert!(!row.completed_treatment);
        assert_eq!(row.icd_code, "S01");
    }

    #[test]
    fn export_writes_every_file_and_skips_fillers() {
        let dir = tempfile::tempdir().unwrap();
        let mut metrics = DataCollection::default();
        metrics.patient.insert("Patient 1".into(), completed(3, 10.0));
        metrics.patient.insert("Patient 2".into(), completed(3, 20.0));
        metrics.patient.insert("Patient 3".into(), completed(3, 60.0));
        let mut filler = completed(3, 500.0);
        filler.exempt_from_data_collection = true;
        metrics.patient.insert("Patient 4".into(), filler);
        let mut odd = record(2, &[(PatientState::DischargedWaiting, 1.0)], &[("exit", 1.0)]);
        odd.ctas_score = None;
        metrics.patient.insert("Patient 5".into(), odd);

        let report = export_analysis(dir.path(), &metrics).unwrap();
        assert_eq!(report.reported, 4);
        assert_eq!(report.completed, 3);

        for f in [STATE_TIMES_FILE, AREA_TIMES_FILE, COMPLETED_STAGE_FILE, ED_METRICS_FILE, CTAS_SUMMARY_FILE] {
            assert!(dir.path().join(f).exists(), "{f}");
        }

        let mut rdr = csv::Reader::from_path(dir.path().join(STATE_TIMES_FILE)).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(&headers[0], "name");
        assert_eq!(&headers[2], "WAITING_FOR_TRIAGE");
        assert_eq!(&headers[12], "DISCHARGED_WAITING");
        assert_eq!(&headers[13], "left_ED");
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| &r[0] != "Patient 4"));
        let last = rows.iter().find(|r| &r[0] == "Patient 5").unwrap();
        assert_eq!(&last[1], "0");
        assert_eq!(&last[2], "0");
        assert_eq!(&last[13], "false");

        let mut rdr = csv::Reader::from_path(dir.path().join(AREA_TIMES_FILE)).unwrap();
        let headers: Vec<String> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(headers, ["name", "CTAS", "exit", "waiting room"]);

        let summary: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(CTAS_SUMMARY_FILE)).unwrap()).unwrap();
        assert_eq!(summary.len(), 6);
        let three = &summary["3"];
        assert_eq!(three["num_of_patients"], 3);
        assert_eq!(three["percentage_of_total"], 75);
        assert_eq!(three["zones"]["minor injuries zone"], 3);
        assert_eq!(three["total"]["time_spent_state"]["WAITING_FOR_TRIAGE"], 90.0);
        assert_eq!(three["mean"]["time_spent_state"]["WAITING_FOR_TRIAGE"], 30.0);
        assert_eq!(three["median"]["time_spent_state"]["WAITING_FOR_TRIAGE"], 20.0);
        assert_eq!(summary["0"]["num_of_patients"], 1);
        assert_eq!(summary["5"]["num_of_patients"], 0);
    }
}

#[cfg(test)]
mod summary_tests {
    use crate::summary::{mean, median, population_std};

    #[test]
    fn statistics() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&xs), 5.0);
        assert_eq!(median(&xs), 4.5);
        assert_eq!(population_std(&xs), 2.0);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_std(&[]), 0.0);
    }
}

#[cfg(test)]
mod observer_tests {
    use chrono::NaiveDate;
    use ed_core::SimConfig;
    use ed_persist::{SimMeta, SimStorage};
    use ed_sim::SimBuilder;

    use crate::csv::{CsvWriter, TICK_SUMMARY_FILE, ZONE_OCCUPANCY_FILE};
    use crate::export::{CTAS_SUMMARY_FILE, ED_METRICS_FILE};
    use crate::observer::SimOutputObserver;

    #[test]
    fn integration_csv() {
        let dir = tempfile::tempdir().unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let config = SimConfig {
            seed:                          5,
            patient_rate_modifier:         2.0,
            preload_waiting_room_patients: 2,
            status_interval_steps:         0,
            ..Default::default()
        };
        let storage = SimStorage::create(dir.path(), "out").unwrap();
        let mut sim = SimBuilder::new(storage, SimMeta::new(start, config))
            .headless(true)
            .write_movement(false)
            .build()
            .unwrap();

        let analysis = sim.storage.analysis_dir();
        let mut obs = SimOutputObserver::new(CsvWriter::new(&analysis).unwrap());
        sim.run_steps(6, &mut obs).unwrap();
        sim.save(&mut obs).unwrap();
        assert!(obs.take_error().is_none());

        let mut rdr = csv::Reader::from_path(analysis.join(TICK_SUMMARY_FILE)).unwrap();
        let steps: Vec<String> = rdr.records().map(|r| r.unwrap()[0].to_string()).collect();
        assert_eq!(steps, ["0", "1", "2", "3", "4", "5"]);

        let zones = sim.ledger.zones.len();
        let mut rdr = csv::Reader::from_path(analysis.join(ZONE_OCCUPANCY_FILE)).unwrap();
        assert_eq!(rdr.records().count(), 6 * zones);

        assert!(analysis.join(ED_METRICS_FILE).exists());
        assert!(analysis.join(CTAS_SUMMARY_FILE).exists());
        assert_eq!(obs.last_export().map(|r| r.reported), Some(sim.metrics.patient.len()));
    }

    #[test]
    fn failed_step_leaves_no_row_behind() {
        let dir = tempfile::tempdir().unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let config = SimConfig { seed: 2, status_interval_steps: 1, ..Default::default() };
        let storage = SimStorage::create(dir.path(), "retry").unwrap();
        let mut sim = SimBuilder::new(storage, SimMeta::new(start, config))
            .headless(true)
            .write_movement(false)
            .build()
            .unwrap();

        let analysis = sim.storage.analysis_dir();
        let mut obs = SimOutputObserver::new(CsvWriter::new(&analysis).unwrap());
        // A directory where the status report goes makes the step fail late.
        let blocker = sim.storage.status_txt_path();
        std::fs::create_dir_all(&blocker).unwrap();
        assert!(sim.step(&mut obs).is_err());

        std::fs::remove_dir_all(&blocker).unwrap();
        sim.step(&mut obs).unwrap();
        sim.save(&mut obs).unwrap();

        let mut rdr = csv::Reader::from_path(analysis.join(TICK_SUMMARY_FILE)).unwrap();
        let steps: Vec<String> = rdr.records().map(|r| r.unwrap()[0].to_string()).collect();
        assert_eq!(steps, ["0"]);
    }
}
