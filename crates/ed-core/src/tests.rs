//! Unit tests for ed-core primitives.

#[cfg(test)]
mod ids {
    use crate::{Acuity, Role, Tile, name_ordinal};

    #[test]
    fn tile_serialises_as_pair() {
        let t = Tile::new(12, 7);
        assert_eq!(serde_json::to_string(&t).unwrap(), "[12,7]");
        let back: Tile = serde_json::from_str("[12,7]").unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn manhattan_distance() {
        assert_eq!(Tile::new(1, 1).manhattan(Tile::new(4, 5)), 7);
        assert_eq!(Tile::new(4, 5).manhattan(Tile::new(1, 1)), 7);
    }

    #[test]
    fn parse_pair_tolerates_spaces() {
        assert_eq!(Tile::parse_pair("3, 9"), Some(Tile::new(3, 9)));
        assert_eq!(Tile::parse_pair("3;9"), None);
    }

    #[test]
    fn role_names() {
        assert_eq!(Role::TriageNurse.actor_name(2), "Triage Nurse 2");
        assert_eq!("Bedside Nurse".parse::<Role>().unwrap(), Role::BedsideNurse);
        assert!("Janitor".parse::<Role>().is_err());
        assert_eq!(name_ordinal("Bedside Nurse 3"), 3);
        assert_eq!(name_ordinal("Doctor"), 0);
    }

    #[test]
    fn acuity_priority() {
        assert_eq!(Acuity(2).priority(3.0), 6.0);
        assert_eq!(Acuity::default(), Acuity(3));
        assert!(Acuity(1).is_resuscitation());
    }
}

#[cfg(test)]
mod time {
    use chrono::NaiveDate;

    use crate::{SimClock, Step, minutes, minutes_between, timestamp};

    fn start() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 2, 13).unwrap().and_hms_opt(6, 0, 0).unwrap()
    }

    #[test]
    fn step_arithmetic() {
        let s = Step(10);
        assert_eq!(s + 5, Step(15));
        assert_eq!(s.offset(3), Step(13));
        assert_eq!(Step(15) - Step(10), 5u64);
        assert_eq!(Step(0).prev(), Step(0));
    }

    #[test]
    fn clock_advance_and_rewind() {
        let mut clock = SimClock::new(start(), 60);
        clock.advance();
        clock.advance();
        assert_eq!(clock.step, Step(2));
        assert_eq!(minutes_between(clock.start, clock.now), 2.0);
        clock.rewind();
        assert_eq!(clock.step, Step(1));
        assert_eq!(minutes_between(clock.start, clock.now), 1.0);
    }

    #[test]
    fn clock_dhm() {
        let mut clock = SimClock::new(start(), 3600);
        for _ in 0..25 {
            clock.advance();
        }
        assert_eq!(clock.elapsed_dhm(), (1, 1, 0));
    }

    #[test]
    fn fractional_minutes() {
        assert_eq!(minutes(1.5).num_seconds(), 90);
    }

    #[test]
    fn timestamp_long_form() {
        assert_eq!(timestamp::format(&start()), "February 13, 2023, 06:00:00");
        assert_eq!(timestamp::parse("February 13, 2023, 06:00:00").unwrap(), start());
    }

    #[test]
    fn clock_serde_roundtrip() {
        let mut clock = SimClock::new(start(), 10);
        clock.advance();
        let json = serde_json::to_string(&clock).unwrap();
        let back: SimClock = serde_json::from_str(&json).unwrap();
        assert_eq!(back, clock);
    }
}

#[cfg(test)]
mod rng {
    use crate::{EdError, SimRng};

    #[test]
    fn deterministic_same_step() {
        let mut r1 = SimRng::for_step(12345, 7);
        let mut r2 = SimRng::for_step(12345, 7);
        for _ in 0..100 {
            let a: f64 = r1.random();
            let b: f64 = r2.random();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn different_steps_differ() {
        let mut r0 = SimRng::for_step(1, 0);
        let mut r1 = SimRng::for_step(1, 1);
        let a: u64 = r0.random();
        let b: u64 = r1.random();
        assert_ne!(a, b, "adjacent steps should diverge");
    }

    #[test]
    fn gen_bool_extremes() {
        let mut rng = SimRng::new(0);
        assert!(!rng.gen_bool(0.0));
        assert!(rng.gen_bool(1.0));
    }

    #[test]
    fn lognormal_is_positive_with_plausible_median() {
        let mut rng = SimRng::new(99);
        let mut draws: Vec<f64> = (0..2001).map(|_| rng.lognormal(3.0, 0.5)).collect();
        assert!(draws.iter().all(|&x| x > 0.0));
        draws.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let median = draws[1000];
        // e^3 ≈ 20.1
        assert!((median - 20.1).abs() < 3.0, "median {median}");
    }

    #[test]
    fn weighted_index_skips_zero_weights() {
        let mut rng = SimRng::new(3);
        for _ in 0..200 {
            let i = rng.weighted_index(&[0.0, 1.0, 0.0, 2.0]).unwrap();
            assert!(i == 1 || i == 3);
        }
        assert!(matches!(rng.weighted_index(&[0.0, 0.0]), Err(EdError::Weights(_))));
        assert!(rng.weighted_index(&[]).is_err());
    }

    #[test]
    fn weighted_index_ignores_negative_and_nan() {
        let mut rng = SimRng::new(8);
        for _ in 0..100 {
            assert_eq!(rng.weighted_index(&[-4.0, f64::NAN, 0.5]).unwrap(), 2);
        }
    }
}

#[cfg(test)]
mod config {
    use crate::{Acuity, SimConfig};

    #[test]
    fn empty_document_yields_defaults() {
        let cfg: SimConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, SimConfig::default());
        cfg.validate().unwrap();
    }

    #[test]
    fn surge_multiplier_at_and_above_baseline() {
        let mut cfg = SimConfig::default();
        assert_eq!(cfg.surge_multiplier(), 1.0);
        cfg.patient_rate_modifier = 1.0;
        assert!((cfg.surge_multiplier() - 1.5).abs() < 1e-12);
        cfg.patient_rate_modifier = 0.1;
        assert_eq!(cfg.surge_multiplier(), 1.0);
    }

    #[test]
    fn tiles_per_step_from_travel_speed() {
        let mut cfg = SimConfig { sec_per_step: 60, ..SimConfig::default() };
        assert_eq!(cfg.tiles_per_step(), 60);
        cfg.travel_speed_mps = Some(1.0);
        cfg.meters_per_tile = 2.0;
        // 2 s per tile → 30 tiles per 60 s step
        assert_eq!(cfg.tiles_per_step(), 30);
        cfg.travel_minutes_per_tile = Some(0.5);
        assert_eq!(cfg.tiles_per_step(), 2);
    }

    #[test]
    fn acuity_tables_fall_back() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.testing_probability(Acuity(1)), 1.0);
        assert_eq!(cfg.testing_probability(Acuity(9)), 0.5);
        assert_eq!(cfg.admission_probability(Acuity(1)), 0.0);
    }

    #[test]
    fn invalid_fill_rejected() {
        let cfg = SimConfig { fill_injuries: 1.5, ..SimConfig::default() };
        assert!(cfg.validate().is_err());
    }
}
