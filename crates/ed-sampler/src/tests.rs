//! Unit tests for ed-sampler.

#[cfg(test)]
mod distribution {
    use ed_core::{Acuity, SimRng};

    use crate::{Stage, WaitConfig, WaitDistribution};

    #[test]
    fn hurdle_parses_before_lognormal() {
        let d: WaitDistribution =
            serde_json::from_str(r#"{"p_zero": 0.5, "mu_pos": 2.0, "sigma_pos": 0.5, "high": 100}"#).unwrap();
        assert!(matches!(d, WaitDistribution::Hurdle { .. }));
        let d: WaitDistribution = serde_json::from_str(r#"{"mu": 2.0, "sigma": 0.5}"#).unwrap();
        assert_eq!(d, WaitDistribution::TruncatedLogNormal { mu: 2.0, sigma: 0.5, low: 0.0, high: 1440.0 });
    }

    #[test]
    fn truncated_draws_stay_in_bounds() {
        let d = WaitDistribution::TruncatedLogNormal { mu: 4.0, sigma: 1.5, low: 10.0, high: 60.0 };
        let mut rng = SimRng::new(5);
        for _ in 0..500 {
            let x = d.sample(&mut rng, 1.0);
            assert!((10.0..=60.0).contains(&x), "{x}");
            assert_eq!((x * 10.0).round() / 10.0, x);
        }
    }

    #[test]
    fn impossible_window_clamps() {
        // Median e^10 minutes; essentially never below 5.
        let d = WaitDistribution::TruncatedLogNormal { mu: 10.0, sigma: 0.01, low: 0.0, high: 5.0 };
        let mut rng = SimRng::new(1);
        assert_eq!(d.sample(&mut rng, 1.0), 5.0);
    }

    #[test]
    fn hurdle_extremes() {
        let mut rng = SimRng::new(9);
        let always_zero = WaitDistribution::Hurdle { p_zero: 1.0, mu_pos: 3.0, sigma_pos: 0.5, high: None };
        let never_zero = WaitDistribution::Hurdle { p_zero: 0.0, mu_pos: 3.0, sigma_pos: 0.5, high: Some(40.0) };
        for _ in 0..100 {
            assert_eq!(always_zero.sample(&mut rng, 1.0), 0.0);
            let x = never_zero.sample(&mut rng, 1.0);
            assert!(x > 0.0 && x <= 40.0);
        }
    }

    #[test]
    fn surge_raises_the_median() {
        let d = WaitDistribution::TruncatedLogNormal { mu: 3.0, sigma: 0.3, low: 0.0, high: 1440.0 };
        let median = |surge: f64| {
            let mut rng = SimRng::new(21);
            let mut xs: Vec<f64> = (0..1001).map(|_| d.sample(&mut rng, surge)).collect();
            xs.sort_by(|a, b| a.total_cmp(b));
            xs[500]
        };
        let base = median(1.0);
        let surged = median(2.0);
        assert!((surged / base - 2.0).abs() < 0.1, "{base} -> {surged}");
        // Below-1 multipliers do not shorten waits.
        assert_eq!(median(0.5), base);
    }

    #[test]
    fn unknown_acuity_or_stage_is_zero() {
        let cfg = WaitConfig::builtin().unwrap();
        let mut rng = SimRng::new(0);
        assert_eq!(cfg.sample_minutes(&mut rng, Acuity(9), Stage::DispositionToExit, 1.0), 0.0);
        let empty = WaitConfig::default();
        assert_eq!(empty.sample_minutes(&mut rng, Acuity(3), Stage::ArrivalToInitialAssessment, 1.0), 0.0);
    }

    #[test]
    fn builtin_covers_every_acuity_and_stage() {
        let cfg = WaitConfig::builtin().unwrap();
        for a in 1..=5 {
            for s in [
                Stage::ArrivalToInitialAssessment,
                Stage::InitialAssessmentToDisposition,
                Stage::DispositionToExit,
            ] {
                assert!(cfg.get(Acuity(a), s).is_some(), "{a} {s}");
            }
        }
    }
}

#[cfg(test)]
mod targets {
    use chrono::NaiveDate;
    use ed_core::{Acuity, SimRng, minutes};

    use crate::{StagedWaitTargets, WaitConfig};

    fn now() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 2, 13).unwrap().and_hms_opt(6, 0, 0).unwrap()
    }

    fn fixed_config() -> WaitConfig {
        WaitConfig::from_json(
            r#"{"3": {
                "arrival_to_initial_assessment":     {"mu": 3.0, "sigma": 0.0001, "low": 0, "high": 1440},
                "initial_assessment_to_disposition": {"mu": 4.0, "sigma": 0.0001, "low": 0, "high": 1440},
                "disposition_to_exit":               {"mu": 2.0, "sigma": 0.0001, "low": 0, "high": 1440}
            }}"#,
        )
        .unwrap()
    }

    #[test]
    fn assign_fills_budgets_and_stage1_gate() {
        let mut t = StagedWaitTargets::default();
        let mut rng = SimRng::new(1);
        t.assign(&fixed_config(), &mut rng, Acuity(3), now(), 1.0);
        let s1 = t.stage1_minutes.unwrap();
        assert!((s1 - 20.1).abs() < 0.05);
        assert_eq!(t.stage1_surge_extra, 0.0);
        assert_eq!(t.initial_assessment_ready_at, Some(now() + minutes(s1)));
        assert!(t.disposition_ready_at.is_none());
        assert!(!t.initial_assessment_done);
    }

    #[test]
    fn assign_is_idempotent() {
        let mut t = StagedWaitTargets::default();
        let mut rng = SimRng::new(1);
        t.assign(&fixed_config(), &mut rng, Acuity(3), now(), 1.5);
        let first = t.clone();
        t.assign(&fixed_config(), &mut rng, Acuity(3), now() + minutes(30.0), 3.0);
        assert_eq!(t, first);
    }

    #[test]
    fn surge_extras_are_stored_separately() {
        let mut t = StagedWaitTargets::default();
        let mut rng = SimRng::new(1);
        t.assign(&fixed_config(), &mut rng, Acuity(3), now(), 1.5);
        let s1 = t.stage1_minutes.unwrap();
        assert!((t.stage1_surge_extra - s1 * 0.5).abs() < 1e-9);
        // Stage 3 carries surge in its draw: e^(2 + ln 1.5) ≈ 11.1
        assert!((t.stage3_minutes.unwrap() - 11.1).abs() < 0.1);

        let gate = t.initial_assessment_ready_at.unwrap();
        t.apply_stage1_surge(now());
        assert_eq!(t.initial_assessment_ready_at, Some(gate + minutes(t.stage1_surge_extra)));
    }

    #[test]
    fn stage2_surge_anchors_at_now_when_gate_passed() {
        let mut t = StagedWaitTargets { stage2_surge_extra: 10.0, ..Default::default() };
        t.disposition_ready_at = Some(now());
        let later = now() + minutes(60.0);
        t.apply_stage2_surge(later);
        assert_eq!(t.disposition_ready_at, Some(later + minutes(10.0)));
    }

    #[test]
    fn timestamps_use_long_form() {
        let mut t = StagedWaitTargets::default();
        t.initial_assessment_ready_at = Some(now());
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["initial_assessment_ready_at"], "February 13, 2023, 06:00:00");
        assert!(json["disposition_ready_at"].is_null());
        let back: StagedWaitTargets = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);
    }
}

#[cfg(test)]
mod catalog {
    use ed_core::SimRng;

    use crate::{ArrivalCurve, DiagnosisCatalog};

    #[test]
    fn builtin_catalog_loads() {
        let cat = DiagnosisCatalog::builtin().unwrap();
        assert!(cat.entries.len() >= 10);
        assert!(cat.entries.iter().any(|d| d.acuity().is_resuscitation() && d.zone == "trauma room"));
        let total: f64 = cat.entries.iter().map(|d| d.normalized_fraction).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sampling_respects_zero_weights() {
        let csv = "Symptoms,ICD-10-CA,CTAS,Zone,normalized_fraction\n\
                   rash,R21,5,minor injuries zone,0.0\n\
                   chest pain,R07.4,2,major injuries zone,1.0\n";
        let cat = DiagnosisCatalog::from_reader(csv.as_bytes()).unwrap();
        let mut rng = SimRng::new(4);
        for _ in 0..50 {
            assert_eq!(cat.sample(&mut rng).unwrap().symptoms, "chest pain");
        }
    }

    #[test]
    fn bad_acuity_rejected() {
        let csv = "Symptoms,ICD-10-CA,CTAS,Zone,normalized_fraction\nx,A00,7,minor injuries zone,1.0\n";
        assert!(DiagnosisCatalog::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn arrival_curve_per_step() {
        let curve = ArrivalCurve::from_reader("hour,num_of_patients\n0,6\n13,12\n".as_bytes()).unwrap();
        assert_eq!(curve.visits(13), 12.0);
        assert_eq!(curve.visits(5), 0.0);
        // 60-second steps: 60 per hour; 12/60 * 0.5 = 0.1
        assert!((curve.per_step(13, 60, 0.5) - 0.1).abs() < 1e-12);
        assert_eq!(curve.visits(24), 6.0);
    }

    #[test]
    fn arrival_curve_rejects_bad_hour() {
        assert!(ArrivalCurve::from_reader("hour,num_of_patients\n24,1\n".as_bytes()).is_err());
        assert_eq!(ArrivalCurve::builtin().unwrap().visits(0), 2.1);
    }
}
