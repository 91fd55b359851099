//! End-to-end behavior of the level pipeline with the default engine.
//!
//! Covers:
//! 1. Empty histories
//! 2. Dose conservation
//! 3. Grid cadence and horizon
//! 4. Single-dose absorption and elimination
//! 5. Superposition of repeated doses
//! 6. Output rounding

use approx::assert_relative_eq;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use pharmlevel::prelude::*;

fn day0() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn dose_at(days: u64, hour: u32, minute: u32, amount: f64) -> DoseRecord {
    DoseRecord::new(
        day0() + chrono::Days::new(days),
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
        amount,
    )
}

fn last_dose_time(records: &[DoseRecord]) -> NaiveDateTime {
    records.last().unwrap().datetime()
}

#[test]
fn empty_history_yields_no_levels() {
    let levels = medication_levels(&[]).unwrap();
    assert!(levels.is_empty());

    let profile = Simulator::default().profile(&[]).unwrap();
    assert!(profile.samples().is_empty());
    assert!(profile.summary().is_none());
}

#[test]
fn every_dose_reaches_the_depot_once() {
    let records = vec![
        dose_at(0, 10, 0, 2.5),
        dose_at(7, 10, 0, 2.5),
        dose_at(14, 9, 45, 5.0),
        dose_at(14, 9, 45, 5.0),
        dose_at(21, 22, 15, 7.5),
    ];
    let simulator = Simulator::default();
    let schedule = DoseSchedule::from_records(&records);
    let trace = simulator.integrate(&schedule).unwrap();

    let mut indices: Vec<usize> = trace.applied_doses().iter().map(|d| d.index).collect();
    indices.sort_unstable();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_relative_eq!(
        trace.depot_input(),
        0.62 * schedule.total_amount(),
        epsilon = 1e-12
    );
}

#[test]
fn levels_are_hourly_and_cover_fourteen_days_after_the_last_dose() {
    let records = vec![dose_at(0, 10, 0, 2.5), dose_at(3, 17, 20, 2.5)];
    let levels = medication_levels(&records).unwrap();

    assert_eq!(levels[0].timestamp(), records[0].datetime());
    for pair in levels.windows(2) {
        assert_eq!(pair[1].timestamp() - pair[0].timestamp(), TimeDelta::hours(1));
    }

    let end = last_dose_time(&records) + TimeDelta::hours(14 * 24);
    let last = levels.last().unwrap().timestamp();
    assert!(last <= end, "last sample {last} after {end}");
    assert!(last >= end - TimeDelta::hours(1), "last sample {last} too early");
}

#[test]
fn single_dose_rises_then_decays() {
    let records = vec![dose_at(0, 10, 0, 2.5)];
    let levels = medication_levels(&records).unwrap();

    assert_eq!(levels.len(), 337);
    assert_eq!(levels[0].timestamp(), records[0].datetime());
    assert!(levels[0].level() < 0.2, "first level {}", levels[0].level());

    let (peak_index, peak) = levels
        .iter()
        .enumerate()
        .fold((0, f64::MIN), |(i_max, max), (i, s)| {
            if s.level() > max {
                (i, s.level())
            } else {
                (i_max, max)
            }
        });
    assert!(peak_index > 0 && peak_index <= 48, "peak at hour {peak_index}");
    assert_relative_eq!(peak, 2.0, epsilon = 0.05);

    for pair in levels[peak_index..].windows(2) {
        assert!(
            pair[1].level() <= pair[0].level(),
            "level rose after the peak at {}",
            pair[1].timestamp()
        );
    }
    assert!(levels.last().unwrap().level() < 0.25 * peak);
}

#[test]
fn second_dose_is_superimposed_on_the_tail() {
    let records = vec![dose_at(0, 10, 0, 2.5), dose_at(7, 10, 0, 2.5)];
    let levels = medication_levels(&records).unwrap();

    let second = levels
        .iter()
        .position(|s| s.timestamp() == records[1].datetime())
        .unwrap();
    let residual = levels[second].level();
    let first_peak = levels[..second]
        .iter()
        .map(|s| s.level())
        .fold(f64::MIN, f64::max);
    let second_peak = levels[second..]
        .iter()
        .map(|s| s.level())
        .fold(f64::MIN, f64::max);

    assert!(residual < first_peak);
    assert!(second_peak > residual);
    assert!(second_peak > first_peak);
}

#[test]
fn levels_have_at_most_two_decimals() {
    let records = vec![dose_at(0, 7, 13, 3.3), dose_at(5, 19, 41, 1.7)];
    for sample in medication_levels(&records).unwrap() {
        let scaled = sample.level() * 100.0;
        assert!(
            (scaled - scaled.round()).abs() < 1e-6,
            "{} has more than two decimals",
            sample.level()
        );
    }
}

#[test]
fn profile_summary_matches_samples() {
    let records = vec![dose_at(0, 10, 0, 2.5)];
    let profile = Simulator::default().profile(&records).unwrap();
    let summary = profile.summary().unwrap();

    let displayed_peak = profile
        .samples()
        .iter()
        .map(|s| s.level())
        .fold(f64::MIN, f64::max);
    assert_relative_eq!(summary.amount_from_cmax, displayed_peak, epsilon = 0.01);
    assert!(summary.total_amount_peak < 0.62 * 2.5);
    assert!(summary.effective_volume.unwrap() > 0.0);
}

#[test]
fn batch_results_follow_input_order() {
    let histories = vec![
        vec![dose_at(0, 10, 0, 2.5)],
        vec![],
        vec![dose_at(0, 10, 0, 5.0), dose_at(7, 10, 0, 5.0)],
    ];
    let simulator = Simulator::default();
    let results = simulator.levels_batch(&histories);

    assert_eq!(results.len(), 3);
    for (history, result) in histories.iter().zip(&results) {
        let expected = simulator.levels(history).unwrap();
        assert_eq!(result.as_ref().unwrap(), &expected);
    }
    assert!(results[1].as_ref().unwrap().is_empty());
}

#[test]
fn step_cap_refuses_long_histories() {
    let settings = SimulationSettings {
        max_steps: Some(1000),
        ..Default::default()
    };
    let simulator = Simulator::new(PkParameters::default(), settings).unwrap();

    assert!(simulator.levels(&[dose_at(0, 10, 0, 2.5)]).is_ok());
    let err = simulator
        .levels(&[dose_at(0, 10, 0, 2.5), dose_at(30, 10, 0, 2.5)])
        .unwrap_err();
    assert!(matches!(err, PharmlevelError::HorizonTooLong { .. }));
}

#[test]
fn broken_parameters_never_produce_output() {
    let parameters = PkParameters {
        vc: f64::INFINITY,
        ..Default::default()
    };
    let err = Simulator::new(parameters, SimulationSettings::default()).unwrap_err();
    assert!(matches!(err, PharmlevelError::InvalidParameter { name: "vc", .. }));
}

#[test]
fn overflowing_rate_constants_fail_without_partial_levels() {
    // Each value is finite and positive, but CL/Vc overflows to infinity
    let parameters = PkParameters {
        cl: 1e300,
        vc: 1e-300,
        ..Default::default()
    };
    let settings = SimulationSettings {
        solver: pharmlevel::Solver::Analytical,
        ..Default::default()
    };
    let simulator = Simulator::new(parameters, settings).unwrap();

    let result = simulator.levels(&[dose_at(0, 10, 0, 2.5)]);
    assert!(
        matches!(result, Err(PharmlevelError::NonFiniteState { .. })),
        "expected a non-finite state error, got {result:?}"
    );
}
