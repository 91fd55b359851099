use chrono::{NaiveDate, NaiveTime};
use criterion::black_box;
use criterion::{criterion_group, criterion_main, Criterion};
use pharmlevel::*;

fn weekly_history(weeks: u64) -> Vec<DoseRecord> {
    (0..weeks)
        .map(|week| {
            DoseRecord::new(
                NaiveDate::from_ymd_opt(2025, 1, 6).unwrap() + chrono::Days::new(7 * week),
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                2.5 + 2.5 * (week / 4) as f64,
            )
        })
        .collect()
}

fn simulator(solver: Solver) -> Simulator {
    let settings = SimulationSettings {
        solver,
        ..Default::default()
    };
    Simulator::new(PkParameters::default(), settings).unwrap()
}

fn criterion_benchmark(c: &mut Criterion) {
    let single = weekly_history(1);
    let year = weekly_history(52);
    let ode = simulator(Solver::Ode);
    let analytical = simulator(Solver::Analytical);

    c.bench_function("ode single dose", |b| {
        b.iter(|| black_box(ode.levels(&single)))
    });
    c.bench_function("ode one year weekly", |b| {
        b.iter(|| black_box(ode.levels(&year)))
    });
    c.bench_function("analytical one year weekly", |b| {
        b.iter(|| black_box(analytical.levels(&year)))
    });

    let histories: Vec<Vec<DoseRecord>> = (1..=32).map(weekly_history).collect();
    c.bench_function("ode batch of 32 histories", |b| {
        b.iter(|| black_box(ode.levels_batch(&histories)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
