use criterion::{criterion_group, criterion_main, Criterion};
use iso_fit::study::{StudyConfig, ToyStudy};

fn bench_single_experiment(c: &mut Criterion) {
    let study = ToyStudy::new(StudyConfig { n_experiments: 1, ..Default::default() }).unwrap();
    c.bench_function("toy_experiment_four_fits", |b| {
        b.iter(|| study.run_one(42).unwrap())
    });
}

fn bench_small_study(c: &mut Criterion) {
    let study = ToyStudy::new(StudyConfig { n_experiments: 20, ..Default::default() }).unwrap();
    c.bench_function("toy_study_20_experiments", |b| b.iter(|| study.run().unwrap()));
}

criterion_group!(benches, bench_single_experiment, bench_small_study);
criterion_main!(benches);
