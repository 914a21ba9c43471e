use gsmp::context::SamplingContextBuilder;
use gsmp::distribution::Exponential;
use gsmp::keyed::Keep;
use gsmp::prefix_sum::BinaryTreePrefixSum;
use gsmp::rng::SmallRngHandle;
use gsmp::samplers::{CombinedNextReaction, DirectCall, FirstToFire, GsmpSampler};

criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        enabling_a_thousand_clocks_first_to_fire,
        draining_a_thousand_clocks_first_to_fire,
        enabling_a_thousand_clocks_direct,
        draining_a_thousand_clocks_direct,
        running_a_combined_next_reaction_trajectory,
        context_enable_fire_roundtrip,
}

const N: u64 = 1_000;

fn enabling_a_thousand_clocks_first_to_fire(c: &mut criterion::Criterion) {
    c.bench_function("enable 1000 exponential clocks (first-to-fire)", |b| {
        b.iter(|| {
            let mut sampler = FirstToFire::new();
            let mut rng = SmallRngHandle::seeded(0);
            for k in 0..N {
                sampler
                    .enable(k, Box::new(Exponential::new(1.0 + k as f64 % 7.0)), 0.0, 0.0, &mut rng)
                    .unwrap();
            }
            sampler
        })
    });
}

fn draining_a_thousand_clocks_first_to_fire(c: &mut criterion::Criterion) {
    c.bench_function("drain 1000 clocks by repeated next/fire (first-to-fire)", |b| {
        b.iter_batched(
            || {
                let mut sampler = FirstToFire::new();
                let mut rng = SmallRngHandle::seeded(1);
                for k in 0..N {
                    sampler
                        .enable(k, Box::new(Exponential::new(1.0 + k as f64 % 7.0)), 0.0, 0.0, &mut rng)
                        .unwrap();
                }
                (sampler, rng)
            },
            |(mut sampler, mut rng)| {
                while let Some((tau, key)) = sampler.next(0.0, &mut rng) {
                    sampler.fire(&key, tau).unwrap();
                }
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

fn enabling_a_thousand_clocks_direct(c: &mut criterion::Criterion) {
    c.bench_function("enable 1000 exponential clocks (direct method)", |b| {
        b.iter(|| {
            let mut sampler: DirectCall<u64, BinaryTreePrefixSum, Keep<u64>> = DirectCall::new();
            let mut rng = SmallRngHandle::seeded(0);
            for k in 0..N {
                sampler
                    .enable(k, Box::new(Exponential::new(1.0 + k as f64 % 7.0)), 0.0, 0.0, &mut rng)
                    .unwrap();
            }
            sampler
        })
    });
}

fn draining_a_thousand_clocks_direct(c: &mut criterion::Criterion) {
    c.bench_function("drain 1000 clocks by repeated next/fire (direct method)", |b| {
        b.iter_batched(
            || {
                let mut sampler: DirectCall<u64, BinaryTreePrefixSum, Keep<u64>> = DirectCall::new();
                let mut rng = SmallRngHandle::seeded(2);
                for k in 0..N {
                    sampler
                        .enable(k, Box::new(Exponential::new(1.0 + k as f64 % 7.0)), 0.0, 0.0, &mut rng)
                        .unwrap();
                }
                (sampler, rng)
            },
            |(mut sampler, mut rng)| {
                while let Some((tau, key)) = sampler.next(0.0, &mut rng) {
                    sampler.fire(&key, tau).unwrap();
                }
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

fn running_a_combined_next_reaction_trajectory(c: &mut criterion::Criterion) {
    c.bench_function("run 200 clocks through combined next-reaction to exhaustion", |b| {
        b.iter_batched(
            || {
                let mut sampler = CombinedNextReaction::new();
                let mut rng = SmallRngHandle::seeded(3);
                for k in 0..200u64 {
                    sampler
                        .enable(k, Box::new(Exponential::new(1.0 + k as f64 % 5.0)), 0.0, 0.0, &mut rng)
                        .unwrap();
                }
                (sampler, rng)
            },
            |(mut sampler, mut rng)| {
                while let Some((tau, key)) = sampler.next(0.0, &mut rng) {
                    sampler.fire(&key, tau).unwrap();
                }
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

fn context_enable_fire_roundtrip(c: &mut criterion::Criterion) {
    c.bench_function("SamplingContext: enable/next/fire 500 clocks", |b| {
        b.iter(|| {
            let mut ctx = SamplingContextBuilder::new(FirstToFire::new(), SmallRngHandle::seeded(4)).build();
            for k in 0..500u64 {
                ctx.enable(k, Box::new(Exponential::new(1.0 + k as f64 % 5.0)), 0.0, 0.0)
                    .unwrap();
            }
            while let Some((tau, key)) = ctx.next() {
                ctx.fire(&key, tau).unwrap();
            }
        })
    });
}
