//! Benchmarks for pair and batch compatibility scoring.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use harmony_core::{PersonalityVector, Timestamp};
use harmony_scoring::{BatchScorer, CompatibilityScorer};

fn create_vector(id: usize) -> PersonalityVector {
    let seed = (id % 17) as f64 / 16.0;
    let mut vector = PersonalityVector::create_default(format!("p{id:04}"));
    vector
        .load_partial(&json!({
            "big_five": {
                "openness": seed, "conscientiousness": 1.0 - seed,
                "extraversion": 0.3 + seed * 0.4, "agreeableness": 0.6,
                "neuroticism": seed * 0.7
            },
            "attachment": { "secure": 1.0 - seed, "anxious": seed },
            "values": { "family": seed, "career": 0.5, "adventure": 1.0 - seed },
            "emotional_intelligence": { "empathy": 0.7, "self_awareness": seed }
        }))
        .expect("valid benchmark traits");
    vector
}

fn benchmark_pair(c: &mut Criterion) {
    let scorer = CompatibilityScorer::new();
    let a = create_vector(1);
    let b = create_vector(7);
    let ts = Timestamp::from_nanos(0);

    c.bench_function("score_pair", |bench| {
        bench.iter(|| scorer.score_at(black_box(&a), black_box(&b), ts))
    });
}

fn benchmark_batch(c: &mut Criterion) {
    let batch = BatchScorer::new();
    let user = create_vector(0);
    let candidates: Vec<PersonalityVector> = (1..=500).map(create_vector).collect();
    let ts = Timestamp::from_nanos(0);

    c.bench_function("score_against_500", |bench| {
        bench.iter(|| batch.score_against(black_box(&user), black_box(&candidates), ts))
    });
}

criterion_group!(benches, benchmark_pair, benchmark_batch);
criterion_main!(benches);
