// Markov training throughput: sequential vs parallel over a synthetic
// corpus, plus verse pool extraction on the same chapters.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use gutenku_engine::trainer::{ParallelTrainer, train_sequential};
use gutenku_engine::{Chapter, VersePools};

const SENTENCES: &[&str] = &[
    "An old silent pond lay under the trees.",
    "A frog jumps into the pond, and the water stirs.",
    "The wind in the pines sang all through the night.",
    "Cold rain on the hill washed the path away.",
    "The moon shines over the hill and the sleeping town.",
    "She walked along the river, thinking of the sea.",
];

fn corpus(chapters: usize, sentences_per_chapter: usize) -> Vec<Chapter> {
    (0..chapters)
        .map(|c| {
            let text: Vec<&str> = (0..sentences_per_chapter)
                .map(|s| SENTENCES[(c + s) % SENTENCES.len()])
                .collect();
            Chapter::titled(format!("Chapter {}", c + 1), text.join(" "))
        })
        .collect()
}

fn bench_training(c: &mut Criterion) {
    let chapters = corpus(32, 200);
    let mut group = c.benchmark_group("markov_training");
    group.sample_size(20);

    group.bench_function("sequential", |b| {
        b.iter(|| black_box(train_sequential(&chapters, 10, |_, _| {})));
    });
    for workers in [1, 2, 4, 8] {
        let trainer = ParallelTrainer::new(workers);
        group.bench_with_input(BenchmarkId::new("parallel", workers), &workers, |b, _| {
            b.iter(|| black_box(trainer.train(&chapters, |_, _| {}).unwrap()));
        });
    }
    group.finish();
}

fn bench_pools(c: &mut Criterion) {
    let chapters = corpus(32, 200);
    c.bench_function("verse_pools_from_chapters", |b| {
        b.iter(|| black_box(VersePools::from_chapters(&chapters)));
    });
}

criterion_group!(benches, bench_training, bench_pools);
criterion_main!(benches);
