use std::fs;
use std::hint::black_box;

use acceptability::{LmDataset, StreamConfig, TokenStream, Vocabulary};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode, Throughput};

const WORDS: [&str; 8] = ["the", "cat", "sat", "on", "a", "mat", "quietly", "today"];

fn build_corpus(lines: usize) -> String {
    let mut corpus = String::with_capacity(lines * 48);
    for line in 0..lines {
        let len = 3 + line % 12;
        let sentence: Vec<&str> = (0..len).map(|idx| WORDS[(line + idx) % WORDS.len()]).collect();
        corpus.push_str(&format!("src{}\t{}\t\t{}\n", line % 7, line % 2, sentence.join(" ")));
    }
    corpus
}

fn bench_stream(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("tempdir");
    let corpus_path = dir.path().join("corpus.tsv");
    let corpus = build_corpus(20_000);
    fs::write(&corpus_path, &corpus).expect("write corpus");
    let vocab = Vocabulary::from_tokens(WORDS).expect("vocabulary");
    let cfg = StreamConfig::builder()
        .seq_length(35)
        .build()
        .expect("configuration");

    let mut group = c.benchmark_group("token_stream");
    group.throughput(Throughput::Bytes(corpus.len() as u64));
    group.sampling_mode(SamplingMode::Flat);
    group.bench_function(BenchmarkId::from_parameter("lines_20k"), |b| {
        b.iter(|| {
            let stream = TokenStream::build(&corpus_path, &vocab, &cfg).expect("build");
            let _ = black_box(stream);
        });
    });
    group.finish();

    let stream = TokenStream::build(&corpus_path, &vocab, &cfg).expect("build");
    let dataset = LmDataset::new(stream, cfg.seq_length).expect("dataset");
    c.bench_function("windows_sum", |b| {
        b.iter(|| {
            let total: u64 = dataset
                .iter()
                .map(|(input, target)| u64::from(input[0]) + u64::from(target[0]))
                .sum();
            black_box(total)
        });
    });
}

criterion_group!(benches, bench_stream);
criterion_main!(benches);
