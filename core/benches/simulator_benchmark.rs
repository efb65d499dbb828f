use criterion::{criterion_group, criterion_main, Criterion};
use threadgrep_core::{compile, search, Flags, MatchRecord};

const TEST_PATTERNS: &[&str] = &[
    "fn",
    "a*b",
    "cat|dog",
    "c!ot",
    "(foo|bar)*baz",
    ".*error.*",
];

const TEST_LINE: &str =
    "the quick brown fox jumps over the lazy dog while a cat sat and watched an error fly by";

fn compile_patterns() -> Vec<(&'static str, threadgrep_core::Nfa)> {
    TEST_PATTERNS
        .iter()
        .map(|&p| (p, compile(p.as_bytes(), false).unwrap()))
        .collect()
}

fn compiling_benchmark(c: &mut Criterion) {
    c.bench_function("compiling", |b| {
        b.iter(|| {
            for pattern in TEST_PATTERNS {
                compile(pattern.as_bytes(), false).unwrap();
            }
        })
    });
}

fn searching_benchmark(c: &mut Criterion) {
    let nfas = compile_patterns();
    c.bench_function("searching", |b| {
        b.iter(|| {
            let mut matches = MatchRecord::new();
            for (_, nfa) in &nfas {
                matches.clear();
                search(TEST_LINE.as_bytes(), nfa, Flags::default(), &mut matches);
            }
        })
    });
}

criterion_group!(benches, compiling_benchmark, searching_benchmark);
criterion_main!(benches);
