//! tongyeok-pipeline 성능 벤치마크
//!
//! 실행: cargo bench -p tongyeok-pipeline
//!
//! 벤치마크 대상:
//! - 편집 거리 (levenshtein) — 스택 행 / 풀 행 경로
//! - 번역 캐시 샘플 해시 (sample_hash)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tongyeok_pipeline::distance::levenshtein;
use tongyeok_pipeline::TranslationCache;

/// 결정적 의사 난수 텍스트 생성
fn make_text(len: usize, seed: u8) -> String {
    let alphabet = ['가', '나', '다', '라', '마', '바', '사', '아', 'a', 'b', 'x', '1'];
    (0..len)
        .map(|i| alphabet[((i as u8).wrapping_mul(31).wrapping_add(seed)) as usize % alphabet.len()])
        .collect()
}

/// 편집 거리 벤치마크 — 짧은(스택) / 긴(풀) 경로
fn bench_levenshtein(c: &mut Criterion) {
    let mut group = c.benchmark_group("levenshtein");

    for len in [16usize, 64, 256, 1024] {
        group.throughput(Throughput::Elements(len as u64));

        let a = make_text(len, 1);
        let b = make_text(len, 7);

        group.bench_with_input(BenchmarkId::new("different", len), &len, |bencher, _| {
            bencher.iter(|| levenshtein(black_box(&a), black_box(&b)))
        });

        group.bench_with_input(BenchmarkId::new("one_edit", len), &len, |bencher, _| {
            let mut edited = a.clone();
            edited.push('끝');
            bencher.iter(|| levenshtein(black_box(&a), black_box(&edited)))
        });
    }

    group.finish();
}

/// 샘플 해시 벤치마크 — 버퍼 크기와 무관하게 평탄한 비용 확인
fn bench_sample_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_hash");

    for size in [64 * 1024usize, 1024 * 1024, 8 * 1024 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        let data = vec![0xA5u8; size];

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bencher, _| {
            bencher.iter(|| TranslationCache::sample_hash(black_box(&data)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_levenshtein, bench_sample_hash);
criterion_main!(benches);
