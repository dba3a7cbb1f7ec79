//! 번역 결과 캐시.
//!
//! 대상 식별자당 엔트리 하나 — "이 대상이 직전 번역 이후 바뀌었나"에
//! 답하는 캐시다. 콘텐츠 중복 제거가 아니므로 덮어쓰기만 하고 TTL이
//! 짧다 (기본 수 초).
//!
//! 히트 조건: 식별자 일치 + 샘플 해시 일치 + TTL 이내.
//! 샘플 해시는 버퍼의 머리/중간/꼬리 창만 해싱해 큰 프레임에서도 비용이
//! 일정하다 — 샘플 창 밖에만 국한된 변경은 놓칠 수 있는 트레이드오프.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::debug;

use tongyeok_core::config::TranslationCacheConfig;
use tongyeok_core::models::capture::TargetId;
use tongyeok_core::models::text::TranslationResult;

/// 샘플 창 크기 (바이트)
const SAMPLE_WINDOW: usize = 4 * 1024;

struct Entry {
    sample_hash: u64,
    result: TranslationResult,
    cached_at: Instant,
}

/// 대상 식별자 기반 번역 캐시
pub struct TranslationCache {
    entries: RwLock<HashMap<TargetId, Entry>>,
    ttl: Duration,
}

impl TranslationCache {
    /// 새 캐시 생성
    pub fn new(config: TranslationCacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: config.ttl(),
        }
    }

    /// 원시 버퍼의 위치 샘플 해시
    ///
    /// 머리/중간/꼬리 고정 창만 해싱한다. 작은 버퍼는 전체를 해싱.
    pub fn sample_hash(data: &[u8]) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update((data.len() as u64).to_le_bytes());

        if data.len() <= SAMPLE_WINDOW * 3 {
            hasher.update(data);
        } else {
            let mid_start = data.len() / 2 - SAMPLE_WINDOW / 2;
            hasher.update(&data[..SAMPLE_WINDOW]);
            hasher.update(&data[mid_start..mid_start + SAMPLE_WINDOW]);
            hasher.update(&data[data.len() - SAMPLE_WINDOW..]);
        }

        let digest = hasher.finalize();
        u64::from_le_bytes(digest[..8].try_into().expect("SHA-256 출력은 8바이트 이상"))
    }

    /// 캐시 조회 — 식별자 + 샘플 해시 + TTL 모두 일치해야 히트
    pub fn try_get(&self, target: TargetId, sample_hash: u64) -> Option<TranslationResult> {
        let entries = self.entries.read();
        let entry = entries.get(&target)?;
        if entry.sample_hash != sample_hash {
            return None;
        }
        if entry.cached_at.elapsed() > self.ttl {
            return None;
        }
        debug!(handle = target.handle, "번역 캐시 히트");
        Some(entry.result.clone())
    }

    /// 캐시 저장 — 대상당 엔트리 하나, 무조건 덮어쓰기
    pub fn put(&self, target: TargetId, sample_hash: u64, result: TranslationResult) {
        self.entries.write().insert(
            target,
            Entry {
                sample_hash,
                result,
                cached_at: Instant::now(),
            },
        );
    }

    /// 대상 제거 — 대상(창) 종료 시 명시적 무효화 훅
    pub fn invalidate(&self, target: TargetId) {
        self.entries.write().remove(&target);
    }

    /// 현재 엔트리 수
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// 캐시가 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// 전체 비우기
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
