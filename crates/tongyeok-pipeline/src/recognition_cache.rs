//! 인식 결과 캐시.
//!
//! 원시 이미지 바이트의 콘텐츠 해시를 키로 하는 캐시. 동일 스크린샷의
//! 인식을 광역으로 중복 제거하므로 TTL이 길다 (기본 1시간).
//!
//! 만료 제거는 주기 스윕이, 용량 초과는 비동기 제거 패스가 담당한다.
//! 제거 패스는 스냅샷을 정렬하는 근사 LRU — 잠금을 정렬 작업 동안
//! 잡지 않는다. 캐시는 순수 최적화다: 미스는 항상 재계산과 동치.

use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use tongyeok_core::config::RecognitionCacheConfig;
use tongyeok_core::models::text::RecognitionResult;

/// 용량 초과 시 줄이는 목표 비율 (용량의 75%)
const EVICT_WATERMARK_NUM: usize = 3;
const EVICT_WATERMARK_DEN: usize = 4;

struct Entry {
    result: RecognitionResult,
    cached_at: Instant,
    last_access: Instant,
    access_count: u64,
}

/// 콘텐츠 주소 인식 캐시
pub struct RecognitionCache {
    entries: RwLock<HashMap<String, Entry>>,
    config: RecognitionCacheConfig,
    /// 제거 패스 중복 실행 방지
    evicting: AtomicBool,
}

impl RecognitionCache {
    /// 새 캐시 생성
    pub fn new(config: RecognitionCacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
            evicting: AtomicBool::new(false),
        }
    }

    /// 원시 이미지 바이트의 콘텐츠 해시 (SHA-256 hex)
    pub fn content_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    /// 캐시 조회 — 만료된 엔트리는 미스 (제거는 다음 스윕이 담당)
    pub fn get(&self, hash: &str) -> Option<RecognitionResult> {
        let mut entries = self.entries.write();
        let entry = entries.get_mut(hash)?;
        if entry.cached_at.elapsed() > self.config.ttl() {
            return None;
        }
        entry.last_access = Instant::now();
        entry.access_count += 1;
        Some(entry.result.clone())
    }

    /// 캐시 저장 (upsert) — 기존 엔트리는 값 교체 + 접근 통계 갱신
    ///
    /// 용량 초과 시 비동기 제거 패스를 기동한다.
    pub fn put(self: &Arc<Self>, hash: &str, result: RecognitionResult) {
        let over_capacity = {
            let mut entries = self.entries.write();
            let now = Instant::now();
            match entries.entry(hash.to_string()) {
                MapEntry::Occupied(mut occupied) => {
                    let entry = occupied.get_mut();
                    entry.result = result;
                    entry.cached_at = now;
                    entry.last_access = now;
                    entry.access_count += 1;
                }
                MapEntry::Vacant(vacant) => {
                    vacant.insert(Entry {
                        result,
                        cached_at: now,
                        last_access: now,
                        access_count: 0,
                    });
                }
            }
            entries.len() > self.config.capacity
        };

        if over_capacity && !self.evicting.swap(true, Ordering::SeqCst) {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let cache = Arc::clone(self);
                    handle.spawn(async move {
                        let removed = cache.evict_to_watermark();
                        cache.evicting.store(false, Ordering::SeqCst);
                        debug!(removed, "용량 제거 패스 완료");
                    });
                }
                Err(_) => {
                    // 런타임 밖 호출 (테스트 등) — 동기 제거
                    let removed = self.evict_to_watermark();
                    self.evicting.store(false, Ordering::SeqCst);
                    debug!(removed, "용량 제거 패스 완료 (동기)");
                }
            }
        }
    }

    /// 특정 해시의 접근 횟수 (진단/테스트용)
    pub fn access_count(&self, hash: &str) -> Option<u64> {
        self.entries.read().get(hash).map(|e| e.access_count)
    }

    /// 만료 엔트리 제거 — 제거된 수 반환
    ///
    /// 키 스냅샷을 먼저 뜨고, 쓰기 잠금 안에서 만료를 재확인한다.
    pub fn sweep_expired(&self) -> usize {
        let ttl = self.config.ttl();
        let expired: Vec<String> = {
            let entries = self.entries.read();
            entries
                .iter()
                .filter(|(_, e)| e.cached_at.elapsed() > ttl)
                .map(|(k, _)| k.clone())
                .collect()
        };
        if expired.is_empty() {
            return 0;
        }

        let mut entries = self.entries.write();
        let mut removed = 0;
        for key in expired {
            if entries
                .get(&key)
                .map(|e| e.cached_at.elapsed() > ttl)
                .unwrap_or(false)
            {
                entries.remove(&key);
                removed += 1;
            }
        }
        debug!(removed, "만료 스윕 완료");
        removed
    }

    /// 용량 워터마크(75%)까지 최근성 낮은 순으로 제거
    ///
    /// (키, 마지막 접근) 스냅샷을 정렬한다 — O(n log n) 작업을 잠금 밖에서
    /// 수행하는 근사 LRU.
    pub fn evict_to_watermark(&self) -> usize {
        let target = self.config.capacity * EVICT_WATERMARK_NUM / EVICT_WATERMARK_DEN;

        let mut snapshot: Vec<(String, Instant)> = {
            let entries = self.entries.read();
            if entries.len() <= self.config.capacity {
                return 0;
            }
            entries
                .iter()
                .map(|(k, e)| (k.clone(), e.last_access))
                .collect()
        };

        snapshot.sort_by_key(|(_, last_access)| *last_access);
        let to_remove = snapshot.len().saturating_sub(target);

        let mut entries = self.entries.write();
        let mut removed = 0;
        for (key, _) in snapshot.into_iter().take(to_remove) {
            if entries.remove(&key).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// 주기 스윕 태스크 기동
    ///
    /// 캐시가 drop되면 태스크는 다음 틱에서 종료된다.
    pub fn start_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        let interval = self.config.sweep_interval();
        info!(interval_secs = interval.as_secs(), "캐시 스윕 태스크 시작");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // 첫 틱은 즉시 발화하므로 소모
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = weak.upgrade() else { break };
                cache.sweep_expired();
                if cache.len() > cache.config.capacity {
                    cache.evict_to_watermark();
                }
            }
        })
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

#[cfg(test)]
mod tests {
    use super::*;
    use tongyeok_core::models::text::TextRegion;

    fn result(text: &str) -> RecognitionResult {
        RecognitionResult::from_regions(vec![TextRegion {
            text: text.to_string(),
            x: 0,
            y: 0,
            width: 40,
            height: 20,
            confidence: 0.9,
        }])
    }

    fn cache(capacity: usize, ttl_secs: u64) -> Arc<RecognitionCache> {
        Arc::new(RecognitionCache::new(RecognitionCacheConfig {
            capacity,
            ttl_secs,
            sweep_interval_secs: 300,
        }))
    }

    #[test]
    fn content_hash_is_deterministic_and_distinct() {
        let a = RecognitionCache::content_hash(b"frame-a");
        let b = RecognitionCache::content_hash(b"frame-a");
        let c = RecognitionCache::content_hash(b"frame-b");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn put_then_get_returns_data_and_bumps_access() {
        let cache = cache(16, 3_600);
        let hash = RecognitionCache::content_hash(b"frame");

        cache.put(&hash, result("저장"));
        assert_eq!(cache.access_count(&hash), Some(0));

        let hit = cache.get(&hash).unwrap();
        assert_eq!(hit.text, "저장");
        assert_eq!(cache.access_count(&hash), Some(1));

        cache.get(&hash);
        assert_eq!(cache.access_count(&hash), Some(2));
    }

    #[test]
    fn missing_key_is_miss() {
        let cache = cache(16, 3_600);
        assert!(cache.get("없는 키").is_none());
    }

    #[test]
    fn put_is_upsert() {
        let cache = cache(16, 3_600);
        let hash = RecognitionCache::content_hash(b"frame");

        cache.put(&hash, result("처음"));
        cache.put(&hash, result("갱신"));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&hash).unwrap().text, "갱신");
    }

    #[test]
    fn expired_entry_is_miss_and_swept() {
        let cache = cache(16, 0); // TTL 0초 → 즉시 만료
        let hash = RecognitionCache::content_hash(b"frame");
        cache.put(&hash, result("만료될 값"));

        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(cache.get(&hash).is_none());
        // 만료 미스는 엔트리를 남기고, 스윕이 제거
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.sweep_expired(), 1);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn sweep_keeps_fresh_entries() {
        let cache = cache(16, 3_600);
        cache.put("h1", result("신선"));
        assert_eq!(cache.sweep_expired(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn over_capacity_evicts_to_watermark_by_recency() {
        let cache = cache(8, 3_600);

        for i in 0..8 {
            cache.put(&format!("h{i}"), result(&format!("값 {i}")));
            // last_access 순서가 구분되도록 약간 간격
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        // 최근 엔트리 일부를 조회해 최근성 부여
        cache.get("h6");
        cache.get("h7");

        // 9번째 삽입 → 용량 초과 → 동기 제거 (런타임 밖)
        cache.put("h8", result("값 8"));

        // 워터마크 = 8 * 3/4 = 6
        assert_eq!(cache.len(), 6);
        // 최근 접근 엔트리는 생존
        assert!(cache.get("h6").is_some());
        assert!(cache.get("h7").is_some());
        assert!(cache.get("h8").is_some());
        // 가장 오래된 엔트리는 제거
        assert!(cache.get("h0").is_none());
    }

    #[test]
    fn clear_empties_cache() {
        let cache = cache(16, 3_600);
        cache.put("h1", result("값"));
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn sweeper_task_removes_expired_entries() {
        let cache = Arc::new(RecognitionCache::new(RecognitionCacheConfig {
            capacity: 16,
            ttl_secs: 0,
            sweep_interval_secs: 1,
        }));
        cache.put("h1", result("만료 예정"));
        assert_eq!(cache.len(), 1);

        let handle = cache.start_sweeper();
        tokio::time::sleep(std::time::Duration::from_millis(1_200)).await;
        assert_eq!(cache.len(), 0);
        handle.abort();
    }
}
