//! 하드웨어 환경 감지 + 프로세스 단위 캐시.
//!
//! 감지는 비용이 있으므로 프로세스당 1회 수행하고 캐시한다.
//! 드라이버 리셋 복구 시 오케스트레이터가 `invalidate()`를 호출해
//! 다음 호출에서 재감지되도록 한다.

use chrono::Utc;
use parking_lot::Mutex;
use sysinfo::System;
use tracing::{debug, info};

use tongyeok_core::error::CoreError;
use tongyeok_core::models::hardware::{AcceleratorTier, HardwareEnvironmentInfo};
use tongyeok_core::ports::hardware_probe::HardwareProbe;

/// sysinfo 기반 하드웨어 감지기 — `HardwareProbe` 포트 구현
///
/// 가속기 등급은 메모리/코어 휴리스틱으로 보수적으로 추정한다.
/// 정밀 판별이 필요한 환경은 포트를 직접 구현해 교체한다.
pub struct SysinfoProbe;

impl SysinfoProbe {
    /// 새 감지기 생성
    pub fn new() -> Self {
        Self
    }

    /// 메모리/코어 기반 가속기 등급 추정
    fn estimate_tier(total_memory_mb: u64, logical_cores: usize) -> AcceleratorTier {
        if total_memory_mb >= 16_384 && logical_cores >= 8 {
            AcceleratorTier::Dedicated
        } else if total_memory_mb >= 4_096 {
            AcceleratorTier::Integrated
        } else {
            AcceleratorTier::Software
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareProbe for SysinfoProbe {
    fn detect(&self) -> Result<HardwareEnvironmentInfo, CoreError> {
        let mut sys = System::new_all();
        sys.refresh_memory();

        let total_memory_mb = sys.total_memory() / (1024 * 1024);
        let logical_cores = sys.cpus().len();
        let tier = Self::estimate_tier(total_memory_mb, logical_cores);

        debug!(
            ?tier,
            total_memory_mb, logical_cores, "하드웨어 환경 감지 완료"
        );

        Ok(HardwareEnvironmentInfo {
            tier,
            total_memory_mb,
            logical_cores,
            detected_at: Utc::now(),
        })
    }
}

/// 감지 결과 캐시 래퍼
///
/// 프로세스당 싱글턴으로 사용. 잠금은 조회/저장 순간에만 잡고
/// 감지 자체는 잠금 밖에서 수행한다.
pub struct CachedProbe {
    inner: Box<dyn HardwareProbe>,
    cached: Mutex<Option<HardwareEnvironmentInfo>>,
}

impl CachedProbe {
    /// 새 캐시 래퍼 생성
    pub fn new(inner: Box<dyn HardwareProbe>) -> Self {
        Self {
            inner,
            cached: Mutex::new(None),
        }
    }

    /// 캐시된 환경 정보 반환 — 없으면 감지 후 캐시
    pub fn environment(&self) -> Result<HardwareEnvironmentInfo, CoreError> {
        if let Some(info) = self.cached.lock().clone() {
            return Ok(info);
        }

        let info = self.inner.detect()?;
        info!(tier = ?info.tier, "하드웨어 환경 캐시 갱신");
        *self.cached.lock() = Some(info.clone());
        Ok(info)
    }

    /// 캐시 무효화 — 다음 `environment()` 호출에서 재감지
    pub fn invalidate(&self) {
        debug!("하드웨어 환경 캐시 무효화");
        *self.cached.lock() = None;
    }

    /// 현재 캐시 보유 여부
    pub fn is_cached(&self) -> bool {
        self.cached.lock().is_some()
    }
}
