//! 하드웨어 환경 감지 포트.
//!
//! 구현: `tongyeok-capture::probe::SysinfoProbe` (sysinfo 기반).
//! 캐싱/무효화는 포트가 아니라 캐시 래퍼(`CachedProbe`)의 책임이다.

use crate::error::CoreError;
use crate::models::hardware::HardwareEnvironmentInfo;

/// 하드웨어 환경 감지기
pub trait HardwareProbe: Send + Sync {
    /// 현재 하드웨어 환경 감지 — 호출마다 실제 감지를 수행한다
    fn detect(&self) -> Result<HardwareEnvironmentInfo, CoreError>;
}
