//! 하드웨어 환경 스냅샷 모델.
//!
//! 프로세스당 1회 감지되어 캐시되고, 드라이버 리셋 복구 시 명시적으로
//! 무효화된다 (캐시 래퍼는 `tongyeok-capture::probe`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 그래픽 가속기 등급
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcceleratorTier {
    /// 외장(전용) 가속기
    Dedicated,
    /// 내장 가속기
    Integrated,
    /// 소프트웨어 렌더링 (가속기 미확인)
    Software,
}

/// 감지된 하드웨어 환경 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareEnvironmentInfo {
    /// 가속기 등급 — 캡처 전략 우선순위 결정에 사용
    pub tier: AcceleratorTier,
    /// 전체 메모리 (MB)
    pub total_memory_mb: u64,
    /// 논리 코어 수
    pub logical_cores: usize,
    /// 감지 시각
    pub detected_at: DateTime<Utc>,
}
