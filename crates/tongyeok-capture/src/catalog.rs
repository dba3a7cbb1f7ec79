//! 전략 카탈로그.
//!
//! 하드웨어 환경에 따라 캡처 전략 우선순위를 결정한다.
//! 정렬은 결정적 — 동일 환경이면 항상 동일 순서를 반환한다.

use tongyeok_core::models::capture::StrategyKind;
use tongyeok_core::models::hardware::{AcceleratorTier, HardwareEnvironmentInfo};

/// 전략 우선순위 카탈로그
#[derive(Debug, Default)]
pub struct StrategyCatalog;

impl StrategyCatalog {
    /// 새 카탈로그 생성
    pub fn new() -> Self {
        Self
    }

    /// 환경에 맞는 전략 순서 반환
    ///
    /// - 전용 가속기: 가속 직접 캡처 우선
    /// - 내장 가속기: 창 표면 캡처 우선 (전체 프레임 캡처가 상대적으로 비쌈)
    /// - 소프트웨어: 컴포지터 미러 우선, 가속 경로는 최후 순위
    pub fn ordering(&self, env: &HardwareEnvironmentInfo) -> Vec<StrategyKind> {
        match env.tier {
            AcceleratorTier::Dedicated => vec![
                StrategyKind::Accelerated,
                StrategyKind::WindowSurface,
                StrategyKind::Compositor,
                StrategyKind::LegacyBlit,
            ],
            AcceleratorTier::Integrated => vec![
                StrategyKind::WindowSurface,
                StrategyKind::Accelerated,
                StrategyKind::Compositor,
                StrategyKind::LegacyBlit,
            ],
            AcceleratorTier::Software => vec![
                StrategyKind::Compositor,
                StrategyKind::WindowSurface,
                StrategyKind::LegacyBlit,
                StrategyKind::Accelerated,
            ],
        }
    }
}
