//! 캡처 전략 포트.
//!
//! OS 그래픽 API 캡처 구현을 추상화한다. 오케스트레이터는 전략을
//! 블랙박스로 취급하고 카탈로그가 정한 순서대로 시도한다.
//!
//! 구현: `tongyeok-capture::strategies` (xcap), 테스트 mock.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::capture::{CaptureOptions, CaptureTarget, CapturedFrame, StrategyKind};
use crate::models::text::TextRegion;

/// 전략 자체 측정 메트릭
#[derive(Debug, Clone, Default)]
pub struct StrategyMetrics {
    /// 캡처된 프레임 바이트 합계
    pub frame_bytes: u64,
    /// 백엔드 호출 소요 시간 (밀리초)
    pub backend_ms: u64,
}

/// 전략 실행 성공 출력
#[derive(Debug, Clone, Default)]
pub struct StrategyOutput {
    /// 캡처된 프레임 (1개 이상)
    pub frames: Vec<CapturedFrame>,
    /// 전략이 인라인 인식을 수행한 경우의 텍스트 영역
    pub text_regions: Vec<TextRegion>,
    /// 전략 자체 측정 메트릭
    pub metrics: Option<StrategyMetrics>,
}

/// 캡처 전략 — OS 레벨 픽셀 캡처 구현 하나
///
/// 에러 분류 계약: 드라이버 리셋은 `CoreError::DriverReset`,
/// 일시적 리소스 제약은 `CoreError::ResourceExhausted`로 반환해야
/// 오케스트레이터의 복구 경로가 동작한다. 그 외는 `CoreError::Capture`.
#[async_trait]
pub trait CaptureStrategy: Send + Sync {
    /// 전략 이름 (시도 이력/로깅에 사용)
    fn name(&self) -> &'static str;

    /// 전략 분류 — 옵션 플래그와 카탈로그 정렬 단위
    fn kind(&self) -> StrategyKind;

    /// 캡처 실행
    async fn execute(
        &self,
        target: &CaptureTarget,
        options: &CaptureOptions,
    ) -> Result<StrategyOutput, CoreError>;
}
