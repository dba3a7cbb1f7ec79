//! 모니터 직접 캡처 전략.
//!
//! xcap `Monitor` 기반 주 모니터 전체 프레임 캡처.

use async_trait::async_trait;
use chrono::Utc;
use std::time::Instant;
use tracing::debug;
use xcap::Monitor;

use tongyeok_core::error::CoreError;
use tongyeok_core::models::capture::{
    CaptureOptions, CaptureTarget, CapturedFrame, StrategyKind,
};
use tongyeok_core::ports::capture_strategy::{CaptureStrategy, StrategyMetrics, StrategyOutput};

use super::classify_backend_error;

/// 주 모니터 직접 캡처 — `CaptureStrategy` 포트 구현
pub struct MonitorCaptureStrategy;

impl MonitorCaptureStrategy {
    /// 새 전략 인스턴스 생성
    pub fn new() -> Self {
        Self
    }
}

impl Default for MonitorCaptureStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureStrategy for MonitorCaptureStrategy {
    fn name(&self) -> &'static str {
        "monitor-direct"
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Accelerated
    }

    async fn execute(
        &self,
        _target: &CaptureTarget,
        _options: &CaptureOptions,
    ) -> Result<StrategyOutput, CoreError> {
        let backend_started = Instant::now();

        let monitors = Monitor::all()
            .map_err(|e| classify_backend_error("모니터 목록 조회", &e.to_string()))?;

        let monitor = monitors
            .into_iter()
            .find(|m| m.is_primary().unwrap_or(false))
            .or_else(|| Monitor::all().ok()?.into_iter().next())
            .ok_or_else(|| CoreError::Capture("모니터를 찾을 수 없음".to_string()))?;

        let image = monitor
            .capture_image()
            .map_err(|e| classify_backend_error("모니터 캡처", &e.to_string()))?;

        let (width, height) = (image.width(), image.height());
        let data = image.into_raw();
        let frame_bytes = data.len() as u64;

        debug!(width, height, "모니터 캡처 완료");

        Ok(StrategyOutput {
            frames: vec![CapturedFrame {
                width,
                height,
                data,
                captured_at: Utc::now(),
            }],
            text_regions: Vec::new(),
            metrics: Some(StrategyMetrics {
                frame_bytes,
                backend_ms: backend_started.elapsed().as_millis() as u64,
            }),
        })
    }
}
