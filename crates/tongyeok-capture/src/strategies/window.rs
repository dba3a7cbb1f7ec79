//! 창 표면 캡처 전략.
//!
//! xcap `Window` 기반 대상 창 캡처. 핸들 값 일치 우선, 제목 부분 일치 폴백.

use async_trait::async_trait;
use chrono::Utc;
use std::time::Instant;
use tracing::debug;
use xcap::Window;

use tongyeok_core::error::CoreError;
use tongyeok_core::models::capture::{
    CaptureOptions, CaptureTarget, CapturedFrame, StrategyKind,
};
use tongyeok_core::ports::capture_strategy::{CaptureStrategy, StrategyMetrics, StrategyOutput};

use super::classify_backend_error;

/// 창 표면 캡처 — `CaptureStrategy` 포트 구현
pub struct WindowCaptureStrategy;

impl WindowCaptureStrategy {
    /// 새 전략 인스턴스 생성
    pub fn new() -> Self {
        Self
    }

    /// 대상 창 찾기 — 핸들 값 일치 우선, 제목 부분 일치 폴백
    fn find_window(windows: Vec<Window>, target: &CaptureTarget) -> Option<Window> {
        let by_handle = windows
            .iter()
            .position(|w| w.id().map(|id| id as u64 == target.id.handle).unwrap_or(false));
        if let Some(idx) = by_handle {
            let mut windows = windows;
            return Some(windows.swap_remove(idx));
        }

        windows.into_iter().find(|w| {
            w.title()
                .map(|t| !target.title.is_empty() && t.contains(&target.title))
                .unwrap_or(false)
        })
    }
}

impl Default for WindowCaptureStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureStrategy for WindowCaptureStrategy {
    fn name(&self) -> &'static str {
        "window-surface"
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::WindowSurface
    }

    async fn execute(
        &self,
        target: &CaptureTarget,
        _options: &CaptureOptions,
    ) -> Result<StrategyOutput, CoreError> {
        let backend_started = Instant::now();

        let windows =
            Window::all().map_err(|e| classify_backend_error("창 목록 조회", &e.to_string()))?;

        let window = Self::find_window(windows, target).ok_or_else(|| {
            CoreError::Capture(format!(
                "대상 창을 찾을 수 없음: handle={:#x}",
                target.id.handle
            ))
        })?;

        let image = window
            .capture_image()
            .map_err(|e| classify_backend_error("창 캡처", &e.to_string()))?;

        let (width, height) = (image.width(), image.height());
        let data = image.into_raw();
        let frame_bytes = data.len() as u64;

        debug!(width, height, title = %target.title, "창 캡처 완료");

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
