//! 캡처 요청/결과 모델.
//!
//! 캡처 대상 식별자, 호출별 옵션, 전략 시도 이력을 포함한 결과를 정의.
//! `CaptureOptions`는 호출자가 호출마다 생성하며 오케스트레이터는 읽기만 한다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::config::CaptureConfig;

/// 캡처 전략 분류
///
/// 옵션의 활성화 플래그와 카탈로그의 우선순위 정렬이 이 분류 단위로 동작한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    /// 가속기 직접 캡처 (모니터 전체 프레임)
    Accelerated,
    /// 창 표면 캡처
    WindowSurface,
    /// 컴포지터 미러 캡처
    Compositor,
    /// 레거시 블릿 캡처 (최후 폴백)
    LegacyBlit,
}

impl StrategyKind {
    /// 로깅용 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Accelerated => "accelerated",
            StrategyKind::WindowSurface => "window-surface",
            StrategyKind::Compositor => "compositor",
            StrategyKind::LegacyBlit => "legacy-blit",
        }
    }
}

/// 캡처 대상 식별자 — OS 핸들 값 + 세대 카운터
///
/// OS가 핸들 값을 재사용해도 세대가 다르면 다른 대상으로 취급된다.
/// 번역 캐시의 키로 사용.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId {
    /// OS 창/모니터 핸들 값
    pub handle: u64,
    /// 핸들 재사용 구분용 세대
    pub generation: u32,
}

impl TargetId {
    /// 새 대상 식별자 생성 (세대 0)
    pub fn new(handle: u64) -> Self {
        Self {
            handle,
            generation: 0,
        }
    }
}

/// 직사각형 영역
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// 캡처 대상 — 식별자 + 표시용 메타데이터
#[derive(Debug, Clone)]
pub struct CaptureTarget {
    /// 대상 식별자
    pub id: TargetId,
    /// 창 제목 또는 모니터 이름
    pub title: String,
    /// 번역 제외 영역 여부 (게이트 규칙에서 사용)
    pub exclusion_zone: bool,
}

/// 호출별 캡처 옵션 — 오케스트레이터는 절대 수정하지 않는다
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// 가속기 직접 캡처 허용
    pub allow_accelerated: bool,
    /// 창 표면 캡처 허용
    pub allow_window_surface: bool,
    /// 컴포지터 미러 캡처 허용
    pub allow_compositor: bool,
    /// 레거시 블릿 캡처 허용
    pub allow_legacy_blit: bool,
    /// 관심 영역 스케일 (1.0 = 원본 크기)
    pub roi_scale: f32,
    /// 최대 전략 시도 횟수
    pub max_attempts: usize,
    /// 드라이버 리셋 후 복구 대기 시간
    pub recovery_wait: Duration,
}

impl CaptureOptions {
    /// 해당 분류의 전략이 이 옵션에서 허용되는지 여부
    pub fn allows(&self, kind: StrategyKind) -> bool {
        match kind {
            StrategyKind::Accelerated => self.allow_accelerated,
            StrategyKind::WindowSurface => self.allow_window_surface,
            StrategyKind::Compositor => self.allow_compositor,
            StrategyKind::LegacyBlit => self.allow_legacy_blit,
        }
    }
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self::from(&CaptureConfig::default())
    }
}

impl From<&CaptureConfig> for CaptureOptions {
    fn from(config: &CaptureConfig) -> Self {
        Self {
            allow_accelerated: config.allow_accelerated,
            allow_window_surface: config.allow_window_surface,
            allow_compositor: config.allow_compositor,
            allow_legacy_blit: config.allow_legacy_blit,
            roi_scale: config.roi_scale,
            max_attempts: config.max_attempts,
            recovery_wait: Duration::from_millis(config.recovery_wait_ms),
        }
    }
}

/// 캡처된 프레임 — RGBA8 원시 버퍼
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// 프레임 너비 (픽셀)
    pub width: u32,
    /// 프레임 높이 (픽셀)
    pub height: u32,
    /// RGBA8 원시 바이트 (width * height * 4)
    pub data: Vec<u8>,
    /// 캡처 시각
    pub captured_at: DateTime<Utc>,
}

/// 전략별 시도 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// 성공
    Succeeded,
    /// 드라이버 리셋으로 중단
    DriverReset,
    /// 리소스 부족으로 중단
    ResourceExhausted,
    /// 기타 실패
    Failed,
}

/// 전략 시도 기록
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 전략 이름
    pub strategy: String,
    /// 소요 시간 (밀리초)
    pub elapsed_ms: u64,
    /// 시도 결과
    pub outcome: AttemptOutcome,
}

/// 캡처 호출 메트릭 — 시도 이력
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureMetrics {
    /// 전략별 시도 기록 (시도 순서대로)
    pub attempts: Vec<AttemptRecord>,
}

/// 캡처 호출 결과
///
/// 전략 소진 시에도 예외 대신 실패 결과로 반환된다 — `attempted`는
/// 항상 실제 시도한 전략 이름을 시도 순서대로 담는다.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    /// 호출 식별자
    pub capture_id: Uuid,
    /// 성공 여부
    pub success: bool,
    /// 캡처된 프레임 (성공 시 1개 이상)
    pub frames: Vec<CapturedFrame>,
    /// 전략이 인라인 인식을 수행한 경우의 텍스트 영역
    pub text_regions: Vec<crate::models::text::TextRegion>,
    /// 실제 사용된 전략 이름
    pub strategy_used: Option<String>,
    /// 시도한 전략 이름 (우선순위 순)
    pub attempted: Vec<String>,
    /// 전체 소요 시간
    pub elapsed: Duration,
    /// 실패 시 에러 메시지
    pub error: Option<String>,
    /// 시도 메트릭
    pub metrics: Option<CaptureMetrics>,
}

impl CaptureResult {
    /// 성공 결과 생성
    pub fn succeeded(
        frames: Vec<CapturedFrame>,
        text_regions: Vec<crate::models::text::TextRegion>,
        strategy_used: String,
        attempted: Vec<String>,
        elapsed: Duration,
        metrics: CaptureMetrics,
    ) -> Self {
        Self {
            capture_id: Uuid::new_v4(),
            success: true,
            frames,
            text_regions,
            strategy_used: Some(strategy_used),
            attempted,
            elapsed,
            error: None,
            metrics: Some(metrics),
        }
    }

    /// 전략 소진 실패 결과 생성
    pub fn exhausted(attempted: Vec<String>, elapsed: Duration, metrics: CaptureMetrics) -> Self {
        let error = crate::error::CoreError::StrategyExhausted {
            attempted: attempted.len(),
        }
        .to_string();
        Self {
            capture_id: Uuid::new_v4(),
            success: false,
            frames: Vec::new(),
            text_regions: Vec::new(),
            strategy_used: None,
            attempted,
            elapsed,
            error: Some(error),
            metrics: Some(metrics),
        }
    }
}
