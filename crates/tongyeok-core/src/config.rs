//! 애플리케이션 설정 구조체.
//!
//! 캡처 전략, 회로 차단기, 변경 게이트, 결과 캐시, 외부 API 엔드포인트의
//! 런타임 설정을 정의한다. 파일/환경변수 로딩은 호스트 앱 담당 —
//! 여기서는 serde 구조체와 기본값만 제공한다.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 캡처 전략/폴백 설정
    #[serde(default)]
    pub capture: CaptureConfig,
    /// 인식 호출 회로 차단기 설정
    #[serde(default = "default_recognition_breaker")]
    pub recognition_breaker: BreakerConfig,
    /// 번역 호출 회로 차단기 설정
    #[serde(default = "default_translation_breaker")]
    pub translation_breaker: BreakerConfig,
    /// 변경 게이트 설정
    #[serde(default)]
    pub gate: GateConfig,
    /// 인식 결과 캐시 설정
    #[serde(default)]
    pub recognition_cache: RecognitionCacheConfig,
    /// 번역 결과 캐시 설정
    #[serde(default)]
    pub translation_cache: TranslationCacheConfig,
    /// 외부 인식 API 설정 (원격 인식 어댑터 사용 시)
    #[serde(default)]
    pub recognition_api: Option<ApiEndpointConfig>,
    /// 외부 번역 API 설정 (원격 번역 어댑터 사용 시)
    #[serde(default)]
    pub translation_api: Option<ApiEndpointConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            recognition_breaker: default_recognition_breaker(),
            translation_breaker: default_translation_breaker(),
            gate: GateConfig::default(),
            recognition_cache: RecognitionCacheConfig::default(),
            translation_cache: TranslationCacheConfig::default(),
            recognition_api: None,
            translation_api: None,
        }
    }
}

// ============================================================
// 캡처 설정
// ============================================================

/// 캡처 전략/폴백 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// 가속기 직접 캡처 허용
    #[serde(default = "default_true")]
    pub allow_accelerated: bool,
    /// 창 표면 캡처 허용
    #[serde(default = "default_true")]
    pub allow_window_surface: bool,
    /// 컴포지터 미러 캡처 허용
    #[serde(default = "default_true")]
    pub allow_compositor: bool,
    /// 레거시 블릿 캡처 허용
    #[serde(default = "default_true")]
    pub allow_legacy_blit: bool,
    /// 관심 영역 스케일 (1.0 = 원본)
    #[serde(default = "default_roi_scale")]
    pub roi_scale: f32,
    /// 호출당 최대 전략 시도 횟수
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// 드라이버 리셋 후 복구 대기 (밀리초)
    #[serde(default = "default_recovery_wait_ms")]
    pub recovery_wait_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            allow_accelerated: true,
            allow_window_surface: true,
            allow_compositor: true,
            allow_legacy_blit: true,
            roi_scale: default_roi_scale(),
            max_attempts: default_max_attempts(),
            recovery_wait_ms: default_recovery_wait_ms(),
        }
    }
}

// ============================================================
// 회로 차단기 설정
// ============================================================

/// 회로 차단기 설정
///
/// 인식/번역은 실패 특성과 비용이 달라 독립 인스턴스로 구성된다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// 연속 실패 임계값 — 도달 시 Open 전환
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Open 유지 시간 (초) — 경과 후 다음 호출이 HalfOpen 시험
    #[serde(default = "default_open_timeout_secs")]
    pub open_timeout_secs: u64,
    /// 래핑된 연산의 실행 타임아웃 (밀리초, 0 = 무제한)
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

impl BreakerConfig {
    /// Open 유지 시간을 Duration으로 반환
    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }

    /// 실행 타임아웃을 Duration으로 반환 (0이면 None)
    pub fn operation_timeout(&self) -> Option<Duration> {
        if self.operation_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.operation_timeout_ms))
        }
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            open_timeout_secs: default_open_timeout_secs(),
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

/// 인식 차단기 기본값 — 로컬/근거리 엔진 기준 짧은 타임아웃
fn default_recognition_breaker() -> BreakerConfig {
    BreakerConfig {
        failure_threshold: 3,
        open_timeout_secs: 15,
        operation_timeout_ms: 10_000,
    }
}

/// 번역 차단기 기본값 — 원격 API 기준 완화된 임계값
fn default_translation_breaker() -> BreakerConfig {
    BreakerConfig {
        failure_threshold: 5,
        open_timeout_secs: 30,
        operation_timeout_ms: 20_000,
    }
}

// ============================================================
// 변경 게이트 설정
// ============================================================

/// 변경 게이트 설정 — 번역 승인 규칙 및 적응 임계값
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// 게이트 활성화 여부 (false면 전부 허용)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 빈 텍스트 거부
    #[serde(default = "default_true")]
    pub skip_empty: bool,
    /// 최소 텍스트 길이 (문자 수)
    #[serde(default = "default_min_text_len")]
    pub min_text_len: usize,
    /// 영역의 첫 텍스트는 항상 허용
    #[serde(default = "default_true")]
    pub always_translate_first: bool,
    /// 직전 텍스트와 동일하면 거부
    #[serde(default = "default_true")]
    pub skip_identical: bool,
    /// 길이 변화 비율이 이 값 이상이면 편집 거리 없이 허용
    #[serde(default = "default_force_translate_ratio")]
    pub force_translate_ratio: f64,
    /// 짧은 텍스트 상한 (문자 수, 이하 = 짧은 버킷)
    #[serde(default = "default_short_text_max_len")]
    pub short_text_max_len: usize,
    /// 긴 텍스트 하한 (문자 수, 이상 = 긴 버킷)
    #[serde(default = "default_long_text_min_len")]
    pub long_text_min_len: usize,
    /// 짧은 버킷 기본 임계값 — 한 글자 깜빡임에 재번역하지 않도록 높게
    #[serde(default = "default_short_threshold")]
    pub short_threshold: f64,
    /// 중간 버킷 기본 임계값
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: f64,
    /// 긴 버킷 기본 임계값 — 긴 텍스트의 작은 편집도 대개 유의미
    #[serde(default = "default_long_threshold")]
    pub long_threshold: f64,
    /// 고신뢰 판정 기준 (이상이면 임계값 하향)
    #[serde(default = "default_high_confidence")]
    pub high_confidence: f64,
    /// 고신뢰 시 임계값 배율 (< 1.0)
    #[serde(default = "default_high_confidence_factor")]
    pub high_confidence_factor: f64,
    /// 저신뢰 판정 기준 (미만이면 임계값 상향)
    #[serde(default = "default_low_confidence")]
    pub low_confidence: f64,
    /// 저신뢰 시 임계값 배율 (> 1.0)
    #[serde(default = "default_low_confidence_factor")]
    pub low_confidence_factor: f64,
    /// 핫 영역 판정 기준 (변경 빈도 점수, 이상이면 핫)
    #[serde(default = "default_hot_region_score")]
    pub hot_region_score: f64,
    /// 핫 영역 임계값 배율 (< 1.0)
    #[serde(default = "default_hot_region_factor")]
    pub hot_region_factor: f64,
    /// 콜드 영역 판정 기준 (변경 빈도 점수, 이하면 콜드)
    #[serde(default = "default_cold_region_score")]
    pub cold_region_score: f64,
    /// 콜드 영역 임계값 배율 (> 1.0)
    #[serde(default = "default_cold_region_factor")]
    pub cold_region_factor: f64,
    /// 영역 히트 지수 이동 평균 감쇠 계수 (0 ~ 1)
    #[serde(default = "default_heat_decay")]
    pub heat_decay: f64,
    /// 거부 시 절감 비용 추정 단가 (문자당)
    #[serde(default = "default_cost_per_char")]
    pub cost_per_char: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            skip_empty: true,
            min_text_len: default_min_text_len(),
            always_translate_first: true,
            skip_identical: true,
            force_translate_ratio: default_force_translate_ratio(),
            short_text_max_len: default_short_text_max_len(),
            long_text_min_len: default_long_text_min_len(),
            short_threshold: default_short_threshold(),
            medium_threshold: default_medium_threshold(),
            long_threshold: default_long_threshold(),
            high_confidence: default_high_confidence(),
            high_confidence_factor: default_high_confidence_factor(),
            low_confidence: default_low_confidence(),
            low_confidence_factor: default_low_confidence_factor(),
            hot_region_score: default_hot_region_score(),
            hot_region_factor: default_hot_region_factor(),
            cold_region_score: default_cold_region_score(),
            cold_region_factor: default_cold_region_factor(),
            heat_decay: default_heat_decay(),
            cost_per_char: default_cost_per_char(),
        }
    }
}

// ============================================================
// 결과 캐시 설정
// ============================================================

/// 인식 결과 캐시 설정 — 동일 스크린샷 광역 중복 제거용, 긴 TTL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionCacheConfig {
    /// 소프트 용량 상한 (엔트리 수)
    #[serde(default = "default_recognition_capacity")]
    pub capacity: usize,
    /// 엔트리 만료 시간 (초)
    #[serde(default = "default_recognition_ttl_secs")]
    pub ttl_secs: u64,
    /// 만료 스윕 주기 (초)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl RecognitionCacheConfig {
    /// 엔트리 만료 시간을 Duration으로 반환
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// 스윕 주기를 Duration으로 반환
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for RecognitionCacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_recognition_capacity(),
            ttl_secs: default_recognition_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// 번역 결과 캐시 설정 — "이 대상이 직전 번역 이후 바뀌었나"용, 짧은 TTL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationCacheConfig {
    /// 엔트리 만료 시간 (초)
    #[serde(default = "default_translation_ttl_secs")]
    pub ttl_secs: u64,
}

impl TranslationCacheConfig {
    /// 엔트리 만료 시간을 Duration으로 반환
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for TranslationCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_translation_ttl_secs(),
        }
    }
}

// ============================================================
// 외부 API 엔드포인트 설정
// ============================================================

/// API 제공자 타입 — URL 문자열 매칭 대신 명시적 enum으로 구분
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiProviderType {
    /// Anthropic Vision 계열 — `x-api-key` 헤더 + content block 응답
    Anthropic,
    /// DeepL 계열 — `DeepL-Auth-Key` 헤더 + translations 배열 응답
    Deepl,
    /// 기타 제공자 — Bearer 토큰 인증, 범용 JSON 파싱
    #[default]
    Generic,
}

/// 외부 API 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEndpointConfig {
    /// API URL (예: "https://api.example.com/v1/recognize")
    pub endpoint: String,
    /// API 키
    #[serde(default)]
    pub api_key: String,
    /// 모델/엔진 이름
    pub model: Option<String>,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
    /// 제공자 타입 — 인증 헤더와 응답 파싱 방식 결정
    #[serde(default)]
    pub provider_type: ApiProviderType,
    /// 목표 언어 (번역 API용)
    #[serde(default = "default_target_lang")]
    pub target_lang: String,
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}

fn default_roi_scale() -> f32 {
    1.0
}
fn default_max_attempts() -> usize {
    4
}
fn default_recovery_wait_ms() -> u64 {
    4_000
}
fn default_failure_threshold() -> u32 {
    5
}
fn default_open_timeout_secs() -> u64 {
    30
}
fn default_operation_timeout_ms() -> u64 {
    15_000
}
fn default_min_text_len() -> usize {
    2
}
fn default_force_translate_ratio() -> f64 {
    0.5
}
fn default_short_text_max_len() -> usize {
    10
}
fn default_long_text_min_len() -> usize {
    50
}
fn default_short_threshold() -> f64 {
    0.4
}
fn default_medium_threshold() -> f64 {
    0.2
}
fn default_long_threshold() -> f64 {
    0.08
}
fn default_high_confidence() -> f64 {
    0.85
}
fn default_high_confidence_factor() -> f64 {
    0.8
}
fn default_low_confidence() -> f64 {
    0.6
}
fn default_low_confidence_factor() -> f64 {
    1.25
}
fn default_hot_region_score() -> f64 {
    0.5
}
fn default_hot_region_factor() -> f64 {
    0.8
}
fn default_cold_region_score() -> f64 {
    0.1
}
fn default_cold_region_factor() -> f64 {
    1.3
}
fn default_heat_decay() -> f64 {
    0.7
}
fn default_cost_per_char() -> f64 {
    1.0
}
fn default_recognition_capacity() -> usize {
    512
}
fn default_recognition_ttl_secs() -> u64 {
    3_600
}
fn default_sweep_interval_secs() -> u64 {
    300
}
fn default_translation_ttl_secs() -> u64 {
    10
}
fn default_api_timeout_secs() -> u64 {
    30
}
fn default_target_lang() -> String {
    "ko".to_string()
}
