//! 번역 승인 판정 모델.
//!
//! 게이트가 판정마다 새로 생성하는 불변 값 레코드. 생성 후 수정되지 않는다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 판정 사유 코드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateReason {
    /// 게이트 전체 비활성화 → 허용
    GateDisabled,
    /// 호출자 강제 허용
    ForcedAllow,
    /// 제외 영역 → 거부
    InExclusionZone,
    /// 빈 텍스트 → 거부
    EmptyText,
    /// 최소 길이 미달 → 거부
    TooShort,
    /// 이 영역의 첫 텍스트 → 허용
    FirstText,
    /// 직전 텍스트와 동일 → 거부
    IdenticalText,
    /// 길이 변화 비율이 강제 번역 임계값 이상 → 허용
    SignificantLengthChange,
    /// 편집 거리 비율이 임계값 이상 → 허용
    SignificantChange,
    /// 편집 거리 비율이 임계값 미만 → 거부
    InsufficientChange,
    /// 게이트 내부 에러 → fail-open 허용
    FailOpen,
}

impl GateReason {
    /// 통계 키/로깅용 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            GateReason::GateDisabled => "gate_disabled",
            GateReason::ForcedAllow => "forced_allow",
            GateReason::InExclusionZone => "in_exclusion_zone",
            GateReason::EmptyText => "empty_text",
            GateReason::TooShort => "too_short",
            GateReason::FirstText => "first_text",
            GateReason::IdenticalText => "identical_text",
            GateReason::SignificantLengthChange => "significant_length_change",
            GateReason::SignificantChange => "significant_change",
            GateReason::InsufficientChange => "insufficient_change",
            GateReason::FailOpen => "fail_open",
        }
    }
}

/// 게이트 판정 — 판정마다 새로 생성되는 불변 레코드
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDecision {
    /// 번역 허용 여부
    pub allow: bool,
    /// 판정 사유
    pub reason: GateReason,
    /// 계산된 변경 비율 (편집 거리 기반, 규칙 8 도달 시에만 > 0)
    pub change_ratio: f64,
    /// 적용된 임계값
    pub threshold: f64,
    /// 직전 텍스트 길이 (문자 수, 없으면 0)
    pub prev_len: usize,
    /// 현재 텍스트 길이 (문자 수)
    pub curr_len: usize,
    /// 판정 소요 시간 (마이크로초)
    pub elapsed_us: u64,
    /// 판정 시각
    pub decided_at: DateTime<Utc>,
}
