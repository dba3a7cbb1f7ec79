//! TONGYEOK 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 자체 에러 enum을 만들지 않고 `CoreError` variant를
//! 직접 구성한다. 캡처 오케스트레이터가 내부에서 삼키는 복구 가능 에러
//! (드라이버 리셋, 리소스 부족)와 호출자에게 그대로 전달되는 에러
//! (차단기 열림, 타임아웃, 취소)를 한 곳에서 구분한다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 캡처 전략 실행 실패 (복구 불가 분류)
    #[error("캡처 에러: {0}")]
    Capture(String),

    /// 그래픽 드라이버 리셋 (TDR) — 복구 대기 후 다음 전략으로
    #[error("그래픽 드라이버 리셋: {0}")]
    DriverReset(String),

    /// 캡처 리소스 부족 — 대기 없이 다음 전략으로
    #[error("캡처 리소스 부족: {0}")]
    ResourceExhausted(String),

    /// 모든 캡처 전략 소진
    #[error("모든 캡처 전략 실패 ({attempted}개 시도)")]
    StrategyExhausted {
        /// 시도한 전략 수
        attempted: usize,
    },

    /// 회로 차단기 열림 — 쿨다운 잔여 시간 포함
    #[error("회로 차단기 열림, {retry_after_secs}초 후 재시도")]
    CircuitOpen {
        /// 재시도까지 잔여 시간 (초)
        retry_after_secs: u64,
    },

    /// 실행 타임아웃
    #[error("실행 타임아웃: {timeout_ms}ms 초과")]
    ExecutionTimeout {
        /// 초과된 타임아웃 시간 (밀리초)
        timeout_ms: u64,
    },

    /// 호출자 취소
    #[error("호출자 취소")]
    Cancelled,

    /// 인식(OCR) 처리 실패
    #[error("인식 에러: {0}")]
    Recognition(String),

    /// 번역 처리 실패
    #[error("번역 에러: {0}")]
    Translation(String),

    /// 네트워크 에러 (연결 실패, 응답 읽기 실패)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 캡처 전략 루프 안에서 복구되는 하드웨어 에러인지 여부
    pub fn is_recoverable_hardware(&self) -> bool {
        matches!(
            self,
            CoreError::DriverReset(_) | CoreError::ResourceExhausted(_)
        )
    }
}
