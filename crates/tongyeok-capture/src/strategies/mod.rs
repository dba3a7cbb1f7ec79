//! xcap 기반 캡처 전략 어댑터.
//!
//! 백엔드 에러 문자열을 복구 가능 분류(드라이버 리셋 / 리소스 부족)로
//! 매핑한다. 분류 계약은 `CaptureStrategy` 포트 문서 참고.

pub mod monitor;
pub mod window;

use tongyeok_core::error::CoreError;

/// 백엔드 에러 메시지를 복구 분류로 매핑
///
/// xcap은 OS 백엔드 에러를 문자열로만 노출하므로 메시지 패턴으로 분류한다.
pub(crate) fn classify_backend_error(context: &str, msg: &str) -> CoreError {
    let lower = msg.to_lowercase();
    if lower.contains("reset")
        || lower.contains("device lost")
        || lower.contains("device removed")
        || lower.contains("hung")
    {
        CoreError::DriverReset(format!("{context}: {msg}"))
    } else if lower.contains("busy")
        || lower.contains("in use")
        || lower.contains("resource")
        || lower.contains("memory")
    {
        CoreError::ResourceExhausted(format!("{context}: {msg}"))
    } else {
        CoreError::Capture(format!("{context}: {msg}"))
    }
}
