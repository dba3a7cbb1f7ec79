//! 인식(OCR) 엔진 포트.
//!
//! 엔진은 불투명한 외부 협력자다 — 튜닝 정보는 런타임 멤버 탐색이 아니라
//! `RecognizerProfile` 타입 계약으로만 노출된다.
//!
//! 구현: `tongyeok-network::recognizer_client::RemoteRecognizer`, 테스트 mock.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::capture::{CapturedFrame, Rect};
use crate::models::text::{RecognitionResult, RecognizerProfile};

/// 인식 엔진
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// 프레임에서 텍스트 추출
    ///
    /// - `frame`: RGBA8 원시 프레임
    /// - `region`: 인식 범위 제한 (None = 전체 프레임)
    async fn recognize(
        &self,
        frame: &CapturedFrame,
        region: Option<&Rect>,
    ) -> Result<RecognitionResult, CoreError>;

    /// 엔진 프로필 (버전, 신뢰도 보정 여부, 언어 힌트)
    fn profile(&self) -> RecognizerProfile;
}
