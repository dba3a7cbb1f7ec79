//! 번역 서비스 포트.
//!
//! 구현: `tongyeok-network::translator_client::RemoteTranslator`, 테스트 mock.
//! 파이프라인에서 회로 차단기로 감싸고 변경 게이트 승인 후에만 호출된다.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::text::TranslationResult;

/// 번역 서비스
#[async_trait]
pub trait Translator: Send + Sync {
    /// 텍스트 번역
    async fn translate(&self, text: &str) -> Result<TranslationResult, CoreError>;

    /// 서비스 이름 (로깅용)
    fn name(&self) -> &str;
}
