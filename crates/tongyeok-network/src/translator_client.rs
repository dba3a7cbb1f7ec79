//! 원격 번역 클라이언트.
//!
//! 외부 번역 API 호출. `Translator` 포트 구현.
//! 파이프라인에서 회로 차단기로 감싸고 변경 게이트 승인 후에만 호출된다.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use tongyeok_core::config::{ApiEndpointConfig, ApiProviderType};
use tongyeok_core::error::CoreError;
use tongyeok_core::models::text::TranslationResult;
use tongyeok_core::ports::translator::Translator;

/// 원격 번역 클라이언트 — `Translator` 포트 구현
#[derive(Debug)]
pub struct RemoteTranslator {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    provider_type: ApiProviderType,
    target_lang: String,
}

impl RemoteTranslator {
    /// 새 원격 번역 클라이언트 생성
    pub fn new(config: &ApiEndpointConfig) -> Result<Self, CoreError> {
        if config.api_key.is_empty() {
            return Err(CoreError::Config(
                "번역 API 키 미설정. 설정에서 입력하세요.".into(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 생성 실패: {e}")))?;

        debug!(
            endpoint = %config.endpoint,
            target_lang = %config.target_lang,
            "RemoteTranslator 초기화"
        );

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            provider_type: config.provider_type,
            target_lang: config.target_lang.clone(),
        })
    }

    /// DeepL 형식 응답 파싱: `{ "translations": [{ "text": ..., "detected_source_language": ... }] }`
    fn parse_deepl_response(source_text: &str, target_lang: &str, body: &str) -> Result<TranslationResult, CoreError> {
        #[derive(Deserialize)]
        struct DeeplTranslation {
            text: String,
            detected_source_language: Option<String>,
        }
        #[derive(Deserialize)]
        struct DeeplResponse {
            translations: Vec<DeeplTranslation>,
        }

        let response: DeeplResponse = serde_json::from_str(body)
            .map_err(|e| CoreError::Translation(format!("DeepL 응답 파싱 실패: {e}")))?;

        let first = response
            .translations
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::Translation("빈 번역 응답".into()))?;

        Ok(TranslationResult {
            source_text: source_text.to_string(),
            translated_text: first.text,
            source_lang: first.detected_source_language.map(|l| l.to_lowercase()),
            target_lang: target_lang.to_string(),
            translated_at: Utc::now(),
        })
    }

    /// 범용 JSON 응답 파싱: `{ "translated_text": ..., "source_lang": ... }`
    fn parse_generic_response(source_text: &str, target_lang: &str, body: &str) -> Result<TranslationResult, CoreError> {
        #[derive(Deserialize)]
        struct GenericResponse {
            translated_text: String,
            #[serde(default)]
            source_lang: Option<String>,
        }

        let response: GenericResponse = serde_json::from_str(body)
            .map_err(|e| CoreError::Translation(format!("범용 응답 파싱 실패: {e}")))?;

        Ok(TranslationResult {
            source_text: source_text.to_string(),
            translated_text: response.translated_text,
            source_lang: response.source_lang,
            target_lang: target_lang.to_string(),
            translated_at: Utc::now(),
        })
    }
}

#[async_trait]
impl Translator for RemoteTranslator {
    async fn translate(&self, text: &str) -> Result<TranslationResult, CoreError> {
        let request_body = match self.provider_type {
            ApiProviderType::Deepl => serde_json::json!({
                "text": [text],
                "target_lang": self.target_lang.to_uppercase(),
            }),
            _ => serde_json::json!({
                "text": text,
                "target_lang": self.target_lang,
            }),
        };

        debug!(
            endpoint = %self.endpoint,
            text_len = text.chars().count(),
            "번역 API 호출"
        );

        let mut builder = self
            .http_client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request_body);

        if self.provider_type == ApiProviderType::Deepl {
            builder = builder.header(
                "Authorization",
                format!("DeepL-Auth-Key {}", self.api_key),
            );
        } else {
            builder = builder.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("번역 API 호출 실패: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CoreError::Network(format!("번역 API 응답 읽기 실패: {e}")))?;

        if !status.is_success() {
            warn!(status = %status, "번역 API 오류 응답");
            return Err(CoreError::Translation(format!(
                "번역 API 오류 ({}): {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let result = if self.provider_type == ApiProviderType::Deepl {
            Self::parse_deepl_response(text, &self.target_lang, &body)?
        } else {
            Self::parse_generic_response(text, &self.target_lang, &body)?
        };

        debug!(
            translated_len = result.translated_text.chars().count(),
            "번역 결과 수신"
        );
        Ok(result)
    }

    fn name(&self) -> &str {
        match self.provider_type {
            ApiProviderType::Deepl => "deepl",
            _ => "generic-translate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint_config(url: &str, provider: ApiProviderType) -> ApiEndpointConfig {
        ApiEndpointConfig {
            endpoint: url.to_string(),
            api_key: "test-api-key-placeholder".to_string(),
            model: None,
            timeout_secs: 5,
            provider_type: provider,
            target_lang: "ko".to_string(),
        }
    }

    #[test]
    fn new_with_empty_key_fails() {
        let mut config = endpoint_config("https://api.example.com", ApiProviderType::Deepl);
        config.api_key = String::new();
        assert!(RemoteTranslator::new(&config).is_err());
    }

    #[test]
    fn parse_deepl_response_valid() {
        let body = r#"{
            "translations": [
                {"detected_source_language": "JA", "text": "게임 시작"}
            ]
        }"#;
        let result = RemoteTranslator::parse_deepl_response("ゲームを開始", "ko", body).unwrap();
        assert_eq!(result.translated_text, "게임 시작");
        assert_eq!(result.source_lang.as_deref(), Some("ja"));
        assert_eq!(result.target_lang, "ko");
        assert_eq!(result.source_text, "ゲームを開始");
    }

    #[test]
    fn parse_deepl_response_empty_fails() {
        let body = r#"{"translations": []}"#;
        assert!(RemoteTranslator::parse_deepl_response("x", "ko", body).is_err());
    }

    #[test]
    fn parse_generic_response_valid() {
        let body = r#"{"translated_text": "저장", "source_lang": "en"}"#;
        let result = RemoteTranslator::parse_generic_response("Save", "ko", body).unwrap();
        assert_eq!(result.translated_text, "저장");
        assert_eq!(result.source_lang.as_deref(), Some("en"));
    }

    #[test]
    fn parse_generic_response_without_source_lang() {
        let body = r#"{"translated_text": "저장"}"#;
        let result = RemoteTranslator::parse_generic_response("Save", "ko", body).unwrap();
        assert!(result.source_lang.is_none());
    }

    #[tokio::test]
    async fn translate_deepl_end_to_end() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/translate")
            .match_header("authorization", "DeepL-Auth-Key test-api-key-placeholder")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"translations": [{"detected_source_language": "EN", "text": "설정을 저장했습니다"}]}"#,
            )
            .create_async()
            .await;

        let config = endpoint_config(
            &format!("{}/v2/translate", server.url()),
            ApiProviderType::Deepl,
        );
        let translator = RemoteTranslator::new(&config).unwrap();

        let result = translator.translate("Settings saved").await.unwrap();
        assert_eq!(result.translated_text, "설정을 저장했습니다");
        assert_eq!(result.source_lang.as_deref(), Some("en"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn translate_rate_limited_surfaces_as_translation_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v2/translate")
            .with_status(429)
            .with_body("too many requests")
            .create_async()
            .await;

        let config = endpoint_config(
            &format!("{}/v2/translate", server.url()),
            ApiProviderType::Deepl,
        );
        let translator = RemoteTranslator::new(&config).unwrap();

        let result = translator.translate("hello").await;
        assert!(matches!(result, Err(CoreError::Translation(_))));
    }

    #[test]
    fn name_follows_provider() {
        let deepl = RemoteTranslator::new(&endpoint_config("https://api.example.com", ApiProviderType::Deepl)).unwrap();
        assert_eq!(deepl.name(), "deepl");
        let generic = RemoteTranslator::new(&endpoint_config("https://api.example.com", ApiProviderType::Generic)).unwrap();
        assert_eq!(generic.name(), "generic-translate");
    }
}
