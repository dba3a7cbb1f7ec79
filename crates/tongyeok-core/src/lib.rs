//! # tongyeok-core
//!
//! TONGYEOK 도메인 모델, 포트(trait) 정의, 에러 타입, 설정.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`] — 도메인 데이터 구조체 (캡처/하드웨어/텍스트/판정)
//! - [`ports`] — Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`error`] — 핵심 에러 타입 (thiserror)
//! - [`config`] — 애플리케이션 설정 구조체 (serde)

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

#[cfg(test)]
mod tests {
    use crate::models::capture::{CaptureOptions, StrategyKind};
    use crate::models::text::TextRegion;

    #[test]
    fn strategy_kind_names_unique() {
        let kinds = [
            StrategyKind::Accelerated,
            StrategyKind::WindowSurface,
            StrategyKind::Compositor,
            StrategyKind::LegacyBlit,
        ];
        let mut names: Vec<_> = kinds.iter().map(|k| k.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), kinds.len());
    }

    #[test]
    fn text_region_serde() {
        let region = TextRegion {
            text: "저장".to_string(),
            x: 100,
            y: 200,
            width: 60,
            height: 25,
            confidence: 0.92,
        };
        let json = serde_json::to_string(&region).unwrap();
        let deser: TextRegion = serde_json::from_str(&json).unwrap();
        assert_eq!(deser.text, "저장");
        assert!((deser.confidence - 0.92).abs() < f64::EPSILON);
    }

    #[test]
    fn default_options_derive_from_default_config() {
        let options = CaptureOptions::default();
        assert_eq!(options.max_attempts, 4);
        assert_eq!(options.recovery_wait.as_millis(), 4_000);
    }
}
