//! # tongyeok-network
//!
//! 네트워크 어댑터 크레이트.
//! 회로 차단기, 원격 인식 클라이언트, 원격 번역 클라이언트를 담당한다.
//!
//! 차단기는 연산 종류별로 독립 인스턴스를 구성한다 — 파이프라인은
//! 인식용/번역용 차단기를 각각 두고 클라이언트 호출을 감싼다.

pub mod breaker;
pub mod recognizer_client;
pub mod translator_client;

pub use breaker::{BreakerState, BreakerStats, CircuitBreaker};
