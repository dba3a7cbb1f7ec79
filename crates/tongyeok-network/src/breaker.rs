//! 회로 차단기.
//!
//! 실패 가능하고 느릴 수 있는 비동기 연산(인식 호출, 번역 호출)을 감싸는
//! Closed → Open → HalfOpen 상태 기계. Open 동안에는 래핑된 연산을
//! 호출하지 않고 잔여 쿨다운을 담은 에러로 즉시 거부한다.
//!
//! 상태 전이는 내부 잠금으로 선형화된다. 통계는 별도 잠금으로 관리되어
//! 빠른 승인/실패 판정 경로를 막지 않는다.
//!
//! 인스턴스는 연산 종류별로 독립 구성한다 — 인식과 번역은 실패 특성과
//! 비용이 다르다 (`AppConfig::{recognition_breaker, translation_breaker}`).

use std::future::Future;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use tongyeok_core::config::BreakerConfig;
use tongyeok_core::error::CoreError;

/// 차단기 상태
///
/// 허용 전이: Closed→Open (임계값 도달), Open→HalfOpen (쿨다운 경과),
/// HalfOpen→Closed (시험 성공), HalfOpen→Open (시험 실패).
/// Closed→HalfOpen, Open→Closed 직접 전이는 없다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakerState {
    /// 모든 호출 허용, 연속 실패 카운트
    Closed,
    /// 호출 즉시 거부 (쿨다운 중)
    Open,
    /// 다음 1회 호출만 시험으로 허용
    HalfOpen,
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakerState::Closed => write!(f, "Closed"),
            BreakerState::Open => write!(f, "Open"),
            BreakerState::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

/// 차단기 통계 스냅샷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerStats {
    /// 현재 상태
    pub state: BreakerState,
    /// 전체 실행 횟수 (거부 제외)
    pub total_executions: u64,
    /// 전체 실패 횟수 (취소 제외)
    pub total_failures: u64,
    /// 현재 연속 실패 횟수
    pub consecutive_failures: u32,
    /// Open 상태 거부 횟수
    pub rejected_count: u64,
    /// 마지막 성공 시각
    pub last_success_at: Option<DateTime<Utc>>,
    /// 마지막 실패 시각
    pub last_failure_at: Option<DateTime<Utc>>,
    /// Open 전환 누적 횟수 (단조 증가)
    pub open_count: u64,
    /// Open 상태 누적 시간 (밀리초)
    pub cumulative_open_ms: u64,
}

/// 상태 기계 내부
struct StateInner {
    state: BreakerState,
    consecutive_failures: u32,
    /// 마지막 Open 전환 시각 — HalfOpen 전환 후에도 유지 (쿨다운 창 기준점)
    opened_at: Option<Instant>,
    /// HalfOpen에서 시험 호출이 진행 중인지 여부
    trial_in_flight: bool,
}

/// 통계 내부 (상태 잠금과 독립)
#[derive(Default)]
struct StatsInner {
    total_executions: u64,
    total_failures: u64,
    rejected_count: u64,
    last_success_at: Option<DateTime<Utc>>,
    last_failure_at: Option<DateTime<Utc>>,
    open_count: u64,
    cumulative_open: Duration,
}

/// 상태 전이 결과 — 잠금 해제 후 통계에 반영
enum Transition {
    None,
    Opened,
    ClosedFromTrial { open_duration: Duration },
    Reopened { open_duration: Duration },
}

/// 회로 차단기
///
/// 래핑되는 결과 타입은 [`CircuitBreaker::execute`]의 타입 파라미터로
/// 결정된다 — 상태 기계 하나로 어떤 연산이든 감싼다.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    state: Mutex<StateInner>,
    stats: Mutex<StatsInner>,
}

impl CircuitBreaker {
    /// 새 차단기 생성
    ///
    /// `name`은 로깅/진단용 (예: "recognition", "translation").
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: Mutex::new(StateInner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                trial_in_flight: false,
            }),
            stats: Mutex::new(StatsInner::default()),
        }
    }

    /// 래핑된 연산 실행
    ///
    /// - Open 상태: 연산을 호출하지 않고 `CoreError::CircuitOpen` 반환
    /// - 쿨다운 경과 후 첫 호출: HalfOpen 시험 호출로 실행
    /// - `operation_timeout_ms` 설정 시 타임아웃 초과는 실패로 집계
    /// - `CoreError::Cancelled`는 호출자에게 전파되지만 실패로 집계하지 않음
    pub async fn execute<T, F, Fut>(&self, op: F) -> Result<T, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        self.check_admission()?;

        let result = match self.config.operation_timeout() {
            Some(timeout) => match tokio::time::timeout(timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(CoreError::ExecutionTimeout {
                    timeout_ms: self.config.operation_timeout_ms,
                }),
            },
            None => op().await,
        };

        match &result {
            Ok(_) => {
                self.on_success();
                self.record_execution(true, false);
            }
            Err(CoreError::Cancelled) => {
                self.on_cancelled();
                self.record_execution(false, true);
            }
            Err(_) => {
                self.on_failure();
                self.record_execution(false, false);
            }
        }

        result
    }

    /// 강제 초기화 — Closed 복귀, 실패 카운터 리셋
    pub fn reset(&self) {
        let open_duration = {
            let mut st = self.state.lock();
            let duration = st.opened_at.take().map(|t| t.elapsed());
            st.state = BreakerState::Closed;
            st.consecutive_failures = 0;
            st.trial_in_flight = false;
            duration
        };
        if let Some(duration) = open_duration {
            self.stats.lock().cumulative_open += duration;
        }
        info!(breaker = %self.name, "차단기 수동 초기화");
    }

    /// 통계 스냅샷
    pub fn stats(&self) -> BreakerStats {
        let (state, consecutive_failures) = {
            let st = self.state.lock();
            (st.state, st.consecutive_failures)
        };
        let stats = self.stats.lock();
        BreakerStats {
            state,
            total_executions: stats.total_executions,
            total_failures: stats.total_failures,
            consecutive_failures,
            rejected_count: stats.rejected_count,
            last_success_at: stats.last_success_at,
            last_failure_at: stats.last_failure_at,
            open_count: stats.open_count,
            cumulative_open_ms: stats.cumulative_open.as_millis() as u64,
        }
    }

    /// 현재 상태 (테스트/진단용)
    pub fn state(&self) -> BreakerState {
        self.state.lock().state
    }

    /// 호출 승인 검사 — Open 쿨다운 경과 시 HalfOpen 전환 담당
    fn check_admission(&self) -> Result<(), CoreError> {
        let mut st = self.state.lock();
        match st.state {
            BreakerState::Closed => Ok(()),
            BreakerState::Open => {
                let elapsed = st.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= self.config.open_timeout() {
                    st.state = BreakerState::HalfOpen;
                    st.trial_in_flight = true;
                    info!(breaker = %self.name, "쿨다운 경과, HalfOpen 시험 호출 시작");
                    Ok(())
                } else {
                    let retry_after_secs = (self.config.open_timeout() - elapsed)
                        .as_secs_f64()
                        .ceil() as u64;
                    drop(st);
                    self.stats.lock().rejected_count += 1;
                    debug!(breaker = %self.name, retry_after_secs, "Open 상태 거부");
                    Err(CoreError::CircuitOpen { retry_after_secs })
                }
            }
            BreakerState::HalfOpen => {
                if st.trial_in_flight {
                    drop(st);
                    self.stats.lock().rejected_count += 1;
                    Err(CoreError::CircuitOpen {
                        retry_after_secs: 1,
                    })
                } else {
                    st.trial_in_flight = true;
                    Ok(())
                }
            }
        }
    }

    fn on_success(&self) {
        let transition = {
            let mut st = self.state.lock();
            match st.state {
                BreakerState::HalfOpen => {
                    st.state = BreakerState::Closed;
                    st.consecutive_failures = 0;
                    st.trial_in_flight = false;
                    let open_duration = st.opened_at.take().map(|t| t.elapsed());
                    Transition::ClosedFromTrial {
                        open_duration: open_duration.unwrap_or_default(),
                    }
                }
                BreakerState::Closed => {
                    st.consecutive_failures = 0;
                    Transition::None
                }
                // Open 전환 전에 승인된 잔여 호출의 성공 — 직접 Closed 전이 없음
                BreakerState::Open => Transition::None,
            }
        };
        self.apply_transition(transition, "시험 호출 성공, Closed 복귀");
    }

    fn on_failure(&self) {
        let transition = {
            let mut st = self.state.lock();
            st.consecutive_failures += 1;
            match st.state {
                BreakerState::Closed => {
                    if st.consecutive_failures >= self.config.failure_threshold {
                        st.state = BreakerState::Open;
                        st.opened_at = Some(Instant::now());
                        Transition::Opened
                    } else {
                        Transition::None
                    }
                }
                BreakerState::HalfOpen => {
                    st.state = BreakerState::Open;
                    st.trial_in_flight = false;
                    let open_duration = st.opened_at.replace(Instant::now());
                    Transition::Reopened {
                        open_duration: open_duration.map(|t| t.elapsed()).unwrap_or_default(),
                    }
                }
                // Open 전환 전에 승인된 잔여 호출의 실패
                BreakerState::Open => Transition::None,
            }
        };
        self.apply_transition(transition, "");
    }

    /// 취소는 실패로 집계하지 않는다 — 시험 슬롯만 반환
    fn on_cancelled(&self) {
        let mut st = self.state.lock();
        if st.state == BreakerState::HalfOpen && st.trial_in_flight {
            st.trial_in_flight = false;
            debug!(breaker = %self.name, "시험 호출 취소, 시험 슬롯 반환");
        }
    }

    fn apply_transition(&self, transition: Transition, close_msg: &str) {
        match transition {
            Transition::None => {}
            Transition::Opened => {
                self.stats.lock().open_count += 1;
                warn!(
                    breaker = %self.name,
                    threshold = self.config.failure_threshold,
                    "연속 실패 임계값 도달, Open 전환"
                );
            }
            Transition::ClosedFromTrial { open_duration } => {
                self.stats.lock().cumulative_open += open_duration;
                info!(breaker = %self.name, "{close_msg}");
            }
            Transition::Reopened { open_duration } => {
                let mut stats = self.stats.lock();
                stats.open_count += 1;
                stats.cumulative_open += open_duration;
                drop(stats);
                warn!(breaker = %self.name, "시험 호출 실패, Open 복귀");
            }
        }
    }

    fn record_execution(&self, success: bool, cancelled: bool) {
        let mut stats = self.stats.lock();
        stats.total_executions += 1;
        if success {
            stats.last_success_at = Some(Utc::now());
        } else if !cancelled {
            stats.total_failures += 1;
            stats.last_failure_at = Some(Utc::now());
        }
    }
}
