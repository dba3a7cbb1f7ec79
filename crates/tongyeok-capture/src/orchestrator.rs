//! 캡처 오케스트레이터.
//!
//! 카탈로그 우선순위대로 전략을 시도하고, 드라이버 리셋(TDR)은
//! 대기 + 환경 캐시 무효화로 복구한다. 전략 하나의 구현 버그가 전체
//! 캡처를 실패시키지 않도록 모든 에러는 다음 전략 폴백으로 흡수된다.
//!
//! 네이티브 캡처 리소스는 재진입이 안전하지 않으므로 호출은 프로세스당
//! 단일 비행(single-flight)으로 직렬화된다.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use tongyeok_core::error::CoreError;
use tongyeok_core::models::capture::{
    AttemptOutcome, AttemptRecord, CaptureMetrics, CaptureOptions, CaptureResult, CaptureTarget,
    CapturedFrame, StrategyKind,
};
use tongyeok_core::models::hardware::{AcceleratorTier, HardwareEnvironmentInfo};
use tongyeok_core::ports::capture_strategy::{CaptureStrategy, StrategyOutput};

use crate::catalog::StrategyCatalog;
use crate::probe::CachedProbe;
use crate::roi;

/// 캡처 오케스트레이터
pub struct CaptureOrchestrator {
    strategies: Vec<Arc<dyn CaptureStrategy>>,
    catalog: StrategyCatalog,
    probe: Arc<CachedProbe>,
    /// 단일 비행 게이트 — await를 가로지르는 유일한 잠금
    flight: Mutex<()>,
}

impl CaptureOrchestrator {
    /// 새 오케스트레이터 생성 (전략은 `register`로 등록)
    pub fn new(probe: Arc<CachedProbe>) -> Self {
        Self {
            strategies: Vec::new(),
            catalog: StrategyCatalog::new(),
            probe,
            flight: Mutex::new(()),
        }
    }

    /// 전략 등록 (빌더 스타일)
    pub fn register(mut self, strategy: Arc<dyn CaptureStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// 등록된 전략 수
    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    /// 해당 분류로 등록된 첫 전략
    fn strategy_for(&self, kind: StrategyKind) -> Option<&Arc<dyn CaptureStrategy>> {
        self.strategies.iter().find(|s| s.kind() == kind)
    }

    /// 캡처 실행 — 전략 소진 시에도 예외 대신 실패 결과 반환
    pub async fn capture(&self, target: &CaptureTarget, options: &CaptureOptions) -> CaptureResult {
        let started = Instant::now();

        // 단일 비행 게이트: 성공/소진/취소 어느 경로로 나가도 가드 drop으로 해제
        let _flight = self.flight.lock().await;

        let env = self.environment_or_fallback();
        let ordering = self.catalog.ordering(&env);

        let mut attempted: Vec<String> = Vec::new();
        let mut metrics = CaptureMetrics::default();

        for kind in ordering {
            let Some(strategy) = self.strategy_for(kind) else {
                debug!(kind = kind.as_str(), "등록된 전략 없음, 건너뜀");
                continue;
            };
            if !options.allows(kind) {
                debug!(kind = kind.as_str(), "옵션에서 비활성화됨, 건너뜀");
                continue;
            }
            if attempted.len() >= options.max_attempts {
                warn!(
                    max_attempts = options.max_attempts,
                    "최대 시도 횟수 도달, 중단"
                );
                break;
            }

            let name = strategy.name();
            attempted.push(name.to_string());
            let attempt_started = Instant::now();

            match strategy.execute(target, options).await {
                Ok(output) => {
                    metrics.attempts.push(AttemptRecord {
                        strategy: name.to_string(),
                        elapsed_ms: attempt_started.elapsed().as_millis() as u64,
                        outcome: AttemptOutcome::Succeeded,
                    });
                    info!(strategy = name, attempts = attempted.len(), "캡처 성공");
                    return self.finish_success(output, name, attempted, metrics, options, started);
                }
                Err(CoreError::DriverReset(msg)) => {
                    metrics.attempts.push(AttemptRecord {
                        strategy: name.to_string(),
                        elapsed_ms: attempt_started.elapsed().as_millis() as u64,
                        outcome: AttemptOutcome::DriverReset,
                    });
                    warn!(
                        strategy = name,
                        %msg,
                        wait_ms = options.recovery_wait.as_millis() as u64,
                        "드라이버 리셋 감지, 복구 대기 후 다음 전략으로"
                    );
                    // 드라이버 안정화 대기 후 환경 재감지 유도.
                    // 실패한 전략은 이 호출 안에서 재시도하지 않는다.
                    tokio::time::sleep(options.recovery_wait).await;
                    self.probe.invalidate();
                }
                Err(CoreError::ResourceExhausted(msg)) => {
                    metrics.attempts.push(AttemptRecord {
                        strategy: name.to_string(),
                        elapsed_ms: attempt_started.elapsed().as_millis() as u64,
                        outcome: AttemptOutcome::ResourceExhausted,
                    });
                    debug!(strategy = name, %msg, "리소스 부족, 즉시 다음 전략으로");
                }
                Err(e) => {
                    metrics.attempts.push(AttemptRecord {
                        strategy: name.to_string(),
                        elapsed_ms: attempt_started.elapsed().as_millis() as u64,
                        outcome: AttemptOutcome::Failed,
                    });
                    warn!(strategy = name, error = %e, "전략 실패, 다음 전략으로");
                }
            }
        }

        warn!(attempts = attempted.len(), "모든 전략 소진, 캡처 실패");
        CaptureResult::exhausted(attempted, started.elapsed(), metrics)
    }

    /// 환경 정보 조회 — 감지 실패 시 가용성 우선으로 소프트웨어 등급 폴백
    fn environment_or_fallback(&self) -> HardwareEnvironmentInfo {
        match self.probe.environment() {
            Ok(env) => env,
            Err(e) => {
                warn!(error = %e, "하드웨어 감지 실패, 소프트웨어 등급으로 진행");
                HardwareEnvironmentInfo {
                    tier: AcceleratorTier::Software,
                    total_memory_mb: 0,
                    logical_cores: 0,
                    detected_at: chrono::Utc::now(),
                }
            }
        }
    }

    /// 성공 결과 마무리 — 필요 시 ROI 다운스케일 적용
    fn finish_success(
        &self,
        output: StrategyOutput,
        strategy_used: &str,
        attempted: Vec<String>,
        metrics: CaptureMetrics,
        options: &CaptureOptions,
        started: Instant,
    ) -> CaptureResult {
        if let Some(m) = &output.metrics {
            debug!(
                frame_bytes = m.frame_bytes,
                backend_ms = m.backend_ms,
                "전략 메트릭"
            );
        }

        let frames = if options.roi_scale < 1.0 {
            output
                .frames
                .into_iter()
                .map(|frame| self.scale_or_keep(frame, options.roi_scale))
                .collect()
        } else {
            output.frames
        };

        CaptureResult::succeeded(
            frames,
            output.text_regions,
            strategy_used.to_string(),
            attempted,
            started.elapsed(),
            metrics,
        )
    }

    /// ROI 스케일 적용 — 스케일 실패는 캡처 실패가 아니라 원본 유지
    fn scale_or_keep(&self, frame: CapturedFrame, scale: f32) -> CapturedFrame {
        let fallback = frame.clone();
        match roi::scale_frame(frame, scale) {
            Ok(scaled) => scaled,
            Err(e) => {
                warn!(error = %e, "ROI 스케일 실패, 원본 프레임 유지");
                fallback
            }
        }
    }
}
