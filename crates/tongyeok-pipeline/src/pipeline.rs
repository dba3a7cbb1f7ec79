//! 번역 파이프라인 조립.
//!
//! 캡처 → (캐시/차단기 경유) 인식 → 변경 게이트 → (캐시/차단기 경유)
//! 번역 → 결과 보고/이벤트 발행의 전 단계를 조립한다.
//!
//! 캡처 실패는 실패 결과로 흡수되고, 인식/번역 에러(차단기 열림 포함)는
//! 구분 가능한 `CoreError`로 호출자에게 전파된다.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use tongyeok_capture::orchestrator::CaptureOrchestrator;
use tongyeok_core::config::AppConfig;
use tongyeok_core::error::CoreError;
use tongyeok_core::models::capture::{CaptureOptions, CaptureResult, CaptureTarget, TargetId};
use tongyeok_core::models::decision::GateDecision;
use tongyeok_core::models::text::{RecognitionResult, RegionInfo, TranslationResult};
use tongyeok_core::ports::recognizer::Recognizer;
use tongyeok_core::ports::translator::Translator;
use tongyeok_network::CircuitBreaker;

use crate::events::{PipelineEvent, PipelineEventBus};
use crate::gate::ChangeGatekeeper;
use crate::recognition_cache::RecognitionCache;
use crate::translation_cache::TranslationCache;

/// 파이프라인 한 사이클의 결과
#[derive(Debug)]
pub struct PipelineOutcome {
    /// 캡처 결과 (실패 포함)
    pub capture: CaptureResult,
    /// 인식 결과 (캡처 실패 시 None)
    pub recognition: Option<RecognitionResult>,
    /// 인식이 캐시에서 왔는지 여부
    pub recognition_from_cache: bool,
    /// 게이트 판정 (인식까지 도달한 경우)
    pub decision: Option<GateDecision>,
    /// 번역 결과 (게이트 허용 + 번역 성공 시)
    pub translation: Option<TranslationResult>,
    /// 번역이 캐시에서 왔는지 여부
    pub translation_from_cache: bool,
}

/// 번역 파이프라인
pub struct TranslationPipeline {
    orchestrator: CaptureOrchestrator,
    recognizer: Arc<dyn Recognizer>,
    translator: Arc<dyn Translator>,
    recognition_breaker: CircuitBreaker,
    translation_breaker: CircuitBreaker,
    recognition_cache: Arc<RecognitionCache>,
    translation_cache: TranslationCache,
    gate: ChangeGatekeeper,
    bus: PipelineEventBus,
    /// 대상별 직전 관측 텍스트 — 번역 성공 시에만 갱신
    prev_texts: Mutex<HashMap<TargetId, String>>,
    cost_per_char: f64,
}

impl TranslationPipeline {
    /// 새 파이프라인 조립
    pub fn new(
        config: &AppConfig,
        orchestrator: CaptureOrchestrator,
        recognizer: Arc<dyn Recognizer>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            orchestrator,
            recognizer,
            translator,
            recognition_breaker: CircuitBreaker::new(
                "recognition",
                config.recognition_breaker.clone(),
            ),
            translation_breaker: CircuitBreaker::new(
                "translation",
                config.translation_breaker.clone(),
            ),
            recognition_cache: Arc::new(RecognitionCache::new(config.recognition_cache.clone())),
            translation_cache: TranslationCache::new(config.translation_cache.clone()),
            gate: ChangeGatekeeper::new(config.gate.clone()),
            bus: PipelineEventBus::default(),
            prev_texts: Mutex::new(HashMap::new()),
            cost_per_char: config.gate.cost_per_char,
        }
    }

    /// 이벤트 구독자 생성
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<PipelineEvent> {
        self.bus.subscribe()
    }

    /// 변경 게이트 (통계 조회/초기화용)
    pub fn gate(&self) -> &ChangeGatekeeper {
        &self.gate
    }

    /// 인식 차단기
    pub fn recognition_breaker(&self) -> &CircuitBreaker {
        &self.recognition_breaker
    }

    /// 번역 차단기
    pub fn translation_breaker(&self) -> &CircuitBreaker {
        &self.translation_breaker
    }

    /// 인식 캐시
    pub fn recognition_cache(&self) -> &Arc<RecognitionCache> {
        &self.recognition_cache
    }

    /// 인식 캐시 주기 스윕 태스크 기동
    pub fn start_cache_sweeper(&self) -> tokio::task::JoinHandle<()> {
        self.recognition_cache.start_sweeper()
    }

    /// 대상 종료 훅 — 직전 텍스트와 번역 캐시 엔트리 제거
    pub fn forget_target(&self, target: TargetId) {
        self.prev_texts.lock().remove(&target);
        self.translation_cache.invalidate(target);
        debug!(handle = target.handle, "대상 상태 제거");
    }

    /// 파이프라인 한 사이클 실행
    pub async fn process(
        &self,
        target: &CaptureTarget,
        options: &CaptureOptions,
    ) -> Result<PipelineOutcome, CoreError> {
        // 1. 캡처 — 전략 소진은 실패 결과로 반환된다
        let capture = self.orchestrator.capture(target, options).await;
        if !capture.success {
            self.bus.publish(PipelineEvent::CaptureFailed {
                target: target.id,
                error: capture.error.clone().unwrap_or_default(),
            });
            return Ok(PipelineOutcome {
                capture,
                recognition: None,
                recognition_from_cache: false,
                decision: None,
                translation: None,
                translation_from_cache: false,
            });
        }
        self.bus.publish(PipelineEvent::CaptureCompleted {
            target: target.id,
            strategy: capture.strategy_used.clone().unwrap_or_default(),
            frame_count: capture.frames.len(),
        });

        let frame = capture
            .frames
            .first()
            .ok_or_else(|| CoreError::Internal("성공한 캡처에 프레임 없음".into()))?;

        // 2. 인식 — 전략 인라인 결과 > 캐시 > 차단기 경유 엔진 호출
        let (recognition, recognition_from_cache) = if !capture.text_regions.is_empty() {
            debug!("전략 인라인 인식 결과 사용");
            (
                RecognitionResult::from_regions(capture.text_regions.clone()),
                false,
            )
        } else {
            let hash = RecognitionCache::content_hash(&frame.data);
            if let Some(hit) = self.recognition_cache.get(&hash) {
                debug!("인식 캐시 히트");
                (hit, true)
            } else {
                let result = self
                    .recognition_breaker
                    .execute(|| self.recognizer.recognize(frame, None))
                    .await?;
                self.recognition_cache.put(&hash, result.clone());
                (result, false)
            }
        };
        self.bus.publish(PipelineEvent::RecognitionCompleted {
            target: target.id,
            text_len: recognition.text.chars().count(),
            from_cache: recognition_from_cache,
        });

        // 3. 변경 게이트
        let region_info = RegionInfo {
            region_id: format!("{}:{}", target.id.handle, target.id.generation),
            exclusion_zone: target.exclusion_zone,
            force_allow: false,
            confidence: Some(recognition.mean_confidence),
        };
        let prev = self.prev_texts.lock().get(&target.id).cloned();
        let decision = self
            .gate
            .decide(prev.as_deref(), &recognition.text, Some(&region_info));

        if !decision.allow {
            debug!(reason = decision.reason.as_str(), "게이트 거부, 번역 생략");
            self.bus.publish(PipelineEvent::TranslationSkipped {
                target: target.id,
                reason: decision.reason,
            });
            return Ok(PipelineOutcome {
                capture,
                recognition: Some(recognition),
                recognition_from_cache,
                decision: Some(decision),
                translation: None,
                translation_from_cache: false,
            });
        }

        // 4. 번역 — 대상 캐시 > 차단기 경유 서비스 호출
        let sample = TranslationCache::sample_hash(&frame.data);
        if let Some(hit) = self.translation_cache.try_get(target.id, sample) {
            self.bus.publish(PipelineEvent::TranslationCompleted {
                target: target.id,
                translated_text: hit.translated_text.clone(),
                from_cache: true,
            });
            return Ok(PipelineOutcome {
                capture,
                recognition: Some(recognition),
                recognition_from_cache,
                decision: Some(decision),
                translation: Some(hit),
                translation_from_cache: true,
            });
        }

        let text = recognition.text.clone();
        let translation = match self
            .translation_breaker
            .execute(|| self.translator.translate(&text))
            .await
        {
            Ok(translation) => translation,
            Err(e) => {
                warn!(error = %e, "번역 실패");
                // 차단기 거부는 실제 번역 시도가 아니므로 사후 보고하지 않는다
                if !matches!(e, CoreError::CircuitOpen { .. }) {
                    self.gate.report_result(&decision, false, 0.0);
                }
                self.bus.publish(PipelineEvent::TranslationFailed {
                    target: target.id,
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        self.translation_cache.put(target.id, sample, translation.clone());
        self.gate.report_result(
            &decision,
            true,
            self.cost_per_char * text.chars().count() as f64,
        );
        self.prev_texts.lock().insert(target.id, recognition.text.clone());

        info!(
            handle = target.id.handle,
            text_len = text.chars().count(),
            "번역 완료"
        );
        self.bus.publish(PipelineEvent::TranslationCompleted {
            target: target.id,
            translated_text: translation.translated_text.clone(),
            from_cache: false,
        });

        Ok(PipelineOutcome {
            capture,
            recognition: Some(recognition),
            recognition_from_cache,
            decision: Some(decision),
            translation: Some(translation),
            translation_from_cache: false,
        })
    }
}
