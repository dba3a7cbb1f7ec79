//! 파이프라인 이벤트 버스.
//!
//! `tokio::broadcast` 기반 fire-and-forget 알림. 구독자가 없어도 발행은
//! 실패하지 않는다.

use tokio::sync::broadcast;
use tracing::debug;

use tongyeok_core::models::capture::TargetId;
use tongyeok_core::models::decision::GateReason;

/// 파이프라인 이벤트
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// 캡처 완료
    CaptureCompleted {
        target: TargetId,
        strategy: String,
        frame_count: usize,
    },
    /// 캡처 실패 (전략 소진)
    CaptureFailed { target: TargetId, error: String },
    /// 인식 완료
    RecognitionCompleted {
        target: TargetId,
        text_len: usize,
        from_cache: bool,
    },
    /// 번역 완료
    TranslationCompleted {
        target: TargetId,
        translated_text: String,
        from_cache: bool,
    },
    /// 게이트 거부로 번역 생략
    TranslationSkipped {
        target: TargetId,
        reason: GateReason,
    },
    /// 번역 실패 (차단기 열림 포함)
    TranslationFailed { target: TargetId, error: String },
}

/// 파이프라인 이벤트 버스
pub struct PipelineEventBus {
    tx: broadcast::Sender<PipelineEvent>,
}

impl PipelineEventBus {
    /// 새 이벤트 버스 생성
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// 이벤트 발행 (fire-and-forget)
    pub fn publish(&self, event: PipelineEvent) {
        debug!("이벤트 발행: {:?}", std::mem::discriminant(&event));
        let _ = self.tx.send(event);
    }

    /// 구독자 생성
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.tx.subscribe()
    }
}

impl Default for PipelineEventBus {
    fn default() -> Self {
        Self::new(128)
    }
}
