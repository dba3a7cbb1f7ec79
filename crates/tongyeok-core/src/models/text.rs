//! 인식/번역 텍스트 모델.
//!
//! 인식 엔진 무관 표준 구조. 엔진별 세부 형식은 어댑터에서 이 구조로 변환.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 인식된 텍스트 영역 (바운딩 박스 + 신뢰도)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRegion {
    /// 인식된 텍스트
    pub text: String,
    /// 바운딩 박스 X 좌표
    pub x: i32,
    /// 바운딩 박스 Y 좌표
    pub y: i32,
    /// 바운딩 박스 너비
    pub width: u32,
    /// 바운딩 박스 높이
    pub height: u32,
    /// 인식 신뢰도 (0.0 ~ 1.0)
    pub confidence: f64,
}

/// 인식 결과 — 영역 목록 + 병합 텍스트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// 줄 단위 병합 텍스트
    pub text: String,
    /// 개별 텍스트 영역
    pub regions: Vec<TextRegion>,
    /// 영역 평균 신뢰도 (영역 없으면 0.0)
    pub mean_confidence: f64,
    /// 인식 시각
    pub recognized_at: DateTime<Utc>,
}

impl RecognitionResult {
    /// 영역 목록으로부터 결과 생성 — 텍스트 병합 + 평균 신뢰도 계산
    pub fn from_regions(regions: Vec<TextRegion>) -> Self {
        let text = regions
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let mean_confidence = if regions.is_empty() {
            0.0
        } else {
            regions.iter().map(|r| r.confidence).sum::<f64>() / regions.len() as f64
        };
        Self {
            text,
            regions,
            mean_confidence,
            recognized_at: Utc::now(),
        }
    }
}

/// 번역 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    /// 원문
    pub source_text: String,
    /// 번역문
    pub translated_text: String,
    /// 감지된 원문 언어 (서비스가 보고한 경우)
    pub source_lang: Option<String>,
    /// 목표 언어
    pub target_lang: String,
    /// 번역 시각
    pub translated_at: DateTime<Utc>,
}

/// 게이트 판정에 쓰이는 영역 메타데이터
#[derive(Debug, Clone, Default)]
pub struct RegionInfo {
    /// 히트(변경 빈도) 추적 키 — 대상/영역별 안정 식별자
    pub region_id: String,
    /// 번역 제외 영역 여부
    pub exclusion_zone: bool,
    /// 호출자 강제 번역 요청 (예: 사용자 수동 트리거)
    pub force_allow: bool,
    /// 인식 신뢰도 (임계값 보정에 사용)
    pub confidence: Option<f64>,
}

/// 인식 엔진 프로필 — 런타임 멤버 탐색 대신 타입 있는 계약
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerProfile {
    /// 엔진 이름 (예: "remote-vision", "local-engine")
    pub engine_name: String,
    /// 엔진/계약 버전
    pub version: String,
    /// 신뢰도 값이 0~1로 보정되어 있는지 여부
    pub confidence_calibrated: bool,
    /// 언어 힌트 (빈 목록 = 자동 감지)
    pub language_hints: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(text: &str, confidence: f64) -> TextRegion {
        TextRegion {
            text: text.to_string(),
            x: 0,
            y: 0,
            width: 40,
            height: 20,
            confidence,
        }
    }

    #[test]
    fn from_regions_joins_lines_and_averages() {
        let result =
            RecognitionResult::from_regions(vec![region("저장", 0.9), region("취소", 0.7)]);
        assert_eq!(result.text, "저장\n취소");
        assert!((result.mean_confidence - 0.8).abs() < 1e-9);
        assert_eq!(result.regions.len(), 2);
    }

    #[test]
    fn from_empty_regions() {
        let result = RecognitionResult::from_regions(Vec::new());
        assert!(result.text.is_empty());
        assert_eq!(result.mean_confidence, 0.0);
    }

    #[test]
    fn translation_result_serde_roundtrip() {
        let result = TranslationResult {
            source_text: "ゲームを開始".to_string(),
            translated_text: "게임 시작".to_string(),
            source_lang: Some("ja".to_string()),
            target_lang: "ko".to_string(),
            translated_at: Utc::now(),
        };
        let json = serde_json::to_string(&result).unwrap();
        let deser: TranslationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(deser.translated_text, "게임 시작");
        assert_eq!(deser.source_lang.as_deref(), Some("ja"));
    }
}
