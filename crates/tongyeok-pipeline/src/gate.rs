//! 변경 게이트.
//!
//! 인식된 텍스트의 변경 폭을 보고 비싼 번역 호출 승인 여부를 판정한다.
//! 규칙은 순서대로 평가되어 첫 일치에서 종료된다. 내부 에러는 절대
//! 전파하지 않고 허용으로 귀결된다 — 과잉 번역이 출력 중단보다 싸다.
//!
//! 임계값은 텍스트 길이 버킷 기본값에 인식 신뢰도와 영역 히트(변경 빈도)
//! 배율을 곱해 적응적으로 결정된다. 짧은 텍스트는 한 글자 깜빡임으로
//! 재번역되지 않도록 높은 비율을, 긴 텍스트는 작은 편집도 대개 유의미하므로
//! 낮은 비율을 요구한다.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tongyeok_core::config::GateConfig;
use tongyeok_core::error::CoreError;
use tongyeok_core::models::decision::{GateDecision, GateReason};
use tongyeok_core::models::text::RegionInfo;

use crate::distance::levenshtein;

/// 게이트 운영 통계 스냅샷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateStats {
    /// 전체 판정 수
    pub total_decisions: u64,
    /// 허용 수
    pub allowed: u64,
    /// 거부 수
    pub denied: u64,
    /// 사유별 판정 수
    pub by_reason: HashMap<String, u64>,
    /// 거부로 절감한 추정 비용 (문자 수 비례)
    pub estimated_cost_saved: f64,
    /// 호출자가 사후 보고한 실제 번역 비용 합계
    pub actual_cost_spent: f64,
    /// 사후 보고된 번역 성공 수
    pub reported_successes: u64,
    /// 사후 보고된 번역 실패 수
    pub reported_failures: u64,
    /// 평균 변경 비율 (편집 거리 비교에 도달한 판정 기준)
    pub avg_change_ratio: f64,
    /// 마지막 판정 시각
    pub last_decision_at: Option<DateTime<Utc>>,
}

/// 통계 내부 누적값
#[derive(Default)]
struct StatsInner {
    total_decisions: u64,
    allowed: u64,
    denied: u64,
    by_reason: HashMap<String, u64>,
    estimated_cost_saved: f64,
    actual_cost_spent: f64,
    reported_successes: u64,
    reported_failures: u64,
    ratio_sum: f64,
    ratio_count: u64,
    last_decision_at: Option<DateTime<Utc>>,
}

/// 변경 게이트
pub struct ChangeGatekeeper {
    config: GateConfig,
    /// 영역별 변경 빈도 점수 (지수 이동 평균)
    heat: Mutex<HashMap<String, f64>>,
    stats: Mutex<StatsInner>,
}

impl ChangeGatekeeper {
    /// 새 게이트 생성
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            heat: Mutex::new(HashMap::new()),
            stats: Mutex::new(StatsInner::default()),
        }
    }

    /// 번역 승인 판정 — 절대 실패하지 않는다
    ///
    /// 판정 값 계산이 먼저 끝난 뒤 통계에 기록된다. 기록은 반환되는
    /// 판정 값에 영향을 주지 않는다.
    pub fn decide(
        &self,
        previous: Option<&str>,
        current: &str,
        region: Option<&RegionInfo>,
    ) -> GateDecision {
        let started = Instant::now();

        let decision = match self.decide_inner(previous, current, region, started) {
            Ok(decision) => decision,
            Err(e) => {
                warn!(error = %e, "게이트 내부 에러, fail-open 허용");
                let curr_len = current.trim().chars().count();
                GateDecision {
                    allow: true,
                    reason: GateReason::FailOpen,
                    change_ratio: 0.0,
                    threshold: 0.0,
                    prev_len: previous.map(|p| p.trim().chars().count()).unwrap_or(0),
                    curr_len,
                    elapsed_us: started.elapsed().as_micros() as u64,
                    decided_at: Utc::now(),
                }
            }
        };

        self.record(&decision);
        decision
    }

    /// 실제 번역 결과 사후 보고 — 통계 전용
    pub fn report_result(&self, _decision: &GateDecision, success: bool, cost: f64) {
        let mut stats = self.stats.lock();
        stats.actual_cost_spent += cost;
        if success {
            stats.reported_successes += 1;
        } else {
            stats.reported_failures += 1;
        }
    }

    /// 통계 스냅샷
    pub fn statistics(&self) -> GateStats {
        let stats = self.stats.lock();
        GateStats {
            total_decisions: stats.total_decisions,
            allowed: stats.allowed,
            denied: stats.denied,
            by_reason: stats.by_reason.clone(),
            estimated_cost_saved: stats.estimated_cost_saved,
            actual_cost_spent: stats.actual_cost_spent,
            reported_successes: stats.reported_successes,
            reported_failures: stats.reported_failures,
            avg_change_ratio: if stats.ratio_count == 0 {
                0.0
            } else {
                stats.ratio_sum / stats.ratio_count as f64
            },
            last_decision_at: stats.last_decision_at,
        }
    }

    /// 통계 초기화 (히트 맵은 유지)
    pub fn reset_statistics(&self) {
        *self.stats.lock() = StatsInner::default();
    }

    /// 영역의 현재 히트 점수 (진단/테스트용)
    pub fn region_heat(&self, region_id: &str) -> f64 {
        self.heat.lock().get(region_id).copied().unwrap_or(0.0)
    }

    /// 규칙 본체 — 순서대로 평가, 첫 일치에서 종료
    fn decide_inner(
        &self,
        previous: Option<&str>,
        current: &str,
        region: Option<&RegionInfo>,
        started: Instant,
    ) -> Result<GateDecision, CoreError> {
        let current = current.trim();
        let previous = previous.map(|p| p.trim());
        let curr_len = current.chars().count();
        let prev_len = previous.map(|p| p.chars().count()).unwrap_or(0);

        let make = |allow: bool, reason: GateReason, ratio: f64, threshold: f64| {
            Ok(GateDecision {
                allow,
                reason,
                change_ratio: ratio,
                threshold,
                prev_len,
                curr_len,
                elapsed_us: started.elapsed().as_micros() as u64,
                decided_at: Utc::now(),
            })
        };

        // 1. 게이트 전체 비활성화
        if !self.config.enabled {
            return make(true, GateReason::GateDisabled, 0.0, 0.0);
        }

        // 2. 호출자 강제 허용 (수동 트리거) — 제외 영역보다 우선
        if region.map(|r| r.force_allow).unwrap_or(false) {
            return make(true, GateReason::ForcedAllow, 0.0, 0.0);
        }

        // 3. 제외 영역
        if region.map(|r| r.exclusion_zone).unwrap_or(false) {
            return make(false, GateReason::InExclusionZone, 0.0, 0.0);
        }

        // 4. 빈 텍스트
        if self.config.skip_empty && current.is_empty() {
            return make(false, GateReason::EmptyText, 0.0, 0.0);
        }

        // 5. 최소 길이 미달
        if curr_len < self.config.min_text_len {
            return make(false, GateReason::TooShort, 0.0, 0.0);
        }

        // 6. 영역의 첫 텍스트
        let Some(prev) = previous else {
            if self.config.always_translate_first {
                return make(true, GateReason::FirstText, 0.0, 0.0);
            }
            // 첫 텍스트 자동 허용이 꺼져 있으면 빈 직전 텍스트로 간주하고 계속
            return self.compare(None, current, region, started, prev_len, curr_len);
        };

        // 7. 직전 텍스트와 동일
        if self.config.skip_identical && prev == current {
            return make(false, GateReason::IdenticalText, 0.0, 0.0);
        }

        self.compare(Some(prev), current, region, started, prev_len, curr_len)
    }

    /// 규칙 7(길이 변화) / 규칙 8(편집 거리 + 적응 임계값)
    fn compare(
        &self,
        previous: Option<&str>,
        current: &str,
        region: Option<&RegionInfo>,
        started: Instant,
        prev_len: usize,
        curr_len: usize,
    ) -> Result<GateDecision, CoreError> {
        let prev = previous.unwrap_or("");

        let make = |allow: bool, reason: GateReason, ratio: f64, threshold: f64| {
            Ok(GateDecision {
                allow,
                reason,
                change_ratio: ratio,
                threshold,
                prev_len,
                curr_len,
                elapsed_us: started.elapsed().as_micros() as u64,
                decided_at: Utc::now(),
            })
        };

        // 임계값 보정은 이번 관측 반영 전의 히트를 기준으로 한다
        let historical_heat = region
            .filter(|r| !r.region_id.is_empty())
            .and_then(|r| self.heat.lock().get(&r.region_id).copied());
        self.update_heat(region, prev != current);

        // 길이 급변은 편집 거리 없이 즉시 허용 (구조적 변경)
        let max_len = prev_len.max(curr_len);
        let length_ratio = if max_len == 0 {
            0.0
        } else {
            (curr_len as f64 - prev_len as f64).abs() / max_len as f64
        };
        if length_ratio >= self.config.force_translate_ratio {
            return make(true, GateReason::SignificantLengthChange, length_ratio, self.config.force_translate_ratio);
        }

        // 편집 거리 비율 vs 적응 임계값
        let distance = levenshtein(prev, current);
        let change_ratio = if max_len == 0 {
            0.0
        } else {
            distance as f64 / max_len as f64
        };
        let threshold = self.adaptive_threshold(curr_len, region, historical_heat)?;

        debug!(
            change_ratio,
            threshold,
            prev_len,
            curr_len,
            "편집 거리 비교"
        );

        if change_ratio >= threshold {
            make(true, GateReason::SignificantChange, change_ratio, threshold)
        } else {
            make(false, GateReason::InsufficientChange, change_ratio, threshold)
        }
    }

    /// 길이 버킷 기본값 × 신뢰도 배율 × 히트 배율, [0, 1] 클램프
    fn adaptive_threshold(
        &self,
        curr_len: usize,
        region: Option<&RegionInfo>,
        historical_heat: Option<f64>,
    ) -> Result<f64, CoreError> {
        let base = if curr_len <= self.config.short_text_max_len {
            self.config.short_threshold
        } else if curr_len >= self.config.long_text_min_len {
            self.config.long_threshold
        } else {
            self.config.medium_threshold
        };

        // 고신뢰 인식은 작은 변경도 믿을 수 있으므로 민감하게
        let confidence_factor = match region.and_then(|r| r.confidence) {
            Some(c) if c >= self.config.high_confidence => self.config.high_confidence_factor,
            Some(c) if c < self.config.low_confidence => self.config.low_confidence_factor,
            _ => 1.0,
        };

        // 자주 변하는 영역은 민감하게, 거의 안 변하는 영역은 둔감하게.
        // 관측 이력이 없는 영역은 보정하지 않는다.
        let heat_factor = match historical_heat {
            Some(heat) if heat >= self.config.hot_region_score => self.config.hot_region_factor,
            Some(heat) if heat <= self.config.cold_region_score => self.config.cold_region_factor,
            _ => 1.0,
        };

        let threshold = (base * confidence_factor * heat_factor).clamp(0.0, 1.0);
        if !threshold.is_finite() {
            return Err(CoreError::Internal(format!(
                "임계값 계산 불능: base={base}, conf={confidence_factor}, heat={heat_factor}"
            )));
        }
        Ok(threshold)
    }

    /// 영역 히트 갱신 — 변경 관측의 지수 이동 평균
    fn update_heat(&self, region: Option<&RegionInfo>, changed: bool) {
        let Some(region) = region else { return };
        if region.region_id.is_empty() {
            return;
        }
        let decay = self.config.heat_decay.clamp(0.0, 1.0);
        let observation = if changed { 1.0 } else { 0.0 };
        let mut heat = self.heat.lock();
        let entry = heat.entry(region.region_id.clone()).or_insert(0.0);
        *entry = decay * *entry + (1.0 - decay) * observation;
    }

    /// 판정 기록 — 판정 값 계산 이후에만 호출된다
    fn record(&self, decision: &GateDecision) {
        let mut stats = self.stats.lock();
        stats.total_decisions += 1;
        if decision.allow {
            stats.allowed += 1;
        } else {
            stats.denied += 1;
            stats.estimated_cost_saved += self.config.cost_per_char * decision.curr_len as f64;
        }
        *stats
            .by_reason
            .entry(decision.reason.as_str().to_string())
            .or_insert(0) += 1;
        if matches!(
            decision.reason,
            GateReason::SignificantChange | GateReason::InsufficientChange
        ) {
            stats.ratio_sum += decision.change_ratio;
            stats.ratio_count += 1;
        }
        stats.last_decision_at = Some(decision.decided_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> ChangeGatekeeper {
        ChangeGatekeeper::new(GateConfig::default())
    }

    fn region(id: &str) -> RegionInfo {
        RegionInfo {
            region_id: id.to_string(),
            exclusion_zone: false,
            force_allow: false,
            confidence: None,
        }
    }

    #[test]
    fn disabled_gate_allows_everything() {
        let mut config = GateConfig::default();
        config.enabled = false;
        let gate = ChangeGatekeeper::new(config);

        let decision = gate.decide(Some("같은 텍스트"), "같은 텍스트", None);
        assert!(decision.allow);
        assert_eq!(decision.reason, GateReason::GateDisabled);
    }

    #[test]
    fn forced_allow_overrides_exclusion() {
        let gate = gate();
        let mut info = region("r1");
        info.exclusion_zone = true;
        info.force_allow = true;

        let decision = gate.decide(Some("이전"), "이전", Some(&info));
        assert!(decision.allow);
        assert_eq!(decision.reason, GateReason::ForcedAllow);
    }

    #[test]
    fn exclusion_zone_denies() {
        let gate = gate();
        let mut info = region("r1");
        info.exclusion_zone = true;

        let decision = gate.decide(None, "완전히 새로운 텍스트", Some(&info));
        assert!(!decision.allow);
        assert_eq!(decision.reason, GateReason::InExclusionZone);
    }

    #[test]
    fn empty_text_denies() {
        let gate = gate();
        let decision = gate.decide(Some("이전 텍스트"), "   ", None);
        assert!(!decision.allow);
        assert_eq!(decision.reason, GateReason::EmptyText);
    }

    #[test]
    fn below_min_length_denies() {
        let mut config = GateConfig::default();
        config.min_text_len = 4;
        let gate = ChangeGatekeeper::new(config);

        let decision = gate.decide(None, "짧다", None);
        assert!(!decision.allow);
        assert_eq!(decision.reason, GateReason::TooShort);
    }

    #[test]
    fn first_text_always_allows() {
        let gate = gate();
        let decision = gate.decide(None, "처음 보는 텍스트", Some(&region("r1")));
        assert!(decision.allow);
        assert_eq!(decision.reason, GateReason::FirstText);
    }

    #[test]
    fn identical_text_denies() {
        let gate = gate();
        let text = "메뉴를 선택하세요";
        let decision = gate.decide(Some(text), text, Some(&region("r1")));
        assert!(!decision.allow);
        assert_eq!(decision.reason, GateReason::IdenticalText);
        assert_eq!(decision.prev_len, decision.curr_len);
    }

    #[test]
    fn large_length_growth_bypasses_edit_distance() {
        let gate = gate();
        // 5자 → 50자: 길이 비율 0.9 ≥ 0.5 → 내용과 무관하게 허용
        let prev = "다섯글자다";
        let curr = "가".repeat(50);
        let decision = gate.decide(Some(prev), &curr, Some(&region("r1")));
        assert!(decision.allow);
        assert_eq!(decision.reason, GateReason::SignificantLengthChange);
        assert!(decision.change_ratio >= 0.5);
    }

    #[test]
    fn small_edit_on_medium_text_denies() {
        let gate = gate();
        // 30자 중 1자 변경: 비율 ≈ 0.033 < 중간 버킷 0.2
        let prev = "a".repeat(30);
        let curr = format!("b{}", "a".repeat(29));
        let decision = gate.decide(Some(&prev), &curr, Some(&region("r1")));
        assert!(!decision.allow);
        assert_eq!(decision.reason, GateReason::InsufficientChange);
        assert!(decision.change_ratio > 0.0);
        assert!(decision.change_ratio < decision.threshold);
    }

    #[test]
    fn substantial_edit_on_medium_text_allows() {
        let gate = gate();
        // 길이는 동일(규칙 7 미적용), 내용 절반 교체 → 비율 0.5 ≥ 0.2
        let prev = format!("{}{}", "a".repeat(10), "c".repeat(10));
        let curr = format!("{}{}", "b".repeat(10), "c".repeat(10));
        let decision = gate.decide(Some(&prev), &curr, Some(&region("r1")));
        assert!(decision.allow);
        assert_eq!(decision.reason, GateReason::SignificantChange);
    }

    #[test]
    fn short_text_requires_higher_ratio() {
        let gate = gate();
        // 3자 중 1자 깜빡임: 비율 ≈ 0.33 < 짧은 버킷 0.4 → 거부
        let decision = gate.decide(Some("가나다"), "가나라", Some(&region("r1")));
        assert!(!decision.allow);
        assert_eq!(decision.reason, GateReason::InsufficientChange);

        // 동일 비율이라도 중간 길이 텍스트라면 허용됐을 것
        let prev = format!("{}{}", "x".repeat(10), "y".repeat(20));
        let curr = format!("{}{}", "z".repeat(10), "y".repeat(20));
        let decision = gate.decide(Some(&prev), &curr, Some(&region("r2")));
        assert!(decision.allow);
    }

    #[test]
    fn high_confidence_lowers_threshold() {
        let gate = gate();
        // 중간 버킷 비율 0.175: 기본 0.2로는 거부, 0.2×0.8=0.16으로는 허용
        let prev: String = "a".repeat(40);
        let mut curr: String = "b".repeat(7);
        curr.push_str(&"a".repeat(33));

        let low = gate.decide(Some(&prev), &curr, Some(&region("r1")));
        assert!(!low.allow);

        let mut confident = region("r2");
        confident.confidence = Some(0.95);
        let high = gate.decide(Some(&prev), &curr, Some(&confident));
        assert!(high.allow);
        assert!(high.threshold < low.threshold);
    }

    #[test]
    fn low_confidence_raises_threshold() {
        let gate = gate();
        let mut info = region("r1");
        info.confidence = Some(0.4);
        // 비율 0.225: 기본 0.2로는 허용, 0.2×1.25=0.25로는 거부
        let prev: String = "a".repeat(40);
        let mut curr: String = "b".repeat(9);
        curr.push_str(&"a".repeat(31));

        let decision = gate.decide(Some(&prev), &curr, Some(&info));
        assert!(!decision.allow);
    }

    #[test]
    fn heat_accumulates_on_changing_region() {
        let gate = gate();
        let info = region("hot-region");

        assert_eq!(gate.region_heat("hot-region"), 0.0);
        // 변경되는 판정을 반복하면 히트 상승
        let mut prev = "텍스트 버전 0".to_string();
        for i in 1..=5 {
            let curr = format!("텍스트 버전 {i}");
            gate.decide(Some(&prev), &curr, Some(&info));
            prev = curr;
        }
        let heat = gate.region_heat("hot-region");
        assert!(heat > 0.5, "히트 점수 상승해야 함: {heat}");
    }

    #[test]
    fn hot_region_gets_lower_threshold() {
        let gate = gate();
        let info = region("hot");

        // 히트를 hot_region_score 위로 올림
        let mut prev = "버전 0 텍스트입니다 아아아아".to_string();
        for i in 1..=6 {
            let curr = format!("버전 {i} 텍스트입니다 아아아아");
            gate.decide(Some(&prev), &curr, Some(&info));
            prev = curr;
        }

        // 비율 0.175 (중간 버킷): 기본 0.2 거부 / 핫 0.2×0.8=0.16 허용
        let base: String = "a".repeat(40);
        let mut edited: String = "b".repeat(7);
        edited.push_str(&"a".repeat(33));

        let cold_decision = gate.decide(Some(&base), &edited, Some(&region("cold-새영역")));
        let hot_decision = gate.decide(Some(&base), &edited, Some(&info));
        assert!(hot_decision.threshold < cold_decision.threshold);
        assert!(hot_decision.allow);
    }

    #[test]
    fn cold_region_gets_raised_threshold() {
        let mut config = GateConfig::default();
        config.skip_identical = false;
        let gate = ChangeGatekeeper::new(config);
        let info = region("cold");
        let text: String = "a".repeat(40);

        // 동일 텍스트 반복 관측 → 히트 0 유지 (콜드)
        for _ in 0..3 {
            gate.decide(Some(&text), &text, Some(&info));
        }
        assert!(gate.region_heat("cold") <= 0.1);

        // 비율 0.225: 기본 0.2면 허용됐겠지만 콜드 보정 0.26으로 거부
        let mut edited: String = "b".repeat(9);
        edited.push_str(&"a".repeat(31));
        let decision = gate.decide(Some(&text), &edited, Some(&info));
        assert!(!decision.allow);
        assert!(decision.threshold > 0.2);
    }

    #[test]
    fn denial_accrues_estimated_cost_saved() {
        let gate = gate();
        let text = "똑같은 텍스트가 반복되는 자막입니다";
        let text_len = text.chars().count() as f64;

        gate.decide(Some(text), text, None);
        let after_one = gate.statistics().estimated_cost_saved;
        assert!((after_one - text_len).abs() < f64::EPSILON);

        gate.decide(Some(text), text, None);
        let after_two = gate.statistics().estimated_cost_saved;
        assert!((after_two - 2.0 * text_len).abs() < f64::EPSILON);
    }

    #[test]
    fn statistics_track_reasons_and_ratio() {
        let gate = gate();
        gate.decide(None, "첫 번째 텍스트", None); // FirstText 허용
        gate.decide(Some("이전 텍스트입니다"), "이전 텍스트입니다", None); // 동일 거부

        let stats = gate.statistics();
        assert_eq!(stats.total_decisions, 2);
        assert_eq!(stats.allowed, 1);
        assert_eq!(stats.denied, 1);
        assert_eq!(stats.by_reason.get("first_text"), Some(&1));
        assert_eq!(stats.by_reason.get("identical_text"), Some(&1));
        assert!(stats.last_decision_at.is_some());
    }

    #[test]
    fn report_result_accrues_actual_cost() {
        let gate = gate();
        let decision = gate.decide(None, "번역할 텍스트", None);
        gate.report_result(&decision, true, 12.5);
        gate.report_result(&decision, false, 3.0);

        let stats = gate.statistics();
        assert!((stats.actual_cost_spent - 15.5).abs() < f64::EPSILON);
        assert_eq!(stats.reported_successes, 1);
        assert_eq!(stats.reported_failures, 1);
    }

    #[test]
    fn reset_statistics_clears_counters() {
        let gate = gate();
        gate.decide(None, "텍스트입니다", None);
        assert_eq!(gate.statistics().total_decisions, 1);

        gate.reset_statistics();
        let stats = gate.statistics();
        assert_eq!(stats.total_decisions, 0);
        assert!(stats.by_reason.is_empty());
    }

    #[test]
    fn invalid_threshold_config_fails_open() {
        let mut config = GateConfig::default();
        config.medium_threshold = f64::NAN;
        let gate = ChangeGatekeeper::new(config);

        // 편집 거리 비교까지 도달하는 입력 → 임계값 계산 불능 → fail-open
        let prev: String = "a".repeat(30);
        let curr = format!("b{}", "a".repeat(29));
        let decision = gate.decide(Some(&prev), &curr, Some(&region("r1")));
        assert!(decision.allow);
        assert_eq!(decision.reason, GateReason::FailOpen);
    }

    #[test]
    fn first_text_without_auto_allow_compares_against_empty() {
        let mut config = GateConfig::default();
        config.always_translate_first = false;
        let gate = ChangeGatekeeper::new(config);

        // 직전 텍스트 없음 + 자동 허용 꺼짐 → 빈 텍스트 대비 길이 급변으로 허용
        let decision = gate.decide(None, "충분히 긴 새 텍스트", None);
        assert!(decision.allow);
        assert_eq!(decision.reason, GateReason::SignificantLengthChange);
    }
}
