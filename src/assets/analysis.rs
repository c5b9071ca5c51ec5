// THEORY:
// `AnalysisResult` is the audit record of one candidate. Scoring and selection are
// separated: an evaluator always produces one of these for every candidate (it never
// fails), and only afterwards does a selector look at the verdicts. A candidate is
// either `Admissible` with a score or `Disqualified` with a reason; a disqualified
// record carries zeros for the total and for every sub-score.

use crate::assets::candidate::Candidate;
use crate::color::Rgb;
use serde::Serialize;
use std::collections::BTreeMap;

/// A scoring criterion. Each pipeline uses a subset with its own weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Aspect,
    Resolution,
    Complexity,
    SourceTrust,
    NotMonogram,
    Area,
    EdgeDensity,
    SpatialSpread,
}

/// Outcome of evaluating one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Admissible { score: f64 },
    Disqualified { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn long_side(&self) -> u32 {
        self.width.max(self.height)
    }

    pub fn short_side(&self) -> u32 {
        self.width.min(self.height)
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f64 / self.height as f64
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub candidate: Candidate,
    pub dimensions: Option<Dimensions>,
    pub sub_scores: BTreeMap<Criterion, f64>,
    /// Weighted sum of the sub-scores times `penalty_factor`, 0..100.
    pub total_score: f64,
    /// Multiplicative penalty in (0, 1]; 1.0 when none applies.
    pub penalty_factor: f64,
    pub verdict: Verdict,
    /// Raw pixel measurements behind the scores, for diagnostics.
    pub metrics: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_color: Option<Rgb>,
}

impl AnalysisResult {
    /// A rejected candidate: every listed criterion is recorded with a zero score.
    pub fn disqualified(
        candidate: Candidate,
        dimensions: Option<Dimensions>,
        criteria: &[(Criterion, f64)],
        reason: impl Into<String>,
    ) -> Self {
        Self {
            candidate,
            dimensions,
            sub_scores: criteria.iter().map(|(c, _)| (*c, 0.0)).collect(),
            total_score: 0.0,
            penalty_factor: 1.0,
            verdict: Verdict::Disqualified {
                reason: reason.into(),
            },
            metrics: BTreeMap::new(),
            dominant_color: None,
        }
    }

    /// A scored candidate. Sub-scores are clamped to 0..100; criteria without a sub-score count as 0.
    pub fn scored(
        candidate: Candidate,
        dimensions: Dimensions,
        weights: &[(Criterion, f64)],
        sub_scores: BTreeMap<Criterion, f64>,
        penalty_factor: f64,
    ) -> Self {
        let sub_scores: BTreeMap<Criterion, f64> = weights
            .iter()
            .map(|(criterion, _)| {
                let value = sub_scores.get(criterion).copied().unwrap_or(0.0);
                (*criterion, value.clamp(0.0, 100.0))
            })
            .collect();
        let weighted: f64 = weights.iter().map(|(c, w)| sub_scores[c] * w).sum();
        let penalty_factor = penalty_factor.clamp(f64::MIN_POSITIVE, 1.0);
        let total_score = (weighted * penalty_factor).clamp(0.0, 100.0);

        Self {
            candidate,
            dimensions: Some(dimensions),
            sub_scores,
            total_score,
            penalty_factor,
            verdict: Verdict::Admissible { score: total_score },
            metrics: BTreeMap::new(),
            dominant_color: None,
        }
    }

    pub fn with_metric(mut self, name: &str, value: f64) -> Self {
        self.metrics.insert(name.to_string(), value);
        self
    }

    pub fn with_dominant_color(mut self, color: Option<Rgb>) -> Self {
        self.dominant_color = color;
        self
    }

    /// Turns a scored result into a disqualification, zeroing every score.
    pub fn into_disqualified(mut self, reason: impl Into<String>) -> Self {
        for value in self.sub_scores.values_mut() {
            *value = 0.0;
        }
        self.total_score = 0.0;
        self.penalty_factor = 1.0;
        self.verdict = Verdict::Disqualified {
            reason: reason.into(),
        };
        self
    }

    pub fn is_disqualified(&self) -> bool {
        matches!(self.verdict, Verdict::Disqualified { .. })
    }

    pub fn disqualify_reason(&self) -> Option<&str> {
        match &self.verdict {
            Verdict::Disqualified { reason } => Some(reason),
            Verdict::Admissible { .. } => None,
        }
    }

    /// Not disqualified and at or above `min_score`.
    pub fn is_admissible(&self, min_score: f64) -> bool {
        !self.is_disqualified() && self.total_score >= min_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::candidate::SourceTag;

    const WEIGHTS: [(Criterion, f64); 2] = [(Criterion::Aspect, 0.25), (Criterion::Resolution, 0.75)];

    fn candidate() -> Candidate {
        Candidate::new("https://x.test/a.png", SourceTag::Favicon)
    }

    #[test]
    fn scored_total_is_weighted_and_penalized() {
        let subs = BTreeMap::from([(Criterion::Aspect, 100.0), (Criterion::Resolution, 40.0)]);
        let dims = Dimensions { width: 10, height: 10 };
        let result = AnalysisResult::scored(candidate(), dims, &WEIGHTS, subs.clone(), 1.0);
        assert!((result.total_score - 55.0).abs() < 1e-9);

        let penalized = AnalysisResult::scored(candidate(), dims, &WEIGHTS, subs, 0.5);
        assert!((penalized.total_score - 27.5).abs() < 1e-9);
        assert_eq!(penalized.verdict, Verdict::Admissible { score: penalized.total_score });
    }

    #[test]
    fn disqualification_zeroes_everything() {
        let subs = BTreeMap::from([(Criterion::Aspect, 90.0), (Criterion::Resolution, 90.0)]);
        let dims = Dimensions { width: 10, height: 10 };
        let result = AnalysisResult::scored(candidate(), dims, &WEIGHTS, subs, 1.0).into_disqualified("portrait");
        assert_eq!(result.total_score, 0.0);
        assert!(result.sub_scores.values().all(|v| *v == 0.0));
        assert_eq!(result.disqualify_reason(), Some("portrait"));
        assert!(!result.is_admissible(0.0));

        let fresh = AnalysisResult::disqualified(candidate(), None, &WEIGHTS, "fetch failed");
        assert_eq!(fresh.sub_scores.len(), 2);
        assert!(fresh.sub_scores.values().all(|v| *v == 0.0));
    }

    #[test]
    fn missing_and_out_of_range_sub_scores_are_clamped() {
        let subs = BTreeMap::from([(Criterion::Aspect, 250.0)]);
        let dims = Dimensions { width: 3, height: 4 };
        let result = AnalysisResult::scored(candidate(), dims, &WEIGHTS, subs, 1.0);
        assert_eq!(result.sub_scores[&Criterion::Aspect], 100.0);
        assert_eq!(result.sub_scores[&Criterion::Resolution], 0.0);
        assert!((result.total_score - 25.0).abs() < 1e-9);
    }
}
