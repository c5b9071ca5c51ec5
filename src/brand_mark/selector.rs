// THEORY:
// Selection policy over fully evaluated candidates. Scoring never short-circuits: every
// gathered candidate is evaluated (concurrently, results kept in input order) before
// `choose_winner` looks at a single verdict. The policy is:
//
// 1.  Only admissible candidates (not disqualified, score >= min viable) compete.
// 2.  Highest score wins; equal scores keep the earlier candidate.
// 3.  A non-favicon winner must beat an admissible favicon by at least the preference
//     buffer, otherwise the favicon is kept.
//
// The winner is then normalized to a square PNG. If that fails the selection is turned
// into a fallback so callers never receive a winner without a mark.

use crate::assets::analysis::AnalysisResult;
use crate::assets::candidate::{Candidate, SourceTag, dedupe};
use crate::assets::fetch::AssetFetcher;
use crate::brand_mark::evaluator::{EvaluatedMark, evaluate_brand_candidate};
use crate::brand_mark::normalize::normalized_mark_data_url;
use crate::config::{BrandMarkConfig, EngineConfig};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Outcome of the brand-mark pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionResult {
    /// The chosen candidate; `None` exactly when `fallback` is set.
    pub winner: Option<AnalysisResult>,
    /// Every gathered candidate, in gather order.
    pub all_evaluated: Vec<AnalysisResult>,
    pub fallback: bool,
    /// Human-readable decision trail.
    pub log: Vec<String>,
    /// The winner normalized to a square PNG `data:` URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark: Option<String>,
}

impl SelectionResult {
    fn fallback(all_evaluated: Vec<AnalysisResult>, mut log: Vec<String>, reason: String) -> Self {
        log.push(reason);
        Self {
            winner: None,
            all_evaluated,
            fallback: true,
            log,
            mark: None,
        }
    }

    /// The evaluated result for a source, if one was gathered.
    pub fn result_for(&self, source: SourceTag) -> Option<&AnalysisResult> {
        self.all_evaluated.iter().find(|r| r.candidate.source == source)
    }
}

/// Favicon, then up to `max_manifest_icons` manifest icons, then the logo; deduplicated.
pub fn gather_candidates(
    favicon: Option<&str>,
    logo: Option<&str>,
    manifest_icons: &[String],
    config: &BrandMarkConfig,
) -> Vec<Candidate> {
    let favicon = favicon.map(|url| Candidate::new(url, SourceTag::Favicon));
    let manifest = manifest_icons
        .iter()
        .filter(|url| !url.trim().is_empty())
        .take(config.max_manifest_icons)
        .map(|url| Candidate::new(url.as_str(), SourceTag::ManifestIcon));
    let logo = logo.map(|url| Candidate::new(url, SourceTag::Logo));
    dedupe(favicon.into_iter().chain(manifest).chain(logo))
}

/// Index of the winning result, applying the favicon preference buffer.
pub fn choose_winner(results: &[AnalysisResult], config: &BrandMarkConfig) -> Option<usize> {
    let admissible: Vec<usize> = (0..results.len())
        .filter(|&i| results[i].is_admissible(config.min_viable_score))
        .collect();

    let best = best_of(results, admissible.iter().copied())?;
    if results[best].candidate.source == SourceTag::Favicon {
        return Some(best);
    }
    let favicon = best_of(
        results,
        admissible
            .iter()
            .copied()
            .filter(|&i| results[i].candidate.source == SourceTag::Favicon),
    );
    match favicon {
        Some(f) if results[best].total_score - results[f].total_score < config.favicon_preference_buffer => Some(f),
        _ => Some(best),
    }
}

/// Highest-scoring index; ties keep the earlier one.
fn best_of(results: &[AnalysisResult], indices: impl Iterator<Item = usize>) -> Option<usize> {
    indices.fold(None, |best: Option<usize>, i| match best {
        Some(b) if results[b].total_score >= results[i].total_score => Some(b),
        _ => Some(i),
    })
}

#[instrument(skip_all, fields(favicon = favicon.unwrap_or(""), logo = logo.unwrap_or("")))]
pub async fn select_brand_mark(
    favicon: Option<&str>,
    logo: Option<&str>,
    manifest_icons: &[String],
    fetcher: &dyn AssetFetcher,
    config: &EngineConfig,
) -> SelectionResult {
    let candidates = gather_candidates(favicon, logo, manifest_icons, &config.brand_mark);
    if candidates.is_empty() {
        return SelectionResult::fallback(Vec::new(), Vec::new(), "no brand-mark candidates".to_string());
    }

    let evaluated: Vec<EvaluatedMark> = stream::iter(candidates)
        .map(|candidate| evaluate_brand_candidate(candidate, fetcher, config))
        .buffered(config.fetch.max_concurrent.max(1))
        .collect()
        .await;

    let mut log: Vec<String> = evaluated
        .iter()
        .map(|e| match e.result.disqualify_reason() {
            Some(reason) => format!("{:?} {}: disqualified ({reason})", e.result.candidate.source, e.result.candidate.url),
            None => format!(
                "{:?} {}: score {:.1}",
                e.result.candidate.source, e.result.candidate.url, e.result.total_score
            ),
        })
        .collect();

    let results: Vec<AnalysisResult> = evaluated.iter().map(|e| e.result.clone()).collect();
    let Some(index) = choose_winner(&results, &config.brand_mark) else {
        info!("no admissible brand mark, falling back to initials");
        return SelectionResult::fallback(
            results,
            log,
            format!("no candidate reached {:.0}", config.brand_mark.min_viable_score),
        );
    };

    let winner = &evaluated[index];
    let Some(image) = winner.image.as_ref() else {
        return SelectionResult::fallback(results, log, "winner has no pixels".to_string());
    };
    let mark = match normalized_mark_data_url(image, &config.brand_mark) {
        Ok(mark) => mark,
        Err(err) => {
            warn!(url = %winner.result.candidate.url, error = %err, "brand mark normalization failed");
            return SelectionResult::fallback(results, log, format!("normalization failed: {err}"));
        }
    };

    info!(
        url = %winner.result.candidate.url,
        source = ?winner.result.candidate.source,
        score = winner.result.total_score,
        "brand mark selected"
    );
    log.push(format!(
        "selected {:?} {}",
        winner.result.candidate.source, winner.result.candidate.url
    ));
    SelectionResult {
        winner: Some(winner.result.clone()),
        all_evaluated: results,
        fallback: false,
        log,
        mark: Some(mark),
    }
}

/// Up to two uppercase initials for the fallback monogram, e.g. "Acme Widgets" -> "AW".
pub fn initials(name: &str) -> String {
    let words: Vec<&str> = name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let letters: String = match words.as_slice() {
        [] => String::new(),
        [only] => only.chars().take(2).collect(),
        [first, .., last] => first.chars().take(1).chain(last.chars().take(1)).collect(),
    };
    letters.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::analysis::{Criterion, Dimensions};
    use std::collections::BTreeMap;

    fn scored(source: SourceTag, score: f64) -> AnalysisResult {
        AnalysisResult::scored(
            Candidate::new(format!("https://brand.test/{source:?}.png"), source),
            Dimensions { width: 64, height: 64 },
            &[(Criterion::Aspect, 1.0)],
            BTreeMap::from([(Criterion::Aspect, score)]),
            1.0,
        )
    }

    #[test]
    fn favicon_survives_a_narrow_loss() {
        let config = BrandMarkConfig::default();
        let results = vec![scored(SourceTag::Favicon, 60.0), scored(SourceTag::Logo, 70.0)];
        assert_eq!(choose_winner(&results, &config), Some(0));
    }

    #[test]
    fn clear_winner_beats_the_favicon() {
        let config = BrandMarkConfig::default();
        let results = vec![scored(SourceTag::Favicon, 60.0), scored(SourceTag::Logo, 80.0)];
        assert_eq!(choose_winner(&results, &config), Some(1));
    }

    #[test]
    fn below_minimum_means_no_winner() {
        let config = BrandMarkConfig::default();
        let results = vec![scored(SourceTag::Favicon, 39.0), scored(SourceTag::Logo, 20.0)];
        assert_eq!(choose_winner(&results, &config), None);
    }

    #[test]
    fn inadmissible_favicon_gets_no_preference() {
        let config = BrandMarkConfig::default();
        let results = vec![scored(SourceTag::Favicon, 30.0), scored(SourceTag::Logo, 41.0)];
        assert_eq!(choose_winner(&results, &config), Some(1));
    }

    #[test]
    fn gather_orders_and_caps_sources() {
        let config = BrandMarkConfig::default();
        let icons = vec![
            "https://a.test/192.png".to_string(),
            "https://a.test/favicon.ico".to_string(),
            "https://a.test/512.png".to_string(),
        ];
        let list = gather_candidates(Some("https://a.test/favicon.ico"), Some("https://a.test/logo.svg"), &icons, &config);
        let sources: Vec<SourceTag> = list.iter().map(|c| c.source).collect();
        assert_eq!(sources, vec![SourceTag::Favicon, SourceTag::ManifestIcon, SourceTag::Logo]);
    }

    #[test]
    fn initials_take_first_and_last_words() {
        assert_eq!(initials("Acme Widgets Inc"), "AI");
        assert_eq!(initials("stripe"), "ST");
        assert_eq!(initials("  "), "");
        assert_eq!(initials("north-west"), "NW");
    }

    #[tokio::test]
    async fn no_candidates_is_a_fallback() {
        let fetcher = crate::assets::fetch::MemoryFetcher::new();
        let result = select_brand_mark(None, None, &[], &fetcher, &EngineConfig::default()).await;
        assert!(result.fallback);
        assert!(result.winner.is_none());
        assert!(result.all_evaluated.is_empty());
    }
}
