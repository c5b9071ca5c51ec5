// THEORY:
// Hero-image evaluation runs in three layers:
//
// 1.  `analyze_hero` (pure): hard gates, then the weighted score. A candidate passes
//     when no gate fired and the total reaches the pass threshold; only passing images
//     are classified as photo or text-heavy.
// 2.  `evaluate_hero` / `evaluate_fallback_heroes`: fetch and analyze one primary or a
//     ranked batch of secondary candidates. The batch is ranked by declared pixel area
//     (unknown sizes rank last, original order kept on ties), capped, evaluated
//     concurrently, and resolved in rank order: first photo, else best text-heavy.
// 3.  `select_hero`: the primary wins outright when it is a passing photo; otherwise the
//     fallback search runs and a text-heavy primary competes with its result on score.
//
// Nothing here errors. Every failure is a disqualified `AnalysisResult`, and when
// nothing passes the best-scoring rejection is kept for diagnostics.

use crate::assets::analysis::{AnalysisResult, Criterion, Dimensions};
use crate::assets::candidate::{Candidate, dedupe};
use crate::assets::fetch::{AssetFetcher, fetch_with_timeout};
use crate::assets::imaging;
use crate::config::{EngineConfig, HeroConfig};
use crate::core_modules::activity_grid::ActivityGrid;
use crate::core_modules::raster::{Raster, THUMBNAIL_SIZE};
use crate::core_modules::statistics::{FINE_BUCKET, edge_density, quantized_color_count};
use crate::hero::classifier::{Classification, ContentType, classify};
use futures::stream::{self, StreamExt};
use image::{DynamicImage, GenericImageView};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Edge density at which the edge sub-score saturates.
const EDGE_SCORE_CEILING: f64 = 30.0;

/// A passing hero image, its classification and its pixels.
#[derive(Debug)]
pub struct HeroPick {
    pub result: AnalysisResult,
    pub classification: Classification,
    pub image: DynamicImage,
}

impl HeroPick {
    pub fn is_photo(&self) -> bool {
        self.classification.content == ContentType::Photo
    }
}

#[derive(Debug, Default)]
pub struct HeroEvaluation {
    pub pick: Option<HeroPick>,
    /// Every evaluated candidate in evaluation order.
    pub evaluated: Vec<AnalysisResult>,
    /// Highest-scoring non-passing candidate when nothing was picked.
    pub best_rejected: Option<AnalysisResult>,
}

pub fn resolution_score(long_side: u32) -> f64 {
    match long_side {
        1920..=u32::MAX => 100.0,
        1200..=1919 => 85.0,
        800..=1199 => 70.0,
        400..=799 => 50.0,
        _ => 20.0,
    }
}

/// Square to mild landscape is ideal; very wide is penalized, never rejected.
pub fn aspect_fitness(aspect_ratio: f64) -> f64 {
    match aspect_ratio {
        a if (1.0..=1.8).contains(&a) => 100.0,
        a if a > 1.8 && a <= 2.5 => 75.0,
        a if a > 2.5 && a <= 3.5 => 50.0,
        a if a > 3.5 => 25.0,
        a if a >= 0.83 => 80.0,
        _ => 40.0,
    }
}

pub fn complexity_score(colors: usize) -> f64 {
    match colors {
        60.. => 100.0,
        30..=59 => 80.0,
        15..=29 => 55.0,
        _ => 30.0,
    }
}

pub fn area_score(area: u64) -> f64 {
    match area {
        2_000_000.. => 100.0,
        1_000_000..=1_999_999 => 85.0,
        500_000..=999_999 => 70.0,
        200_000..=499_999 => 50.0,
        _ => 25.0,
    }
}

/// Not disqualified and at or above the pass threshold.
pub fn passes(result: &AnalysisResult, config: &HeroConfig) -> bool {
    result.is_admissible(config.pass_threshold)
}

/// Gates, scores and (when passing) classifies a decoded hero image.
pub fn analyze_hero(
    candidate: Candidate,
    image: &DynamicImage,
    config: &HeroConfig,
) -> (AnalysisResult, Option<Classification>) {
    let weights = config.weights.entries();
    let (width, height) = image.dimensions();
    let dimensions = Dimensions { width, height };
    let reject = |candidate: Candidate, reason: String| {
        (
            AnalysisResult::disqualified(candidate, Some(dimensions), &weights, reason),
            None,
        )
    };

    if dimensions.long_side() < config.min_long_side {
        return reject(
            candidate,
            format!("long side {}px below {}", dimensions.long_side(), config.min_long_side),
        );
    }
    if dimensions.short_side() < config.min_short_side {
        return reject(
            candidate,
            format!("short side {}px below {}", dimensions.short_side(), config.min_short_side),
        );
    }
    if height as f64 > width as f64 * config.max_portrait_ratio {
        return reject(candidate, format!("portrait: {width}x{height}"));
    }

    let raster = Raster::thumbnail(image, THUMBNAIL_SIZE);
    let colors = quantized_color_count(&raster, FINE_BUCKET);
    let edge = edge_density(&raster);
    let spread = ActivityGrid::standard(&raster).active_spread();

    let gate = if colors < config.min_color_count {
        Some(format!("only {colors} colors, need {}", config.min_color_count))
    } else if edge < config.min_edge_density {
        Some(format!("edge density {edge:.1} below {:.1}", config.min_edge_density))
    } else if spread < config.min_spatial_spread {
        Some(format!("spatial spread {spread:.2} below {:.2}", config.min_spatial_spread))
    } else {
        None
    };
    if let Some(reason) = gate {
        let (result, _) = reject(candidate, reason);
        let result = result
            .with_metric("color_count", colors as f64)
            .with_metric("edge_density", edge)
            .with_metric("spatial_spread", spread);
        return (result, None);
    }

    let sub_scores = BTreeMap::from([
        (Criterion::Resolution, resolution_score(dimensions.long_side())),
        (Criterion::Aspect, aspect_fitness(dimensions.aspect_ratio())),
        (Criterion::Complexity, complexity_score(colors)),
        (Criterion::Area, area_score(dimensions.area())),
        (Criterion::EdgeDensity, (edge / EDGE_SCORE_CEILING * 100.0).min(100.0)),
        (Criterion::SpatialSpread, spread * 100.0),
    ]);
    let result = AnalysisResult::scored(candidate, dimensions, &weights, sub_scores, 1.0)
        .with_metric("color_count", colors as f64)
        .with_metric("edge_density", edge)
        .with_metric("spatial_spread", spread);

    if !passes(&result, config) {
        return (result, None);
    }
    let classification = classify(&raster, dimensions.aspect_ratio(), config);
    (result, Some(classification))
}

struct Evaluated {
    result: AnalysisResult,
    pick: Option<(Classification, DynamicImage)>,
}

async fn evaluate_candidate(candidate: Candidate, fetcher: &dyn AssetFetcher, config: &EngineConfig) -> Evaluated {
    let weights = config.hero.weights.entries();
    let reject = |candidate: Candidate, reason: String| {
        debug!(url = %candidate.url, %reason, "hero candidate disqualified");
        Evaluated {
            result: AnalysisResult::disqualified(candidate, None, &weights, reason),
            pick: None,
        }
    };

    let bytes = match fetch_with_timeout(fetcher, &candidate.url, config.fetch.timeout()).await {
        Ok(bytes) => bytes,
        Err(err) => return reject(candidate, err.to_string()),
    };

    let hero_config = config.hero.clone();
    let task_candidate = candidate.clone();
    let analysis = tokio::task::spawn_blocking(move || {
        imaging::decode(&bytes).map(|image| {
            let (result, classification) = analyze_hero(task_candidate, &image, &hero_config);
            (result, classification.map(|c| (c, image)))
        })
    })
    .await;

    match analysis {
        Ok(Ok((result, pick))) => {
            debug!(
                url = %result.candidate.url,
                score = result.total_score,
                passed = pick.is_some(),
                content = ?pick.as_ref().map(|(c, _)| c.content),
                "hero candidate evaluated"
            );
            Evaluated { result, pick }
        }
        Ok(Err(err)) => reject(candidate, err.to_string()),
        Err(join_err) => reject(candidate, crate::error::AssetError::from(join_err).to_string()),
    }
}

fn into_evaluation(evaluated: Vec<Evaluated>) -> HeroEvaluation {
    let mut results = Vec::with_capacity(evaluated.len());
    let mut photo: Option<HeroPick> = None;
    let mut text_heavy: Option<HeroPick> = None;

    for item in evaluated {
        results.push(item.result.clone());
        let Some((classification, image)) = item.pick else { continue };
        let pick = HeroPick {
            result: item.result,
            classification,
            image,
        };
        if pick.is_photo() {
            if photo.is_none() {
                photo = Some(pick);
            }
        } else if text_heavy
            .as_ref()
            .is_none_or(|best| pick.result.total_score > best.result.total_score)
        {
            text_heavy = Some(pick);
        }
    }

    let pick = photo.or(text_heavy);
    let best_rejected = if pick.is_some() { None } else { best_scoring(&results) };
    HeroEvaluation {
        pick,
        evaluated: results,
        best_rejected,
    }
}

fn best_scoring(results: &[AnalysisResult]) -> Option<AnalysisResult> {
    results
        .iter()
        .fold(None, |best: Option<&AnalysisResult>, r| match best {
            Some(b) if b.total_score >= r.total_score => Some(b),
            _ => Some(r),
        })
        .cloned()
}

/// Evaluates the primary hero candidate, if there is one.
pub async fn evaluate_hero(
    primary: Option<Candidate>,
    fetcher: &dyn AssetFetcher,
    config: &EngineConfig,
) -> HeroEvaluation {
    match primary {
        Some(candidate) => into_evaluation(vec![evaluate_candidate(candidate, fetcher, config).await]),
        None => HeroEvaluation::default(),
    }
}

/// Ranks secondary candidates by declared area and evaluates the largest few.
pub fn rank_fallbacks(candidates: &[Candidate], exclude_url: Option<&str>, limit: usize) -> Vec<Candidate> {
    let mut ranked: Vec<Candidate> = dedupe(candidates.iter().cloned())
        .into_iter()
        .filter(|c| Some(c.url.as_str()) != exclude_url)
        .collect();
    ranked.sort_by_key(|c| std::cmp::Reverse(c.declared_area()));
    ranked.truncate(limit);
    ranked
}

pub async fn evaluate_fallback_heroes(
    candidates: &[Candidate],
    exclude_url: Option<&str>,
    fetcher: &dyn AssetFetcher,
    config: &EngineConfig,
) -> HeroEvaluation {
    let ranked = rank_fallbacks(candidates, exclude_url, config.hero.max_fallback_candidates);
    let evaluated: Vec<Evaluated> = stream::iter(ranked)
        .map(|candidate| evaluate_candidate(candidate, fetcher, config))
        .buffered(config.fetch.max_concurrent.max(1))
        .collect()
        .await;
    into_evaluation(evaluated)
}

/// A photo fallback beats a text-heavy primary; two text-heavy picks compete on score and
/// the fallback must score strictly higher to win.
fn prefer_pick(primary: Option<HeroPick>, fallback: Option<HeroPick>) -> Option<HeroPick> {
    match (primary, fallback) {
        (Some(primary), _) if primary.is_photo() => Some(primary),
        (_, Some(found)) if found.is_photo() => Some(found),
        (Some(primary), Some(found)) => {
            if found.result.total_score > primary.result.total_score {
                Some(found)
            } else {
                Some(primary)
            }
        }
        (primary, found) => primary.or(found),
    }
}

#[instrument(skip_all, fields(primary = primary.as_ref().map(|c| c.url.as_str()).unwrap_or(""), candidates = candidates.len()))]
pub async fn select_hero(
    primary: Option<Candidate>,
    candidates: &[Candidate],
    fetcher: &dyn AssetFetcher,
    config: &EngineConfig,
) -> HeroEvaluation {
    let exclude = primary.as_ref().map(|c| c.url.clone());
    let first = evaluate_hero(primary, fetcher, config).await;
    if first.pick.as_ref().is_some_and(HeroPick::is_photo) {
        info!("primary hero image is a photo");
        return first;
    }

    let fallback = evaluate_fallback_heroes(candidates, exclude.as_deref(), fetcher, config).await;
    let pick = prefer_pick(first.pick, fallback.pick);

    let mut evaluated = first.evaluated;
    evaluated.extend(fallback.evaluated);
    let best_rejected = if pick.is_some() { None } else { best_scoring(&evaluated) };
    match &pick {
        Some(p) => info!(url = %p.result.candidate.url, content = ?p.classification.content, "hero image selected"),
        None => info!(evaluated = evaluated.len(), "no hero image passed"),
    }
    HeroEvaluation {
        pick,
        evaluated,
        best_rejected,
    }
}
