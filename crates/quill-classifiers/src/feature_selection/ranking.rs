//! Scoring feature groups one at a time.
use rayon::prelude::*;

use crate::error::Result;
use crate::feature_selection::SubsetScorer;
use crate::report::{FeatureRanking, FeatureScore};

/// Precision of every group on its own, best first.
pub fn rank_features_solo<C: SubsetScorer + ?Sized>(
    scorer: &C,
    groups: &[String],
) -> Result<FeatureRanking> {
    let mut ranking: Vec<FeatureScore> = groups
        .par_iter()
        .map(|g| {
            Ok(FeatureScore {
                group: g.clone(),
                score: scorer.score(std::slice::from_ref(g))?,
            })
        })
        .collect::<Result<_>>()?;
    ranking.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(FeatureRanking {
        method: "solo".to_string(),
        baseline: None,
        ranking,
    })
}

/// Change in precision when each group is dropped from the full set,
/// ascending: groups whose removal hurts most come first.
pub fn rank_features_dropout<C: SubsetScorer + ?Sized>(
    scorer: &C,
    groups: &[String],
) -> Result<FeatureRanking> {
    let baseline = scorer.score(groups)?;
    log::info!("Base precision: {:.4}", baseline);

    let mut ranking: Vec<FeatureScore> = groups
        .par_iter()
        .map(|dropped| {
            let rest: Vec<String> = groups.iter().filter(|g| *g != dropped).cloned().collect();
            Ok(FeatureScore {
                group: dropped.clone(),
                score: scorer.score(&rest)? - baseline,
            })
        })
        .collect::<Result<_>>()?;
    ranking.sort_by(|a, b| a.score.total_cmp(&b.score));
    Ok(FeatureRanking {
        method: "dropout".to_string(),
        baseline: Some(baseline),
        ranking,
    })
}
