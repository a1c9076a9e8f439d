//! Strict-greedy bottom-up and top-down search over feature groups.
//!
//! Every round scores all candidates before committing to the best one, and
//! only a strict improvement over the current precision is accepted. Both
//! searches therefore never lose precision and stop after at most one round
//! per group.
use rayon::prelude::*;

use crate::error::{EvalError, Result};
use crate::feature_selection::SubsetScorer;
use crate::report::{SelectionResult, SelectionStep};

/// Starting floor of a bottom-up search with nothing selected; any real
/// precision beats it.
pub const UNATTAINABLE_PRECISION: f64 = -1.0;

/// Current selection and the precision it achieved.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    pub selection: Vec<String>,
    pub precision: f64,
    pub steps: Vec<SelectionStep>,
    start_precision: f64,
}

impl SelectionState {
    fn new(selection: Vec<String>, precision: f64) -> Self {
        Self {
            selection,
            precision,
            steps: Vec::new(),
            start_precision: precision,
        }
    }

    pub fn start_precision(&self) -> f64 {
        self.start_precision
    }

    pub fn into_result(self, direction: &str) -> SelectionResult {
        SelectionResult {
            direction: direction.to_string(),
            start_precision: self.start_precision,
            precision: self.precision,
            selection: self.selection,
            steps: self.steps,
        }
    }
}

fn check_known(groups: &[String], names: &[String]) -> Result<()> {
    match names.iter().find(|n| !groups.contains(n)) {
        Some(unknown) => Err(EvalError::UnknownFeatureGroup(unknown.clone())),
        None => Ok(()),
    }
}

/// Score every candidate selection in parallel and return the index of the
/// best one that strictly beats `current`. The earliest candidate wins ties.
fn best_candidate<C: SubsetScorer + ?Sized>(
    scorer: &C,
    candidates: &[Vec<String>],
    current: f64,
) -> Result<Option<(usize, f64)>> {
    let scores: Vec<f64> = candidates
        .par_iter()
        .map(|selection| scorer.score(selection))
        .collect::<Result<_>>()?;

    let mut best: Option<(usize, f64)> = None;
    let mut best_precision = current;
    for (i, &precision) in scores.iter().enumerate() {
        if precision > best_precision {
            best_precision = precision;
            best = Some((i, precision));
        }
    }
    Ok(best)
}

/// Grow `seed` one group at a time, adding the group with the largest
/// strict improvement each round.
pub fn bottom_up<C: SubsetScorer + ?Sized>(
    scorer: &C,
    groups: &[String],
    seed: &[String],
) -> Result<SelectionState> {
    check_known(groups, seed)?;
    let mut left: Vec<String> = groups
        .iter()
        .filter(|g| !seed.contains(g))
        .cloned()
        .collect();

    let start = if seed.is_empty() {
        UNATTAINABLE_PRECISION
    } else {
        scorer.score(seed)?
    };
    log::info!("Bottom-up search: start precision {:.4}", start);
    let mut state = SelectionState::new(seed.to_vec(), start);

    while !left.is_empty() {
        let candidates: Vec<Vec<String>> = left
            .iter()
            .map(|g| {
                let mut next = state.selection.clone();
                next.push(g.clone());
                next
            })
            .collect();
        let Some((i, precision)) = best_candidate(scorer, &candidates, state.precision)? else {
            break;
        };
        let added = left.remove(i);
        log::info!("Found improvement: +{} ({:.4})", added, precision);
        state.selection.push(added.clone());
        state.precision = precision;
        state.steps.push(SelectionStep {
            group: added,
            precision,
        });
    }
    Ok(state)
}

/// Shrink `start` (all groups when `None`) one group at a time, removing the
/// group whose removal gives the largest strict improvement each round.
/// A selection is never reduced to nothing.
pub fn top_down<C: SubsetScorer + ?Sized>(
    scorer: &C,
    groups: &[String],
    start: Option<&[String]>,
) -> Result<SelectionState> {
    let selection: Vec<String> = match start {
        Some(names) => {
            check_known(groups, names)?;
            names.to_vec()
        }
        None => groups.to_vec(),
    };
    if selection.is_empty() {
        return Err(EvalError::EmptySelection);
    }

    let start = scorer.score(&selection)?;
    log::info!("Top-down search: start precision {:.4}", start);
    let mut state = SelectionState::new(selection, start);

    while state.selection.len() > 1 {
        let candidates: Vec<Vec<String>> = (0..state.selection.len())
            .map(|skip| {
                state
                    .selection
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != skip)
                    .map(|(_, g)| g.clone())
                    .collect()
            })
            .collect();
        let Some((i, precision)) = best_candidate(scorer, &candidates, state.precision)? else {
            break;
        };
        let removed = state.selection.remove(i);
        log::info!("Found improvement: -{} ({:.4})", removed, precision);
        state.precision = precision;
        state.steps.push(SelectionStep {
            group: removed,
            precision,
        });
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Additive toy scorer: each group contributes a fixed amount.
    struct Weights(HashMap<&'static str, f64>);

    impl SubsetScorer for Weights {
        fn score(&self, groups: &[String]) -> Result<f64> {
            Ok(groups.iter().map(|g| self.0[g.as_str()]).sum())
        }
    }

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn scorer() -> Weights {
        Weights(HashMap::from([("a", 0.3), ("b", -0.2), ("c", 0.5), ("d", 0.0)]))
    }

    #[test]
    fn bottom_up_adds_only_helpful_groups() {
        let groups = names(&["a", "b", "c", "d"]);
        let state = bottom_up(&scorer(), &groups, &[]).unwrap();
        assert_eq!(state.selection, names(&["c", "a"]));
        assert!((state.precision - 0.8).abs() < 1e-12);
        assert_eq!(state.start_precision(), UNATTAINABLE_PRECISION);
        assert_eq!(state.steps.len(), 2);
    }

    #[test]
    fn top_down_drops_harmful_groups() {
        let groups = names(&["a", "b", "c", "d"]);
        let state = top_down(&scorer(), &groups, None).unwrap();
        // dropping "d" is a tie and is not an improvement
        assert_eq!(state.selection, names(&["a", "c", "d"]));
        assert!(state.precision >= state.start_precision());
    }

    #[test]
    fn unknown_seed_group_is_rejected() {
        let groups = names(&["a"]);
        assert!(matches!(
            bottom_up(&scorer(), &groups, &names(&["zzz"])),
            Err(EvalError::UnknownFeatureGroup(_))
        ));
    }
}
