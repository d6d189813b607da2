//! `CodepointPredictor` (spec §4.6): predicts codepoints a client is likely to need next, so the
//! server can bundle them into the current response instead of waiting for a follow-up request.
//!
//! The original `FrequencyCodepointPredictor` (`frequency_codepoint_predictor.cc`) is an
//! unimplemented stub; the selection algorithm here is built directly from a fully worked-out
//! description of the intended behaviour rather than ported from C++.

use std::collections::BTreeMap;

use crate::codepoint_set::CodepointSet;

/// A single subset of a slicing strategy: a partition cell of Unicode, annotated with an
/// observed usage count per codepoint. Membership is exactly the key set.
#[derive(Debug, Clone, Default)]
pub struct FrequencySubset {
    pub counts: BTreeMap<u32, u32>,
}

impl FrequencySubset {
    pub fn new(counts: BTreeMap<u32, u32>) -> Self {
        FrequencySubset { counts }
    }

    fn intersects(&self, set: &CodepointSet) -> bool {
        self.counts.keys().any(|cp| set.contains(*cp))
    }
}

/// A full partition of Unicode into [`FrequencySubset`]s, identified by a stable id used to
/// break ties deterministically when two strategies fit a font equally well.
#[derive(Debug, Clone, Default)]
pub struct SlicingStrategy {
    pub id: u32,
    pub subsets: Vec<FrequencySubset>,
}

impl SlicingStrategy {
    fn distinct_codepoints(&self) -> CodepointSet {
        self.subsets
            .iter()
            .flat_map(|subset| subset.counts.keys().copied())
            .collect()
    }
}

/// Predicts additional codepoints a client is likely to need, given the font's full codepoint
/// set, what the client already has, and what it just asked for.
pub trait CodepointPredictor {
    fn predict(
        &self,
        font_codepoints: &CodepointSet,
        have: &CodepointSet,
        requested: &CodepointSet,
        max: usize,
    ) -> CodepointSet;
}

/// Predicts nothing; used when no corpus of usage data is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCodepointPredictor;

impl CodepointPredictor for NoopCodepointPredictor {
    fn predict(
        &self,
        _font_codepoints: &CodepointSet,
        _have: &CodepointSet,
        _requested: &CodepointSet,
        _max: usize,
    ) -> CodepointSet {
        CodepointSet::empty()
    }
}

/// Predicts using a precomputed corpus of slicing strategies.
pub struct FrequencyCodepointPredictor {
    strategies: Vec<SlicingStrategy>,
    min_freq: f64,
}

impl FrequencyCodepointPredictor {
    pub fn new(strategies: Vec<SlicingStrategy>, min_freq: f64) -> Self {
        FrequencyCodepointPredictor {
            strategies,
            min_freq,
        }
    }

    /// The strategy whose distinct-codepoint intersection with `font_codepoints` is largest,
    /// breaking ties by the smallest strategy id.
    fn best_strategy(&self, font_codepoints: &CodepointSet) -> Option<&SlicingStrategy> {
        let mut best: Option<(&SlicingStrategy, usize)> = None;
        for strategy in &self.strategies {
            let intersection_size = strategy
                .distinct_codepoints()
                .intersection(font_codepoints)
                .len();
            best = Some(match best {
                None => (strategy, intersection_size),
                Some((best_strategy, best_size)) => {
                    if intersection_size > best_size
                        || (intersection_size == best_size && strategy.id < best_strategy.id)
                    {
                        (strategy, intersection_size)
                    } else {
                        (best_strategy, best_size)
                    }
                }
            });
        }
        best.map(|(strategy, _)| strategy)
    }
}

impl CodepointPredictor for FrequencyCodepointPredictor {
    fn predict(
        &self,
        font_codepoints: &CodepointSet,
        have: &CodepointSet,
        requested: &CodepointSet,
        max: usize,
    ) -> CodepointSet {
        let Some(strategy) = self.best_strategy(font_codepoints) else {
            return CodepointSet::empty();
        };

        let max_count = strategy
            .subsets
            .iter()
            .filter(|subset| subset.intersects(requested) || subset.intersects(font_codepoints))
            .flat_map(|subset| subset.counts.values().copied())
            .max()
            .unwrap_or(0);
        if max_count == 0 {
            return CodepointSet::empty();
        }

        let mut candidates: Vec<(u32, u32)> = Vec::new(); // (count, codepoint)
        for subset in strategy.subsets.iter().filter(|s| s.intersects(requested)) {
            for (&cp, &count) in &subset.counts {
                if requested.contains(cp) || have.contains(cp) || !font_codepoints.contains(cp) {
                    continue;
                }
                if count as f64 / max_count as f64 >= self.min_freq {
                    candidates.push((count, cp));
                }
            }
        }

        candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        candidates.truncate(max);
        candidates.into_iter().map(|(_, cp)| cp).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subset(pairs: &[(u32, u32)]) -> FrequencySubset {
        FrequencySubset::new(pairs.iter().copied().collect())
    }

    fn codepoints(values: impl IntoIterator<Item = u32>) -> CodepointSet {
        values.into_iter().collect()
    }

    #[test]
    fn noop_predicts_nothing() {
        let font = codepoints([1, 2, 3]);
        let predicted =
            NoopCodepointPredictor.predict(&font, &CodepointSet::empty(), &codepoints([1]), 5);
        assert!(predicted.is_empty());
    }

    #[test]
    fn frequency_ranks_by_count_then_codepoint() {
        // Single strategy, single subset covering {1,2,3,4}; 2 is requested.
        let strategy = SlicingStrategy {
            id: 0,
            subsets: vec![subset(&[(1, 10), (2, 100), (3, 50), (4, 50)])],
        };
        let predictor = FrequencyCodepointPredictor::new(vec![strategy], 0.1);

        let font = codepoints([1, 2, 3, 4]);
        let predicted = predictor.predict(&font, &CodepointSet::empty(), &codepoints([2]), 2);

        // 3 and 4 tie on count (50); codepoint 3 wins the tie-break.
        assert_eq!(predicted, codepoints([3, 4]));
    }

    #[test]
    fn excludes_have_and_requested_and_low_frequency() {
        let strategy = SlicingStrategy {
            id: 0,
            subsets: vec![subset(&[(1, 100), (2, 100), (3, 1), (4, 100)])],
        };
        let predictor = FrequencyCodepointPredictor::new(vec![strategy], 0.5);

        let font = codepoints([1, 2, 3, 4]);
        let have = codepoints([4]);
        let requested = codepoints([1]);
        let predicted = predictor.predict(&font, &have, &requested, 10);

        // 1 excluded (requested), 4 excluded (have), 3 excluded (below min_freq), leaves only 2.
        assert_eq!(predicted, codepoints([2]));
    }

    #[test]
    fn picks_strategy_with_largest_font_intersection_smallest_id_on_tie() {
        let a = SlicingStrategy {
            id: 5,
            subsets: vec![subset(&[(1, 10), (2, 10)])],
        };
        let b = SlicingStrategy {
            id: 1,
            subsets: vec![subset(&[(1, 10), (2, 10)])],
        };
        let predictor = FrequencyCodepointPredictor::new(vec![a, b], 0.0);

        let font = codepoints([1, 2]);
        let best = predictor.best_strategy(&font).unwrap();
        assert_eq!(best.id, 1);
    }

    #[test]
    fn respects_max_budget() {
        let strategy = SlicingStrategy {
            id: 0,
            subsets: vec![subset(&[(1, 30), (2, 20), (3, 10)])],
        };
        let predictor = FrequencyCodepointPredictor::new(vec![strategy], 0.0);

        let font = codepoints([1, 2, 3]);
        let predicted = predictor.predict(&font, &CodepointSet::empty(), &codepoints([1]), 1);
        assert_eq!(predicted.len(), 1);
        assert_eq!(predicted, codepoints([2]));
    }
}
