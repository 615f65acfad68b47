//! Ranking scores for facet values
//!
//! Three independent scores trade raw average rating against the number of
//! films behind it:
//! - weighted: `avg * ln(count + 1)`
//! - Bayesian: shrinks toward a prior mean of 3.0 with strength 3
//! - Wilson: 95% lower confidence bound on `avg / 5`, rescaled to 0..=5

use serde::Serialize;

use super::facets::FacetAggregate;

/// Prior strength for the Bayesian average
pub const BAYESIAN_PRIOR_WEIGHT: f64 = 3.0;

/// Prior mean rating for the Bayesian average
pub const BAYESIAN_PRIOR_MEAN: f64 = 3.0;

/// z-value for a 95% confidence Wilson interval
pub const WILSON_Z: f64 = 1.96;

const MAX_RATING: f64 = 5.0;

pub fn weighted_score(avg_rating: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    avg_rating * (count as f64 + 1.0).ln()
}

pub fn bayesian_score(avg_rating: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let n = count as f64;
    (n * avg_rating + BAYESIAN_PRIOR_WEIGHT * BAYESIAN_PRIOR_MEAN) / (n + BAYESIAN_PRIOR_WEIGHT)
}

pub fn wilson_score(avg_rating: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let n = count as f64;
    let p = (avg_rating / MAX_RATING).clamp(0.0, 1.0);
    let z2 = WILSON_Z * WILSON_Z;

    let denominator = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denominator;
    let margin = WILSON_Z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denominator;

    ((center - margin) * MAX_RATING).clamp(0.0, MAX_RATING)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMethod {
    Weighted,
    Bayesian,
    Wilson,
}

impl RankingMethod {
    pub fn score(self, avg_rating: f64, count: usize) -> f64 {
        match self {
            Self::Weighted => weighted_score(avg_rating, count),
            Self::Bayesian => bayesian_score(avg_rating, count),
            Self::Wilson => wilson_score(avg_rating, count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedItem {
    pub name: String,
    pub score: f64,
    pub count: usize,
    pub avg_rating: f64,
}

/// Top `n` items of `aggregate` under `method`, highest score first.
///
/// Items without an average rating are left out. Equal scores keep the
/// aggregate's first-seen order.
pub fn rank(aggregate: &FacetAggregate, method: RankingMethod, n: usize) -> Vec<RankedItem> {
    let mut ranked: Vec<RankedItem> = aggregate
        .items()
        .iter()
        .filter_map(|item| {
            let avg_rating = item.avg_rating()?;
            Some(RankedItem {
                name: item.name.clone(),
                score: method.score(avg_rating, item.count),
                count: item.count,
                avg_rating,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(n);
    ranked
}

/// The three parallel rankings reported for every facet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingTriple {
    pub weighted: Vec<RankedItem>,
    pub bayesian: Vec<RankedItem>,
    pub wilson: Vec<RankedItem>,
}

impl RankingTriple {
    pub fn from_aggregate(aggregate: &FacetAggregate, n: usize) -> Self {
        Self {
            weighted: rank(aggregate, RankingMethod::Weighted, n),
            bayesian: rank(aggregate, RankingMethod::Bayesian, n),
            wilson: rank(aggregate, RankingMethod::Wilson, n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DiaryRecord, PartialRecord};
    use crate::stats::facets::Facet;

    const EPS: f64 = 1e-9;

    #[test]
    fn reference_values() {
        assert!((weighted_score(4.0, 5) - 4.0 * 6f64.ln()).abs() < EPS);
        assert!((weighted_score(4.0, 5) - 7.167).abs() < 1e-3);
        assert!((bayesian_score(4.0, 5) - 3.625).abs() < EPS);

        let wilson = wilson_score(4.0, 5);
        assert!(wilson > 0.0 && wilson < 4.0);
    }

    #[test]
    fn zero_count_scores_zero() {
        for method in [RankingMethod::Weighted, RankingMethod::Bayesian, RankingMethod::Wilson] {
            assert_eq!(method.score(4.5, 0), 0.0);
        }
    }

    #[test]
    fn wilson_rewards_volume() {
        assert!(wilson_score(4.0, 50) > wilson_score(4.0, 5));
        assert!(wilson_score(5.0, 1) < wilson_score(4.0, 30));
    }

    #[test]
    fn wilson_stays_in_range() {
        assert!(wilson_score(0.0, 3) < EPS);
        assert!(wilson_score(5.0, 10_000) <= MAX_RATING);
    }

    fn with_director(title: &str, rating: Option<f64>, director: &str) -> DiaryRecord {
        let mut record = DiaryRecord::new(title).unwrap();
        record.rating = rating;
        record.enrichment.absorb(PartialRecord {
            directors: vec![director.into()],
            ..Default::default()
        });
        record
    }

    #[test]
    fn ranking_excludes_unrated_and_orders_by_score() {
        let records = [
            with_director("A", Some(3.0), "Mann"),
            with_director("B", Some(5.0), "Scott"),
            with_director("C", Some(3.0), "Mann"),
            with_director("D", None, "Lynch"),
        ];
        let canonical: Vec<&DiaryRecord> = records.iter().collect();
        let aggregate = FacetAggregate::build(Facet::Directors, &canonical);
        let triple = RankingTriple::from_aggregate(&aggregate, 10);

        assert_eq!(triple.weighted.len(), 2);
        assert!(triple.weighted.iter().all(|item| item.name != "Lynch"));
        assert_eq!(triple.bayesian[0].name, "Scott");
        assert_eq!(triple.bayesian[0].avg_rating, 5.0);
    }

    #[test]
    fn equal_scores_keep_first_seen_order() {
        let records = [
            with_director("A", Some(4.0), "Second"),
            with_director("B", Some(4.0), "First"),
        ];
        let canonical: Vec<&DiaryRecord> = records.iter().collect();
        let aggregate = FacetAggregate::build(Facet::Directors, &canonical);
        let ranked = rank(&aggregate, RankingMethod::Weighted, 1);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "Second");
    }
}
