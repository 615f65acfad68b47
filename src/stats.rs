//! Statistics module - Aggregation engine over enriched diary records
//!
//! Every operation here is pure and deterministic. Statistics are computed
//! over two views produced by [`dedup::deduplicate`]:
//! - the full diary (every entry, rewatches included)
//! - the canonical set (one best-rated record per title)

pub mod dedup;
pub mod facets;
pub mod rewatch;
pub mod scoring;
pub mod summary;
pub mod timeline;
pub mod variance;

use serde::Serialize;
use tracing::debug;

use crate::domain::DiaryRecord;
use crate::infrastructure::config::StatsConfig;

pub use dedup::{RecordSets, deduplicate};
pub use facets::{ActorEntry, CountEntry, Facet, FacetAggregate, FacetItem};
pub use rewatch::RewatchEntry;
pub use scoring::{RankedItem, RankingMethod, RankingTriple};
pub use summary::{DecadeStats, RuntimeStats};
pub use timeline::{Milestone, TimelinePoint, WeekdayStats};
pub use variance::{DirectorVariance, VarianceMovie};

/// One value per facet, serialized under the facet's name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerFacet<T> {
    pub genres: T,
    pub actors: T,
    pub directors: T,
    pub writers: T,
    pub editors: T,
    pub cinematographers: T,
    pub studios: T,
    pub languages: T,
}

impl<T> PerFacet<T> {
    pub fn build(mut f: impl FnMut(Facet) -> T) -> Self {
        Self {
            genres: f(Facet::Genres),
            actors: f(Facet::Actors),
            directors: f(Facet::Directors),
            writers: f(Facet::Writers),
            editors: f(Facet::Editors),
            cinematographers: f(Facet::Cinematographers),
            studios: f(Facet::Studios),
            languages: f(Facet::Languages),
        }
    }

    pub fn get(&self, facet: Facet) -> &T {
        match facet {
            Facet::Genres => &self.genres,
            Facet::Actors => &self.actors,
            Facet::Directors => &self.directors,
            Facet::Writers => &self.writers,
            Facet::Editors => &self.editors,
            Facet::Cinematographers => &self.cinematographers,
            Facet::Studios => &self.studios,
            Facet::Languages => &self.languages,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> PerFacet<U> {
        PerFacet::build(|facet| f(self.get(facet)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolarizingTakes {
    pub top_variance_movies: Vec<VarianceMovie>,
    pub top_overhyped_directors: Vec<DirectorVariance>,
    pub top_underhyped_directors: Vec<DirectorVariance>,
}

/// Everything the aggregation engine derives from one diary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiaryStatistics {
    pub total_films: usize,
    pub unique_films: usize,
    /// Distinct values per facet
    pub aggregate_counts: PerFacet<usize>,
    #[serde(flatten)]
    pub rankings: PerFacet<RankingTriple>,
    pub most_watched: PerFacet<Vec<CountEntry>>,
    pub day_of_week: Vec<WeekdayStats>,
    pub top_rewatched: Vec<RewatchEntry>,
    pub polarizing_takes: PolarizingTakes,
    pub actors_detailed: Vec<ActorEntry>,
    pub watch_timeline: Vec<TimelinePoint>,
    pub runtime_stats: Option<RuntimeStats>,
    pub decade_stats: DecadeStats,
    pub average_film_age: Option<f64>,
    pub average_rating: Option<f64>,
    pub milestones: Vec<Milestone>,
}

/// Computes [`DiaryStatistics`] with the configured thresholds.
#[derive(Debug, Clone, Default)]
pub struct AggregationEngine {
    config: StatsConfig,
}

impl AggregationEngine {
    pub fn new(config: StatsConfig) -> Self {
        Self { config }
    }

    pub fn aggregate(&self, records: &[DiaryRecord]) -> DiaryStatistics {
        let sets = deduplicate(records);
        debug!(
            "Aggregating {} diary entries ({} unique titles)",
            sets.total(),
            sets.unique()
        );

        let aggregates = PerFacet::build(|facet| FacetAggregate::build(facet, &sets.canonical));
        let directors = variance::director_variances(&sets.canonical);
        let cfg = &self.config;

        DiaryStatistics {
            total_films: sets.total(),
            unique_films: sets.unique(),
            aggregate_counts: aggregates.map(FacetAggregate::len),
            rankings: aggregates.map(|aggregate| RankingTriple::from_aggregate(aggregate, cfg.top_n)),
            most_watched: aggregates.map(|aggregate| aggregate.top_by_count(cfg.top_n)),
            day_of_week: timeline::day_of_week_stats(sets.full),
            top_rewatched: rewatch::top_rewatched(&sets, cfg.rewatch_top_n),
            polarizing_takes: PolarizingTakes {
                top_variance_movies: variance::top_variance_movies(&sets.canonical, cfg.variance_top_n),
                top_overhyped_directors: variance::top_overhyped_directors(
                    &directors,
                    cfg.variance_top_n,
                    cfg.overhyped_min_films,
                ),
                top_underhyped_directors: variance::top_underhyped_directors(
                    &directors,
                    cfg.variance_top_n,
                    cfg.underhyped_min_films,
                ),
            },
            actors_detailed: facets::actor_index(&sets.canonical, cfg.actor_index_limit),
            watch_timeline: timeline::cumulative_timeline(sets.full),
            runtime_stats: summary::runtime_stats(&sets),
            decade_stats: summary::decade_stats(&sets.canonical, cfg.favorite_decade_min_films),
            average_film_age: summary::average_film_age(sets.full),
            average_rating: summary::average_rating(&sets.canonical),
            milestones: timeline::milestones(sets.full, &cfg.milestone_positions),
        }
    }
}
