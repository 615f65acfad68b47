//! Personal vs. global rating variance: polarizing films and directors

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::DiaryRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VarianceDirection {
    Overrated,
    Underrated,
}

impl VarianceDirection {
    fn of(variance: f64) -> Self {
        if variance > 0.0 {
            Self::Overrated
        } else {
            Self::Underrated
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarianceMovie {
    pub movie: String,
    pub your_rating: f64,
    pub avg_rating: f64,
    pub variance: f64,
    pub direction: VarianceDirection,
}

/// Canonical films furthest from the global average, in either direction.
pub fn top_variance_movies(canonical: &[&DiaryRecord], n: usize) -> Vec<VarianceMovie> {
    let mut movies: Vec<VarianceMovie> = canonical
        .iter()
        .filter_map(|record| {
            let your_rating = record.rating?;
            let avg_rating = record.enrichment.avg_rating?;
            let variance = your_rating - avg_rating;
            Some(VarianceMovie {
                movie: record.title().to_string(),
                your_rating,
                avg_rating,
                variance,
                direction: VarianceDirection::of(variance),
            })
        })
        .collect();

    movies.sort_by(|a, b| b.variance.abs().total_cmp(&a.variance.abs()));
    movies.truncate(n);
    movies
}

/// Variance track record of one director
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectorVariance {
    pub director: String,
    pub avg_variance: f64,
    pub num_films: usize,
    /// `avg_variance * sqrt(num_films)`
    pub weighted_score: f64,
    #[serde(skip)]
    variances: Vec<f64>,
}

impl DirectorVariance {
    pub fn variances(&self) -> &[f64] {
        &self.variances
    }
}

/// One aggregate per director, in first-seen order. Only films with both a
/// personal and a global rating contribute.
pub fn director_variances(canonical: &[&DiaryRecord]) -> Vec<DirectorVariance> {
    let mut grouped: Vec<(String, Vec<f64>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in canonical {
        let Some(variance) = record.rating_variance() else {
            continue;
        };
        for director in &record.enrichment.directors {
            let slot = *index.entry(director.as_str()).or_insert_with(|| {
                grouped.push((director.clone(), Vec::new()));
                grouped.len() - 1
            });
            grouped[slot].1.push(variance);
        }
    }

    grouped
        .into_iter()
        .map(|(director, variances)| {
            let num_films = variances.len();
            let avg_variance = variances.iter().sum::<f64>() / num_films as f64;
            DirectorVariance {
                director,
                avg_variance,
                num_films,
                weighted_score: avg_variance * (num_films as f64).sqrt(),
                variances,
            }
        })
        .collect()
}

/// Directors rated furthest above the crowd, highest weighted score first.
pub fn top_overhyped_directors(
    directors: &[DirectorVariance],
    n: usize,
    min_films: usize,
) -> Vec<DirectorVariance> {
    let mut selected: Vec<DirectorVariance> = directors
        .iter()
        .filter(|entry| entry.num_films >= min_films)
        .cloned()
        .collect();
    selected.sort_by(|a, b| b.weighted_score.total_cmp(&a.weighted_score));
    selected.truncate(n);
    selected
}

/// Directors rated furthest below the crowd, lowest weighted score first.
pub fn top_underhyped_directors(
    directors: &[DirectorVariance],
    n: usize,
    min_films: usize,
) -> Vec<DirectorVariance> {
    let mut selected: Vec<DirectorVariance> = directors
        .iter()
        .filter(|entry| entry.num_films >= min_films)
        .cloned()
        .collect();
    selected.sort_by(|a, b| a.weighted_score.total_cmp(&b.weighted_score));
    selected.truncate(n);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PartialRecord;

    fn film(title: &str, mine: Option<f64>, global: Option<f64>, director: &str) -> DiaryRecord {
        let mut record = DiaryRecord::new(title).unwrap();
        record.rating = mine;
        record.enrichment.absorb(PartialRecord {
            avg_rating: global,
            directors: vec![director.into()],
            ..Default::default()
        });
        record
    }

    #[test]
    fn movies_sorted_by_absolute_variance() {
        let records = [
            film("Mild", Some(3.5), Some(3.0), "A"),
            film("Hated", Some(1.0), Some(4.2), "B"),
            film("Loved", Some(5.0), Some(3.1), "C"),
            film("Unrated", None, Some(3.0), "D"),
        ];
        let canonical: Vec<&DiaryRecord> = records.iter().collect();
        let movies = top_variance_movies(&canonical, 10);

        let titles: Vec<&str> = movies.iter().map(|m| m.movie.as_str()).collect();
        assert_eq!(titles, vec!["Hated", "Loved", "Mild"]);
        assert_eq!(movies[0].direction, VarianceDirection::Underrated);
        assert_eq!(movies[1].direction, VarianceDirection::Overrated);
    }

    #[test]
    fn zero_variance_counts_as_underrated() {
        assert_eq!(VarianceDirection::of(0.0), VarianceDirection::Underrated);
    }

    #[test]
    fn director_weighted_score() {
        let records = [
            film("One", Some(4.0), Some(3.0), "Mann"),
            film("Two", Some(4.0), Some(3.5), "Mann"),
        ];
        let canonical: Vec<&DiaryRecord> = records.iter().collect();
        let directors = director_variances(&canonical);

        assert_eq!(directors.len(), 1);
        let mann = &directors[0];
        assert_eq!(mann.variances(), &[1.0, 0.5]);
        assert!((mann.avg_variance - 0.75).abs() < 1e-12);
        assert!((mann.weighted_score - 0.75 * 2f64.sqrt()).abs() < 1e-12);
        assert!((mann.weighted_score - 1.06).abs() < 1e-2);
    }

    #[test]
    fn hype_rankings_respect_minimum_films() {
        let records = [
            film("A1", Some(5.0), Some(3.0), "Solo"),
            film("B1", Some(2.0), Some(3.0), "Pair"),
            film("B2", Some(2.5), Some(3.0), "Pair"),
            film("C1", Some(1.0), Some(4.0), "Single"),
        ];
        let canonical: Vec<&DiaryRecord> = records.iter().collect();
        let directors = director_variances(&canonical);

        let over = top_overhyped_directors(&directors, 10, 1);
        assert_eq!(over[0].director, "Solo");
        assert_eq!(over.len(), 3);

        let under = top_underhyped_directors(&directors, 10, 2);
        assert_eq!(under.len(), 1);
        assert_eq!(under[0].director, "Pair");
    }
}
