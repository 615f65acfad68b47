//! Property tests for deduplication and ranking scores
use std::collections::HashSet;

use chrono::NaiveDate;
use film_diary_stats::DiaryRecord;
use film_diary_stats::stats::scoring::{bayesian_score, weighted_score, wilson_score};
use film_diary_stats::stats::{deduplicate, rewatch};
use proptest::prelude::*;

const TITLES: [&str; 6] = ["Heat", "Alien", "Solaris", "Stalker", "Ran", "Ikiru"];

fn diary() -> impl Strategy<Value = Vec<DiaryRecord>> {
    prop::collection::vec((0..TITLES.len(), prop::option::of(1u8..=10), 1u32..=28), 0..40).prop_map(|rows| {
        rows.into_iter()
            .map(|(title, half_stars, day)| {
                let mut record = DiaryRecord::new(TITLES[title])
                    .unwrap()
                    .with_watch_date(NaiveDate::from_ymd_opt(2024, 2, day).unwrap());
                if let Some(units) = half_stars {
                    record = record.with_rating(f64::from(units) / 2.0);
                }
                record
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn canonical_set_has_one_record_per_title(records in diary()) {
        let sets = deduplicate(&records);
        let titles: HashSet<&str> = records.iter().map(DiaryRecord::title).collect();

        prop_assert!(sets.unique() <= sets.total());
        prop_assert_eq!(sets.unique(), titles.len());
        let canonical_titles: HashSet<&str> = sets.canonical.iter().map(|record| record.title()).collect();
        prop_assert_eq!(canonical_titles.len(), sets.unique());
    }

    #[test]
    fn canonical_record_carries_highest_rating(records in diary()) {
        let sets = deduplicate(&records);
        for canonical in &sets.canonical {
            let best = records
                .iter()
                .filter(|record| record.title() == canonical.title())
                .filter_map(|record| record.rating)
                .fold(None, |best: Option<f64>, rating| Some(best.map_or(rating, |b| b.max(rating))));
            prop_assert_eq!(canonical.rating, best);
        }
    }

    #[test]
    fn deduplication_is_idempotent(records in diary()) {
        let once: Vec<DiaryRecord> = deduplicate(&records).canonical.into_iter().cloned().collect();
        let twice: Vec<DiaryRecord> = deduplicate(&once).canonical.into_iter().cloned().collect();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn rewatches_are_logged_more_than_once(records in diary()) {
        let sets = deduplicate(&records);
        for entry in rewatch::top_rewatched(&sets, 10) {
            let logged = records.iter().filter(|record| record.title() == entry.movie).count();
            prop_assert!(entry.count > 1);
            prop_assert_eq!(entry.count, logged);
        }
    }

    #[test]
    fn weighted_score_grows_with_count(avg in 0.5f64..=5.0, count in 1usize..500) {
        prop_assert!(weighted_score(avg, count + 1) > weighted_score(avg, count));
    }

    #[test]
    fn bayesian_score_grows_with_count_above_prior(avg in 3.0f64..=5.0, count in 1usize..500) {
        prop_assert!(bayesian_score(avg, count + 1) >= bayesian_score(avg, count) - 1e-12);
    }

    #[test]
    fn wilson_score_grows_with_count(avg in 0.0f64..=5.0, count in 1usize..500) {
        prop_assert!(wilson_score(avg, count + 1) >= wilson_score(avg, count) - 1e-12);
    }

    #[test]
    fn wilson_score_never_exceeds_average(avg in 0.0f64..=5.0, count in 1usize..500) {
        let score = wilson_score(avg, count);
        prop_assert!(score >= 0.0);
        prop_assert!(score <= avg + 1e-9);
    }
}
