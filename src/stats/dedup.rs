//! Record merger: collapse rewatches into one canonical record per title

use std::collections::HashMap;

use crate::domain::DiaryRecord;

/// The two views every statistic is computed over.
///
/// `full` keeps every diary entry in its original order; `canonical` holds
/// one record per distinct title in first-seen order.
#[derive(Debug, Clone)]
pub struct RecordSets<'a> {
    pub full: &'a [DiaryRecord],
    pub canonical: Vec<&'a DiaryRecord>,
}

impl RecordSets<'_> {
    pub fn total(&self) -> usize {
        self.full.len()
    }

    pub fn unique(&self) -> usize {
        self.canonical.len()
    }
}

/// Split `records` into the full and canonical views.
///
/// The canonical record for a title is the one with the highest rating; an
/// absent rating ranks below every numeric rating and ties keep the earliest
/// entry.
pub fn deduplicate(records: &[DiaryRecord]) -> RecordSets<'_> {
    let mut canonical: Vec<&DiaryRecord> = Vec::new();
    let mut slot_by_title: HashMap<&str, usize> = HashMap::new();

    for record in records {
        match slot_by_title.get(record.title()) {
            Some(&slot) => {
                if rating_rank(record) > rating_rank(canonical[slot]) {
                    canonical[slot] = record;
                }
            }
            None => {
                slot_by_title.insert(record.title(), canonical.len());
                canonical.push(record);
            }
        }
    }

    RecordSets {
        full: records,
        canonical,
    }
}

fn rating_rank(record: &DiaryRecord) -> f64 {
    record.rating.unwrap_or(f64::NEG_INFINITY)
}
