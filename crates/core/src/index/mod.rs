pub mod facets;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::PhotoRecord;
use crate::timestamp::{effective_date, year_month_key};
pub use facets::{
    build_camera_index, build_location_index, build_tag_index, location_label, suggest_tags,
    CameraEntry, LocationEntry, TagEntry,
};

/// Display caps for the derived indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexLimits {
    pub time_buckets: usize,
    pub locations: usize,
    pub cameras: usize,
    pub tags: usize,
}

impl Default for IndexLimits {
    fn default() -> Self {
        Self {
            time_buckets: 12,
            locations: 10,
            cameras: 8,
            tags: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeBucket {
    pub year_month: String,
    pub count: usize,
}

/// Photo counts per effective year-month, most recent first, at most `cap`
/// buckets. Records with no valid timestamp are not counted.
pub fn build_time_buckets(records: &[PhotoRecord], cap: usize) -> Vec<TimeBucket> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        if let Ok(date) = effective_date(record) {
            *counts.entry(year_month_key(&date)).or_default() += 1;
        }
    }

    // "YYYY-MM" orders lexicographically the same as chronologically
    counts
        .into_iter()
        .rev()
        .take(cap)
        .map(|(year_month, count)| TimeBucket { year_month, count })
        .collect()
}

/// Every derived index over one set of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetIndex {
    pub time_buckets: Vec<TimeBucket>,
    pub locations: Vec<LocationEntry>,
    pub cameras: Vec<CameraEntry>,
    pub tags: Vec<TagEntry>,
}

impl FacetIndex {
    pub fn build(records: &[PhotoRecord], limits: &IndexLimits) -> Self {
        Self {
            time_buckets: build_time_buckets(records, limits.time_buckets),
            locations: build_location_index(records, limits.locations),
            cameras: build_camera_index(records, limits.cameras),
            tags: build_tag_index(records, limits.tags),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CaptureInfo, Timestamp};

    fn record(upload_at: &str, taken: Option<&str>) -> PhotoRecord {
        PhotoRecord {
            id: upload_at.to_string(),
            url: String::new(),
            title: None,
            description: None,
            tags: Vec::new(),
            upload_at: Timestamp::parse(upload_at),
            capture_info: taken.map(|t| CaptureInfo {
                date_taken: Some(Timestamp::parse(t)),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_buckets_use_effective_date() {
        let records = vec![
            record("2024-10-22T09:00:00Z", Some("2025-05-04T10:08:36Z")),
            record("2024-10-22T09:00:00Z", None),
            record("2024-10-01T00:00:00Z", Some("garbage")),
        ];
        let buckets = build_time_buckets(&records, 12);
        assert_eq!(
            buckets,
            vec![
                TimeBucket {
                    year_month: "2025-05".to_string(),
                    count: 1
                },
                TimeBucket {
                    year_month: "2024-10".to_string(),
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn test_buckets_skip_records_without_valid_timestamp() {
        let records = vec![
            record("bad", Some("also bad")),
            record("2023-01-05T00:00:00Z", None),
        ];
        let buckets = build_time_buckets(&records, 12);
        let total: usize = buckets.iter().map(|b| b.count).sum();
        assert_eq!(total, 1);
        assert!(total < records.len());
    }

    #[test]
    fn test_buckets_strictly_descending_and_capped() {
        let mut records = Vec::new();
        for year in [2022, 2023] {
            for month in 1..=12 {
                records.push(record(&format!("{year}-{month:02}-15T12:00:00Z"), None));
            }
        }
        let buckets = build_time_buckets(&records, 12);
        assert_eq!(buckets.len(), 12);
        assert_eq!(buckets[0].year_month, "2023-12");
        assert_eq!(buckets[11].year_month, "2023-01");
        assert!(buckets.windows(2).all(|w| w[0].year_month > w[1].year_month));

        let wider = build_time_buckets(&records, 30);
        assert_eq!(wider.len(), 24);
        assert_eq!(wider.iter().map(|b| b.count).sum::<usize>(), records.len());
    }

    #[test]
    fn test_facet_index_honors_limits() {
        let records = vec![
            record("2024-01-01T00:00:00Z", None),
            record("2024-02-01T00:00:00Z", None),
        ];
        let limits = IndexLimits {
            time_buckets: 1,
            ..Default::default()
        };
        let index = FacetIndex::build(&records, &limits);
        assert_eq!(index.time_buckets.len(), 1);
        assert_eq!(index.time_buckets[0].year_month, "2024-02");
        assert!(index.cameras.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(build_time_buckets(&[], 12).is_empty());
        assert_eq!(FacetIndex::build(&[], &IndexLimits::default()), FacetIndex::default());
    }
}
