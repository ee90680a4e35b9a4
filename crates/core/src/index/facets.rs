use std::collections::HashMap;

use serde::Serialize;

use crate::domain::PhotoRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationEntry {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraEntry {
    pub camera: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagEntry {
    pub name: String,
    pub count: usize,
}

/// Count occurrences of each key, then order by descending count.
/// Ties keep the order in which keys were first seen. At most `cap` entries.
pub(crate) fn rank_by_count<I>(keys: I, cap: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = String>,
{
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for key in keys {
        match positions.get(&key) {
            Some(&pos) => counts[pos].1 += 1,
            None => {
                positions.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }

    // stable sort: ties stay in first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(cap);
    counts
}

/// Display/grouping label for a location string.
///
/// A comma-separated list of numbers is treated as a raw "lat, lng" pair and
/// each coordinate is reduced to one decimal place, so nearby GPS fixes share
/// a label. Any other text is returned unchanged.
pub fn location_label(text: &str) -> String {
    if text.contains(',') {
        let coords: Option<Vec<f64>> = text
            .split(',')
            .map(|part| part.trim().parse::<f64>().ok().filter(|c| c.is_finite()))
            .collect();
        if let Some(coords) = coords {
            return coords
                .iter()
                .map(|c| format!("{c:.1}"))
                .collect::<Vec<_>>()
                .join(", ");
        }
    }
    text.to_string()
}

/// Most frequent locations, nearby GPS fixes collapsed to one label.
pub fn build_location_index(records: &[PhotoRecord], cap: usize) -> Vec<LocationEntry> {
    let keys = records
        .iter()
        .filter_map(|r| r.capture_info.as_ref()?.location.as_deref())
        .filter(|loc| !loc.trim().is_empty())
        .map(location_label);

    rank_by_count(keys, cap)
        .into_iter()
        .map(|(label, count)| LocationEntry { label, count })
        .collect()
}

/// Most frequent camera models, grouped verbatim.
pub fn build_camera_index(records: &[PhotoRecord], cap: usize) -> Vec<CameraEntry> {
    let keys = records
        .iter()
        .filter_map(|r| r.capture_info.as_ref()?.camera.clone())
        .filter(|cam| !cam.trim().is_empty());

    rank_by_count(keys, cap)
        .into_iter()
        .map(|(camera, count)| CameraEntry { camera, count })
        .collect()
}

/// Most frequent tag names across the collection.
pub fn build_tag_index(records: &[PhotoRecord], cap: usize) -> Vec<TagEntry> {
    let keys = records
        .iter()
        .flat_map(|r| r.tags.iter().map(|t| t.name.clone()))
        .filter(|name| !name.trim().is_empty());

    rank_by_count(keys, cap)
        .into_iter()
        .map(|(name, count)| TagEntry { name, count })
        .collect()
}

/// Tag names containing `partial` (case-insensitive), most used first.
/// A blank `partial` suggests nothing.
pub fn suggest_tags(records: &[PhotoRecord], partial: &str, cap: usize) -> Vec<TagEntry> {
    let needle = partial.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let keys = records
        .iter()
        .flat_map(|r| r.tags.iter())
        .filter(|t| t.name.to_lowercase().contains(&needle))
        .map(|t| t.name.clone());

    rank_by_count(keys, cap)
        .into_iter()
        .map(|(name, count)| TagEntry { name, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CaptureInfo, Tag, TagSource, Timestamp};

    fn record(id: &str, camera: Option<&str>, location: Option<&str>) -> PhotoRecord {
        PhotoRecord {
            id: id.to_string(),
            url: String::new(),
            title: None,
            description: None,
            tags: Vec::new(),
            upload_at: Timestamp::parse("2024-10-22T09:00:00Z"),
            capture_info: Some(CaptureInfo {
                camera: camera.map(str::to_string),
                location: location.map(str::to_string),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_location_label_rounds_gps_pairs() {
        assert_eq!(location_label("31.230416, 121.473701"), "31.2, 121.5");
        assert_eq!(location_label("31.234000,121.479000"), "31.2, 121.5");
        assert_eq!(location_label("-33.868820, 151.209290"), "-33.9, 151.2");
    }

    #[test]
    fn test_location_label_keeps_place_names() {
        assert_eq!(location_label("Shanghai"), "Shanghai");
        assert_eq!(location_label("Paris, France"), "Paris, France");
        assert_eq!(location_label("NaN, 1.0"), "NaN, 1.0");
    }

    #[test]
    fn test_nearby_gps_fixes_collapse() {
        let records = vec![
            record("1", None, Some("31.230416, 121.473701")),
            record("2", None, Some("31.234000, 121.479000")),
        ];
        let index = build_location_index(&records, 10);
        assert_eq!(
            index,
            vec![LocationEntry {
                label: "31.2, 121.5".to_string(),
                count: 2
            }]
        );
    }

    #[test]
    fn test_location_index_sorted_and_capped() {
        let mut records = Vec::new();
        for i in 0..12 {
            records.push(record(&format!("p{i}"), None, Some(&format!("Place {i}"))));
        }
        records.push(record("x", None, Some("Place 5")));
        records.push(record("y", None, Some("Place 5")));
        records.push(record("z", None, Some("Place 9")));
        records.push(record("blank", None, Some("  ")));
        records.push(record("none", None, None));

        let index = build_location_index(&records, 10);
        assert_eq!(index.len(), 10);
        assert_eq!(index[0].label, "Place 5");
        assert_eq!(index[0].count, 3);
        assert_eq!(index[1].label, "Place 9");
        assert_eq!(index[1].count, 2);
        // ties keep first-seen order
        assert_eq!(index[2].label, "Place 0");
        assert!(index.iter().all(|e| e.label.trim() != ""));
    }

    #[test]
    fn test_camera_index_verbatim_and_capped() {
        let mut records = Vec::new();
        for i in 0..10 {
            records.push(record(&format!("c{i}"), Some(&format!("Cam {i}")), None));
        }
        records.push(record("dup", Some("Cam 3"), None));
        records.push(record("case", Some("cam 3"), None));

        let index = build_camera_index(&records, 8);
        assert_eq!(index.len(), 8);
        assert_eq!(
            index[0],
            CameraEntry {
                camera: "Cam 3".to_string(),
                count: 2
            }
        );
        assert!(index.iter().all(|e| e.camera != "cam 3" || e.count == 1));
    }

    #[test]
    fn test_tag_index_counts_every_occurrence() {
        let tag = |name: &str| Tag {
            name: name.to_string(),
            source: TagSource::Ai,
            confidence: None,
        };
        let mut a = record("a", None, None);
        a.tags = vec![tag("beach"), tag("sunset")];
        let mut b = record("b", None, None);
        b.tags = vec![tag("beach")];

        let index = build_tag_index(&[a, b], 20);
        assert_eq!(index[0].name, "beach");
        assert_eq!(index[0].count, 2);
        assert_eq!(index[1].name, "sunset");
    }

    #[test]
    fn test_suggest_tags_by_substring() {
        let tag = |name: &str| Tag {
            name: name.to_string(),
            source: TagSource::Manual,
            confidence: None,
        };
        let mut a = record("a", None, None);
        a.tags = vec![tag("Sunset"), tag("beach")];
        let mut b = record("b", None, None);
        b.tags = vec![tag("sunrise"), tag("sunset"), tag("Sunset")];
        let records = [a, b];

        let names: Vec<String> = suggest_tags(&records, " SUN", 10)
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Sunset", "sunrise", "sunset"]);

        assert_eq!(suggest_tags(&records, "sun", 1).len(), 1);
        assert!(suggest_tags(&records, "  ", 10).is_empty());
        assert!(suggest_tags(&records, "mountain", 10).is_empty());
    }

    #[test]
    fn test_zero_cap_is_empty() {
        let records = vec![record("1", Some("Cam"), Some("Here"))];
        assert!(build_camera_index(&records, 0).is_empty());
        assert!(build_location_index(&records, 0).is_empty());
    }
}
