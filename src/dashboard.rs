//! Dashboard aggregations over fetched student records.
//!
//! Student ids are stored without the Buddhist-era century; the dashboard
//! displays them with "25" prepended and groups cohorts by the first four
//! characters of that display id (the enrollment year). Rendering is up to
//! the caller; these functions only produce the aggregated counts, in
//! deterministic (sorted) order.

use std::collections::BTreeMap;

use crate::api::StudentBundle;

/// Display form of a student id: the raw id with the era prefix prepended.
pub fn display_id(raw: &str) -> String {
    format!("25{}", raw)
}

/// Cohort key: first four characters of the display id.
pub fn cohort_key(raw: &str) -> String {
    display_id(raw).chars().take(4).collect()
}

/// Unique cohort keys present in the records, sorted.
pub fn cohort_prefixes(records: &[StudentBundle]) -> Vec<String> {
    let mut keys: Vec<String> = records.iter().map(|r| cohort_key(&r.student.std_id)).collect();
    keys.sort();
    keys.dedup();
    keys
}

/// Keep records whose display id starts with the prefix. An empty prefix
/// keeps everything.
pub fn filter_by_cohort<'a>(records: &'a [StudentBundle], prefix: &str) -> Vec<&'a StudentBundle> {
    if prefix.is_empty() {
        return records.iter().collect();
    }
    records
        .iter()
        .filter(|r| display_id(&r.student.std_id).starts_with(prefix))
        .collect()
}

/// Students per cohort key.
pub fn cohort_counts<'a, I>(records: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a StudentBundle>,
{
    let mut counts = BTreeMap::new();
    for r in records {
        *counts.entry(cohort_key(&r.student.std_id)).or_insert(0) += 1;
    }
    counts
}

/// Students per school province; records without a province are skipped.
pub fn province_counts<'a, I>(records: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a StudentBundle>,
{
    let mut counts = BTreeMap::new();
    for r in records {
        let province = r.school.sch_province.trim();
        if province.is_empty() {
            continue;
        }
        *counts.entry(province.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Students per major; records without a major are skipped.
pub fn major_counts<'a, I>(records: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a StudentBundle>,
{
    let mut counts = BTreeMap::new();
    for r in records {
        let major = r.student.major.trim();
        if major.is_empty() {
            continue;
        }
        *counts.entry(major.to_string()).or_insert(0) += 1;
    }
    counts
}
