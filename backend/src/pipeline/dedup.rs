use common::model::record::CandidateRecord;
use common::model::schema::FieldKey;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub total_rows: usize,
    pub duplicate_rows: usize,
    pub unique_rows: usize,
    /// Key of every dropped row, in the order they were met.
    pub duplicate_ids: Vec<String>,
    /// Rows skipped for lacking the key altogether.
    pub missing_key_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deduplicated {
    pub records: Vec<CandidateRecord>,
    pub stats: DedupStats,
}

/// Keeps the first record seen for each value of `key`, in input order.
/// Later records with a seen key are counted and dropped, never merged.
pub fn deduplicate(records: Vec<CandidateRecord>, key: FieldKey) -> Deduplicated {
    let mut stats = DedupStats {
        total_rows: records.len(),
        ..DedupStats::default()
    };
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut unique = Vec::with_capacity(records.len());

    for record in records {
        let Some(id) = record.text(key).map(str::to_string) else {
            stats.missing_key_rows += 1;
            continue;
        };
        if seen.insert(id.clone()) {
            unique.push(record);
        } else {
            stats.duplicate_rows += 1;
            stats.duplicate_ids.push(id);
        }
    }

    stats.unique_rows = unique.len();
    Deduplicated {
        records: unique,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::record::FieldValue;

    fn volunteer(id: Option<&str>, name: &str) -> CandidateRecord {
        let mut record = CandidateRecord::new();
        if let Some(id) = id {
            record.set(FieldKey::SaiConnectId, FieldValue::Text(id.into()));
        }
        record.set(FieldKey::FullName, FieldValue::Text(name.into()));
        record
    }

    #[test]
    fn first_occurrence_wins() {
        let result = deduplicate(
            vec![
                volunteer(Some("000123"), "First"),
                volunteer(Some("654321"), "Other"),
                volunteer(Some("000123"), "Second"),
            ],
            FieldKey::SaiConnectId,
        );

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].text(FieldKey::FullName), Some("First"));
        assert_eq!(result.records[1].text(FieldKey::FullName), Some("Other"));
        assert_eq!(
            result.stats,
            DedupStats {
                total_rows: 3,
                duplicate_rows: 1,
                unique_rows: 2,
                duplicate_ids: vec!["000123".into()],
                missing_key_rows: 0,
            }
        );
    }

    #[test]
    fn every_extra_copy_is_listed() {
        let result = deduplicate(
            vec![
                volunteer(Some("111111"), "a"),
                volunteer(Some("111111"), "b"),
                volunteer(Some("111111"), "c"),
            ],
            FieldKey::SaiConnectId,
        );
        assert_eq!(result.stats.duplicate_rows, 2);
        assert_eq!(result.stats.duplicate_ids, vec!["111111", "111111"]);
    }

    #[test]
    fn rows_without_key_are_skipped_not_counted_as_duplicates() {
        let result = deduplicate(
            vec![volunteer(None, "nobody"), volunteer(Some("222222"), "someone")],
            FieldKey::SaiConnectId,
        );
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.stats.duplicate_rows, 0);
        assert_eq!(result.stats.missing_key_rows, 1);
    }
}
