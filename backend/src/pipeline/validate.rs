//! Field-level checks and cheap repairs on normalized rows.
//!
//! `validate_row` consumes a record and returns a new [`RowValidation`]:
//! either the (possibly repaired) record with a note per repair, or the list
//! of errors that make the row unusable. Whether one bad row sinks the whole
//! upload is decided by the caller.

use common::model::record::{CandidateRecord, FieldValue};
use common::model::schema::{Constraint, FieldDescriptor, FieldSchema, IdentifierRole};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

// ASCII only: `\D` would keep Devanagari and other Unicode digits.
static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]").expect("static regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowValidation {
    Accepted {
        record: CandidateRecord,
        repairs: Vec<String>,
    },
    Rejected {
        row_number: usize,
        errors: Vec<String>,
    },
}

/// `row_number` is the 1-based sheet row, header included.
pub fn validate_row(mut record: CandidateRecord, row_number: usize, schema: &FieldSchema) -> RowValidation {
    let mut errors = Vec::new();
    let mut repairs = Vec::new();

    for field in schema.fields() {
        if !record.contains(field.key) {
            if field.required {
                errors.push(format!("Row {}: {} is required", row_number, field.display_label));
            }
            continue;
        }

        match field.constraint {
            Constraint::None => {}
            Constraint::Identifier { length, role } => {
                check_identifier(&mut record, field, length, role, row_number, &mut errors, &mut repairs)
            }
            Constraint::Range { min, max } => {
                let Some(value) = record.get(field.key).and_then(FieldValue::as_integer) else {
                    continue;
                };
                if !(min..=max).contains(&value) {
                    record.remove(field.key);
                    let note = format!(
                        "Row {}: {} {} is outside {}-{} and was cleared",
                        row_number, field.display_label, value, min, max
                    );
                    warn!("{}", note);
                    repairs.push(note);
                }
            }
        }
    }

    if errors.is_empty() {
        RowValidation::Accepted { record, repairs }
    } else {
        RowValidation::Rejected { row_number, errors }
    }
}

fn check_identifier(
    record: &mut CandidateRecord,
    field: &FieldDescriptor,
    length: usize,
    role: IdentifierRole,
    row_number: usize,
    errors: &mut Vec<String>,
    repairs: &mut Vec<String>,
) {
    let raw = match record.get(field.key) {
        Some(FieldValue::Text(s)) => s.clone(),
        Some(FieldValue::Integer(n)) => n.to_string(),
        _ => String::new(),
    };
    let digits = NON_DIGITS.replace_all(&raw, "").into_owned();
    let label = field.display_label;

    if digits.len() == length {
        record.set(field.key, FieldValue::Text(digits));
        return;
    }

    match (role, digits.len()) {
        (IdentifierRole::Primary, 0) => {
            record.remove(field.key);
            errors.push(format!("Row {}: {} '{}' contains no digits", row_number, label, raw));
        }
        (IdentifierRole::Primary, n) if n < length => {
            let padded = format!("{:0>width$}", digits, width = length);
            let note = format!("Row {}: {} '{}' padded to '{}'", row_number, label, raw, padded);
            warn!("{}", note);
            repairs.push(note);
            record.set(field.key, FieldValue::Text(padded));
        }
        (IdentifierRole::Secondary, 0) => {
            record.remove(field.key);
        }
        (IdentifierRole::Secondary, 1) => {
            record.remove(field.key);
            let note = format!("Row {}: dropped stray digit '{}' in {}", row_number, raw, label);
            warn!("{}", note);
            repairs.push(note);
        }
        (_, n) => {
            errors.push(format!(
                "Row {}: {} '{}' must have exactly {} digits (found {})",
                row_number, label, raw, length, n
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::schema::FieldKey;

    fn row(pairs: &[(FieldKey, FieldValue)]) -> CandidateRecord {
        pairs.iter().cloned().collect()
    }

    fn valid(id: &str) -> CandidateRecord {
        row(&[
            (FieldKey::SaiConnectId, FieldValue::Text(id.into())),
            (FieldKey::FullName, FieldValue::Text("Ravi Kumar".into())),
        ])
    }

    fn accepted(result: RowValidation) -> (CandidateRecord, Vec<String>) {
        match result {
            RowValidation::Accepted { record, repairs } => (record, repairs),
            RowValidation::Rejected { errors, .. } => panic!("row rejected: {errors:?}"),
        }
    }

    fn rejected(result: RowValidation) -> Vec<String> {
        match result {
            RowValidation::Rejected { errors, .. } => errors,
            RowValidation::Accepted { record, .. } => panic!("row accepted: {record:?}"),
        }
    }

    #[test]
    fn short_primary_identifier_is_zero_padded() {
        let schema = FieldSchema::volunteer();
        let (record, repairs) = accepted(validate_row(valid("123"), 2, &schema));
        assert_eq!(record.text(FieldKey::SaiConnectId), Some("000123"));
        assert_eq!(repairs, vec!["Row 2: SAI Connect ID '123' padded to '000123'"]);
    }

    #[test]
    fn long_primary_identifier_is_rejected() {
        let schema = FieldSchema::volunteer();
        let errors = rejected(validate_row(valid("1234567"), 7, &schema));
        assert_eq!(
            errors,
            vec!["Row 7: SAI Connect ID '1234567' must have exactly 6 digits (found 7)"]
        );
    }

    #[test]
    fn identifier_punctuation_is_stripped() {
        let schema = FieldSchema::volunteer();
        let mut record = valid("SC-654 321");
        record.set(FieldKey::MobileNumber, FieldValue::Text("98765-43210".into()));
        record.set(FieldKey::AadharNumber, FieldValue::Text("1234 5678 9012".into()));

        let (record, repairs) = accepted(validate_row(record, 3, &schema));
        assert_eq!(record.text(FieldKey::SaiConnectId), Some("654321"));
        assert_eq!(record.text(FieldKey::MobileNumber), Some("9876543210"));
        assert_eq!(record.text(FieldKey::AadharNumber), Some("123456789012"));
        assert!(repairs.is_empty());
    }

    #[test]
    fn single_digit_phone_is_dropped_without_error() {
        let schema = FieldSchema::volunteer();
        let mut record = valid("000123");
        record.set(FieldKey::MobileNumber, FieldValue::Text("0".into()));

        let (record, repairs) = accepted(validate_row(record, 4, &schema));
        assert!(!record.contains(FieldKey::MobileNumber));
        assert_eq!(repairs.len(), 1);
    }

    #[test]
    fn ten_digit_phone_is_kept_verbatim() {
        let schema = FieldSchema::volunteer();
        let mut record = valid("000123");
        record.set(FieldKey::MobileNumber, FieldValue::Text("9876543210".into()));

        let (record, _) = accepted(validate_row(record, 4, &schema));
        assert_eq!(record.text(FieldKey::MobileNumber), Some("9876543210"));
    }

    #[test]
    fn wrong_length_secondary_identifier_is_an_error() {
        let schema = FieldSchema::volunteer();
        let mut record = valid("000123");
        record.set(FieldKey::AadharNumber, FieldValue::Text("12345".into()));
        let errors = rejected(validate_row(record, 9, &schema));
        assert!(errors[0].starts_with("Row 9: Aadhar Number '12345' must have exactly 12 digits"));
    }

    #[test]
    fn missing_required_fields_are_each_reported() {
        let schema = FieldSchema::volunteer();
        let errors = rejected(validate_row(CandidateRecord::new(), 5, &schema));
        assert_eq!(
            errors,
            vec!["Row 5: Full Name is required", "Row 5: SAI Connect ID is required"]
        );
    }

    #[test]
    fn primary_identifier_without_digits_is_rejected() {
        let schema = FieldSchema::volunteer();
        let errors = rejected(validate_row(valid("N/A"), 6, &schema));
        assert_eq!(errors, vec!["Row 6: SAI Connect ID 'N/A' contains no digits"]);
    }

    #[test]
    fn devanagari_digits_are_not_identifier_digits() {
        let schema = FieldSchema::volunteer();
        for id in ["१२", "१२३४५६"] {
            let errors = rejected(validate_row(valid(id), 2, &schema));
            assert_eq!(errors, vec![format!("Row 2: SAI Connect ID '{}' contains no digits", id)]);
        }

        let mut record = valid("000123");
        record.set(FieldKey::MobileNumber, FieldValue::Text("५".into()));
        let (record, repairs) = accepted(validate_row(record, 3, &schema));
        assert!(!record.contains(FieldKey::MobileNumber));
        assert!(repairs.is_empty());

        let mut record = valid("000123");
        record.set(FieldKey::MobileNumber, FieldValue::Text("98765४3210".into()));
        let errors = rejected(validate_row(record, 4, &schema));
        assert_eq!(
            errors,
            vec!["Row 4: Mobile Number '98765४3210' must have exactly 10 digits (found 9)"]
        );
    }

    #[test]
    fn out_of_range_age_is_cleared_not_rejected() {
        let schema = FieldSchema::volunteer();
        let mut record = valid("000123");
        record.set(FieldKey::Age, FieldValue::Integer(340));

        let (record, repairs) = accepted(validate_row(record, 8, &schema));
        assert!(!record.contains(FieldKey::Age));
        assert_eq!(repairs, vec!["Row 8: Age 340 is outside 1-120 and was cleared"]);

        let mut record = valid("000124");
        record.set(FieldKey::Age, FieldValue::Integer(120));
        let (record, _) = accepted(validate_row(record, 9, &schema));
        assert_eq!(record.get(FieldKey::Age), Some(&FieldValue::Integer(120)));
    }
}
