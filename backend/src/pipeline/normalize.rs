use super::headers::HeaderMapping;
use super::reader::RawCell;
use chrono::{Days, NaiveDate};
use common::model::record::{CandidateRecord, FieldValue};
use common::model::schema::{FieldSchema, FieldType};

/// Affirmative tokens, compared after trimming and lowercasing. A numeric
/// cell is truthy only when it equals 1, matching the `"1"` token.
const TRUTHY: &[&str] = &["yes", "y", "true", "1", "हाँ", "हां"];

/// Largest serial the 1900 date system can express (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

/// Builds a typed record from one raw row.
///
/// Cells that are empty, or that fail to coerce, leave their field unset.
/// Boolean fields that end up unset default to `false`.
pub fn normalize_row(row: &[RawCell], mapping: &HeaderMapping, schema: &FieldSchema) -> CandidateRecord {
    let mut record = CandidateRecord::new();

    for &(idx, key) in mapping.columns() {
        let Some(field) = schema.get(key) else {
            continue;
        };
        let cell = row.get(idx).unwrap_or(&RawCell::Empty);
        if cell.is_empty() {
            continue;
        }
        if let Some(value) = coerce(cell, field.field_type) {
            record.set(key, value);
        }
    }

    for field in schema.fields() {
        if field.field_type == FieldType::Boolean && !record.contains(field.key) {
            record.set(field.key, FieldValue::Boolean(false));
        }
    }

    record
}

pub fn coerce(cell: &RawCell, field_type: FieldType) -> Option<FieldValue> {
    match field_type {
        FieldType::String => coerce_string(cell).map(FieldValue::Text),
        FieldType::Integer => coerce_integer(cell).map(FieldValue::Integer),
        FieldType::Boolean => Some(FieldValue::Boolean(coerce_bool(cell))),
        FieldType::Date => coerce_date(cell).map(FieldValue::Date),
    }
}

fn coerce_string(cell: &RawCell) -> Option<String> {
    let text = match cell {
        RawCell::Empty => return None,
        RawCell::Text(s) => s.trim().to_string(),
        RawCell::Number(n) if n.fract() == 0.0 && n.abs() < 1e16 => format!("{}", *n as i64),
        RawCell::Number(n) => n.to_string(),
        RawCell::Bool(b) => b.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

/// Leading base-10 integer of a trimmed string: `"42.9"` and `"42 yrs"`
/// give 42, `"abc"` gives nothing.
fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(digits.len(), |(i, _)| i);
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

fn coerce_integer(cell: &RawCell) -> Option<i64> {
    match cell {
        RawCell::Number(n) if n.is_finite() && n.abs() < 9.0e15 => Some(n.trunc() as i64),
        RawCell::Text(s) => parse_leading_int(s),
        _ => None,
    }
}

fn coerce_bool(cell: &RawCell) -> bool {
    match cell {
        RawCell::Bool(b) => *b,
        RawCell::Number(n) => *n == 1.0,
        RawCell::Text(s) => {
            let token = s.trim().to_lowercase();
            TRUTHY.contains(&token.as_str())
        }
        RawCell::Empty => false,
    }
}

/// Converts a spreadsheet serial (1900 date system) to a calendar date.
///
/// Serials below 61 sit before the phantom 1900-02-29 and are shifted by a
/// day so that serial 1 is 1900-01-01.
pub fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let days = serial.floor() as u64;
    let epoch = if days < 61 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    epoch.checked_add_days(Days::new(days))
}

fn coerce_date(cell: &RawCell) -> Option<NaiveDate> {
    match cell {
        RawCell::Number(n) => date_from_serial(*n),
        RawCell::Text(s) => {
            let s = s.trim();
            match s.parse::<f64>() {
                Ok(serial) => date_from_serial(serial),
                Err(_) => s
                    .get(..10)
                    .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()),
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::headers::HeaderResolver;
    use common::model::schema::FieldKey;

    fn text(s: &str) -> RawCell {
        RawCell::Text(s.to_string())
    }

    #[test]
    fn boolean_tokens_in_both_languages_are_truthy() {
        for token in ["yes", "YES ", "true", "1", "y", "हाँ", "हां"] {
            assert!(coerce_bool(&text(token)), "{token} should be true");
        }
        for token in ["no", "false", "0", "maybe", "नहीं"] {
            assert!(!coerce_bool(&text(token)), "{token} should be false");
        }
        assert!(coerce_bool(&RawCell::Number(1.0)));
        assert!(!coerce_bool(&RawCell::Empty));
    }

    #[test]
    fn numeric_cells_follow_the_text_tokens() {
        for n in [1.0, 2.0, -1.0, 0.0] {
            assert_eq!(
                coerce_bool(&RawCell::Number(n)),
                coerce_bool(&text(&n.to_string())),
                "{n} disagrees with its text form"
            );
        }
        assert!(!coerce_bool(&RawCell::Number(2.0)));
        assert!(!coerce_bool(&RawCell::Number(0.5)));
    }

    #[test]
    fn integers_parse_like_a_lenient_reader() {
        assert_eq!(coerce_integer(&text("42")), Some(42));
        assert_eq!(coerce_integer(&text(" 42.9 ")), Some(42));
        assert_eq!(coerce_integer(&text("35 years")), Some(35));
        assert_eq!(coerce_integer(&text("thirty")), None);
        assert_eq!(coerce_integer(&RawCell::Number(61.0)), Some(61));
        assert_eq!(coerce_integer(&RawCell::Bool(true)), None);
    }

    #[test]
    fn serial_dates_convert_to_calendar_dates() {
        assert_eq!(date_from_serial(1.0), NaiveDate::from_ymd_opt(1900, 1, 1));
        assert_eq!(date_from_serial(59.0), NaiveDate::from_ymd_opt(1900, 2, 28));
        assert_eq!(date_from_serial(61.0), NaiveDate::from_ymd_opt(1900, 3, 1));
        assert_eq!(date_from_serial(45614.0), NaiveDate::from_ymd_opt(2024, 11, 18));
        assert_eq!(date_from_serial(45614.75), NaiveDate::from_ymd_opt(2024, 11, 18));
        assert_eq!(date_from_serial(0.0), None);
        assert_eq!(date_from_serial(-3.0), None);
        assert_eq!(date_from_serial(f64::NAN), None);
    }

    #[test]
    fn text_dates_accept_serials_and_iso() {
        assert_eq!(coerce_date(&text("45614")), NaiveDate::from_ymd_opt(2024, 11, 18));
        assert_eq!(coerce_date(&text("2024-11-18T00:00:00")), NaiveDate::from_ymd_opt(2024, 11, 18));
        assert_eq!(coerce_date(&text("next week")), None);
    }

    #[test]
    fn numeric_identifiers_stringify_without_fraction() {
        assert_eq!(coerce_string(&RawCell::Number(123.0)), Some("123".into()));
        assert_eq!(coerce_string(&RawCell::Number(987654321012.0)), Some("987654321012".into()));
        assert_eq!(coerce_string(&text("  Ravi  ")), Some("Ravi".into()));
    }

    #[test]
    fn row_normalization_uses_mapping_and_defaults_booleans() {
        let schema = FieldSchema::volunteer();
        let headers: Vec<String> = ["Age", "sai_connect_id", "Name", "Past Service", "Prashanti Arrival"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mapping = HeaderResolver::default().resolve(&headers, &schema).unwrap();

        let record = normalize_row(
            &[text("abc"), RawCell::Number(123.0), text(" Ravi "), text("Yes"), RawCell::Empty],
            &mapping,
            &schema,
        );

        assert_eq!(record.get(FieldKey::Age), None);
        assert_eq!(record.text(FieldKey::SaiConnectId), Some("123"));
        assert_eq!(record.text(FieldKey::FullName), Some("Ravi"));
        assert_eq!(record.get(FieldKey::PastPrashantiService), Some(&FieldValue::Boolean(true)));
        assert_eq!(record.get(FieldKey::IsCancelled), Some(&FieldValue::Boolean(false)));
        assert_eq!(record.get(FieldKey::PrashantiArrival), None);
        assert!(!record.contains(FieldKey::MobileNumber));
    }
}
