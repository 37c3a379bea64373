//! Maps raw header cells to canonical field keys.
//!
//! The alias table is a value handed to the resolver, not shared global
//! state, so another schema or another language's spellings can be swapped
//! in without touching this module.

use crate::error::{HeaderConflict, UploadError};
use common::model::schema::{FieldKey, FieldSchema};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_\-]+").expect("static regex"));

/// Spellings accepted out of the box: the column names of the export
/// template, the camel-case names of the older template, common short
/// forms, and their Hindi equivalents.
const DEFAULT_ALIASES: &[(&str, FieldKey)] = &[
    ("serial_number", FieldKey::SerialNumber),
    ("SerialNumber", FieldKey::SerialNumber),
    ("S No", FieldKey::SerialNumber),
    ("S.No", FieldKey::SerialNumber),
    ("Sl No", FieldKey::SerialNumber),
    ("क्रम संख्या", FieldKey::SerialNumber),
    ("क्रमांक", FieldKey::SerialNumber),
    ("full_name", FieldKey::FullName),
    ("FullName", FieldKey::FullName),
    ("Name", FieldKey::FullName),
    ("पूरा नाम", FieldKey::FullName),
    ("नाम", FieldKey::FullName),
    ("age", FieldKey::Age),
    ("आयु", FieldKey::Age),
    ("उम्र", FieldKey::Age),
    ("aadhar_number", FieldKey::AadharNumber),
    ("AadharNumber", FieldKey::AadharNumber),
    ("Aadhar", FieldKey::AadharNumber),
    ("Aadhaar Number", FieldKey::AadharNumber),
    ("Aadhaar", FieldKey::AadharNumber),
    ("आधार संख्या", FieldKey::AadharNumber),
    ("आधार नंबर", FieldKey::AadharNumber),
    ("sai_connect_id", FieldKey::SaiConnectId),
    ("SaiConnectId", FieldKey::SaiConnectId),
    ("SAI Connect ID", FieldKey::SaiConnectId),
    ("Connect ID", FieldKey::SaiConnectId),
    ("साई कनेक्ट आईडी", FieldKey::SaiConnectId),
    ("sevadal_training_certificate", FieldKey::SevadalTrainingCertificate),
    ("SevadalTraining", FieldKey::SevadalTrainingCertificate),
    ("Sevadal Training", FieldKey::SevadalTrainingCertificate),
    ("सेवादल प्रशिक्षण प्रमाणपत्र", FieldKey::SevadalTrainingCertificate),
    ("सेवादल प्रशिक्षण", FieldKey::SevadalTrainingCertificate),
    ("mobile_number", FieldKey::MobileNumber),
    ("MobileNumber", FieldKey::MobileNumber),
    ("Mobile", FieldKey::MobileNumber),
    ("Phone", FieldKey::MobileNumber),
    ("Phone Number", FieldKey::MobileNumber),
    ("मोबाइल नंबर", FieldKey::MobileNumber),
    ("मोबाइल", FieldKey::MobileNumber),
    ("sss_district", FieldKey::SssDistrict),
    ("SSSDistrict", FieldKey::SssDistrict),
    ("District", FieldKey::SssDistrict),
    ("एसएसएस जिला", FieldKey::SssDistrict),
    ("जिला", FieldKey::SssDistrict),
    ("gender", FieldKey::Gender),
    ("लिंग", FieldKey::Gender),
    ("samiti_or_bhajan_mandli", FieldKey::SamitiOrBhajanMandli),
    ("Samiti", FieldKey::SamitiOrBhajanMandli),
    ("BhajanMandli", FieldKey::SamitiOrBhajanMandli),
    ("Bhajan Mandli", FieldKey::SamitiOrBhajanMandli),
    ("समिति", FieldKey::SamitiOrBhajanMandli),
    ("भजन मंडली", FieldKey::SamitiOrBhajanMandli),
    ("education", FieldKey::Education),
    ("शिक्षा", FieldKey::Education),
    ("special_qualifications", FieldKey::SpecialQualifications),
    ("SpecialQualifications", FieldKey::SpecialQualifications),
    ("Qualifications", FieldKey::SpecialQualifications),
    ("विशेष योग्यता", FieldKey::SpecialQualifications),
    ("past_prashanti_service", FieldKey::PastPrashantiService),
    ("PastService", FieldKey::PastPrashantiService),
    ("Past Service", FieldKey::PastPrashantiService),
    ("पूर्व प्रशांति सेवा", FieldKey::PastPrashantiService),
    ("last_service_location", FieldKey::LastServiceLocation),
    ("LastServiceLocation", FieldKey::LastServiceLocation),
    ("अंतिम सेवा स्थान", FieldKey::LastServiceLocation),
    ("other_service_location", FieldKey::OtherServiceLocation),
    ("OtherServiceLocation", FieldKey::OtherServiceLocation),
    ("अन्य सेवा स्थान", FieldKey::OtherServiceLocation),
    ("prashanti_arrival", FieldKey::PrashantiArrival),
    ("PrashantiArrival", FieldKey::PrashantiArrival),
    ("Arrival Date", FieldKey::PrashantiArrival),
    ("प्रशांति आगमन", FieldKey::PrashantiArrival),
    ("आगमन", FieldKey::PrashantiArrival),
    ("prashanti_departure", FieldKey::PrashantiDeparture),
    ("PrashantiDeparture", FieldKey::PrashantiDeparture),
    ("Departure Date", FieldKey::PrashantiDeparture),
    ("प्रशांति प्रस्थान", FieldKey::PrashantiDeparture),
    ("प्रस्थान", FieldKey::PrashantiDeparture),
    ("duty_point", FieldKey::DutyPoint),
    ("DutyPoint", FieldKey::DutyPoint),
    ("ड्यूटी पॉइंट", FieldKey::DutyPoint),
    ("is_cancelled", FieldKey::IsCancelled),
    ("IsCancelled", FieldKey::IsCancelled),
    ("Cancelled", FieldKey::IsCancelled),
    ("रद्द", FieldKey::IsCancelled),
];

/// Trim, lowercase, and fold `_`, `-` and whitespace runs into one space.
pub fn normalize_header(raw: &str) -> String {
    SEPARATORS
        .replace_all(raw.trim(), " ")
        .trim()
        .to_lowercase()
}

/// Recognized header spellings, keyed by their normalized form.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    aliases: HashMap<String, FieldKey>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in English and Hindi spellings for the volunteer schema.
    pub fn volunteer() -> Self {
        DEFAULT_ALIASES
            .iter()
            .fold(Self::new(), |table, (spelling, key)| table.with_alias(spelling, *key))
    }

    pub fn with_alias(mut self, spelling: &str, key: FieldKey) -> Self {
        self.aliases.insert(normalize_header(spelling), key);
        self
    }

    pub fn lookup(&self, header: &str) -> Option<FieldKey> {
        self.aliases.get(&normalize_header(header)).copied()
    }
}

/// Raw column index to canonical key, fixed for one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMapping {
    columns: Vec<(usize, FieldKey)>,
    ignored: Vec<String>,
}

impl HeaderMapping {
    pub fn columns(&self) -> &[(usize, FieldKey)] {
        &self.columns
    }

    #[cfg(test)]
    pub fn column_of(&self, key: FieldKey) -> Option<usize> {
        self.columns.iter().find(|(_, k)| *k == key).map(|(idx, _)| *idx)
    }

    /// Header cells that matched nothing, in sheet order.
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }
}

#[derive(Debug, Clone)]
pub struct HeaderResolver {
    aliases: AliasTable,
}

impl HeaderResolver {
    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    pub fn resolve(&self, headers: &[String], schema: &FieldSchema) -> Result<HeaderMapping, UploadError> {
        let mut columns: Vec<(usize, FieldKey)> = Vec::new();
        let mut ignored = Vec::new();
        let mut conflicts = Vec::new();

        for (idx, raw) in headers.iter().enumerate() {
            if raw.trim().is_empty() {
                continue;
            }
            match self.aliases.lookup(raw).filter(|key| schema.get(*key).is_some()) {
                Some(key) => {
                    if let Some(&(first_idx, _)) = columns.iter().find(|(_, k)| *k == key) {
                        conflicts.push(HeaderConflict {
                            key,
                            first: headers[first_idx].trim().to_string(),
                            first_position: first_idx + 1,
                            second: raw.trim().to_string(),
                            second_position: idx + 1,
                        });
                    } else {
                        columns.push((idx, key));
                    }
                }
                None => {
                    debug!("Ignoring unrecognized column '{}'", raw.trim());
                    ignored.push(raw.trim().to_string());
                }
            }
        }

        let missing: Vec<String> = schema
            .required()
            .filter(|field| !columns.iter().any(|(_, k)| *k == field.key))
            .map(|field| field.display_label.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(UploadError::MissingHeaders(missing));
        }
        if !conflicts.is_empty() {
            return Err(UploadError::AmbiguousHeaders(conflicts));
        }

        Ok(HeaderMapping { columns, ignored })
    }
}

impl Default for HeaderResolver {
    fn default() -> Self {
        Self::new(AliasTable::volunteer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn spellings_in_both_languages_resolve() {
        let resolver = HeaderResolver::default();
        let schema = FieldSchema::volunteer();
        let mapping = resolver
            .resolve(
                &headers(&["  SAI  Connect-ID ", "पूरा नाम", "MobileNumber", "Remarks", ""]),
                &schema,
            )
            .unwrap();

        assert_eq!(mapping.column_of(FieldKey::SaiConnectId), Some(0));
        assert_eq!(mapping.column_of(FieldKey::FullName), Some(1));
        assert_eq!(mapping.column_of(FieldKey::MobileNumber), Some(2));
        assert_eq!(mapping.ignored(), ["Remarks".to_string()]);
    }

    #[test]
    fn missing_required_column_names_its_label() {
        let resolver = HeaderResolver::default();
        let err = resolver
            .resolve(&headers(&["Name", "Age"]), &FieldSchema::volunteer())
            .unwrap_err();
        match err {
            UploadError::MissingHeaders(labels) => assert_eq!(labels, vec!["SAI Connect ID"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn two_columns_for_one_key_are_ambiguous() {
        let resolver = HeaderResolver::default();
        let err = resolver
            .resolve(
                &headers(&["sai_connect_id", "Name", "full_name"]),
                &FieldSchema::volunteer(),
            )
            .unwrap_err();
        match err {
            UploadError::AmbiguousHeaders(conflicts) => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].key, FieldKey::FullName);
                assert_eq!(conflicts[0].first_position, 2);
                assert_eq!(conflicts[0].second_position, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn injected_table_replaces_builtin_spellings() {
        let table = AliasTable::new()
            .with_alias("Identifiant", FieldKey::SaiConnectId)
            .with_alias("Nom complet", FieldKey::FullName);
        let resolver = HeaderResolver::new(table);
        let schema = FieldSchema::volunteer();

        let mapping = resolver
            .resolve(&headers(&["Nom complet", "identifiant"]), &schema)
            .unwrap();
        assert_eq!(mapping.column_of(FieldKey::SaiConnectId), Some(1));

        assert!(resolver.resolve(&headers(&["Name", "sai_connect_id"]), &schema).is_err());
    }

    #[test]
    fn normalization_folds_case_and_separators() {
        assert_eq!(normalize_header("  Full_Name "), "full name");
        assert_eq!(normalize_header("SAI-Connect   ID"), "sai connect id");
        assert_eq!(AliasTable::volunteer().lookup("SSS DISTRICT"), Some(FieldKey::SssDistrict));
    }
}
