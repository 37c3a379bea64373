//! The canonical volunteer field schema.
//!
//! Every column an uploaded sheet may carry resolves to exactly one
//! [`FieldKey`]. The [`FieldSchema`] attached to those keys is the single
//! source of truth for header matching, type coercion and the constraints the
//! row validator enforces. Records are keyed by the closed `FieldKey` enum,
//! never by strings taken from the input file.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Canonical name of a volunteer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    SerialNumber,
    FullName,
    Age,
    AadharNumber,
    SaiConnectId,
    SevadalTrainingCertificate,
    MobileNumber,
    SssDistrict,
    Gender,
    SamitiOrBhajanMandli,
    Education,
    SpecialQualifications,
    PastPrashantiService,
    LastServiceLocation,
    OtherServiceLocation,
    PrashantiArrival,
    PrashantiDeparture,
    DutyPoint,
    IsCancelled,
}

impl FieldKey {
    /// All keys in column order.
    pub const ALL: [FieldKey; 19] = [
        FieldKey::SerialNumber,
        FieldKey::FullName,
        FieldKey::Age,
        FieldKey::AadharNumber,
        FieldKey::SaiConnectId,
        FieldKey::SevadalTrainingCertificate,
        FieldKey::MobileNumber,
        FieldKey::SssDistrict,
        FieldKey::Gender,
        FieldKey::SamitiOrBhajanMandli,
        FieldKey::Education,
        FieldKey::SpecialQualifications,
        FieldKey::PastPrashantiService,
        FieldKey::LastServiceLocation,
        FieldKey::OtherServiceLocation,
        FieldKey::PrashantiArrival,
        FieldKey::PrashantiDeparture,
        FieldKey::DutyPoint,
        FieldKey::IsCancelled,
    ];

    /// Column name used in storage and in JSON payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKey::SerialNumber => "serial_number",
            FieldKey::FullName => "full_name",
            FieldKey::Age => "age",
            FieldKey::AadharNumber => "aadhar_number",
            FieldKey::SaiConnectId => "sai_connect_id",
            FieldKey::SevadalTrainingCertificate => "sevadal_training_certificate",
            FieldKey::MobileNumber => "mobile_number",
            FieldKey::SssDistrict => "sss_district",
            FieldKey::Gender => "gender",
            FieldKey::SamitiOrBhajanMandli => "samiti_or_bhajan_mandli",
            FieldKey::Education => "education",
            FieldKey::SpecialQualifications => "special_qualifications",
            FieldKey::PastPrashantiService => "past_prashanti_service",
            FieldKey::LastServiceLocation => "last_service_location",
            FieldKey::OtherServiceLocation => "other_service_location",
            FieldKey::PrashantiArrival => "prashanti_arrival",
            FieldKey::PrashantiDeparture => "prashanti_departure",
            FieldKey::DutyPoint => "duty_point",
            FieldKey::IsCancelled => "is_cancelled",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type of a field; drives cell coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    Boolean,
    Date,
}

/// Whether a fixed-length identifier is the upload's unique key or a
/// secondary contact/identity number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierRole {
    /// Short values are zero-padded on the left.
    Primary,
    /// A lone stray digit is dropped; other length mismatches are errors.
    Secondary,
}

/// Extra rule the validator applies on top of presence and type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    None,
    /// Digits-only identifier of exactly `length` digits.
    Identifier { length: usize, role: IdentifierRole },
    /// Inclusive integer range; out-of-range values are reset to absent.
    Range { min: i64, max: i64 },
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldDescriptor {
    pub key: FieldKey,
    pub display_label: &'static str,
    pub required: bool,
    pub field_type: FieldType,
    pub constraint: Constraint,
}

impl FieldDescriptor {
    pub const fn new(key: FieldKey, display_label: &'static str, field_type: FieldType) -> Self {
        Self {
            key,
            display_label,
            required: false,
            field_type,
            constraint: Constraint::None,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn constrained(mut self, constraint: Constraint) -> Self {
        self.constraint = constraint;
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("field '{0}' is declared more than once")]
    DuplicateField(FieldKey),
    #[error("unique key '{0}' has no descriptor")]
    MissingUniqueKey(FieldKey),
    #[error("unique key '{0}' must be required")]
    OptionalUniqueKey(FieldKey),
}

/// Ordered set of field descriptors plus the designated unique key.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSchema {
    fields: Vec<FieldDescriptor>,
    unique_key: FieldKey,
}

impl FieldSchema {
    pub fn new(fields: Vec<FieldDescriptor>, unique_key: FieldKey) -> Result<Self, SchemaError> {
        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.key) {
                return Err(SchemaError::DuplicateField(field.key));
            }
        }
        match fields.iter().find(|f| f.key == unique_key) {
            None => Err(SchemaError::MissingUniqueKey(unique_key)),
            Some(f) if !f.required => Err(SchemaError::OptionalUniqueKey(unique_key)),
            Some(_) => Ok(Self { fields, unique_key }),
        }
    }

    /// The volunteer register: 6-digit SAI Connect ID as unique key,
    /// 10-digit mobile and 12-digit Aadhar as secondary identifiers.
    pub fn volunteer() -> Self {
        use Constraint::{Identifier, Range};
        use FieldKey as K;
        use FieldType::{Boolean, Date, Integer, String};
        use IdentifierRole::{Primary, Secondary};

        let fields = vec![
            FieldDescriptor::new(K::SerialNumber, "Serial Number", String),
            FieldDescriptor::new(K::FullName, "Full Name", String).required(),
            FieldDescriptor::new(K::Age, "Age", Integer)
                .constrained(Range { min: 1, max: 120 }),
            FieldDescriptor::new(K::AadharNumber, "Aadhar Number", String)
                .constrained(Identifier { length: 12, role: Secondary }),
            FieldDescriptor::new(K::SaiConnectId, "SAI Connect ID", String)
                .required()
                .constrained(Identifier { length: 6, role: Primary }),
            FieldDescriptor::new(K::SevadalTrainingCertificate, "Sevadal Training Certificate", Boolean),
            FieldDescriptor::new(K::MobileNumber, "Mobile Number", String)
                .constrained(Identifier { length: 10, role: Secondary }),
            FieldDescriptor::new(K::SssDistrict, "SSS District", String),
            FieldDescriptor::new(K::Gender, "Gender", String),
            FieldDescriptor::new(K::SamitiOrBhajanMandli, "Samiti / Bhajan Mandli", String),
            FieldDescriptor::new(K::Education, "Education", String),
            FieldDescriptor::new(K::SpecialQualifications, "Special Qualifications", String),
            FieldDescriptor::new(K::PastPrashantiService, "Past Prashanti Service", Boolean),
            FieldDescriptor::new(K::LastServiceLocation, "Last Service Location", String),
            FieldDescriptor::new(K::OtherServiceLocation, "Other Service Location", String),
            FieldDescriptor::new(K::PrashantiArrival, "Prashanti Arrival", Date),
            FieldDescriptor::new(K::PrashantiDeparture, "Prashanti Departure", Date),
            FieldDescriptor::new(K::DutyPoint, "Duty Point", String),
            FieldDescriptor::new(K::IsCancelled, "Is Cancelled", Boolean),
        ];

        Self {
            fields,
            unique_key: K::SaiConnectId,
        }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn get(&self, key: FieldKey) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn required(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.required)
    }

    pub fn unique_key(&self) -> FieldKey {
        self.unique_key
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::volunteer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volunteer_schema_has_one_descriptor_per_key() {
        let schema = FieldSchema::volunteer();
        assert_eq!(schema.fields().len(), FieldKey::ALL.len());
        for key in FieldKey::ALL {
            assert!(schema.get(key).is_some(), "missing descriptor for {key}");
        }
        let required: Vec<_> = schema.required().map(|f| f.key).collect();
        assert_eq!(required, vec![FieldKey::FullName, FieldKey::SaiConnectId]);
    }

    #[test]
    fn duplicate_descriptor_is_refused() {
        let fields = vec![
            FieldDescriptor::new(FieldKey::SaiConnectId, "ID", FieldType::String).required(),
            FieldDescriptor::new(FieldKey::SaiConnectId, "ID again", FieldType::String),
        ];
        assert_eq!(
            FieldSchema::new(fields, FieldKey::SaiConnectId).unwrap_err(),
            SchemaError::DuplicateField(FieldKey::SaiConnectId)
        );
    }

    #[test]
    fn unique_key_must_be_required() {
        let fields = vec![FieldDescriptor::new(FieldKey::SaiConnectId, "ID", FieldType::String)];
        assert_eq!(
            FieldSchema::new(fields, FieldKey::SaiConnectId).unwrap_err(),
            SchemaError::OptionalUniqueKey(FieldKey::SaiConnectId)
        );
    }

    #[test]
    fn keys_serialize_as_column_names() {
        let json = serde_json::to_string(&FieldKey::SamitiOrBhajanMandli).unwrap();
        assert_eq!(json, "\"samiti_or_bhajan_mandli\"");
        assert_eq!(FieldKey::SamitiOrBhajanMandli.to_string(), "samiti_or_bhajan_mandli");
    }
}
