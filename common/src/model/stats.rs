use serde::{Deserialize, Serialize};

/// Headline counts shown on the dashboard.
///
/// `coming` and `not_coming` split `total_volunteers` on the cancellation
/// flag; `registered` counts rows in the registration table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerStats {
    pub total_volunteers: u64,
    pub coming: u64,
    pub not_coming: u64,
    pub registered: u64,
}
