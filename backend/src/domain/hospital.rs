//! Hospital aggregate, departments, and partial-update merge.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::geo::{Coordinate, CoordinateValidationError};

/// Server-assigned numeric hospital identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct HospitalId(pub i64);

impl fmt::Display for HospitalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a medical department (care subject).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DepartmentId(pub i64);

impl fmt::Display for DepartmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Medical department referenced by hospitals. Catalogue data; not mutated
/// through this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
}

/// Hospital facility record.
///
/// ## Invariants
/// - `coordinate`, once set, is a valid (lat, lng) pair usable for distance
///   computation.
#[derive(Debug, Clone, PartialEq)]
pub struct Hospital {
    /// Server-assigned identity.
    pub id: HospitalId,
    /// Facility name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Contact email.
    pub email: String,
    /// Contact phone number.
    pub number: String,
    /// Geographic coordinate of the facility.
    pub coordinate: Coordinate,
    /// Associated departments, ids only. Ordered for deterministic output.
    pub departments: BTreeSet<DepartmentId>,
}

/// Hospital data before the store assigns an identity.
#[derive(Debug, Clone)]
pub struct NewHospital {
    pub name: String,
    pub address: String,
    pub email: String,
    pub number: String,
    pub coordinate: Coordinate,
}

/// Selective field merge applied to a stored hospital.
///
/// String semantics match account updates: absent or empty means "no
/// change". Coordinate components merge individually against the stored
/// pair.
#[derive(Debug, Clone, Default)]
pub struct HospitalUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub number: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

fn replace_if_supplied(target: &mut String, value: Option<&str>) {
    if let Some(value) = value
        && !value.is_empty()
    {
        value.clone_into(target);
    }
}

impl Hospital {
    /// Apply a selective merge to this hospital.
    ///
    /// Runs under the repository's record lock; the merged coordinate is
    /// re-validated so an out-of-range component can never land in the
    /// store.
    pub fn apply(&mut self, update: &HospitalUpdate) -> Result<(), CoordinateValidationError> {
        replace_if_supplied(&mut self.name, update.name.as_deref());
        replace_if_supplied(&mut self.address, update.address.as_deref());
        replace_if_supplied(&mut self.email, update.email.as_deref());
        replace_if_supplied(&mut self.number, update.number.as_deref());

        if update.lat.is_some() || update.lng.is_some() {
            let lat = update.lat.unwrap_or_else(|| self.coordinate.lat());
            let lng = update.lng.unwrap_or_else(|| self.coordinate.lng());
            self.coordinate = Coordinate::new(lat, lng)?;
        }

        Ok(())
    }

    /// Associate departments with this hospital. Re-adding an existing
    /// association is a no-op.
    pub fn add_departments(&mut self, ids: &[DepartmentId]) {
        self.departments.extend(ids.iter().copied());
    }
}
