//! In-memory [`HospitalRepository`] adapter with a department catalogue.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::hospital::{
    Department, DepartmentId, Hospital, HospitalId, HospitalUpdate, NewHospital,
};
use crate::domain::ports::{HospitalPersistenceError, HospitalRepository};

#[derive(Debug, Default)]
struct HospitalsState {
    next_id: i64,
    hospitals: BTreeMap<i64, Hospital>,
    catalogue: BTreeMap<i64, Department>,
}

/// Mutex-guarded hospital store.
///
/// The department catalogue is seeded at construction and read-only
/// afterwards; hospitals reference it by identifier.
#[derive(Debug, Default)]
pub struct InMemoryHospitalRepository {
    state: Mutex<HospitalsState>,
}

impl InMemoryHospitalRepository {
    /// Create an empty store with no catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the given department catalogue.
    #[must_use]
    pub fn with_departments(departments: Vec<Department>) -> Self {
        let catalogue = departments
            .into_iter()
            .map(|department| (department.id.0, department))
            .collect();
        Self {
            state: Mutex::new(HospitalsState {
                next_id: 0,
                hospitals: BTreeMap::new(),
                catalogue,
            }),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HospitalsState>, HospitalPersistenceError> {
        self.state
            .lock()
            .map_err(|_| HospitalPersistenceError::query("hospital store lock poisoned"))
    }
}

#[async_trait]
impl HospitalRepository for InMemoryHospitalRepository {
    async fn insert(&self, hospital: NewHospital) -> Result<Hospital, HospitalPersistenceError> {
        let mut state = self.lock()?;
        state.next_id += 1;
        let stored = Hospital {
            id: HospitalId(state.next_id),
            name: hospital.name,
            address: hospital.address,
            email: hospital.email,
            number: hospital.number,
            coordinate: hospital.coordinate,
            departments: BTreeSet::new(),
        };
        state.hospitals.insert(stored.id.0, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(
        &self,
        id: HospitalId,
    ) -> Result<Option<Hospital>, HospitalPersistenceError> {
        let state = self.lock()?;
        Ok(state.hospitals.get(&id.0).cloned())
    }

    async fn update(
        &self,
        id: HospitalId,
        update: HospitalUpdate,
    ) -> Result<Option<Hospital>, HospitalPersistenceError> {
        let mut state = self.lock()?;
        let Some(hospital) = state.hospitals.get_mut(&id.0) else {
            return Ok(None);
        };
        // Merge onto a copy first so a rejected coordinate leaves the stored
        // record untouched.
        let mut merged = hospital.clone();
        merged.apply(&update)?;
        *hospital = merged.clone();
        Ok(Some(merged))
    }

    async fn add_departments(
        &self,
        id: HospitalId,
        departments: &[DepartmentId],
    ) -> Result<Hospital, HospitalPersistenceError> {
        let mut state = self.lock()?;

        if let Some(unknown) = departments
            .iter()
            .find(|department| !state.catalogue.contains_key(&department.0))
        {
            return Err(HospitalPersistenceError::UnknownDepartment { id: *unknown });
        }

        let Some(hospital) = state.hospitals.get_mut(&id.0) else {
            return Err(HospitalPersistenceError::HospitalMissing { id });
        };
        hospital.add_departments(departments);
        Ok(hospital.clone())
    }

    async fn list_all(&self) -> Result<Vec<Hospital>, HospitalPersistenceError> {
        let state = self.lock()?;
        Ok(state.hospitals.values().cloned().collect())
    }
}
