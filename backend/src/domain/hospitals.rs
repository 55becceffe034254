//! Hospital directory domain service.
//!
//! Implements facility CRUD, department association, and proximity ranking
//! on top of the [`HospitalRepository`] port. Ranking walks every stored
//! facility; the directory is bounded and needs no spatial index.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;

use super::error::Error;
use super::geo::Coordinate;
use super::hospital::{DepartmentId, Hospital, HospitalId, HospitalUpdate, NewHospital};
use super::ports::{HospitalPersistenceError, HospitalRepository};

/// A hospital paired with its great-circle distance from a query point.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedHospital {
    pub hospital: Hospital,
    pub distance_km: f64,
}

/// Driving port for the hospital directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HospitalDirectory: Send + Sync {
    /// Register a new facility.
    async fn create(&self, hospital: NewHospital) -> Result<Hospital, Error>;

    /// Fetch a facility by identifier.
    async fn get_by_id(&self, id: HospitalId) -> Result<Hospital, Error>;

    /// Merge a partial update into the stored facility.
    async fn update_details(
        &self,
        id: HospitalId,
        update: HospitalUpdate,
    ) -> Result<Hospital, Error>;

    /// Associate catalogue departments with a facility.
    async fn add_departments(
        &self,
        id: HospitalId,
        departments: Vec<DepartmentId>,
    ) -> Result<Hospital, Error>;

    /// Every facility, ordered by ascending identifier.
    async fn list_all(&self) -> Result<Vec<Hospital>, Error>;

    /// Every facility ranked by distance from `origin`, nearest first.
    /// Equidistant facilities order by ascending identifier.
    async fn rank_by_proximity(&self, origin: Coordinate) -> Result<Vec<RankedHospital>, Error>;
}

/// Hospital directory service implementing the driving port.
#[derive(Clone)]
pub struct HospitalService<R> {
    repo: Arc<R>,
}

impl<R> HospitalService<R> {
    /// Create a new service over the repository.
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

impl<R> HospitalService<R>
where
    R: HospitalRepository,
{
    fn map_persistence_error(error: HospitalPersistenceError) -> Error {
        match error {
            HospitalPersistenceError::HospitalMissing { id } => {
                Error::not_found(format!("hospital {id} does not exist"))
            }
            HospitalPersistenceError::UnknownDepartment { id } => {
                Error::not_found(format!("department {id} does not exist"))
            }
            HospitalPersistenceError::InvalidCoordinate(error) => {
                Error::validation(error.to_string())
            }
            HospitalPersistenceError::Query { message } => {
                Error::internal(format!("hospital repository error: {message}"))
            }
        }
    }
}

#[async_trait]
impl<R> HospitalDirectory for HospitalService<R>
where
    R: HospitalRepository,
{
    async fn create(&self, hospital: NewHospital) -> Result<Hospital, Error> {
        self.repo
            .insert(hospital)
            .await
            .map_err(Self::map_persistence_error)
    }

    async fn get_by_id(&self, id: HospitalId) -> Result<Hospital, Error> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| Error::not_found(format!("hospital {id} does not exist")))
    }

    async fn update_details(
        &self,
        id: HospitalId,
        update: HospitalUpdate,
    ) -> Result<Hospital, Error> {
        self.repo
            .update(id, update)
            .await
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| Error::not_found(format!("hospital {id} does not exist")))
    }

    async fn add_departments(
        &self,
        id: HospitalId,
        departments: Vec<DepartmentId>,
    ) -> Result<Hospital, Error> {
        self.repo
            .add_departments(id, &departments)
            .await
            .map_err(Self::map_persistence_error)
    }

    async fn list_all(&self) -> Result<Vec<Hospital>, Error> {
        self.repo
            .list_all()
            .await
            .map_err(Self::map_persistence_error)
    }

    async fn rank_by_proximity(&self, origin: Coordinate) -> Result<Vec<RankedHospital>, Error> {
        let mut ranked: Vec<RankedHospital> = self
            .repo
            .list_all()
            .await
            .map_err(Self::map_persistence_error)?
            .into_iter()
            .map(|hospital| {
                let distance_km = origin.distance_km(&hospital.coordinate);
                RankedHospital {
                    hospital,
                    distance_km,
                }
            })
            .collect();

        // Distances are finite because every stored coordinate is; the
        // identifier tiebreak keeps equidistant output deterministic.
        ranked.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.hospital.id.cmp(&b.hospital.id))
        });

        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockHospitalRepository;
    use mockall::predicate::eq;
    use std::collections::BTreeSet;

    fn facility(id: i64, lat: f64, lng: f64) -> Hospital {
        Hospital {
            id: HospitalId(id),
            name: format!("Hospital {id}"),
            address: "somewhere".into(),
            email: format!("desk{id}@example.com"),
            number: "02-000-0000".into(),
            coordinate: Coordinate::new(lat, lng).expect("valid coordinate"),
            departments: BTreeSet::new(),
        }
    }

    #[tokio::test]
    async fn get_by_id_maps_missing_to_not_found() {
        let mut repo = MockHospitalRepository::new();
        repo.expect_find_by_id()
            .with(eq(HospitalId(9)))
            .times(1)
            .return_once(|_| Ok(None));

        let service = HospitalService::new(Arc::new(repo));
        let error = service
            .get_by_id(HospitalId(9))
            .await
            .expect_err("missing hospital");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn unknown_department_maps_to_not_found() {
        let mut repo = MockHospitalRepository::new();
        repo.expect_add_departments()
            .times(1)
            .return_once(|_, _| {
                Err(HospitalPersistenceError::UnknownDepartment {
                    id: DepartmentId(42),
                })
            });

        let service = HospitalService::new(Arc::new(repo));
        let error = service
            .add_departments(HospitalId(1), vec![DepartmentId(42)])
            .await
            .expect_err("unknown department");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn ranking_orders_nearest_first() {
        let mut repo = MockHospitalRepository::new();
        repo.expect_list_all().times(1).return_once(|| {
            Ok(vec![
                facility(1, 37.60, 127.13),
                facility(2, 37.50, 127.03),
                facility(3, 38.00, 127.50),
            ])
        });

        let service = HospitalService::new(Arc::new(repo));
        let origin = Coordinate::new(37.50, 127.03).expect("valid coordinate");
        let ranked = service
            .rank_by_proximity(origin)
            .await
            .expect("ranking succeeds");

        let order: Vec<i64> = ranked.iter().map(|entry| entry.hospital.id.0).collect();
        assert_eq!(order, vec![2, 1, 3]);
        assert_eq!(ranked[0].distance_km, 0.0);
        assert!(
            (13.0..=14.5).contains(&ranked[1].distance_km),
            "expected ~13-14 km, got {}",
            ranked[1].distance_km
        );
        assert!(ranked[2].distance_km > ranked[1].distance_km);
    }

    #[tokio::test]
    async fn equidistant_facilities_order_by_identifier() {
        let mut repo = MockHospitalRepository::new();
        repo.expect_list_all().times(1).return_once(|| {
            Ok(vec![
                facility(8, 37.50, 127.03),
                facility(3, 37.50, 127.03),
            ])
        });

        let service = HospitalService::new(Arc::new(repo));
        let origin = Coordinate::new(37.50, 127.03).expect("valid coordinate");
        let ranked = service
            .rank_by_proximity(origin)
            .await
            .expect("ranking succeeds");

        let order: Vec<i64> = ranked.iter().map(|entry| entry.hospital.id.0).collect();
        assert_eq!(order, vec![3, 8]);
    }
}
