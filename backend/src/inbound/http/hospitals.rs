//! Hospital directory API handlers.
//!
//! ```text
//! POST  /hospitals                      create a facility
//! GET   /hospitals                      full directory snapshot
//! GET   /hospitals/near?lat=&lng=       proximity-ranked directory
//! GET   /hospitals/{id}
//! PATCH /hospitals/HosUpdate/{id}       partial update
//! POST  /hospitals/{id}/departments     associate catalogue departments
//! ```

use actix_web::{get, patch, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    Coordinate, DepartmentId, Error, Hospital, HospitalId, HospitalUpdate, NewHospital,
    RankedHospital,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Creation body for `POST /hospitals`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateHospitalRequest {
    pub hos_name: String,
    pub hos_address: String,
    pub hos_email: String,
    pub hos_number: String,
    pub hos_lat: f64,
    pub hos_lng: f64,
}

/// Acknowledgement payload for `POST /hospitals`.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HospitalCreatedResponse {
    pub message: String,
    pub id: i64,
}

/// Facility projection returned by reads and listings.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HospitalResponse {
    pub id: i64,
    pub hos_name: String,
    pub hos_address: String,
    pub hos_email: String,
    pub hos_number: String,
    pub hos_lat: f64,
    pub hos_lng: f64,
    pub departments: Vec<i64>,
}

impl From<Hospital> for HospitalResponse {
    fn from(hospital: Hospital) -> Self {
        Self {
            id: hospital.id.0,
            hos_name: hospital.name,
            hos_address: hospital.address,
            hos_email: hospital.email,
            hos_number: hospital.number,
            hos_lat: hospital.coordinate.lat(),
            hos_lng: hospital.coordinate.lng(),
            departments: hospital
                .departments
                .iter()
                .map(|department| department.0)
                .collect(),
        }
    }
}

/// Partial-update body for `PATCH /hospitals/HosUpdate/{id}`.
///
/// Absent and empty-string fields leave the stored value untouched;
/// coordinate components merge individually.
#[derive(Deserialize, Serialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HospitalUpdateRequest {
    pub hos_name: Option<String>,
    pub hos_address: Option<String>,
    pub hos_email: Option<String>,
    pub hos_number: Option<String>,
    pub hos_lat: Option<f64>,
    pub hos_lng: Option<f64>,
}

/// Echo payload for `PATCH /hospitals/HosUpdate/{id}` carrying the merged
/// field set.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HospitalUpdatedResponse {
    pub message: String,
    pub id: i64,
    pub hos_name: String,
    pub hos_address: String,
    pub hos_email: String,
    pub hos_number: String,
    pub hos_lat: f64,
    pub hos_lng: f64,
}

/// Association body for `POST /hospitals/{id}/departments`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
pub struct AddDepartmentsRequest {
    pub departments: Vec<i64>,
}

/// Echo payload for `POST /hospitals/{id}/departments` carrying the full
/// post-merge association set.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentsResponse {
    pub message: String,
    pub hospital_id: i64,
    pub departments: Vec<i64>,
}

/// Proximity query for `GET /hospitals/near`.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct NearbyQuery {
    /// Latitude of the query point in decimal degrees.
    pub lat: f64,
    /// Longitude of the query point in decimal degrees.
    pub lng: f64,
}

/// One ranked entry of `GET /hospitals/near`.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct RankedHospitalResponse {
    pub hospital: HospitalResponse,
    /// Great-circle distance from the query point in kilometres.
    pub distance: f64,
}

impl From<RankedHospital> for RankedHospitalResponse {
    fn from(ranked: RankedHospital) -> Self {
        Self {
            hospital: ranked.hospital.into(),
            distance: ranked.distance_km,
        }
    }
}

fn coordinate_from(lat: f64, lng: f64) -> Result<Coordinate, Error> {
    Coordinate::new(lat, lng).map_err(|error| {
        Error::validation(error.to_string()).with_details(json!({
            "lat": if lat.is_finite() { json!(lat) } else { json!(null) },
            "lng": if lng.is_finite() { json!(lng) } else { json!(null) },
        }))
    })
}

/// Register a new facility.
#[utoipa::path(
    post,
    path = "/hospitals",
    request_body = CreateHospitalRequest,
    responses(
        (status = 200, description = "Facility created", body = HospitalCreatedResponse),
        (status = 400, description = "Invalid coordinate or field", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["hospitals"],
    operation_id = "createHospital",
    security([])
)]
#[post("")]
pub async fn create_hospital(
    state: web::Data<HttpState>,
    payload: web::Json<CreateHospitalRequest>,
) -> ApiResult<web::Json<HospitalCreatedResponse>> {
    let payload = payload.into_inner();
    let coordinate = coordinate_from(payload.hos_lat, payload.hos_lng)?;

    let hospital = state
        .hospitals
        .create(NewHospital {
            name: payload.hos_name,
            address: payload.hos_address,
            email: payload.hos_email,
            number: payload.hos_number,
            coordinate,
        })
        .await?;

    Ok(web::Json(HospitalCreatedResponse {
        message: "hospital created".into(),
        id: hospital.id.0,
    }))
}

/// Full directory snapshot.
#[utoipa::path(
    get,
    path = "/hospitals",
    responses(
        (status = 200, description = "All facilities", body = [HospitalResponse]),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["hospitals"],
    operation_id = "listHospitals",
    security([])
)]
#[get("")]
pub async fn list_hospitals(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<HospitalResponse>>> {
    let hospitals = state.hospitals.list_all().await?;
    Ok(web::Json(
        hospitals.into_iter().map(HospitalResponse::from).collect(),
    ))
}

/// Directory ranked by distance from the query point, nearest first.
#[utoipa::path(
    get,
    path = "/hospitals/near",
    params(NearbyQuery),
    responses(
        (status = 200, description = "Ranked facilities", body = [RankedHospitalResponse]),
        (status = 400, description = "Invalid query coordinate", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["hospitals"],
    operation_id = "nearbyHospitals",
    security([])
)]
#[get("/near")]
pub async fn nearby_hospitals(
    state: web::Data<HttpState>,
    query: web::Query<NearbyQuery>,
) -> ApiResult<web::Json<Vec<RankedHospitalResponse>>> {
    let origin = coordinate_from(query.lat, query.lng)?;
    let ranked = state.hospitals.rank_by_proximity(origin).await?;
    Ok(web::Json(
        ranked.into_iter().map(RankedHospitalResponse::from).collect(),
    ))
}

/// Fetch a facility by identifier.
#[utoipa::path(
    get,
    path = "/hospitals/{id}",
    params(("id" = i64, Path, description = "Hospital identifier")),
    responses(
        (status = 200, description = "Facility", body = HospitalResponse),
        (status = 404, description = "Hospital does not exist", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["hospitals"],
    operation_id = "getHospital",
    security([])
)]
#[get("/{id}")]
pub async fn get_hospital(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<HospitalResponse>> {
    let hospital = state
        .hospitals
        .get_by_id(HospitalId(path.into_inner()))
        .await?;
    Ok(web::Json(hospital.into()))
}

/// Merge a partial update into the stored facility.
#[utoipa::path(
    patch,
    path = "/hospitals/HosUpdate/{id}",
    params(("id" = i64, Path, description = "Hospital identifier")),
    request_body = HospitalUpdateRequest,
    responses(
        (status = 200, description = "Facility updated", body = HospitalUpdatedResponse),
        (status = 400, description = "Invalid coordinate component", body = Error),
        (status = 404, description = "Hospital does not exist", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["hospitals"],
    operation_id = "updateHospital",
    security([])
)]
#[patch("/HosUpdate/{id}")]
pub async fn update_hospital(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<HospitalUpdateRequest>,
) -> ApiResult<web::Json<HospitalUpdatedResponse>> {
    let payload = payload.into_inner();
    let hospital = state
        .hospitals
        .update_details(
            HospitalId(path.into_inner()),
            HospitalUpdate {
                name: payload.hos_name,
                address: payload.hos_address,
                email: payload.hos_email,
                number: payload.hos_number,
                lat: payload.hos_lat,
                lng: payload.hos_lng,
            },
        )
        .await?;

    Ok(web::Json(HospitalUpdatedResponse {
        message: "hospital updated".into(),
        id: hospital.id.0,
        hos_name: hospital.name,
        hos_address: hospital.address,
        hos_email: hospital.email,
        hos_number: hospital.number,
        hos_lat: hospital.coordinate.lat(),
        hos_lng: hospital.coordinate.lng(),
    }))
}

/// Associate catalogue departments with a facility.
///
/// A single unknown department identifier rejects the whole call; repeats
/// of an existing association are no-ops.
#[utoipa::path(
    post,
    path = "/hospitals/{id}/departments",
    params(("id" = i64, Path, description = "Hospital identifier")),
    request_body = AddDepartmentsRequest,
    responses(
        (status = 200, description = "Departments associated", body = DepartmentsResponse),
        (status = 404, description = "Hospital or department does not exist", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["hospitals"],
    operation_id = "addDepartments",
    security([])
)]
#[post("/{id}/departments")]
pub async fn add_departments(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<AddDepartmentsRequest>,
) -> ApiResult<web::Json<DepartmentsResponse>> {
    let departments: Vec<DepartmentId> = payload
        .into_inner()
        .departments
        .into_iter()
        .map(DepartmentId)
        .collect();

    let hospital = state
        .hospitals
        .add_departments(HospitalId(path.into_inner()), departments)
        .await?;

    Ok(web::Json(DepartmentsResponse {
        message: "departments updated".into(),
        hospital_id: hospital.id.0,
        departments: hospital
            .departments
            .iter()
            .map(|department| department.0)
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::accounts::MockAccountLifecycle;
    use crate::domain::hospitals::MockHospitalDirectory;
    use crate::domain::ports::MockSessionStore;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use serde_json::Value;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn fixture_hospital(id: i64) -> Hospital {
        Hospital {
            id: HospitalId(id),
            name: "Central Care".into(),
            address: "1 Teheran-ro".into(),
            email: "desk@central.example".into(),
            number: "02-123-4567".into(),
            coordinate: Coordinate::new(37.50, 127.03).expect("valid coordinate"),
            departments: BTreeSet::from([DepartmentId(1), DepartmentId(3)]),
        }
    }

    fn state_with(hospitals: MockHospitalDirectory) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(
            Arc::new(MockAccountLifecycle::new()),
            Arc::new(hospitals),
            Arc::new(MockSessionStore::new()),
        ))
    }

    fn test_app(
        state: web::Data<HttpState>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new().app_data(state).service(
            web::scope("/hospitals")
                .service(create_hospital)
                .service(list_hospitals)
                .service(nearby_hospitals)
                .service(update_hospital)
                .service(add_departments)
                .service(get_hospital),
        )
    }

    #[actix_web::test]
    async fn create_rejects_out_of_range_coordinates() {
        let mut hospitals = MockHospitalDirectory::new();
        hospitals.expect_create().times(0);

        let app = actix_test::init_service(test_app(state_with(hospitals))).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/hospitals")
                .set_json(CreateHospitalRequest {
                    hos_name: "Central Care".into(),
                    hos_address: "1 Teheran-ro".into(),
                    hos_email: "desk@central.example".into(),
                    hos_number: "02-123-4567".into(),
                    hos_lat: 120.0,
                    hos_lng: 127.03,
                })
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn update_echoes_the_merged_field_set() {
        let mut hospitals = MockHospitalDirectory::new();
        hospitals
            .expect_update_details()
            .times(1)
            .return_once(|_, _| {
                let mut hospital = fixture_hospital(3);
                hospital.address = "2 Gangnam-daero".into();
                Ok(hospital)
            });

        let app = actix_test::init_service(test_app(state_with(hospitals))).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::patch()
                .uri("/hospitals/HosUpdate/3")
                .set_json(HospitalUpdateRequest {
                    hos_address: Some("2 Gangnam-daero".into()),
                    ..HospitalUpdateRequest::default()
                })
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let value: Value = actix_test::read_body_json(res).await;
        assert_eq!(value.get("id"), Some(&Value::from(3)));
        assert_eq!(
            value.get("hosAddress"),
            Some(&Value::from("2 Gangnam-daero"))
        );
        assert_eq!(value.get("hosName"), Some(&Value::from("Central Care")));
    }

    #[actix_web::test]
    async fn near_route_wins_over_the_id_route() {
        let mut hospitals = MockHospitalDirectory::new();
        hospitals.expect_get_by_id().times(0);
        hospitals
            .expect_rank_by_proximity()
            .times(1)
            .return_once(|_| {
                Ok(vec![RankedHospital {
                    hospital: fixture_hospital(1),
                    distance_km: 0.0,
                }])
            });

        let app = actix_test::init_service(test_app(state_with(hospitals))).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/hospitals/near?lat=37.50&lng=127.03")
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let value: Value = actix_test::read_body_json(res).await;
        let entries = value.as_array().expect("array body");
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].pointer("/hospital/id"),
            Some(&Value::from(1))
        );
        assert_eq!(entries[0].get("distance"), Some(&Value::from(0.0)));
    }

    #[actix_web::test]
    async fn departments_echo_the_post_merge_set() {
        let mut hospitals = MockHospitalDirectory::new();
        hospitals
            .expect_add_departments()
            .times(1)
            .return_once(|_, _| Ok(fixture_hospital(2)));

        let app = actix_test::init_service(test_app(state_with(hospitals))).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/hospitals/2/departments")
                .set_json(AddDepartmentsRequest {
                    departments: vec![1, 3],
                })
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let value: Value = actix_test::read_body_json(res).await;
        assert_eq!(value.get("hospitalId"), Some(&Value::from(2)));
        assert_eq!(
            value.get("departments"),
            Some(&Value::from(vec![1, 3]))
        );
    }
}
