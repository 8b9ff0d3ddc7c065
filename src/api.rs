//! HTTP surface for the rosterd service.
//!
//! This module exposes the student REST API under `/api/v1/students`:
//!
//! - `GET /` – List students, optionally ordered by last name
//!   (`?sort=asc|desc`) and truncated (`?limit=N`).
//! - `POST /` – Validate and create a student document.
//! - `GET|PUT|DELETE /:id` – Fetch, merge-update, or hard-delete one student.
//! - `GET|POST|PUT|DELETE /:id/classes` – Read or rewrite a student's class
//!   list (append, remove/replace, or wholesale replacement).
//! - `GET /:id/classes/:class_name` – Look up a single class by canonical
//!   name.
//!
//! Every response uses the `{success, data|message, count?}` envelope, and
//! every failure kind (validation, unknown id, storage trouble) maps to
//! HTTP 400 with `success: false`. A `GET /metrics` route outside the API
//! prefix reports roster activity counters.

use crate::roster::{
    ListOptions, NewStudent, RosterApi, RosterError, Student, StudentPatch, classes::canonicalize,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Build the HTTP router exposing the roster API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: RosterApi + 'static,
{
    let students = Router::new()
        .route("/", get(list_students::<S>).post(create_student::<S>))
        .route(
            "/:id",
            get(get_student::<S>)
                .put(update_student::<S>)
                .delete(delete_student::<S>),
        )
        .route(
            "/:id/classes",
            get(get_classes::<S>)
                .post(create_classes::<S>)
                .put(update_classes::<S>)
                .delete(delete_classes::<S>),
        )
        .route("/:id/classes/:class_name", get(get_class::<S>));

    Router::new()
        .nest("/api/v1/students", students)
        .route("/metrics", get(get_metrics::<S>))
        .with_state(service)
}

/// Raw query parameters accepted by the list endpoint.
#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    sort: Option<String>,
    #[serde(default)]
    limit: Option<String>,
}

/// Success response for the list endpoint.
#[derive(Serialize)]
struct StudentListResponse {
    success: bool,
    count: usize,
    data: Vec<Student>,
}

/// List students, optionally sorted by last name and truncated.
async fn list_students<S>(
    State(service): State<Arc<S>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<StudentListResponse>, ApiError>
where
    S: RosterApi,
{
    let options = ListOptions::parse(query.sort.as_deref(), query.limit.as_deref())?;
    let students = service.list_students(options).await?;
    tracing::debug!(count = students.len(), "Listed students");
    Ok(Json(StudentListResponse {
        success: true,
        count: students.len(),
        data: students,
    }))
}

/// Student fields accepted by the create and update endpoints.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct StudentFieldsRequest {
    first_name: Option<String>,
    last_name: Option<String>,
    grade: Option<f64>,
    classes: Option<Vec<String>>,
}

/// Success response wrapping a single student document.
#[derive(Serialize)]
struct StudentResponse {
    success: bool,
    data: Student,
}

/// Validate and create a student.
async fn create_student<S>(
    State(service): State<Arc<S>>,
    body: Result<Json<StudentFieldsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StudentResponse>), ApiError>
where
    S: RosterApi,
{
    let Json(request) = body.map_err(bad_json)?;
    let student = service
        .create_student(NewStudent {
            first_name: request.first_name,
            last_name: request.last_name,
            grade: request.grade,
            classes: request.classes,
        })
        .await?;
    tracing::info!(id = %student.id, "Create request completed");
    Ok((
        StatusCode::CREATED,
        Json(StudentResponse {
            success: true,
            data: student,
        }),
    ))
}

/// Fetch a single student by id.
async fn get_student<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<StudentResponse>, ApiError>
where
    S: RosterApi,
{
    let student = service.fetch_student(&id).await?;
    Ok(Json(StudentResponse {
        success: true,
        data: student,
    }))
}

/// Merge the provided fields into an existing student.
async fn update_student<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
    body: Result<Json<StudentFieldsRequest>, JsonRejection>,
) -> Result<Json<StudentResponse>, ApiError>
where
    S: RosterApi,
{
    let Json(request) = body.map_err(bad_json)?;
    let student = service
        .update_student(
            &id,
            StudentPatch {
                first_name: request.first_name,
                last_name: request.last_name,
                grade: request.grade,
                classes: request.classes,
            },
        )
        .await?;
    tracing::info!(id = %student.id, "Update request completed");
    Ok(Json(StudentResponse {
        success: true,
        data: student,
    }))
}

/// Hard-delete a student, returning its last stored state.
async fn delete_student<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<StudentResponse>, ApiError>
where
    S: RosterApi,
{
    let student = service.remove_student(&id).await?;
    tracing::info!(id = %student.id, "Delete request completed");
    Ok(Json(StudentResponse {
        success: true,
        data: student,
    }))
}

/// Success response wrapping a class list.
#[derive(Serialize)]
struct ClassListResponse {
    success: bool,
    data: Vec<String>,
}

/// Return a student's class list verbatim.
async fn get_classes<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<ClassListResponse>, ApiError>
where
    S: RosterApi,
{
    let classes = service.list_classes(&id).await?;
    Ok(Json(ClassListResponse {
        success: true,
        data: classes,
    }))
}

/// Request body naming a list of classes; used by append and wholesale
/// replacement.
#[derive(Deserialize, Default)]
struct ClassListRequest {
    #[serde(default)]
    classes: Option<Vec<String>>,
}

/// Append classes to a student's list.
///
/// The resulting list is returned with 201 even when the body names no
/// classes; in that case nothing is persisted.
async fn create_classes<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
    body: Option<Json<ClassListRequest>>,
) -> Result<(StatusCode, Json<ClassListResponse>), ApiError>
where
    S: RosterApi,
{
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let classes = service.add_classes(&id, request.classes).await?;
    Ok((
        StatusCode::CREATED,
        Json(ClassListResponse {
            success: true,
            data: classes,
        }),
    ))
}

/// Request body for the class revision endpoint.
#[derive(Deserialize, Default)]
struct ClassRevisionsRequest {
    #[serde(default)]
    remove: Option<Vec<String>>,
    #[serde(default)]
    replace: Option<Vec<String>>,
}

/// Remove and/or append classes in one request.
async fn update_classes<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
    body: Option<Json<ClassRevisionsRequest>>,
) -> Result<Json<ClassListResponse>, ApiError>
where
    S: RosterApi,
{
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let classes = service
        .revise_classes(&id, request.remove, request.replace)
        .await?;
    Ok(Json(ClassListResponse {
        success: true,
        data: classes,
    }))
}

/// Replace the whole class list, emptying it when the body names none.
async fn delete_classes<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
    body: Option<Json<ClassListRequest>>,
) -> Result<Json<ClassListResponse>, ApiError>
where
    S: RosterApi,
{
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let classes = service.replace_classes(&id, request.classes).await?;
    Ok(Json(ClassListResponse {
        success: true,
        data: classes,
    }))
}

/// Success response for the single-class lookup.
#[derive(Serialize)]
struct ClassLookupResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Look up one class by canonical name.
///
/// A missing class is not an error: the lookup reports it with an
/// informational message and `success: true`.
async fn get_class<S>(
    State(service): State<Arc<S>>,
    Path((id, class_name)): Path<(String, String)>,
) -> Result<Json<ClassLookupResponse>, ApiError>
where
    S: RosterApi,
{
    if class_name.trim().is_empty() {
        return Err(ApiError(RosterError::BadRequest));
    }

    let response = match service.find_class(&id, &class_name).await? {
        Some(found) => ClassLookupResponse {
            success: true,
            data: Some(found),
            message: None,
        },
        None => ClassLookupResponse {
            success: true,
            data: None,
            message: Some(format!(
                "Class {} not found for this student",
                canonicalize(&class_name)
            )),
        },
    };
    Ok(Json(response))
}

/// Response body for `GET /metrics`.
#[derive(Serialize)]
struct MetricsResponse {
    students_created: u64,
    students_updated: u64,
    students_deleted: u64,
}

/// Return roster activity counters for observability.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsResponse>
where
    S: RosterApi,
{
    let snapshot = service.metrics_snapshot();
    Json(MetricsResponse {
        students_created: snapshot.students_created,
        students_updated: snapshot.students_updated,
        students_deleted: snapshot.students_deleted,
    })
}

/// Failure envelope returned for every error kind.
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

struct ApiError(RosterError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Every failure kind, unknown ids included, reports HTTP 400.
        let body = ErrorResponse {
            success: false,
            message: self.0.to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

impl From<RosterError> for ApiError {
    fn from(inner: RosterError) -> Self {
        Self(inner)
    }
}

/// Map a JSON extraction failure onto the uniform validation envelope.
fn bad_json(rejection: JsonRejection) -> ApiError {
    ApiError(RosterError::Validation(rejection.body_text()))
}
