use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::put,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, DatabaseError, ResourceTyped, check_access,
        entity::{Enrollment, EnrollmentCreate},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult, error::ErrorResponse,
        middlewares,
    },
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct EnrollmentUpdateBody {
    pub progress: f64,
    pub completed: bool,
}

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/{id}",
            put(enrollment_update_handler).delete(enrollment_delete_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn fetch_enrollment(
    state: &AppState,
    actor: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Enrollment> {
    Enrollment::find_by_id(state.pool(), actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Enrollment::get_resource_type()))
}

fn map_access_error(e: DatabaseError) -> WebError {
    if let DatabaseError::Forbidden = e {
        WebError::resource_forbidden(Enrollment::get_resource_type())
    } else {
        WebError::resource_fetch_error(Enrollment::get_resource_type(), e)
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/enrollments/{id}",
    description = "Update progress or completion status of own enrollment",
    request_body = EnrollmentUpdateBody,
    params(
        ("id" = Uuid, Path, description = "ID of the enrollment to update")
    ),
    responses(
        (status = 200, description = "Enrollment updated", body = Enrollment),
        (status = 400, description = "Progress must be within 0-100", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You cannot update another student's enrollment", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "enrollments",
    security(
        ("cookie" = [])
    )
)]
pub async fn enrollment_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EnrollmentUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    if !(0.0..=100.0).contains(&payload.progress) {
        return Err(WebError::resource_bad_request(
            Enrollment::get_resource_type(),
            "progress must be within 0-100",
        ));
    }

    let enrollment = fetch_enrollment(&state, user, id).await?;
    check_access(state.pool(), user, &enrollment, user.user_id())
        .await
        .map_err(map_access_error)?;

    let payload = EnrollmentCreate {
        student_id: enrollment.student_id(),
        course_id: enrollment.course_id(),
        progress: payload.progress,
        completed: payload.completed,
    };

    let updated = enrollment
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/enrollments/{id}",
    description = "Unenroll from a course",
    params(
        ("id" = Uuid, Path, description = "ID of the enrollment to delete")
    ),
    responses(
        (status = 200, description = "Enrollment deleted"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You cannot delete another student's enrollment", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "enrollments",
    security(
        ("cookie" = [])
    )
)]
pub async fn enrollment_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let enrollment = fetch_enrollment(&state, user, id).await?;
    check_access(state.pool(), user, &enrollment, user.user_id())
        .await
        .map_err(map_access_error)?;

    enrollment
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}
