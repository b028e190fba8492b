use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, DatabaseError, HasOwner, ResourceTyped, check_access,
        entity::{Enrollment, Lesson, LessonCreate, Quiz, QuizCreate},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, UserRole, WebError, WebResult,
        error::ErrorResponse, middlewares, routes::courses::LessonBody,
    },
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct QuizBody {
    pub title: String,
    pub description: String,
    pub is_active: Option<bool>,
}

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/{id}",
            get(lessons_get_handler)
                .put(lessons_update_handler)
                .delete(lessons_delete_handler),
        )
        .route(
            "/{id}/quizzes",
            get(lessons_quizzes_list_handler).post(lessons_quizzes_create_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn fetch_lesson(state: &AppState, actor: &AuthenticatedUser, id: Uuid) -> WebResult<Lesson> {
    Lesson::find_by_id(state.pool(), actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Lesson::get_resource_type()))
}

fn map_access_error(e: DatabaseError) -> WebError {
    if let DatabaseError::Forbidden = e {
        WebError::resource_forbidden(Lesson::get_resource_type())
    } else {
        WebError::resource_fetch_error(Lesson::get_resource_type(), e)
    }
}

/// Enrolled students, the owning instructor and admin can read a lesson.
async fn check_lesson_visibility(
    state: &AppState,
    actor: &AuthenticatedUser,
    lesson: &Lesson,
) -> WebResult<()> {
    if actor.user_role() == UserRole::Admin {
        return Ok(());
    }

    let owner = lesson
        .get_owner_id(state.pool(), actor)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;
    if owner == actor.user_id() {
        return Ok(());
    }

    let enrolled = Enrollment::exists(state.pool(), actor, actor.user_id(), lesson.course_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    if enrolled {
        Ok(())
    } else {
        Err(WebError::resource_forbidden(Lesson::get_resource_type()))
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/lessons/{id}",
    description = "Fetch comprehensive info about lesson including its content",
    params(
        ("id" = Uuid, Path, description = "ID of the lesson to get")
    ),
    responses(
        (status = 200, description = "Lesson found", body = Lesson),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You have to be enrolled to read lessons", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = fetch_lesson(&state, user, id).await?;
    check_lesson_visibility(&state, user, &lesson).await?;

    Ok((StatusCode::OK, Json(lesson)))
}

#[utoipa::path(
    put,
    path = "/api/v1/lessons/{id}",
    request_body = LessonBody,
    params(
        ("id" = Uuid, Path, description = "ID of the lesson to update")
    ),
    responses(
        (status = 200, description = "Lesson updated", body = Lesson),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only the owning instructor can update a lesson", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_update_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<LessonBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = fetch_lesson(&state, user, id).await?;

    check_access(state.pool(), user, &lesson, user.user_id())
        .await
        .map_err(map_access_error)?;

    let payload = LessonCreate {
        course_id: lesson.course_id(),
        title: payload.title,
        content: payload.content,
        order_index: payload.order_index,
    };

    let updated = lesson
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/lessons/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the lesson to delete")
    ),
    responses(
        (status = 200, description = "Lesson deleted"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only the owning instructor can delete a lesson", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = fetch_lesson(&state, user, id).await?;

    check_access(state.pool(), user, &lesson, user.user_id())
        .await
        .map_err(map_access_error)?;

    lesson
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/lessons/{id}/quizzes",
    params(
        ("id" = Uuid, Path, description = "ID of the lesson")
    ),
    responses(
        (status = 200, description = "Quizzes of the lesson", body = Vec<Quiz>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You have to be enrolled to see quizzes", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_quizzes_list_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = fetch_lesson(&state, user, id).await?;
    check_lesson_visibility(&state, user, &lesson).await?;

    let quizzes = Quiz::all_by_lesson(state.pool(), user, lesson.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(quizzes)))
}

#[utoipa::path(
    post,
    path = "/api/v1/lessons/{id}/quizzes",
    request_body = QuizBody,
    params(
        ("id" = Uuid, Path, description = "ID of the lesson")
    ),
    responses(
        (status = 201, description = "Quiz created", body = Quiz),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only the owning instructor can add quizzes", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub async fn lessons_quizzes_create_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<QuizBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = fetch_lesson(&state, user, id).await?;

    check_access(state.pool(), user, &lesson, user.user_id())
        .await
        .map_err(map_access_error)?;

    let payload = QuizCreate {
        lesson_id: lesson.id(),
        title: payload.title,
        description: payload.description,
        is_active: payload.is_active,
    };

    let created = Quiz::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}
