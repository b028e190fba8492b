use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, DatabaseError, PaginatableRepository, ResourceTyped, check_access,
        entity::{
            Course, CourseCreate, Enrollment, EnrollmentCreate, EnrollmentWithNamesRow, Lesson,
            LessonCreate,
        },
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, UserRole, WebError, WebResult,
        dto::enrollments::EnrollmentResponse,
        error::ErrorResponse,
        middlewares,
        routes::PaginationQuery,
    },
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CourseBody {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LessonBody {
    pub title: String,
    pub content: String,
    pub order_index: Option<i32>,
}

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(courses_list_handler).post(courses_create_handler))
        .route(
            "/{id}",
            get(courses_get_handler)
                .put(courses_update_handler)
                .delete(courses_delete_handler),
        )
        .route(
            "/{id}/lessons",
            get(courses_lessons_list_handler).post(courses_lessons_create_handler),
        )
        .route("/{id}/enroll", post(courses_enroll_handler))
        .route("/{id}/progress", get(courses_progress_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Fetches the course or maps its absence to a 404.
async fn fetch_course(state: &AppState, actor: &AuthenticatedUser, id: Uuid) -> WebResult<Course> {
    Course::find_by_id(state.pool(), actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))
}

fn map_access_error(e: DatabaseError) -> WebError {
    if let DatabaseError::Forbidden = e {
        WebError::resource_forbidden(Course::get_resource_type())
    } else {
        WebError::resource_fetch_error(Course::get_resource_type(), e)
    }
}

/// Enrolled students, the owning instructor and admin can see the inside of
/// a course.
async fn check_course_visibility(
    state: &AppState,
    actor: &AuthenticatedUser,
    course: &Course,
) -> WebResult<()> {
    if actor.user_role() == UserRole::Admin || course.instructor_id() == actor.user_id() {
        return Ok(());
    }

    let enrolled = Enrollment::exists(state.pool(), actor, actor.user_id(), course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    if enrolled {
        Ok(())
    } else {
        Err(WebError::resource_forbidden(Course::get_resource_type()))
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/",
    params(
        ("limit" = i64, Query, description = "Page size"),
        ("offset" = i64, Query, description = "Page offset"),
    ),
    responses(
        (status = 200, description = "Returns requested page of courses", body = crate::model::Page<Course>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses"
)]
pub async fn courses_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    // public listing; fall back to the admin actor for anonymous callers
    let admin = AuthenticatedUser::admin();
    let actor = ctx.maybe_user().unwrap_or(&admin);

    let courses = Course::page(state.pool(), actor, page.limit, page.offset)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(courses)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/",
    request_body = CourseBody,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only instructors can create courses", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub async fn courses_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<CourseBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() != UserRole::Instructor {
        return Err(WebError::resource_forbidden(Course::get_resource_type()));
    }

    let payload = CourseCreate {
        instructor_id: user.user_id(),
        title: payload.title,
        description: payload.description,
    };

    let created = Course::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the course to get")
    ),
    responses(
        (status = 200, description = "Course found", body = Course),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses"
)]
pub async fn courses_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let admin = AuthenticatedUser::admin();
    let actor = ctx.maybe_user().unwrap_or(&admin);
    let course = fetch_course(&state, actor, id).await?;

    Ok((StatusCode::OK, Json(course)))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    request_body = CourseBody,
    params(
        ("id" = Uuid, Path, description = "ID of the course to update")
    ),
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only the owning instructor can update a course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub async fn courses_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CourseBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = fetch_course(&state, user, id).await?;

    check_access(state.pool(), user, &course, user.user_id())
        .await
        .map_err(map_access_error)?;

    let payload = CourseCreate {
        instructor_id: course.instructor_id(),
        title: payload.title,
        description: payload.description,
    };

    let updated = course
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the course to delete")
    ),
    responses(
        (status = 200, description = "Course deleted"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only the owning instructor can delete a course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub async fn courses_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = fetch_course(&state, user, id).await?;

    check_access(state.pool(), user, &course, user.user_id())
        .await
        .map_err(map_access_error)?;

    course
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/lessons",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Lessons of the course", body = Vec<Lesson>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You have to be enrolled to see lessons", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub async fn courses_lessons_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = fetch_course(&state, user, id).await?;
    check_course_visibility(&state, user, &course).await?;

    let lessons = Lesson::all_by_course(state.pool(), user, course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(lessons)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/lessons",
    request_body = LessonBody,
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 201, description = "Lesson created", body = Lesson),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only the owning instructor can add lessons", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub async fn courses_lessons_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LessonBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = fetch_course(&state, user, id).await?;

    check_access(state.pool(), user, &course, user.user_id())
        .await
        .map_err(map_access_error)?;

    let payload = LessonCreate {
        course_id: course.id(),
        title: payload.title,
        content: payload.content,
        order_index: payload.order_index,
    };

    let created = Lesson::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/enroll",
    params(
        ("id" = Uuid, Path, description = "ID of the course to enroll in")
    ),
    responses(
        (status = 201, description = "Enrolled successfully", body = Enrollment),
        (status = 200, description = "Already enrolled", body = Enrollment),
        (status = 400, description = "Instructors cannot enroll in their own courses", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only students can enroll", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub async fn courses_enroll_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = fetch_course(&state, user, id).await?;

    if course.instructor_id() == user.user_id() {
        return Err(WebError::resource_bad_request(
            Enrollment::get_resource_type(),
            "instructors cannot enroll in their own courses",
        ));
    }

    if user.user_role() != UserRole::Student {
        return Err(WebError::resource_forbidden(Enrollment::get_resource_type()));
    }

    let existing =
        Enrollment::find_by_student_and_course(state.pool(), user, user.user_id(), course.id())
            .await
            .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    if let Some(existing) = existing {
        return Ok((StatusCode::OK, Json(existing)));
    }

    let payload = EnrollmentCreate {
        student_id: user.user_id(),
        course_id: course.id(),
        progress: 0.0,
        completed: false,
    };

    let created = Enrollment::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/progress",
    description = "Students get their own enrollment; the owning instructor gets every enrollment of the course",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Progress found", body = EnrollmentResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "Course or enrollment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub async fn courses_progress_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<Response> {
    let user = ctx.user()?;
    let course = fetch_course(&state, user, id).await?;

    let is_owner =
        course.instructor_id() == user.user_id() || user.user_role() == UserRole::Admin;

    if is_owner {
        let enrollments = EnrollmentWithNamesRow::all_by_course(state.pool(), user, course.id())
            .await
            .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?
            .into_iter()
            .map(EnrollmentResponse::from)
            .collect::<Vec<_>>();

        return Ok((StatusCode::OK, Json(enrollments)).into_response());
    }

    let enrollment = EnrollmentWithNamesRow::find_by_student_and_course(
        state.pool(),
        user,
        user.user_id(),
        course.id(),
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?
    .map(EnrollmentResponse::from)
    .ok_or_else(|| WebError::resource_not_found(Enrollment::get_resource_type()))?;

    Ok((StatusCode::OK, Json(enrollment)).into_response())
}
