use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, DatabaseError, HasOwner, ResourceTyped, check_access,
        entity::{
            Enrollment, Question, QuestionCreate, Quiz, QuizCreate, Submission, SubmissionCreate,
        },
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, UserRole, WebError, WebResult,
        dto::quizzes::{QuizSubmitRequest, QuizWithQuestions},
        error::ErrorResponse,
        middlewares,
        routes::lessons::QuizBody,
    },
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct QuestionBody {
    pub question_text: String,
    /// JSON array of option strings.
    pub options: serde_json::Value,
    pub correct_option: i32,
    pub points: Option<i32>,
    pub order_index: Option<i32>,
}

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/{id}",
            get(quizzes_get_handler)
                .put(quizzes_update_handler)
                .delete(quizzes_delete_handler),
        )
        .route("/{id}/questions", post(quizzes_questions_create_handler))
        .route("/{id}/submit", post(quizzes_submit_handler))
        .route("/{id}/results", get(quizzes_results_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn fetch_quiz(state: &AppState, actor: &AuthenticatedUser, id: Uuid) -> WebResult<Quiz> {
    Quiz::find_by_id(state.pool(), actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Quiz::get_resource_type()))
}

fn map_access_error(e: DatabaseError) -> WebError {
    if let DatabaseError::Forbidden = e {
        WebError::resource_forbidden(Quiz::get_resource_type())
    } else {
        WebError::resource_fetch_error(Quiz::get_resource_type(), e)
    }
}

/// Whether the actor owns the quiz through its course (or is admin).
async fn is_quiz_owner(
    state: &AppState,
    actor: &AuthenticatedUser,
    quiz: &Quiz,
) -> WebResult<bool> {
    if actor.user_role() == UserRole::Admin {
        return Ok(true);
    }

    let owner = quiz
        .get_owner_id(state.pool(), actor)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;
    Ok(owner == actor.user_id())
}

#[utoipa::path(
    get,
    path = "/api/v1/quizzes/{id}",
    description = "Quiz with its questions. Correct answers are revealed to the owning instructor only",
    params(
        ("id" = Uuid, Path, description = "ID of the quiz to get")
    ),
    responses(
        (status = 200, description = "Quiz found", body = QuizWithQuestions),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
pub async fn quizzes_get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = fetch_quiz(&state, user, id).await?;
    let reveal_answers = is_quiz_owner(&state, user, &quiz).await?;

    let questions = Question::all_by_quiz(state.pool(), user, quiz.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;

    let response = QuizWithQuestions::from_entity(quiz, questions, reveal_answers);
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    put,
    path = "/api/v1/quizzes/{id}",
    request_body = QuizBody,
    params(
        ("id" = Uuid, Path, description = "ID of the quiz to update")
    ),
    responses(
        (status = 200, description = "Quiz updated", body = Quiz),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only the owning instructor can update a quiz", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
pub async fn quizzes_update_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<QuizBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = fetch_quiz(&state, user, id).await?;

    check_access(state.pool(), user, &quiz, user.user_id())
        .await
        .map_err(map_access_error)?;

    let payload = QuizCreate {
        lesson_id: quiz.lesson_id(),
        title: payload.title,
        description: payload.description,
        is_active: payload.is_active,
    };

    let updated = quiz
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/quizzes/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the quiz to delete")
    ),
    responses(
        (status = 200, description = "Quiz deleted"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only the owning instructor can delete a quiz", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
pub async fn quizzes_delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = fetch_quiz(&state, user, id).await?;

    check_access(state.pool(), user, &quiz, user.user_id())
        .await
        .map_err(map_access_error)?;

    quiz.delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/quizzes/{id}/questions",
    request_body = QuestionBody,
    params(
        ("id" = Uuid, Path, description = "ID of the quiz")
    ),
    responses(
        (status = 201, description = "Question created", body = Question),
        (status = 400, description = "Malformed options or correct_option", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only the owning instructor can add questions", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
pub async fn quizzes_questions_create_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<QuestionBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = fetch_quiz(&state, user, id).await?;

    check_access(state.pool(), user, &quiz, user.user_id())
        .await
        .map_err(map_access_error)?;

    let option_count = payload
        .options
        .as_array()
        .map(Vec::len)
        .ok_or_else(|| {
            WebError::resource_bad_request(
                Question::get_resource_type(),
                "options must be a JSON array",
            )
        })?;

    if payload.correct_option < 0 || payload.correct_option as usize >= option_count {
        return Err(WebError::resource_bad_request(
            Question::get_resource_type(),
            "correct_option must index into options",
        ));
    }

    let payload = QuestionCreate {
        quiz_id: quiz.id(),
        question_text: payload.question_text,
        options: payload.options,
        correct_option: payload.correct_option,
        points: payload.points,
        order_index: payload.order_index,
    };

    let created = Question::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/quizzes/{id}/submit",
    description = "Submit answers for automatic grading. One attempt per quiz",
    request_body = QuizSubmitRequest,
    params(
        ("id" = Uuid, Path, description = "ID of the quiz")
    ),
    responses(
        (status = 201, description = "Graded submission", body = Submission),
        (status = 400, description = "Inactive quiz or malformed answers", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You have to be enrolled to submit", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 409, description = "Quiz was already submitted", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
pub async fn quizzes_submit_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<QuizSubmitRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = fetch_quiz(&state, user, id).await?;

    if !quiz.is_active() {
        return Err(WebError::resource_bad_request(
            Quiz::get_resource_type(),
            "quiz is not active",
        ));
    }

    let course_id = quiz
        .course_id(state.pool())
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;
    let enrolled = Enrollment::exists(state.pool(), user, user.user_id(), course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;
    if !enrolled {
        return Err(WebError::resource_forbidden(Submission::get_resource_type()));
    }

    let existing =
        Submission::find_by_student_and_quiz(state.pool(), user, user.user_id(), quiz.id())
            .await
            .map_err(|e| WebError::resource_fetch_error(Submission::get_resource_type(), e))?;
    if existing.is_some() {
        return Err(WebError::resource_conflict(Submission::get_resource_type()));
    }

    let questions = Question::all_by_quiz(state.pool(), user, quiz.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;

    if payload.answers.len() != questions.len() {
        return Err(WebError::resource_bad_request(
            Submission::get_resource_type(),
            "answers must match the question count",
        ));
    }

    // automatic grading
    let score: i32 = questions
        .iter()
        .zip(payload.answers.iter())
        .filter(|(question, answer)| question.correct_option() == **answer)
        .map(|(question, _)| question.points())
        .sum();

    let payload = SubmissionCreate {
        student_id: user.user_id(),
        quiz_id: quiz.id(),
        answers: serde_json::json!(payload.answers),
        score,
    };

    let created = Submission::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Submission::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/quizzes/{id}/results",
    description = "Students get their own submission; the owning instructor gets every submission of the quiz",
    params(
        ("id" = Uuid, Path, description = "ID of the quiz")
    ),
    responses(
        (status = 200, description = "Results found", body = Submission),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "Quiz or submission not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
pub async fn quizzes_results_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<Response> {
    let user = ctx.user()?;
    let quiz = fetch_quiz(&state, user, id).await?;

    if is_quiz_owner(&state, user, &quiz).await? {
        let submissions = Submission::all_by_quiz(state.pool(), user, quiz.id())
            .await
            .map_err(|e| WebError::resource_fetch_error(Submission::get_resource_type(), e))?;

        return Ok((StatusCode::OK, Json(submissions)).into_response());
    }

    let submission =
        Submission::find_by_student_and_quiz(state.pool(), user, user.user_id(), quiz.id())
            .await
            .map_err(|e| WebError::resource_fetch_error(Submission::get_resource_type(), e))?
            .ok_or_else(|| WebError::resource_not_found(Submission::get_resource_type()))?;

    Ok((StatusCode::OK, Json(submission)).into_response())
}
