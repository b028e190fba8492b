mod common;
use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    Action, Flow, create_course_action, login_action, register_action, setup_server, setup_test_db,
};

fn stored_id(ctx: &common::FlowContext, key: &str) -> String {
    ctx.get(key)["id"]
        .as_str()
        .expect("missing id in stored body")
        .to_string()
}

/// Registers an instructor and builds course -> lesson -> quiz, storing each
/// response along the way.
fn course_with_quiz(flow: Flow) -> Flow {
    flow.step(register_action(
        "teach@example.com",
        "teach",
        "pass",
        "instructor",
    ))
    .step(create_course_action("Quizzical", "with quizzes", "course"))
    .step(
        Action::new("create_lesson", "POST", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/courses/{}/lessons", stored_id(ctx, "course")))
            .with_body(json!({
                "title": "Lesson 1",
                "content": "read me",
                "order_index": 0,
            }))
            .with_expect(StatusCode::CREATED)
            .with_save_as("lesson"),
    )
    .step(
        Action::new("create_quiz", "POST", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/lessons/{}/quizzes", stored_id(ctx, "lesson")))
            .with_body(json!({
                "title": "Quiz 1",
                "description": "checkpoint",
            }))
            .with_expect(StatusCode::CREATED)
            .with_save_as("quiz"),
    )
    .step(
        Action::new("create_question_1", "POST", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/quizzes/{}/questions", stored_id(ctx, "quiz")))
            .with_body(json!({
                "question_text": "2 + 2?",
                "options": ["3", "4", "5"],
                "correct_option": 1,
                "points": 2,
                "order_index": 0,
            }))
            .with_expect(StatusCode::CREATED),
    )
    .step(
        Action::new("create_question_2", "POST", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/quizzes/{}/questions", stored_id(ctx, "quiz")))
            .with_body(json!({
                "question_text": "capital of France?",
                "options": ["Paris", "Lyon"],
                "correct_option": 0,
                "points": 3,
                "order_index": 1,
            }))
            .with_expect(StatusCode::CREATED),
    )
}

#[tokio::test]
async fn route_question_validation_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let flow = course_with_quiz(Flow::new())
        // options must be an array
        .step(
            Action::new("bad_options", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/quizzes/{}/questions", stored_id(ctx, "quiz"))
                })
                .with_body(json!({
                    "question_text": "broken",
                    "options": "not an array",
                    "correct_option": 0,
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        // correct_option must index into options
        .step(
            Action::new("bad_correct_option", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/quizzes/{}/questions", stored_id(ctx, "quiz"))
                })
                .with_body(json!({
                    "question_text": "broken",
                    "options": ["a", "b"],
                    "correct_option": 5,
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        // only the owner may add questions
        .step(register_action(
            "rival@example.com",
            "rival",
            "pass",
            "instructor",
        ))
        .step(
            Action::new("rival_question", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/quizzes/{}/questions", stored_id(ctx, "quiz"))
                })
                .with_body(json!({
                    "question_text": "hijack",
                    "options": ["a", "b"],
                    "correct_option": 0,
                }))
                .with_expect(StatusCode::FORBIDDEN),
        );

    flow.run(&mut server, pool).await;
}

#[tokio::test]
async fn route_quiz_answer_visibility_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let flow = course_with_quiz(Flow::new())
        // the owner sees the answer key
        .step(
            Action::new("quiz_get_owner", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/quizzes/{}", stored_id(ctx, "quiz")))
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.contains("correct_option"));
                    assert!(body.contains("2 + 2?"));
                }),
        )
        // an enrolled student does not
        .step(register_action(
            "student@example.com",
            "student",
            "pass",
            "student",
        ))
        .step(
            Action::new("enroll", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/enroll", stored_id(ctx, "course")))
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("quiz_get_student", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/quizzes/{}", stored_id(ctx, "quiz")))
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(!body.contains("correct_option"));
                    assert!(body.contains("2 + 2?"));
                }),
        );

    flow.run(&mut server, pool).await;
}

#[tokio::test]
async fn route_quiz_submit_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let flow = course_with_quiz(Flow::new())
        .step(register_action(
            "student@example.com",
            "student",
            "pass",
            "student",
        ))
        // submitting without enrolling is forbidden
        .step(
            Action::new("submit_unenrolled", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/quizzes/{}/submit", stored_id(ctx, "quiz")))
                .with_body(json!({ "answers": [1, 0] }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("enroll", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/enroll", stored_id(ctx, "course")))
                .with_expect(StatusCode::CREATED),
        )
        // wrong answer count
        .step(
            Action::new("submit_short", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/quizzes/{}/submit", stored_id(ctx, "quiz")))
                .with_body(json!({ "answers": [1] }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        // question 1 right (2 pts), question 2 wrong
        .step(
            Action::new("submit", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/quizzes/{}/submit", stored_id(ctx, "quiz")))
                .with_body(json!({ "answers": [1, 1] }))
                .with_expect(StatusCode::CREATED)
                .assert_body(|body| {
                    assert!(body.contains("\"score\":2"));
                }),
        )
        // one attempt per quiz
        .step(
            Action::new("submit_again", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/quizzes/{}/submit", stored_id(ctx, "quiz")))
                .with_body(json!({ "answers": [1, 0] }))
                .with_expect(StatusCode::CONFLICT),
        )
        // the student reads their own result back
        .step(
            Action::new("results_student", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/quizzes/{}/results", stored_id(ctx, "quiz")))
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.contains("\"score\":2"));
                }),
        )
        // the instructor gets every submission
        .step(login_action("teach@example.com", "pass").with_clear_cookies(true))
        .step(
            Action::new("results_instructor", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/quizzes/{}/results", stored_id(ctx, "quiz")))
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.starts_with('['));
                    assert!(body.contains("\"score\":2"));
                }),
        );

    flow.run(&mut server, pool).await;
}

#[tokio::test]
async fn route_quiz_inactive_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let flow = course_with_quiz(Flow::new())
        // deactivate the quiz
        .step(
            Action::new("deactivate", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/quizzes/{}", stored_id(ctx, "quiz")))
                .with_body(json!({
                    "title": "Quiz 1",
                    "description": "checkpoint",
                    "is_active": false,
                }))
                .with_expect(StatusCode::OK),
        )
        .step(register_action(
            "student@example.com",
            "student",
            "pass",
            "student",
        ))
        .step(
            Action::new("enroll", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/enroll", stored_id(ctx, "course")))
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("submit_inactive", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/quizzes/{}/submit", stored_id(ctx, "quiz")))
                .with_body(json!({ "answers": [1, 0] }))
                .with_expect(StatusCode::BAD_REQUEST),
        );

    flow.run(&mut server, pool).await;
}
