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

#[tokio::test]
async fn route_course_create_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        // students cannot create courses
        .step(register_action(
            "student@example.com",
            "student",
            "pass",
            "student",
        ))
        .step(
            Action::new("create_course_as_student", "POST", "/api/v1/courses/")
                .with_body(json!({
                    "title": "Rust 101",
                    "description": "Intro course",
                }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        // instructors can
        .step(register_action(
            "teach@example.com",
            "teach",
            "pass",
            "instructor",
        ))
        .step(
            create_course_action("Rust 101", "Intro course", "course").assert_body(|body| {
                assert!(body.contains("Rust 101"));
            }),
        )
        // course listing is public
        .step(
            Action::new("course_list_anon", "GET", "/api/v1/courses/")
                .with_clear_cookies(true)
                .with_save_cookies(false)
                .with_param("limit", "10")
                .with_param("offset", "0")
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.contains("total"));
                    assert!(body.contains("Rust 101"));
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_course_update_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(register_action(
            "owner@example.com",
            "owner",
            "pass",
            "instructor",
        ))
        .step(create_course_action("Owned", "mine", "course"))
        // the owner can rename it
        .step(
            Action::new("course_update", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", stored_id(ctx, "course")))
                .with_body(json!({
                    "title": "Owned v2",
                    "description": "still mine",
                }))
                .with_expect(StatusCode::OK)
                .assert_body(|body| assert!(body.contains("Owned v2"))),
        )
        // a different instructor cannot
        .step(register_action(
            "rival@example.com",
            "rival",
            "pass",
            "instructor",
        ))
        .step(
            Action::new("course_update_rival", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", stored_id(ctx, "course")))
                .with_body(json!({
                    "title": "stolen",
                    "description": "stolen",
                }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        // nor delete it
        .step(
            Action::new("course_delete_rival", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", stored_id(ctx, "course")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(login_action("owner@example.com", "pass").with_clear_cookies(true))
        .step(
            Action::new("course_delete_owner", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", stored_id(ctx, "course")))
                .with_expect(StatusCode::OK),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_enroll_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(register_action(
            "teach@example.com",
            "teach",
            "pass",
            "instructor",
        ))
        .step(create_course_action("Enrollable", "come on in", "course"))
        // instructors cannot enroll in their own course
        .step(
            Action::new("enroll_own", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/enroll", stored_id(ctx, "course")))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(register_action(
            "student@example.com",
            "student",
            "pass",
            "student",
        ))
        // first enrollment creates
        .step(
            Action::new("enroll", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/enroll", stored_id(ctx, "course")))
                .with_expect(StatusCode::CREATED)
                .with_save_as("enrollment"),
        )
        // a second one is idempotent
        .step(
            Action::new("enroll_again", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/enroll", stored_id(ctx, "course")))
                .with_expect(StatusCode::OK),
        )
        // lessons become visible once enrolled
        .step(
            Action::new("lessons_enrolled", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/courses/{}/lessons", stored_id(ctx, "course"))
                })
                .with_expect(StatusCode::OK),
        )
        // a stranger still cannot see them
        .step(register_action(
            "stranger@example.com",
            "stranger",
            "pass",
            "student",
        ))
        .step(
            Action::new("lessons_stranger", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/courses/{}/lessons", stored_id(ctx, "course"))
                })
                .with_expect(StatusCode::FORBIDDEN),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_progress_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(register_action(
            "teach@example.com",
            "teach",
            "pass",
            "instructor",
        ))
        .step(create_course_action("Progressive", "tracked", "course"))
        .step(register_action(
            "student@example.com",
            "student",
            "pass",
            "student",
        ))
        .step(
            Action::new("enroll", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/enroll", stored_id(ctx, "course")))
                .with_expect(StatusCode::CREATED)
                .with_save_as("enrollment"),
        )
        // out-of-range progress is rejected
        .step(
            Action::new("progress_out_of_range", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/enrollments/{}", stored_id(ctx, "enrollment"))
                })
                .with_body(json!({
                    "progress": 150.0,
                    "completed": false,
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        // valid update
        .step(
            Action::new("progress_update", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/enrollments/{}", stored_id(ctx, "enrollment"))
                })
                .with_body(json!({
                    "progress": 42.5,
                    "completed": false,
                }))
                .with_expect(StatusCode::OK)
                .assert_body(|body| assert!(body.contains("42.5"))),
        )
        // the student reads their own progress back
        .step(
            Action::new("progress_own", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/courses/{}/progress", stored_id(ctx, "course"))
                })
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.contains("42.5"));
                    assert!(body.contains("student_name"));
                }),
        )
        // another student cannot touch the enrollment
        .step(register_action(
            "rival@example.com",
            "rival",
            "pass",
            "student",
        ))
        .step(
            Action::new("progress_update_rival", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/enrollments/{}", stored_id(ctx, "enrollment"))
                })
                .with_body(json!({
                    "progress": 0.0,
                    "completed": false,
                }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        // the owning instructor sees everyone
        .step(login_action("teach@example.com", "pass").with_clear_cookies(true))
        .step(
            Action::new("progress_instructor", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/courses/{}/progress", stored_id(ctx, "course"))
                })
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.starts_with('['));
                    assert!(body.contains("student"));
                }),
        )
        // the student can unenroll
        .step(login_action("student@example.com", "pass").with_clear_cookies(true))
        .step(
            Action::new("unenroll", "DELETE", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/enrollments/{}", stored_id(ctx, "enrollment"))
                })
                .with_expect(StatusCode::OK),
        )
        .run(&mut server, pool)
        .await;
}
