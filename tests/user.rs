mod common;
use axum::http::StatusCode;
use eduflow::model::entity::UserEntity;
use eduflow::web::middlewares::AUTH_TOKEN;
use tower_cookies::cookie::SameSite;

use crate::common::{
    Action, Flow, login_action, login_admin_action, register_action, setup_server, setup_test_db,
};

#[tokio::test]
async fn route_register_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            register_action("foobar@example.com", "foobar", "foobaz", "student")
                .assert_cookie(AUTH_TOKEN, |cookie| {
                    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
                    assert_eq!(cookie.path(), Some("/"));
                    assert_eq!(cookie.http_only(), Some(true));
                })
                .assert_body(|body| {
                    let ent: UserEntity = serde_json::from_str(body).expect("Invalid body format");
                    assert_eq!(ent.username(), "foobar");
                    assert_eq!(ent.email(), "foobar@example.com");
                })
                .with_expect(StatusCode::OK),
        )
        // try to register twice
        .step(
            register_action("foobar@example.com", "foobar", "foobaz", "student")
                .with_expect(StatusCode::CONFLICT),
        )
        // same username, different email
        .step(
            register_action("other@example.com", "foobar", "foobaz", "student")
                .with_expect(StatusCode::CONFLICT),
        )
        // admin accounts cannot be self-registered
        .step(
            register_action("root@example.com", "root", "root", "admin")
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| {
                    assert!(body.contains("bad request"));
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_login_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            register_action("logintest@example.com", "LOGINTEST", "LOGINTEST", "student")
                .with_save_cookies(false),
        )
        .step(
            login_action("logintest@example.com", "LOGINTEST")
                .assert_cookie(AUTH_TOKEN, |cookie| {
                    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
                    assert_eq!(cookie.path(), Some("/"));
                    assert_eq!(cookie.http_only(), Some(true));
                })
                .assert_body(|body| {
                    let ent: UserEntity = serde_json::from_str(body).expect("Invalid JSON format");
                    assert_eq!(ent.username(), "LOGINTEST");
                })
                .with_expect(StatusCode::OK)
                .with_clear_cookies(true),
        )
        // wrong credentials
        .step(
            login_action("logintest@example.com", "WRONGPASSWORD")
                .with_save_cookies(false)
                .with_clear_cookies(true)
                .assert_body(|body| {
                    assert!(body.contains("Authentication error"));
                })
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        // non-existing account
        .step(
            login_action("nonexisting@example.com", "nvm")
                .with_expect(StatusCode::UNAUTHORIZED)
                .assert_body(|body| assert!(body.contains("Authentication error"))),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_verify_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        // no cookie yet
        .step(
            Action::new("verify_anon", "GET", "/api/v1/auth/verify")
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(register_action(
            "verify@example.com",
            "verify",
            "verify",
            "student",
        ))
        .step(Action::new("verify", "GET", "/api/v1/auth/verify").with_expect(StatusCode::OK))
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_user_list_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(register_action("foobar@example.com", "FOOBAR", "FOOBAZ", "student").with_save_cookies(true))
        // try to request without admin perms
        .step(
            Action::new("user_list", "GET", "/api/v1/users/page")
                .assert_body(|body| {
                    assert!(body.contains("error"));
                })
                .with_param("limit", "5")
                .with_param("offset", "0")
                .with_expect(StatusCode::FORBIDDEN)
                .with_save_cookies(true),
        )
        // acquire admin account
        .step(login_admin_action())
        .step(
            Action::new("user_list", "GET", "/api/v1/users/page")
                .with_param("limit", "5")
                .with_param("offset", "0")
                .assert_body(|body| {
                    assert!(body.contains("total"));
                    assert!(body.contains("items"));
                })
                .with_expect(StatusCode::OK),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_user_delete_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            register_action("foobar@example.com", "FOOBAR", "FOOBAZ", "student")
                .with_save_cookies(false)
                .with_save_as("foobar"),
        )
        .step(
            register_action("foobaz@example.com", "FOOBAZ", "FOOBAR", "student")
                .with_save_cookies(true)
                .with_save_as("foobaz"),
        )
        // we can't allow everybody to delete anybody ;D
        .step(
            Action::new("user_delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| {
                    let foobar = ctx.get_json::<UserEntity>("foobar");
                    format!("/api/v1/users/{}", foobar.id())
                })
                .with_expect(StatusCode::FORBIDDEN)
                .assert_body(|body| {
                    assert!(body.contains("error"));
                }),
        )
        // self deletion is allowed
        .step(
            Action::new("user_delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| {
                    let foobaz = ctx.get_json::<UserEntity>("foobaz");
                    format!("/api/v1/users/{}", foobaz.id())
                })
                .with_expect(StatusCode::OK),
        )
        .step(login_admin_action())
        // even admin cannot delete the user which doesn't exist :)
        .step(
            Action::new("user_delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| {
                    let foobaz = ctx.get_json::<UserEntity>("foobaz");
                    format!("/api/v1/users/{}", foobaz.id())
                })
                .with_expect(StatusCode::NOT_FOUND),
        )
        // admin can delete every user he wants
        .step(
            Action::new("user_delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| {
                    let foobar = ctx.get_json::<UserEntity>("foobar");
                    format!("/api/v1/users/{}", foobar.id())
                })
                .with_expect(StatusCode::OK),
        )
        .run(&mut server, pool)
        .await;
}
