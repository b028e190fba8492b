use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::Modify;

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "SID",
                    "JWT token for current user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::routes::user::auth_register_handler,
        crate::web::routes::user::auth_login_handler,
        crate::web::routes::user::auth_verify_handler,
        crate::web::routes::user::user_list_handler,
        crate::web::routes::user::user_delete_handler,
        crate::web::routes::courses::courses_list_handler,
        crate::web::routes::courses::courses_create_handler,
        crate::web::routes::courses::courses_get_handler,
        crate::web::routes::courses::courses_update_handler,
        crate::web::routes::courses::courses_delete_handler,
        crate::web::routes::courses::courses_lessons_list_handler,
        crate::web::routes::courses::courses_lessons_create_handler,
        crate::web::routes::courses::courses_enroll_handler,
        crate::web::routes::courses::courses_progress_handler,
        crate::web::routes::enrollments::enrollment_update_handler,
        crate::web::routes::enrollments::enrollment_delete_handler,
        crate::web::routes::lessons::lessons_get_handler,
        crate::web::routes::lessons::lessons_update_handler,
        crate::web::routes::lessons::lessons_delete_handler,
        crate::web::routes::lessons::lessons_quizzes_list_handler,
        crate::web::routes::lessons::lessons_quizzes_create_handler,
        crate::web::routes::quizzes::quizzes_get_handler,
        crate::web::routes::quizzes::quizzes_update_handler,
        crate::web::routes::quizzes::quizzes_delete_handler,
        crate::web::routes::quizzes::quizzes_questions_create_handler,
        crate::web::routes::quizzes::quizzes_submit_handler,
        crate::web::routes::quizzes::quizzes_results_handler,
    ),
    modifiers(&CookieAuthModifier),
)]
pub struct ApiDoc;
