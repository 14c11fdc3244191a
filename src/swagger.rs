use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::verify_token,
        handlers::auth::send_code,
        handlers::auth::verify_code,
        handlers::user::get_profile,
        handlers::user::update_profile,
        handlers::user::change_password,
        handlers::user::google_login,
    ),
    components(
        schemas(
            RegisterRequest,
            RegisterResponse,
            SendCodeRequest,
            VerifyCodeRequest,
            VerifyCodeResponse,
            LoginRequest,
            AuthResponse,
            TokenCheckResponse,
            UserSummary,
            UserResponse,
            QuizData,
            ProfileResponse,
            UpdateProfileRequest,
            ChangePasswordRequest,
            GoogleLoginRequest,
            GoogleLoginResponse,
            MessageResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, email verification and login"),
        (name = "user", description = "Profile and account management"),
    ),
    info(
        title = "NutriSnap Backend API",
        version = "1.0.0",
        description = "NutriSnap REST API documentation"
    ),
    servers(
        (url = "/api", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
