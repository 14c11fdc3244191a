use crate::models::*;
use crate::services::{AuthService, RegistrationService};
use crate::utils::bearer_token;
use actix_web::{HttpRequest, HttpResponse, Result, ResponseError, web};

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 202, description = "Registro pendente criado e código enviado", body = RegisterResponse),
        (status = 400, description = "Dados inválidos", body = ApiError),
        (status = 409, description = "Email já cadastrado e verificado", body = ApiError),
        (status = 500, description = "Erro interno ou falha no envio do email", body = ApiError)
    )
)]
pub async fn register(
    registration_service: web::Data<RegistrationService>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    match registration_service.begin(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Accepted().json(response)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login realizado", body = AuthResponse),
        (status = 400, description = "Dados inválidos", body = ApiError),
        (status = 401, description = "Email ou senha incorretos", body = ApiError),
        (status = 403, description = "Conta não verificada (acao = VERIFICACAO_REQUERIDA)", body = ApiError)
    )
)]
pub async fn login(
    auth_service: web::Data<AuthService>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    match auth_service.login(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/auth/verify-token",
    tag = "auth",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Token válido", body = TokenCheckResponse),
        (status = 401, description = "Token ausente ou inválido", body = TokenCheckResponse)
    )
)]
pub async fn verify_token(
    auth_service: web::Data<AuthService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    let Some(token) = bearer_token(header) else {
        return Ok(HttpResponse::Unauthorized().json(TokenCheckResponse {
            valid: false,
            user: None,
            message: "Token ausente".to_string(),
        }));
    };

    match auth_service.check_token(token).await {
        Ok(user) => Ok(HttpResponse::Ok().json(TokenCheckResponse {
            valid: true,
            user: Some(user),
            message: "Token válido".to_string(),
        })),
        Err(e) => {
            log::warn!("Token check failed: {e}");
            Ok(HttpResponse::Unauthorized().json(TokenCheckResponse {
                valid: false,
                user: None,
                message: "Token inválido".to_string(),
            }))
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/send-code",
    tag = "auth",
    request_body = SendCodeRequest,
    responses(
        (status = 200, description = "Resposta genérica, exista ou não um cadastro pendente", body = MessageResponse),
        (status = 400, description = "Email ausente", body = ApiError),
        (status = 500, description = "Erro interno", body = ApiError)
    )
)]
pub async fn send_code(
    registration_service: web::Data<RegistrationService>,
    request: web::Json<SendCodeRequest>,
) -> Result<HttpResponse> {
    match registration_service.resend_code(&request.email).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/verify-code",
    tag = "auth",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Conta criada e sessão iniciada", body = VerifyCodeResponse),
        (status = 400, description = "Código expirado ou dados ausentes", body = ApiError),
        (status = 401, description = "Código inválido ou não encontrado", body = ApiError),
        (status = 409, description = "Email cadastrado por outro meio durante a verificação", body = ApiError),
        (status = 500, description = "Erro interno", body = ApiError)
    )
)]
pub async fn verify_code(
    registration_service: web::Data<RegistrationService>,
    request: web::Json<VerifyCodeRequest>,
) -> Result<HttpResponse> {
    match registration_service.verify(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/verify-token", web::get().to(verify_token))
            .route("/send-code", web::post().to(send_code))
            .route("/verify-code", web::post().to(verify_code)),
    );
}
