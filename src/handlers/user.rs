use crate::middlewares::current_user_id;
use crate::models::*;
use crate::services::{AuthService, UserService};
use actix_web::{HttpRequest, HttpResponse, Result, ResponseError, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/user/profile",
    tag = "user",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Perfil do usuário", body = ProfileResponse),
        (status = 401, description = "Não autorizado", body = ApiError),
        (status = 404, description = "Usuário não encontrado", body = ApiError)
    )
)]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match user_service.get_profile(user_id).await {
        Ok(profile) => Ok(HttpResponse::Ok().json(profile)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/user/profile",
    tag = "user",
    request_body = UpdateProfileRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Perfil atualizado"),
        (status = 400, description = "Campos ausentes ou email em uso", body = ApiError),
        (status = 401, description = "Não autorizado", body = ApiError)
    )
)]
pub async fn update_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    request: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match user_service.update_profile(user_id, request.into_inner()).await {
        Ok(updated) => Ok(HttpResponse::Ok().json(json!({
            "mensagem": "Perfil atualizado com sucesso",
            "usuario": updated
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/user/change-password",
    tag = "user",
    request_body = ChangePasswordRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Senha alterada", body = MessageResponse),
        (status = 400, description = "Campos ausentes", body = ApiError),
        (status = 401, description = "Senha atual incorreta", body = ApiError),
        (status = 404, description = "Usuário não encontrado", body = ApiError)
    )
)]
pub async fn change_password(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    request: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match user_service
        .change_password(user_id, request.into_inner())
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(MessageResponse::new("Senha alterada com sucesso!"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/user/login/google",
    tag = "user",
    request_body = GoogleLoginRequest,
    responses(
        (status = 200, description = "Login via Google", body = GoogleLoginResponse),
        (status = 400, description = "Token ausente", body = ApiError),
        (status = 401, description = "Token do Google inválido", body = ApiError)
    )
)]
pub async fn google_login(
    auth_service: web::Data<AuthService>,
    request: web::Json<GoogleLoginRequest>,
) -> Result<HttpResponse> {
    match auth_service.google_login(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/user")
            .route("/profile", web::get().to(get_profile))
            .route("/profile", web::put().to(update_profile))
            .route("/change-password", web::put().to(change_password))
            .route("/login/google", web::post().to(google_login)),
    );
}
