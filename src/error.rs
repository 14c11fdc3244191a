use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Value of `acao` telling the client to route to the verification screen.
pub const VERIFICATION_REQUIRED_ACTION: &str = "VERIFICACAO_REQUERIDA";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0:?}")]
    InvalidInput(Vec<String>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Email verification required")]
    VerificationRequired,

    #[error("Verification code expired")]
    CodeExpired,

    #[error("Invalid verification code")]
    InvalidCode,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Email delivery error: {0}")]
    EmailDeliveryError(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),
}

impl AppError {
    /// Maps unique-constraint violations to `Conflict`, everything else to `DatabaseError`.
    pub fn from_insert_err(err: DbErr, conflict_message: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict(conflict_message.to_string())
            }
            _ => AppError::DatabaseError(err),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidInput(_) | AppError::CodeExpired => {
                StatusCode::BAD_REQUEST
            }
            AppError::AuthError(_) | AppError::InvalidCode | AppError::JwtError(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::VerificationRequired => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ExternalApiError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, message): (&str, String) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                ("VALIDATION_ERROR", msg.clone())
            }
            AppError::InvalidInput(details) => {
                log::warn!("Invalid input: {details:?}");
                return HttpResponse::build(self.status_code()).json(json!({
                    "mensagem": "Dados inválidos",
                    "erro": "VALIDATION_ERROR",
                    "detalhes": details,
                }));
            }
            AppError::Conflict(msg) => {
                log::warn!("Conflict: {msg}");
                ("CONFLICT", msg.clone())
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                ("AUTH_ERROR", msg.clone())
            }
            AppError::VerificationRequired => {
                return HttpResponse::build(self.status_code()).json(json!({
                    "mensagem": "Conta não verificada. Verifique seu email para acessar.",
                    "erro": "VERIFICATION_REQUIRED",
                    "acao": VERIFICATION_REQUIRED_ACTION,
                }));
            }
            AppError::CodeExpired => (
                "CODE_EXPIRED",
                "O código de verificação expirou.".to_string(),
            ),
            AppError::InvalidCode => (
                "INVALID_CODE",
                "Código inválido ou não encontrado.".to_string(),
            ),
            AppError::JwtError(err) => {
                log::warn!("Token rejected: {err}");
                ("INVALID_TOKEN", "Token inválido".to_string())
            }
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone()),
            AppError::ExternalApiError(msg) => {
                log::error!("External API error: {msg}");
                (
                    "EXTERNAL_API_ERROR",
                    "Falha ao comunicar com o provedor externo.".to_string(),
                )
            }
            AppError::EmailDeliveryError(msg) => {
                log::error!("Email delivery error: {msg}");
                (
                    "EMAIL_DELIVERY_ERROR",
                    "Falha ao enviar e-mail de verificação. Tente novamente.".to_string(),
                )
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    "DATABASE_ERROR",
                    "Erro interno do servidor. Tente novamente.".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    "INTERNAL_ERROR",
                    "Erro interno do servidor. Tente novamente.".to_string(),
                )
            }
        };

        HttpResponse::build(self.status_code()).json(json!({
            "mensagem": message,
            "erro": error_code,
        }))
    }
}
