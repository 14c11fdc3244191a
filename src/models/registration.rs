use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserSummary;

/// Result of checking a submitted code against the pending registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Success {
        name: String,
        email: String,
        password_hash: String,
    },
    Expired,
    Invalid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(rename = "nome", default)]
    #[schema(example = "Ana")]
    pub name: String,
    #[serde(default)]
    #[schema(example = "ana@x.com")]
    pub email: String,
    #[serde(rename = "senha", default)]
    #[schema(example = "secret1")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    #[serde(rename = "mensagem")]
    pub message: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendCodeRequest {
    #[serde(default)]
    #[schema(example = "ana@x.com")]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyCodeRequest {
    #[serde(default)]
    #[schema(example = "ana@x.com")]
    pub email: String,
    #[serde(rename = "codigo", default)]
    #[schema(example = "042917")]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyCodeResponse {
    #[serde(rename = "mensagem")]
    pub message: String,
    pub token: String,
    #[serde(rename = "usuario")]
    pub user: UserSummary,
}
