use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[serde(rename = "mensagem")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error body shape produced by `AppError`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    #[serde(rename = "mensagem")]
    pub message: String,
    #[serde(rename = "erro")]
    pub code: String,
    #[serde(rename = "detalhes", skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(rename = "acao", skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}
