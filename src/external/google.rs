use crate::config::GoogleConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::Deserialize;

/// Identity claims we rely on from a verified Google ID token.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleIdentity {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenInfoResponse {
    #[serde(default)]
    aud: Option<String>,
    #[serde(default)]
    email: Option<String>,
    // tokeninfo returns this as the string "true"/"false"
    #[serde(default)]
    email_verified: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Delegates ID-token verification to the provider's tokeninfo endpoint.
#[derive(Clone)]
pub struct GoogleAuthService {
    http: Client,
    cfg: GoogleConfig,
}

impl GoogleAuthService {
    pub fn new(cfg: GoogleConfig) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent("nutrisnap-backend/google")
            .build()?;
        Ok(Self { http, cfg })
    }

    pub async fn verify_id_token(&self, id_token: &str) -> AppResult<GoogleIdentity> {
        if id_token.len() > 4096 {
            return Err(AppError::AuthError("Token do Google inválido".into()));
        }

        let resp = self
            .http
            .get(&self.cfg.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("tokeninfo unreachable: {e}")))?;

        let status = resp.status();
        if status.is_client_error() {
            log::warn!("Google tokeninfo rejected token: HTTP {}", status.as_u16());
            return Err(AppError::AuthError("Token do Google inválido".into()));
        }
        if !status.is_success() {
            return Err(AppError::ExternalApiError(format!(
                "tokeninfo returned HTTP {}",
                status.as_u16()
            )));
        }

        let info: TokenInfoResponse = resp.json().await?;
        self.identity_from(info)
    }

    fn identity_from(&self, info: TokenInfoResponse) -> AppResult<GoogleIdentity> {
        if !self.cfg.client_id.is_empty() && info.aud.as_deref() != Some(&self.cfg.client_id) {
            log::warn!("Google token audience mismatch: {:?}", info.aud);
            return Err(AppError::AuthError("Token do Google inválido".into()));
        }
        if info.email_verified.as_deref() != Some("true") {
            return Err(AppError::AuthError("Email do Google não verificado".into()));
        }
        let email = info
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::AuthError("Token do Google sem email".into()))?;

        Ok(GoogleIdentity {
            email,
            name: info.name,
            picture: info.picture,
        })
    }
}
