use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{user_entity, user_profile_entity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
}

impl From<&user_entity::Model> for UserSummary {
    fn from(user: &user_entity::Model) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Account fields safe to return to the owner (never the hash).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "email_verificado")]
    pub email_verified: bool,
    #[serde(rename = "foto")]
    pub photo_url: Option<String>,
    #[serde(rename = "criado_em")]
    pub created_at: DateTime<Utc>,
}

impl From<user_entity::Model> for UserResponse {
    fn from(user: user_entity::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            email_verified: user.email_verified,
            photo_url: user.photo_url,
            created_at: user.created_at,
        }
    }
}

/// Onboarding quiz answers as exchanged with the mobile client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuizData {
    #[serde(rename = "idade", default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(rename = "sexo", default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(rename = "altura", default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(rename = "peso_atual", default, skip_serializing_if = "Option::is_none")]
    pub current_weight_kg: Option<f64>,
    #[serde(rename = "peso_meta", default, skip_serializing_if = "Option::is_none")]
    pub target_weight_kg: Option<f64>,
    #[serde(rename = "objetivo", default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(rename = "nivel_atividade", default, skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<String>,
}

impl QuizData {
    pub fn is_empty(&self) -> bool {
        *self == QuizData::default()
    }
}

impl From<user_profile_entity::Model> for QuizData {
    fn from(p: user_profile_entity::Model) -> Self {
        Self {
            age: p.age,
            sex: p.sex,
            height_cm: p.height_cm,
            current_weight_kg: p.current_weight_kg,
            target_weight_kg: p.target_weight_kg,
            goal: p.goal,
            activity_level: p.activity_level,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    #[serde(flatten)]
    pub quiz: QuizData,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(flatten)]
    pub quiz: QuizData,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    #[serde(rename = "senhaAtual", default)]
    pub current_password: String,
    #[serde(rename = "novaSenha", default)]
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[schema(example = "ana@x.com")]
    pub email: String,
    #[serde(rename = "senha", default)]
    #[schema(example = "secret1")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    #[serde(rename = "usuario")]
    pub user: UserSummary,
    #[serde(rename = "mensagem")]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GoogleLoginRequest {
    #[serde(rename = "idToken", default)]
    pub id_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GoogleLoginResponse {
    #[serde(rename = "usuario")]
    pub user: UserSummary,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenCheckResponse {
    #[serde(rename = "valido")]
    pub valid: bool,
    #[serde(rename = "usuario", skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
    #[serde(rename = "mensagem")]
    pub message: String,
}
