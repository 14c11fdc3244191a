use crate::entities::{user_entity as users, user_profile_entity as profiles};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::*;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};

const EMAIL_TAKEN: &str = "Email já está cadastrado e verificado.";

/// Committed accounts and their profile data.
#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<users::Model>> {
        Ok(users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.pool)
            .await?)
    }

    pub async fn find_by_id(&self, user_id: i64) -> AppResult<Option<users::Model>> {
        Ok(users::Entity::find_by_id(user_id).one(&self.pool).await?)
    }

    /// Inserts an account from an already-hashed password.
    /// A unique-email violation surfaces as `Conflict`.
    pub async fn create_from_hash(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        email_verified: bool,
    ) -> AppResult<users::Model> {
        let now = Utc::now();
        users::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(Some(password_hash.to_string())),
            email_verified: Set(email_verified),
            photo_url: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await
        .map_err(|e| AppError::from_insert_err(e, EMAIL_TAKEN))
    }

    /// Commits a verified registration.
    ///
    /// An existing *unverified* account for `email` is taken over: its name and
    /// hash are replaced and it becomes verified. Only a verified account
    /// blocks the commit, as `Conflict`.
    pub async fn commit_registration(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> AppResult<users::Model> {
        match self.create_from_hash(name, email, password_hash, true).await {
            Err(AppError::Conflict(_)) => {}
            other => return other,
        }

        let res = users::Entity::update_many()
            .col_expr(users::Column::Name, Expr::value(name))
            .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(users::Column::EmailVerified, Expr::value(true))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::EmailVerified.eq(false))
            .exec(&self.pool)
            .await?;
        if res.rows_affected != 1 {
            return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
        }

        log::info!("Unverified account taken over by registration: {email}");
        self.find_by_email(email)
            .await?
            .ok_or_else(|| AppError::InternalError(format!("account for {email} vanished")))
    }

    /// Account created through an external identity provider: verified, no password.
    pub async fn create_oauth_user(
        &self,
        name: &str,
        email: &str,
        photo_url: Option<&str>,
    ) -> AppResult<users::Model> {
        let now = Utc::now();
        users::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(None),
            email_verified: Set(true),
            photo_url: Set(photo_url.map(str::to_string)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await
        .map_err(|e| AppError::from_insert_err(e, EMAIL_TAKEN))
    }

    pub async fn mark_email_verified(&self, user_id: i64) -> AppResult<()> {
        let user = self
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuário não encontrado".to_string()))?;
        if user.email_verified {
            return Ok(());
        }
        let mut am = user.into_active_model();
        am.email_verified = Set(true);
        am.updated_at = Set(Utc::now());
        am.update(&self.pool).await?;
        Ok(())
    }

    pub async fn get_profile(&self, user_id: i64) -> AppResult<ProfileResponse> {
        let (user, profile) = users::Entity::find_by_id(user_id)
            .find_also_related(profiles::Entity)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuário não encontrado".to_string()))?;

        Ok(ProfileResponse {
            user: user.into(),
            quiz: profile.map(QuizData::from).unwrap_or_default(),
        })
    }

    /// Updates name/email and upserts quiz answers.
    /// The quiz row is only created when the request carries quiz fields.
    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateProfileRequest,
    ) -> AppResult<UpdateProfileRequest> {
        let name = request.name.trim().to_string();
        let email = normalize_email(&request.email);
        if name.is_empty() || email.is_empty() {
            return Err(AppError::ValidationError(
                "Nome e email são obrigatórios".to_string(),
            ));
        }
        if !is_valid_email(&email) {
            return Err(AppError::ValidationError("Email inválido".to_string()));
        }

        if let Some(other) = self.find_by_email(&email).await?
            && other.id != user_id
        {
            return Err(AppError::ValidationError(
                "Este email já está em uso por outro usuário".to_string(),
            ));
        }

        let user = self
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuário não encontrado".to_string()))?;

        let now = Utc::now();
        let mut am = user.into_active_model();
        am.name = Set(name.clone());
        am.email = Set(email.clone());
        am.updated_at = Set(now);
        am.update(&self.pool).await.map_err(|e| {
            // lost a race with another account taking the email
            match AppError::from_insert_err(e, "Este email já está em uso por outro usuário") {
                AppError::Conflict(msg) => AppError::ValidationError(msg),
                other => other,
            }
        })?;

        let existing = profiles::Entity::find()
            .filter(profiles::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?;

        if existing.is_some() || !request.quiz.is_empty() {
            let q = &request.quiz;
            profiles::Entity::insert(profiles::ActiveModel {
                user_id: Set(user_id),
                age: Set(q.age),
                sex: Set(q.sex.clone()),
                height_cm: Set(q.height_cm),
                current_weight_kg: Set(q.current_weight_kg),
                target_weight_kg: Set(q.target_weight_kg),
                goal: Set(q.goal.clone()),
                activity_level: Set(q.activity_level.clone()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            })
            .on_conflict(
                OnConflict::column(profiles::Column::UserId)
                    .update_columns([
                        profiles::Column::Age,
                        profiles::Column::Sex,
                        profiles::Column::HeightCm,
                        profiles::Column::CurrentWeightKg,
                        profiles::Column::TargetWeightKg,
                        profiles::Column::Goal,
                        profiles::Column::ActivityLevel,
                        profiles::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.pool)
            .await?;
        }

        log::info!("Profile updated for user {user_id}");
        Ok(UpdateProfileRequest {
            name,
            email,
            quiz: request.quiz,
        })
    }

    pub async fn change_password(
        &self,
        user_id: i64,
        request: ChangePasswordRequest,
    ) -> AppResult<()> {
        if request.current_password.is_empty() || request.new_password.is_empty() {
            return Err(AppError::ValidationError(
                "Senha atual e nova senha são obrigatórias.".to_string(),
            ));
        }

        let user = self
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuário não encontrado.".to_string()))?;
        let Some(stored_hash) = user.password_hash.clone() else {
            return Err(AppError::NotFound("Usuário não encontrado.".to_string()));
        };

        if !verify_password_async(request.current_password, stored_hash).await? {
            return Err(AppError::AuthError("Senha atual incorreta.".to_string()));
        }

        validate_password(&request.new_password)?;
        let new_hash = hash_password_async(request.new_password).await?;

        let mut am = user.into_active_model();
        am.password_hash = Set(Some(new_hash));
        am.updated_at = Set(Utc::now());
        am.update(&self.pool).await?;

        log::info!("Password changed for user {user_id}");
        Ok(())
    }
}
