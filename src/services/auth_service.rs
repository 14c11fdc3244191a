use crate::error::{AppError, AppResult};
use crate::external::GoogleAuthService;
use crate::models::*;
use crate::services::UserService;
use crate::utils::*;

const BAD_CREDENTIALS: &str = "Email ou senha incorretos";

#[derive(Clone)]
pub struct AuthService {
    users: UserService,
    jwt_service: JwtService,
    google: GoogleAuthService,
}

impl AuthService {
    pub fn new(users: UserService, jwt_service: JwtService, google: GoogleAuthService) -> Self {
        Self {
            users,
            jwt_service,
            google,
        }
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&request.email);
        let mut problems = Vec::new();
        if !is_valid_email(&email) {
            problems.push("Email inválido".to_string());
        }
        if request.password.is_empty() {
            problems.push("Senha é obrigatória".to_string());
        }
        if !problems.is_empty() {
            return Err(AppError::InvalidInput(problems));
        }

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::AuthError(BAD_CREDENTIALS.to_string()))?;

        // accounts created through Google have no password to compare against
        let Some(stored_hash) = user.password_hash.clone() else {
            return Err(AppError::AuthError(BAD_CREDENTIALS.to_string()));
        };
        if !verify_password_async(request.password, stored_hash).await? {
            return Err(AppError::AuthError(BAD_CREDENTIALS.to_string()));
        }

        if !user.email_verified {
            log::warn!("Login blocked for unverified account: {}", user.email);
            return Err(AppError::VerificationRequired);
        }

        let token = self.jwt_service.issue(&user)?;

        log::info!("Login: {} (ID: {})", user.email, user.id);
        Ok(AuthResponse {
            token,
            user: UserSummary::from(&user),
            message: "Login realizado com sucesso!".to_string(),
        })
    }

    /// Resolves a bearer token to the account it was issued for.
    pub async fn check_token(&self, token: &str) -> AppResult<UserResponse> {
        let claims = self.jwt_service.verify_token(token)?;
        let user = self
            .users
            .find_by_id(claims.user_id()?)
            .await?
            .ok_or_else(|| AppError::AuthError("Usuário não encontrado".to_string()))?;
        Ok(user.into())
    }

    pub async fn google_login(
        &self,
        request: GoogleLoginRequest,
    ) -> AppResult<GoogleLoginResponse> {
        let id_token = request.id_token.trim();
        if id_token.is_empty() {
            return Err(AppError::ValidationError(
                "Token do Google é obrigatório".to_string(),
            ));
        }

        let identity = self.google.verify_id_token(id_token).await?;
        let email = normalize_email(&identity.email);

        let user = match self.users.find_by_email(&email).await? {
            Some(user) => {
                if !user.email_verified {
                    // the provider has vouched for the address
                    self.users.mark_email_verified(user.id).await?;
                }
                user
            }
            None => {
                let name = identity
                    .name
                    .as_deref()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| email.split('@').next().unwrap_or("Usuário"));
                let user = self
                    .users
                    .create_oauth_user(name, &email, identity.picture.as_deref())
                    .await?;
                log::info!("Account created via Google: {} (ID: {})", user.email, user.id);
                user
            }
        };

        let token = self.jwt_service.issue(&user)?;
        Ok(GoogleLoginResponse {
            user: UserSummary::from(&user),
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoogleConfig;
    use crate::database::test_pool;

    async fn service() -> (AuthService, UserService, JwtService) {
        let users = UserService::new(test_pool().await);
        let jwt = JwtService::new("test-secret", 3600);
        let google = GoogleAuthService::new(GoogleConfig::default()).unwrap();
        (
            AuthService::new(users.clone(), jwt.clone(), google),
            users,
            jwt,
        )
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_verified_account() {
        let (auth, users, jwt) = service().await;
        let hash = hash_password("secret1").unwrap();
        let ana = users
            .create_from_hash("Ana", "ana@x.com", &hash, true)
            .await
            .unwrap();

        let resp = auth.login(login("Ana@x.com", "secret1")).await.unwrap();
        assert_eq!(resp.user.id, ana.id);
        assert_eq!(jwt.verify_token(&resp.token).unwrap().user_id().unwrap(), ana.id);
    }

    #[tokio::test]
    async fn test_login_unverified_account_requires_verification() {
        let (auth, users, _) = service().await;
        let hash = hash_password("secret1").unwrap();
        users
            .create_from_hash("Ana", "ana@x.com", &hash, false)
            .await
            .unwrap();

        let err = auth.login(login("ana@x.com", "secret1")).await.unwrap_err();
        assert!(matches!(err, AppError::VerificationRequired));
    }

    #[tokio::test]
    async fn test_login_bad_credentials_are_indistinguishable() {
        let (auth, users, _) = service().await;
        let hash = hash_password("secret1").unwrap();
        users
            .create_from_hash("Ana", "ana@x.com", &hash, true)
            .await
            .unwrap();
        users
            .create_oauth_user("Bia", "bia@x.com", None)
            .await
            .unwrap();

        for req in [
            login("ana@x.com", "wrong-pass"),
            login("ghost@x.com", "secret1"),
            login("bia@x.com", "secret1"),
        ] {
            match auth.login(req).await.unwrap_err() {
                AppError::AuthError(msg) => assert_eq!(msg, BAD_CREDENTIALS),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_login_validation() {
        let (auth, _, _) = service().await;
        let err = auth.login(login("nope", "")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(d) if d.len() == 2));
    }

    #[tokio::test]
    async fn test_check_token() {
        let (auth, users, jwt) = service().await;
        let ana = users
            .create_from_hash("Ana", "ana@x.com", "h", true)
            .await
            .unwrap();

        let token = jwt.issue(&ana).unwrap();
        assert_eq!(auth.check_token(&token).await.unwrap().id, ana.id);

        let orphan = jwt.generate_token(9999, "ghost@x.com").unwrap();
        assert!(matches!(
            auth.check_token(&orphan).await,
            Err(AppError::AuthError(_))
        ));
        assert!(auth.check_token("garbage").await.is_err());
    }

    #[tokio::test]
    async fn test_google_login_requires_token() {
        let (auth, _, _) = service().await;
        let err = auth
            .google_login(GoogleLoginRequest {
                id_token: "  ".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
