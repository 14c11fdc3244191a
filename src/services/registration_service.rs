use crate::error::{AppError, AppResult};
use crate::external::{Mailer, send_verification_code};
use crate::models::*;
use crate::services::{PendingRegistrationService, UserService};
use crate::utils::*;
use std::sync::Arc;
use std::time::Duration;

const NAME_MAX_LEN: usize = 100;

/// Drives the two-phase sign-up: begin (store + mail code), resend, verify (commit + token).
#[derive(Clone)]
pub struct RegistrationService {
    pending: PendingRegistrationService,
    users: UserService,
    jwt_service: JwtService,
    mailer: Arc<dyn Mailer>,
    mail_timeout: Duration,
}

/// Input that passed schema checks, with the email in canonical form.
#[derive(Debug)]
struct ValidRegistration {
    name: String,
    email: String,
    password: String,
}

fn validate_registration(request: RegisterRequest) -> AppResult<ValidRegistration> {
    let name = request.name.trim().to_string();
    let email = normalize_email(&request.email);
    let mut problems = Vec::new();

    if name.is_empty() {
        problems.push("Nome é obrigatório".to_string());
    } else if name.chars().count() > NAME_MAX_LEN {
        problems.push(format!("Nome deve ter no máximo {NAME_MAX_LEN} caracteres"));
    }
    if !is_valid_email(&email) {
        problems.push("Email inválido".to_string());
    }
    if let Some(msg) = password_policy_violation(&request.password) {
        problems.push(msg);
    }

    if problems.is_empty() {
        Ok(ValidRegistration {
            name,
            email,
            password: request.password,
        })
    } else {
        Err(AppError::InvalidInput(problems))
    }
}

impl RegistrationService {
    pub fn new(
        pending: PendingRegistrationService,
        users: UserService,
        jwt_service: JwtService,
        mailer: Arc<dyn Mailer>,
        mail_timeout: Duration,
    ) -> Self {
        Self {
            pending,
            users,
            jwt_service,
            mailer,
            mail_timeout,
        }
    }

    fn ttl_minutes(&self) -> i64 {
        self.pending.ttl().num_minutes()
    }

    /// Starts (or restarts) a registration and mails the code.
    ///
    /// If mailing fails the pending record stays written, so `resend_code`
    /// can still complete the flow without registering again.
    pub async fn begin(&self, request: RegisterRequest) -> AppResult<RegisterResponse> {
        let input = validate_registration(request)?;

        if let Some(existing) = self.users.find_by_email(&input.email).await?
            && existing.email_verified
        {
            return Err(AppError::Conflict(
                "Email já está cadastrado e verificado.".to_string(),
            ));
        }

        let password_hash = hash_password_async(input.password).await?;
        let code = generate_verification_code();

        self.pending
            .upsert(&input.name, &input.email, &password_hash, &code)
            .await?;

        send_verification_code(
            self.mailer.as_ref(),
            &input.email,
            &code,
            self.ttl_minutes(),
            self.mail_timeout,
        )
        .await?;

        log::info!("Pending registration saved and code sent: {}", input.email);
        Ok(RegisterResponse {
            message: "Cadastro iniciado! Código de verificação enviado para seu email."
                .to_string(),
            email: input.email,
        })
    }

    /// Re-sends the stored code. Answers the same way whether or not a
    /// registration is pending for `email`.
    pub async fn resend_code(&self, email: &str) -> AppResult<MessageResponse> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AppError::ValidationError("O email é obrigatório.".to_string()));
        }

        match self.pending.find(&email).await? {
            Some(record) => {
                send_verification_code(
                    self.mailer.as_ref(),
                    &email,
                    &record.code,
                    self.ttl_minutes(),
                    self.mail_timeout,
                )
                .await?;
                log::info!("Verification code re-sent: {email}");
            }
            None => log::info!("Code requested for email without pending registration: {email}"),
        }

        Ok(MessageResponse::new(
            "Se houver um cadastro pendente, o código foi enviado para o seu email.",
        ))
    }

    /// Consumes the code and commits the account.
    ///
    /// Any submitted code goes through the store, so an expired registration
    /// reports `CodeExpired` even for a malformed code. An unverified account
    /// with the same email is taken over on commit; a verified one is a
    /// terminal conflict since the code is already consumed.
    pub async fn verify(&self, request: VerifyCodeRequest) -> AppResult<VerifyCodeResponse> {
        let email = normalize_email(&request.email);
        let code = request.code.trim();
        if email.is_empty() || code.is_empty() {
            return Err(AppError::ValidationError(
                "Email e código são obrigatórios.".to_string(),
            ));
        }
        let (name, email, password_hash) =
            match self.pending.verify_and_consume(&email, code).await? {
                VerificationOutcome::Success {
                    name,
                    email,
                    password_hash,
                } => (name, email, password_hash),
                VerificationOutcome::Expired => {
                    log::info!("Expired verification code used: {email}");
                    return Err(AppError::CodeExpired);
                }
                VerificationOutcome::Invalid => {
                    if is_well_formed_code(code) {
                        log::warn!("Invalid verification code attempt: {email}");
                    } else {
                        log::warn!("Malformed verification code submitted: {email}");
                    }
                    return Err(AppError::InvalidCode);
                }
            };

        let user = self
            .users
            .commit_registration(&name, &email, &password_hash)
            .await
            .inspect_err(|e| {
                if matches!(e, AppError::Conflict(_)) {
                    log::error!(
                        "Verified account for {email} appeared after its code was consumed"
                    );
                }
            })?;

        let token = self.jwt_service.issue(&user)?;

        log::info!("Registration completed: {} (ID: {})", user.email, user.id);
        Ok(VerifyCodeResponse {
            message: "Registro e verificação concluídos com sucesso!".to_string(),
            token,
            user: UserSummary::from(&user),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{DbPool, test_pool};
    use crate::entities::pending_registration_entity as pending;
    use crate::external::testing::{FailingMailer, RecordingMailer};
    use chrono::{Duration as ChronoDuration, Utc};
    use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};

    struct Harness {
        pool: DbPool,
        service: RegistrationService,
        pending: PendingRegistrationService,
        users: UserService,
        mailer: Arc<RecordingMailer>,
        jwt: JwtService,
    }

    async fn harness_with(mailer: Arc<dyn Mailer>, recorder: Arc<RecordingMailer>) -> Harness {
        let pool = test_pool().await;
        let pending = PendingRegistrationService::new(pool.clone(), 15);
        let users = UserService::new(pool.clone());
        let jwt = JwtService::new("test-secret", 7 * 24 * 3600);
        let service = RegistrationService::new(
            pending.clone(),
            users.clone(),
            jwt.clone(),
            mailer,
            Duration::from_secs(5),
        );
        Harness {
            pool,
            service,
            pending,
            users,
            mailer: recorder,
            jwt,
        }
    }

    async fn harness() -> Harness {
        let recorder = Arc::new(RecordingMailer::default());
        harness_with(recorder.clone(), recorder).await
    }

    fn register(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn verify(email: &str, code: &str) -> VerifyCodeRequest {
        VerifyCodeRequest {
            email: email.to_string(),
            code: code.to_string(),
        }
    }

    #[tokio::test]
    async fn test_begin_stores_pending_and_mails_matching_code() {
        let h = harness().await;
        let resp = h
            .service
            .begin(register("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap();
        assert_eq!(resp.email, "ana@x.com");

        let rec = h.pending.find("ana@x.com").await.unwrap().unwrap();
        assert_eq!(rec.expires_at - rec.created_at, ChronoDuration::minutes(15));
        assert!(is_well_formed_code(&rec.code));
        assert!(verify_password("secret1", &rec.password_hash).unwrap());

        let sent = h.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ana@x.com");
        assert!(sent[0].html.contains(&rec.code));
    }

    #[tokio::test]
    async fn test_end_to_end_registration() {
        let h = harness().await;
        h.service
            .begin(register("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap();
        let code = h.pending.find("ana@x.com").await.unwrap().unwrap().code;

        let resp = h.service.verify(verify("ana@x.com", &code)).await.unwrap();
        assert_eq!(resp.user.email, "ana@x.com");
        assert_eq!(resp.user.name, "Ana");

        let claims = h.jwt.verify_token(&resp.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), resp.user.id);

        let account = h.users.find_by_email("ana@x.com").await.unwrap().unwrap();
        assert!(account.email_verified);
        assert!(verify_password("secret1", account.password_hash.as_deref().unwrap()).unwrap());

        let again = h
            .service
            .verify(verify("ana@x.com", &code))
            .await
            .unwrap_err();
        assert!(matches!(again, AppError::InvalidCode));
    }

    #[tokio::test]
    async fn test_expired_code_then_invalid() {
        let h = harness().await;
        h.service
            .begin(register("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap();
        let rec = h.pending.find("ana@x.com").await.unwrap().unwrap();
        let code = rec.code.clone();

        // move the clock past the TTL by backdating the record
        let mut am = rec.into_active_model();
        am.expires_at = Set(Utc::now() - ChronoDuration::seconds(1));
        am.update(&h.pool).await.unwrap();

        let err = h.service.verify(verify("ana@x.com", &code)).await.unwrap_err();
        assert!(matches!(err, AppError::CodeExpired));

        let err = h.service.verify(verify("ana@x.com", &code)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCode));
        assert!(h.users.find_by_email("ana@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reregistration_replaces_code() {
        let h = harness().await;
        h.service
            .begin(register("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap();
        let first = h.pending.find("ana@x.com").await.unwrap().unwrap();

        // force a distinct second code so the assertion is deterministic
        let second = loop {
            h.service
                .begin(register("Ana B", "ana@x.com", "secret2"))
                .await
                .unwrap();
            let rec = h.pending.find("ana@x.com").await.unwrap().unwrap();
            if rec.code != first.code {
                break rec;
            }
        };
        assert_eq!(second.name, "Ana B");

        let err = h
            .service
            .verify(verify("ana@x.com", &first.code))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCode));

        let ok = h
            .service
            .verify(verify("ana@x.com", &second.code))
            .await
            .unwrap();
        assert_eq!(ok.user.name, "Ana B");
    }

    #[tokio::test]
    async fn test_begin_rejects_verified_email() {
        let h = harness().await;
        h.users
            .create_from_hash("Ana", "ana@x.com", "h", true)
            .await
            .unwrap();
        let err = h
            .service
            .begin(register("Ana", "ANA@x.com", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(h.mailer.sent().is_empty());
        assert!(h.pending.find("ana@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_begin_validation_collects_every_problem() {
        let h = harness().await;
        let err = h
            .service
            .begin(register("  ", "not-an-email", "123"))
            .await
            .unwrap_err();
        match err {
            AppError::InvalidInput(details) => assert_eq!(details.len(), 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_mail_failure_keeps_pending_record() {
        let recorder = Arc::new(RecordingMailer::default());
        let h = harness_with(Arc::new(FailingMailer), recorder).await;

        let err = h
            .service
            .begin(register("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailDeliveryError(_)));
        assert!(h.pending.find("ana@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_resend_reuses_stored_code() {
        let h = harness().await;
        h.service
            .begin(register("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap();
        let code = h.pending.find("ana@x.com").await.unwrap().unwrap().code;

        h.service.resend_code("ana@x.com").await.unwrap();
        let sent = h.mailer.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].html.contains(&code));
        assert_eq!(h.pending.find("ana@x.com").await.unwrap().unwrap().code, code);
    }

    #[tokio::test]
    async fn test_resend_answers_identically_without_pending_record() {
        let h = harness().await;
        h.service
            .begin(register("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap();

        let known = h.service.resend_code("ana@x.com").await.unwrap();
        let unknown = h.service.resend_code("ghost@x.com").await.unwrap();
        assert_eq!(known.message, unknown.message);
        assert!(h.mailer.sent().iter().all(|m| m.to == "ana@x.com"));
    }

    #[tokio::test]
    async fn test_verify_unknown_email_and_wrong_code_look_the_same() {
        let h = harness().await;
        h.service
            .begin(register("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap();
        let stored = h.pending.find("ana@x.com").await.unwrap().unwrap().code;
        let wrong = if stored == "000000" { "000001" } else { "000000" };

        let a = h.service.verify(verify("ana@x.com", wrong)).await.unwrap_err();
        let b = h
            .service
            .verify(verify("ghost@x.com", "123456"))
            .await
            .unwrap_err();
        assert!(matches!(a, AppError::InvalidCode));
        assert!(matches!(b, AppError::InvalidCode));

        // the wrong guess did not burn the registration
        assert!(h.service.verify(verify("ana@x.com", &stored)).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_verify_commits_one_account() {
        let h = harness().await;
        h.service
            .begin(register("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap();
        let code = h.pending.find("ana@x.com").await.unwrap().unwrap().code;

        let (a, b) = tokio::join!(
            h.service.verify(verify("ana@x.com", &code)),
            h.service.verify(verify("ana@x.com", &code)),
        );
        let oks = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(oks, 1);
    }

    #[tokio::test]
    async fn test_commit_conflict_is_terminal() {
        let h = harness().await;
        h.service
            .begin(register("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap();
        let code = h.pending.find("ana@x.com").await.unwrap().unwrap().code;

        // another path (e.g. OAuth) commits the email first
        h.users
            .create_oauth_user("Ana G", "ana@x.com", None)
            .await
            .unwrap();

        let err = h.service.verify(verify("ana@x.com", &code)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(h.pending.find("ana@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unverified_account_is_completed_by_registration() {
        let h = harness().await;
        let legacy = h
            .users
            .create_from_hash("Old", "ana@x.com", "h", false)
            .await
            .unwrap();

        h.service
            .begin(register("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap();
        let code = h.pending.find("ana@x.com").await.unwrap().unwrap().code;

        let resp = h.service.verify(verify("ana@x.com", &code)).await.unwrap();
        assert_eq!(resp.user.id, legacy.id);
        assert_eq!(resp.user.name, "Ana");
        let claims = h.jwt.verify_token(&resp.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), legacy.id);

        let account = h.users.find_by_email("ana@x.com").await.unwrap().unwrap();
        assert!(account.email_verified);
        assert!(verify_password("secret1", account.password_hash.as_deref().unwrap()).unwrap());
    }

    #[tokio::test]
    async fn test_expiry_wins_over_malformed_code() {
        let h = harness().await;
        h.service
            .begin(register("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap();
        let rec = h.pending.find("ana@x.com").await.unwrap().unwrap();
        let mut am = rec.into_active_model();
        am.expires_at = Set(Utc::now() - ChronoDuration::seconds(1));
        am.update(&h.pool).await.unwrap();

        let err = h.service.verify(verify("ana@x.com", "12345")).await.unwrap_err();
        assert!(matches!(err, AppError::CodeExpired));
        assert!(h.pending.find("ana@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_code_is_invalid_and_keeps_record() {
        let h = harness().await;
        h.service
            .begin(register("Ana", "ana@x.com", "secret1"))
            .await
            .unwrap();

        let err = h.service.verify(verify("ana@x.com", "12a45")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCode));
        assert!(h.pending.find("ana@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_verify_requires_fields() {
        let h = harness().await;
        let err = h.service.verify(verify("", "")).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_pending_entity_expiry_is_strict() {
        let now = Utc::now();
        let rec = pending::Model {
            email: "a@b.co".into(),
            name: "A".into(),
            password_hash: "h".into(),
            code: "123456".into(),
            expires_at: now,
            created_at: now,
        };
        assert!(!rec.is_expired_at(now));
        assert!(rec.is_expired_at(now + ChronoDuration::milliseconds(1)));
    }
}
