use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::core::AppError;
use crate::models::users::{LoginRequest, NewUser, RegisterRequest, User};

use super::{ActivationMailer, UserRepository};

/// Activation links older than this trigger a resend instead of confirming.
const ACTIVATION_TTL_HOURS: i64 = 24;

/// Registration, e-mail activation and credential checks.
pub struct UserService {
    users: Arc<dyn UserRepository>,
    mailer: Arc<dyn ActivationMailer>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, mailer: Arc<dyn ActivationMailer>) -> Self {
        Self { users, mailer }
    }

    pub async fn find_all(&self) -> Result<Vec<User>, AppError> {
        self.users.find_all().await
    }

    /// Registers a new account and mails out the activation link.
    #[tracing::instrument(name = "Register user", skip(self, request))]
    pub async fn add_user(&self, request: RegisterRequest) -> Result<User, AppError> {
        request
            .validate()
            .map_err(AppError::validation_error)?;

        if self
            .users
            .find_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(AppError::already_exists("User exists!"));
        }

        let activation_code = Uuid::new_v4().to_string();
        let user = self
            .users
            .insert(NewUser {
                username: request.username,
                password: hash_password(&request.password)?,
                email: request.email,
                activation_code: Some(activation_code.clone()),
                registration_date: Utc::now(),
                is_confirmed: false,
            })
            .await?;

        self.mailer
            .send_activation(&user.email, &user.username, &activation_code)
            .await?;

        Ok(user)
    }

    /// Confirms the e-mail address behind an activation code. An expired
    /// code is rotated and re-sent, and the attempt reported back as an
    /// error.
    #[tracing::instrument(name = "Activate user", skip(self, code))]
    pub async fn activate_user(&self, code: &str) -> Result<User, AppError> {
        if code.is_empty() {
            return Err(AppError::not_found("Activation code has not found!"));
        }

        let mut user = self
            .users
            .find_by_activation_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Activation code has not found!"))?;

        if Utc::now() - user.registration_date > Duration::hours(ACTIVATION_TTL_HOURS) {
            let new_code = Uuid::new_v4().to_string();
            user.activation_code = Some(new_code.clone());
            user.registration_date = Utc::now();
            self.users.update(&user).await?;
            self.mailer
                .send_activation(&user.email, &user.username, &new_code)
                .await?;

            return Err(AppError::validation_error(
                "Activation link has expired! The new one has been sent",
            ));
        }

        user.activation_code = None;
        user.is_confirmed = true;
        self.users.update(&user).await?;

        Ok(user)
    }

    /// Checks credentials and returns the account, which must be confirmed.
    #[tracing::instrument(name = "User login", skip(self, request))]
    pub async fn login(&self, request: &LoginRequest) -> Result<User, AppError> {
        let user = self
            .users
            .find_by_username(&request.username)
            .await?
            .ok_or_else(|| AppError::unauthorized("Username or password is incorrect"))?;

        if !verify_password(&request.password, &user.password)? {
            return Err(AppError::unauthorized("Username or password is incorrect"));
        }

        if !user.is_confirmed {
            return Err(AppError::unauthorized("Account is not activated"));
        }

        Ok(user)
    }
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AppError::internal_error("Failed to hash password"))
}

fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|_| AppError::internal_error("Stored password hash is invalid"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AppErrorType;
    use crate::services::support::{InMemoryUsers, RecordingMailer};
    use claim::{assert_none, assert_ok, assert_some};

    fn service() -> (UserService, Arc<InMemoryUsers>, Arc<RecordingMailer>) {
        let users = Arc::new(InMemoryUsers::default());
        let mailer = Arc::new(RecordingMailer::default());
        (
            UserService::new(users.clone(), mailer.clone()),
            users,
            mailer,
        )
    }

    fn registration(username: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: "correct horse".to_string(),
            email: format!("{}@example.com", username),
        }
    }

    #[tokio::test]
    async fn registration_stores_a_hash_and_mails_the_activation_code() {
        let (service, _, mailer) = service();

        let user = service.add_user(registration("maria")).await.unwrap();

        assert!(!user.is_confirmed);
        assert_some!(user.activation_code.as_ref());
        assert_ne!(user.password, "correct horse");
        assert!(verify_password("correct horse", &user.password).unwrap());

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "maria@example.com");
        assert_eq!(Some(&sent[0].1), user.activation_code.as_ref());
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let (service, _, _) = service();
        service.add_user(registration("maria")).await.unwrap();

        let err = service.add_user(registration("maria")).await.unwrap_err();

        assert_eq!(err.error_type, AppErrorType::AlreadyExistsError);
        assert_eq!(err.message(), "User exists!");
    }

    #[tokio::test]
    async fn invalid_registration_payloads_are_rejected() {
        let (service, _, _) = service();

        let mut request = registration("maria");
        request.username = "m".repeat(51);
        let err = service.add_user(request).await.unwrap_err();
        assert_eq!(err.error_type, AppErrorType::PayloadValidationError);

        let mut request = registration("maria");
        request.password = "short".to_string();
        let err = service.add_user(request).await.unwrap_err();
        assert_eq!(err.error_type, AppErrorType::PayloadValidationError);

        let mut request = registration("maria");
        request.email = "not-an-email".to_string();
        let err = service.add_user(request).await.unwrap_err();
        assert_eq!(err.error_type, AppErrorType::PayloadValidationError);
    }

    #[tokio::test]
    async fn activation_confirms_and_clears_the_code() {
        let (service, users, _) = service();
        let user = service.add_user(registration("maria")).await.unwrap();
        let code = user.activation_code.clone().unwrap();

        let activated = service.activate_user(&code).await.unwrap();

        assert!(activated.is_confirmed);
        assert_none!(activated.activation_code.as_ref());
        let stored = users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.is_confirmed);
    }

    #[tokio::test]
    async fn unknown_activation_code_is_not_found() {
        let (service, _, _) = service();

        for code in ["", "nope"] {
            let err = service.activate_user(code).await.unwrap_err();
            assert_eq!(err.error_type, AppErrorType::NotFoundError);
        }
    }

    #[tokio::test]
    async fn stale_activation_rotates_the_code_and_resends() {
        let (service, users, mailer) = service();
        let mut user = service.add_user(registration("maria")).await.unwrap();
        let old_code = user.activation_code.clone().unwrap();

        user.registration_date = Utc::now() - Duration::hours(25);
        users.update(&user).await.unwrap();

        let err = service.activate_user(&old_code).await.unwrap_err();
        assert_eq!(err.error_type, AppErrorType::PayloadValidationError);

        let stored = users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(!stored.is_confirmed);
        let new_code = stored.activation_code.unwrap();
        assert_ne!(new_code, old_code);

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].1, new_code);
    }

    #[tokio::test]
    async fn login_accepts_only_confirmed_accounts_with_valid_credentials() {
        let (service, _, _) = service();
        let user = service.add_user(registration("maria")).await.unwrap();

        let request = LoginRequest {
            username: "maria".to_string(),
            password: "correct horse".to_string(),
        };

        // unconfirmed account
        let err = service.login(&request).await.unwrap_err();
        assert_eq!(err.error_type, AppErrorType::AuthError);

        let code = user.activation_code.unwrap();
        service.activate_user(&code).await.unwrap();

        assert_ok!(service.login(&request).await);

        let err = service
            .login(&LoginRequest {
                username: "maria".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_type, AppErrorType::AuthError);

        let err = service
            .login(&LoginRequest {
                username: "nobody".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_type, AppErrorType::AuthError);
    }
}
