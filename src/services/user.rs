//! User service
//!
//! Accounts and authentication:
//! - registration (user and profile created together)
//! - email/password authentication and token issuing
//! - resolving a presented token back to a [`Principal`]
//! - self-service account updates, applied atomically to user and profile

use crate::db::repositories::{is_unique_violation, ProfileRepository, UserRepository};
use crate::models::{Account, UpdateAccountInput, User};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::password::{hash_password, verify_password, UNMATCHABLE_HASH};
use crate::services::permission::Principal;
use crate::services::token::TokenService;
use anyhow::Context;
use std::sync::Arc;

/// Password length bounds, in characters
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

const MAX_USERNAME_LENGTH: usize = 255;

/// An account together with a freshly signed token
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub account: Account,
    pub token: String,
}

/// User service for managing accounts and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    profile_repo: Arc<dyn ProfileRepository>,
    tokens: TokenService,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        profile_repo: Arc<dyn ProfileRepository>,
        tokens: TokenService,
    ) -> Self {
        Self {
            user_repo,
            profile_repo,
            tokens,
        }
    }

    /// Register a new account and sign a token for it
    ///
    /// # Errors
    ///
    /// - `Validation` if a field is missing or malformed
    /// - `Conflict` if the username or email is taken
    pub async fn register(&self, input: RegisterInput) -> ServiceResult<AuthenticatedAccount> {
        let account = self.create_account(input, false).await?;
        tracing::info!("Registered user {}", account.user.username);
        self.with_token(account)
    }

    /// Create an account with staff and superuser flags set
    pub async fn create_superuser(&self, input: RegisterInput) -> ServiceResult<Account> {
        let account = self.create_account(input, true).await?;
        tracing::info!("Created superuser {}", account.user.username);
        Ok(account)
    }

    /// Check an email/password pair.
    ///
    /// Every failure, including an inactive account, is `InvalidCredentials`.
    pub async fn authenticate(&self, email: &str, password: &str) -> ServiceResult<Principal> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ServiceError::InvalidCredentials);
        }

        let user = self
            .user_repo
            .get_by_email(&normalize_email(email))
            .await
            .context("Failed to look up user")?;

        // An unknown email still pays for one full verification
        let stored_hash = user
            .as_ref()
            .map_or(UNMATCHABLE_HASH, |user| user.password_hash.as_str());
        let password_ok =
            verify_password(password, stored_hash).context("Failed to verify password")?;

        let user = match user {
            Some(user) if password_ok && user.is_active => user,
            Some(user) => {
                tracing::warn!("Authentication failed for user {}", user.id);
                return Err(ServiceError::InvalidCredentials);
            }
            None => {
                tracing::warn!("Authentication failed: unknown email");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        self.principal_for(&user).await
    }

    /// Authenticate and sign a token
    pub async fn login(&self, input: LoginInput) -> ServiceResult<AuthenticatedAccount> {
        let principal = self.authenticate(&input.email, &input.password).await?;
        let account = self.current(principal.user_id).await?;
        self.with_token(account)
    }

    /// Resolve a presented token to the principal it was issued for
    pub async fn resolve_token(&self, token: &str) -> ServiceResult<Principal> {
        let claims = self.tokens.verify(token)?;

        let user = self
            .user_repo
            .get_by_id(claims.id)
            .await
            .context("Failed to look up token user")?
            .ok_or_else(|| ServiceError::unauthorized("No user matching this token was found."))?;

        if !user.is_active {
            return Err(ServiceError::unauthorized("This user has been deactivated."));
        }

        self.principal_for(&user).await
    }

    /// Load the account of an authenticated user
    pub async fn current(&self, user_id: i64) -> ServiceResult<Account> {
        let user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| ServiceError::unauthorized("No user matching this token was found."))?;
        let profile = self
            .profile_repo
            .get_by_user_id(user_id)
            .await
            .context("Failed to get profile")?
            .ok_or_else(|| anyhow::anyhow!("User {} has no profile", user_id))?;

        Ok(Account { user, profile })
    }

    /// Current account with a freshly signed token
    pub async fn current_with_token(&self, user_id: i64) -> ServiceResult<AuthenticatedAccount> {
        let account = self.current(user_id).await?;
        self.with_token(account)
    }

    /// Apply a partial update to the user's own account.
    ///
    /// User and profile fields are written in one transaction.
    pub async fn update(
        &self,
        user_id: i64,
        input: UpdateAccountInput,
    ) -> ServiceResult<AuthenticatedAccount> {
        if input.is_empty() {
            return self.current_with_token(user_id).await;
        }

        let Account {
            mut user,
            mut profile,
        } = self.current(user_id).await?;

        if let Some(email) = input.email {
            let email = normalize_email(email.trim());
            validate_email(&email)?;
            if email != user.email {
                self.ensure_email_free(&email, Some(user.id)).await?;
                user.email = email;
            }
        }
        if let Some(username) = input.username {
            let username = username.trim().to_string();
            validate_username(&username)?;
            if username != user.username {
                self.ensure_username_free(&username, Some(user.id)).await?;
                user.username = username;
            }
        }
        if let Some(password) = input.password {
            validate_password(&password)?;
            user.password_hash = hash_password(&password).context("Failed to hash password")?;
        }
        if let Some(bio) = input.bio {
            profile.bio = bio;
        }
        if let Some(image) = input.image {
            profile.image = Some(image).filter(|url| !url.trim().is_empty());
        }

        let account = self
            .user_repo
            .update_with_profile(&user, &profile)
            .await
            .map_err(|e| conflict_or_internal(e, "That username or email is already taken."))?;

        self.with_token(account)
    }

    /// Mark an account inactive; its credentials and tokens stop working
    pub async fn deactivate(&self, user_id: i64) -> ServiceResult<()> {
        let found = self
            .user_repo
            .set_active(user_id, false)
            .await
            .context("Failed to deactivate user")?;
        if !found {
            return Err(ServiceError::not_found("A user with this ID does not exist."));
        }
        tracing::info!("Deactivated user {}", user_id);
        Ok(())
    }

    async fn create_account(&self, input: RegisterInput, superuser: bool) -> ServiceResult<Account> {
        let username = input.username.trim().to_string();
        let email = normalize_email(input.email.trim());

        validate_username(&username)?;
        validate_email(&email)?;
        validate_password(&input.password)?;

        self.ensure_username_free(&username, None).await?;
        self.ensure_email_free(&email, None).await?;

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let mut user = User::new(email, username, password_hash);
        if superuser {
            user = user.into_superuser();
        }

        self.user_repo
            .create_with_profile(&user)
            .await
            .map_err(|e| conflict_or_internal(e, "That username or email is already taken."))
    }

    async fn ensure_username_free(&self, username: &str, owner: Option<i64>) -> ServiceResult<()> {
        let existing = self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to check username")?;
        match existing {
            Some(other) if Some(other.id) != owner => Err(ServiceError::conflict(format!(
                "Username '{}' is already taken",
                username
            ))),
            _ => Ok(()),
        }
    }

    async fn ensure_email_free(&self, email: &str, owner: Option<i64>) -> ServiceResult<()> {
        let existing = self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to check email")?;
        match existing {
            Some(other) if Some(other.id) != owner => Err(ServiceError::conflict(format!(
                "Email '{}' is already registered",
                email
            ))),
            _ => Ok(()),
        }
    }

    async fn principal_for(&self, user: &User) -> ServiceResult<Principal> {
        let profile = self
            .profile_repo
            .get_by_user_id(user.id)
            .await
            .context("Failed to get profile")?
            .ok_or_else(|| anyhow::anyhow!("User {} has no profile", user.id))?;

        Ok(Principal {
            user_id: user.id,
            profile_id: profile.id,
            username: user.username.clone(),
        })
    }

    fn with_token(&self, account: Account) -> ServiceResult<AuthenticatedAccount> {
        let token = self.tokens.issue(account.user.id)?;
        Ok(AuthenticatedAccount { account, token })
    }
}

/// Map a repository failure to `Conflict` when a unique index rejected it
pub(crate) fn conflict_or_internal(err: anyhow::Error, message: &str) -> ServiceError {
    if is_unique_violation(&err) {
        ServiceError::conflict(message)
    } else {
        ServiceError::Internal(err)
    }
}

/// Lowercase the domain part of an email address
fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn validate_username(username: &str) -> ServiceResult<()> {
    if username.is_empty() {
        return Err(ServiceError::validation("Username cannot be empty"));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ServiceError::validation(format!(
            "Username cannot be longer than {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> ServiceResult<()> {
    if email.is_empty() {
        return Err(ServiceError::validation("Email cannot be empty"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ServiceError::validation("Invalid email format")),
    }
}

fn validate_password(password: &str) -> ServiceResult<()> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH || length > MAX_PASSWORD_LENGTH {
        return Err(ServiceError::validation(format!(
            "Password must be between {} and {} characters",
            MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Input for user registration
#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Input for user login
#[derive(Debug, Clone, Default)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::db::repositories::{SqlxProfileRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};
    use proptest::prelude::*;

    async fn setup_property_test_service() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxProfileRepository::boxed(pool),
            TokenService::new("property-secret", 60),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(10))]

        /// Every registered account has exactly one profile, and its
        /// credentials authenticate to that account.
        #[test]
        fn registration_creates_one_profile_and_authenticates(
            username in "[a-z]{3,12}",
            email_prefix in "[a-z]{3,12}",
            password in "[a-zA-Z0-9!@#$%^&*]{8,20}"
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let service = setup_property_test_service().await;
                let email = format!("{}@example.com", email_prefix);

                let registered = service
                    .register(RegisterInput::new(username.clone(), email.clone(), password.clone()))
                    .await
                    .expect("Registration should succeed");

                let profile = service
                    .profile_repo
                    .get_by_user_id(registered.account.user.id)
                    .await
                    .unwrap();
                prop_assert_eq!(profile.map(|p| p.id), Some(registered.account.profile.id));

                let principal = service.authenticate(&email, &password).await
                    .expect("Login should succeed with valid credentials");
                prop_assert_eq!(principal.user_id, registered.account.user.id);
                prop_assert_eq!(principal.username, username);
                Ok(())
            });
            result?;
        }
    }
}
