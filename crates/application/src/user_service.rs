//! User account ports and application service.
//!
//! Covers registration, email verification, and password login. The
//! mocked single-sign-on path lives in `sso_service` and shares the
//! same `UserRepository` port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use markops_core::{AppError, AppResult, OrganizationId, UserIdentity};
use markops_domain::{EmailAddress, UserId, validate_password};
use uuid::Uuid;

use crate::sso_service::OrganizationRepository;

/// Stored user row.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    /// User identifier.
    pub id: UserId,
    /// Organization the account belongs to; absent until attached.
    pub organization_id: Option<OrganizationId>,
    /// Lower-cased email address, unique across the system.
    pub email: String,
    /// Display name shown in the UI.
    pub display_name: String,
    /// Argon2 password hash; absent for SSO-provisioned accounts that
    /// never set a password.
    pub password_hash: Option<String>,
    /// Inactive accounts cannot log in.
    pub is_active: bool,
    /// Whether the email address was verified.
    pub is_verified: bool,
    /// Superuser accounts bypass team-scoped checks.
    pub is_superuser: bool,
    /// Pending verification token; cleared once the email is verified.
    pub verification_token: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Builds the session identity for this account.
    #[must_use]
    pub fn identity(&self) -> UserIdentity {
        UserIdentity::new(
            self.id.as_uuid(),
            self.display_name.clone(),
            Some(self.email.clone()),
            self.organization_id,
            self.is_superuser,
        )
    }
}

/// Input payload for self-service registration.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterUserInput {
    /// Email address for the new account.
    pub email: String,
    /// Plaintext password; validated then hashed.
    pub password: String,
    /// Display name.
    pub display_name: String,
    /// Organization to attach at creation, when known.
    pub organization_id: Option<OrganizationId>,
}

/// Profile view returned to the authenticated user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    /// The account itself.
    pub user: UserRecord,
    /// Name of the attached organization, when any.
    pub organization_name: Option<String>,
    /// Names of roles with a currently active validity window.
    pub active_roles: Vec<String>,
}

/// Outcome of consuming a verification token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The token verified the account.
    Verified,
    /// The account was already verified; the call is a no-op.
    AlreadyVerified,
}

/// Repository port for user persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persists a new user.
    async fn insert(&self, user: &UserRecord) -> AppResult<()>;

    /// Finds a user by id.
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>>;

    /// Finds a user by lower-cased email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>>;

    /// Finds a user by pending verification token.
    async fn find_by_verification_token(&self, token: &str) -> AppResult<Option<UserRecord>>;

    /// Persists an updated user row.
    async fn update(&self, user: &UserRecord) -> AppResult<()>;

    /// Lists names of roles assigned to the user whose validity window
    /// contains `at`.
    async fn list_active_role_names(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<Vec<String>>;
}

/// Password hashing port.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password.
    fn hash(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> AppResult<bool>;
}

/// Outbound email port. The default implementation logs instead of
/// sending.
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Delivers a verification message carrying the token.
    async fn send_verification(&self, email: &str, token: &str) -> AppResult<()>;
}

/// Application service for account lifecycle.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    hasher: Arc<dyn PasswordHasher>,
    email: Arc<dyn EmailService>,
}

impl UserService {
    /// Creates a new service from its ports.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        organizations: Arc<dyn OrganizationRepository>,
        hasher: Arc<dyn PasswordHasher>,
        email: Arc<dyn EmailService>,
    ) -> Self {
        Self {
            users,
            organizations,
            hasher,
            email,
        }
    }

    /// Registers a new account and sends the verification email.
    pub async fn register(&self, input: RegisterUserInput) -> AppResult<UserRecord> {
        let email = EmailAddress::new(input.email)?;
        validate_password(&input.password)?;

        if self.users.find_by_email(email.as_str()).await?.is_some() {
            return Err(AppError::Validation(
                "an account with this email already exists".to_owned(),
            ));
        }

        let display_name = input.display_name.trim();
        let display_name = if display_name.is_empty() {
            email.as_str().to_owned()
        } else {
            display_name.to_owned()
        };

        let token = Uuid::new_v4().simple().to_string();
        let user = UserRecord {
            id: UserId::new(),
            organization_id: input.organization_id,
            email: email.as_str().to_owned(),
            display_name,
            password_hash: Some(self.hasher.hash(&input.password)?),
            is_active: true,
            is_verified: false,
            is_superuser: false,
            verification_token: Some(token.clone()),
            created_at: Utc::now(),
        };

        self.users.insert(&user).await?;
        self.email.send_verification(&user.email, &token).await?;
        Ok(user)
    }

    /// Consumes a verification token.
    pub async fn verify_email(&self, token: &str) -> AppResult<VerificationOutcome> {
        let mut user = self
            .users
            .find_by_verification_token(token)
            .await?
            .ok_or_else(|| AppError::NotFound("verification token is not valid".to_owned()))?;

        if user.is_verified {
            return Ok(VerificationOutcome::AlreadyVerified);
        }

        user.is_verified = true;
        user.verification_token = None;
        self.users.update(&user).await?;
        Ok(VerificationOutcome::Verified)
    }

    /// Authenticates an email/password pair and returns the session
    /// identity.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<UserIdentity> {
        let email = EmailAddress::new(email)?;
        let user = self
            .users
            .find_by_email(email.as_str())
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid credentials".to_owned()))?;

        let hash = user
            .password_hash
            .as_deref()
            .ok_or_else(|| AppError::Unauthorized("invalid credentials".to_owned()))?;

        if !self.hasher.verify(password, hash)? {
            return Err(AppError::Unauthorized("invalid credentials".to_owned()));
        }

        if !user.is_active {
            return Err(AppError::Unauthorized("account is deactivated".to_owned()));
        }

        Ok(user.identity())
    }

    /// Returns the profile view for an authenticated user.
    pub async fn profile(&self, user_id: UserId) -> AppResult<UserProfile> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' was not found")))?;

        let organization_name = match user.organization_id {
            Some(organization_id) => self
                .organizations
                .find_by_id(organization_id)
                .await?
                .map(|organization| organization.name),
            None => None,
        };

        let active_roles = self
            .users
            .list_active_role_names(user_id, Utc::now())
            .await?;

        Ok(UserProfile {
            user,
            organization_name,
            active_roles,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use markops_core::{AppError, AppResult, OrganizationId};
    use markops_domain::{EmailAddress, UserId};
    use tokio::sync::Mutex;

    use crate::sso_service::{OrganizationRecord, OrganizationRepository};

    use super::{
        EmailService, PasswordHasher, RegisterUserInput, UserRecord, UserRepository, UserService,
        VerificationOutcome,
    };

    #[derive(Default)]
    pub(crate) struct FakeUserRepository {
        pub users: Mutex<HashMap<UserId, UserRecord>>,
        pub role_names: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl UserRepository for FakeUserRepository {
        async fn insert(&self, user: &UserRecord) -> AppResult<()> {
            self.users.lock().await.insert(user.id, user.clone());
            Ok(())
        }

        async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
            Ok(self.users.lock().await.get(&user_id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
            Ok(self
                .users
                .lock()
                .await
                .values()
                .find(|user| user.email == email)
                .cloned())
        }

        async fn find_by_verification_token(
            &self,
            token: &str,
        ) -> AppResult<Option<UserRecord>> {
            Ok(self
                .users
                .lock()
                .await
                .values()
                .find(|user| user.verification_token.as_deref() == Some(token))
                .cloned())
        }

        async fn update(&self, user: &UserRecord) -> AppResult<()> {
            self.users.lock().await.insert(user.id, user.clone());
            Ok(())
        }

        async fn list_active_role_names(
            &self,
            _: UserId,
            _: DateTime<Utc>,
        ) -> AppResult<Vec<String>> {
            Ok(self.role_names.lock().await.clone())
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeOrganizationRepository {
        pub organizations: Mutex<Vec<OrganizationRecord>>,
    }

    #[async_trait]
    impl OrganizationRepository for FakeOrganizationRepository {
        async fn find_by_id(
            &self,
            organization_id: OrganizationId,
        ) -> AppResult<Option<OrganizationRecord>> {
            Ok(self
                .organizations
                .lock()
                .await
                .iter()
                .find(|organization| organization.id == organization_id)
                .cloned())
        }

        async fn find_by_email_domain(
            &self,
            domain: &str,
        ) -> AppResult<Option<OrganizationRecord>> {
            Ok(self
                .organizations
                .lock()
                .await
                .iter()
                .find(|organization| organization.email_domain == domain)
                .cloned())
        }
    }

    pub(crate) struct PlainHasher;

    impl PasswordHasher for PlainHasher {
        fn hash(&self, password: &str) -> AppResult<String> {
            Ok(format!("hashed:{password}"))
        }

        fn verify(&self, password: &str, hash: &str) -> AppResult<bool> {
            Ok(hash == format!("hashed:{password}"))
        }
    }

    #[derive(Default)]
    pub(crate) struct RecordingEmailService {
        pub sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl EmailService for RecordingEmailService {
        async fn send_verification(&self, email: &str, token: &str) -> AppResult<()> {
            self.sent
                .lock()
                .await
                .push((email.to_owned(), token.to_owned()));
            Ok(())
        }
    }

    fn service_with(
        users: Arc<FakeUserRepository>,
        email: Arc<RecordingEmailService>,
    ) -> UserService {
        UserService::new(
            users,
            Arc::new(FakeOrganizationRepository::default()),
            Arc::new(PlainHasher),
            email,
        )
    }

    fn register_input(email: &str) -> RegisterUserInput {
        RegisterUserInput {
            email: email.to_owned(),
            password: "correct horse battery".to_owned(),
            display_name: "Test Buyer".to_owned(),
            organization_id: None,
        }
    }

    #[tokio::test]
    async fn register_sends_verification_email() {
        let users = Arc::new(FakeUserRepository::default());
        let email = Arc::new(RecordingEmailService::default());
        let service = service_with(users, email.clone());

        let user = service.register(register_input("buyer@testagency.com")).await;
        assert!(user.is_ok());

        let sent = email.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "buyer@testagency.com");
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let users = Arc::new(FakeUserRepository::default());
        let email = Arc::new(RecordingEmailService::default());
        let service = service_with(users, email);

        assert!(service
            .register(register_input("buyer@testagency.com"))
            .await
            .is_ok());
        let second = service
            .register(register_input("Buyer@TestAgency.com"))
            .await;
        assert!(matches!(second, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let users = Arc::new(FakeUserRepository::default());
        let email = Arc::new(RecordingEmailService::default());
        let service = service_with(users, email);

        let mut input = register_input("buyer@testagency.com");
        input.password = "short".to_owned();
        let result = service.register(input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn verification_token_is_single_use() {
        let users = Arc::new(FakeUserRepository::default());
        let email = Arc::new(RecordingEmailService::default());
        let service = service_with(users, email.clone());

        assert!(service
            .register(register_input("buyer@testagency.com"))
            .await
            .is_ok());
        let token = email.sent.lock().await[0].1.clone();

        let first = service.verify_email(&token).await;
        assert_eq!(first.ok(), Some(VerificationOutcome::Verified));

        // The token is cleared on verification, so replay fails.
        let replay = service.verify_email(&token).await;
        assert!(matches!(replay, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let users = Arc::new(FakeUserRepository::default());
        let email = Arc::new(RecordingEmailService::default());
        let service = service_with(users, email);

        assert!(service
            .register(register_input("buyer@testagency.com"))
            .await
            .is_ok());

        let result = service.login("buyer@testagency.com", "wrong password").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn login_returns_identity_with_email() {
        let users = Arc::new(FakeUserRepository::default());
        let email = Arc::new(RecordingEmailService::default());
        let service = service_with(users, email);

        assert!(service
            .register(register_input("buyer@testagency.com"))
            .await
            .is_ok());

        let identity = service
            .login("buyer@testagency.com", "correct horse battery")
            .await;
        assert_eq!(
            identity.ok().and_then(|value| value.email().map(str::to_owned)),
            Some("buyer@testagency.com".to_owned())
        );
    }

    #[tokio::test]
    async fn login_rejects_deactivated_account() {
        let users = Arc::new(FakeUserRepository::default());
        let email = Arc::new(RecordingEmailService::default());
        let service = service_with(users.clone(), email);

        assert!(service
            .register(register_input("buyer@testagency.com"))
            .await
            .is_ok());
        for user in users.users.lock().await.values_mut() {
            user.is_active = false;
        }

        let result = service
            .login("buyer@testagency.com", "correct horse battery")
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn email_validation_happens_before_lookup() {
        assert!(EmailAddress::new("no-at-sign").is_err());
    }
}
