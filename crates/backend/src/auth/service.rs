//! Sign-up, sign-in and token refresh.

use std::sync::Arc;

use chrono::Utc;
use gatehouse_types::{Gender, Role, SignInRequest, SignUpRequest};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::models::Identity;
use crate::store::{IdentityStore, StoreError};

use super::jwt::TokenService;
use super::password::{CredentialHasher, HashError};

const DUPLICATE_EMAIL: &str = "User with that email already exists";

/// Access and refresh tokens minted by a successful sign-in.
#[cfg_attr(test, derive(Debug))]
pub struct SessionTokens {
    pub access: String,
    pub refresh: String,
}

/// Orchestrates the hasher, token service and identity store.
#[derive(Clone)]
pub struct AuthWorkflow {
    identities: Arc<dyn IdentityStore>,
    hasher: Arc<CredentialHasher>,
    tokens: Arc<TokenService>,
}

impl AuthWorkflow {
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        hasher: Arc<CredentialHasher>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            identities,
            hasher,
            tokens,
        }
    }

    /// Create a new unverified identity with the `user` role.
    pub async fn register(&self, request: SignUpRequest) -> ApiResult<Identity> {
        request.validate()?;

        let email = request.email.trim().to_lowercase();
        if self.identities.find_by_email(&email).await?.is_some() {
            return Err(ApiError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        let gender: Gender = request.gender.parse().map_err(ApiError::Validation)?;
        let password_hash = self.hasher.hash(&request.password)?;

        let now = Utc::now();
        let identity = Identity {
            id: Uuid::new_v4(),
            first_name: request.first_name,
            name: request.name,
            birthday: request.birthday,
            gender,
            email,
            password_hash,
            role: Role::User,
            address: None,
            subscription_code: None,
            is_active: true,
            verified: false,
            created_at: now,
            updated_at: now,
        };

        // The store has the final word on uniqueness when two sign-ups race
        match self.identities.create(identity).await {
            Ok(created) => {
                tracing::info!(id = %created.id, "Registered new identity");
                Ok(created)
            }
            Err(StoreError::Duplicate) => Err(ApiError::Conflict(DUPLICATE_EMAIL.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Verify credentials and mint a token pair.
    ///
    /// Unknown email, wrong password and deactivated account all fail with the
    /// same `InvalidCredentials`.
    pub async fn sign_in(&self, request: SignInRequest) -> ApiResult<SessionTokens> {
        request.validate()?;

        let email = request.email.trim().to_lowercase();
        let identity = match self.identities.find_by_email(&email).await? {
            Some(identity) if identity.is_active => identity,
            _ => {
                tracing::debug!("Sign-in for unknown or inactive email");
                // Same Argon2 cost as a wrong password
                let _ = self.hasher.verify_decoy(&request.password);
                return Err(ApiError::InvalidCredentials);
            }
        };

        match self.hasher.verify(&identity.password_hash, &request.password) {
            Ok(()) => {}
            Err(HashError::Mismatch) => {
                tracing::debug!(id = %identity.id, "Sign-in with wrong password");
                return Err(ApiError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        }

        let access = self.tokens.issue_access(identity.id)?;
        let refresh = self.tokens.issue_refresh(identity.id)?;

        tracing::info!(id = %identity.id, "Signed in");
        Ok(SessionTokens { access, refresh })
    }

    /// Mint a fresh access token from a refresh token.
    ///
    /// The refresh token itself is not rotated.
    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<String> {
        let subject = self.tokens.validate_refresh(refresh_token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected refresh token");
            ApiError::from(e)
        })?;

        let id = Uuid::parse_str(&subject)
            .map_err(|_| ApiError::unauthenticated("The refresh token is not valid"))?;

        let identity = match self.identities.find_by_id(id).await? {
            Some(identity) if identity.is_active => identity,
            _ => {
                return Err(ApiError::not_found(
                    "the user belonging to this token no longer exists",
                ))
            }
        };

        Ok(self.tokens.issue_access(identity.id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_support::{cheap_hasher, test_tokens};
    use crate::auth::HasherConfig;
    use chrono::TimeZone;
    use std::time::{Duration, Instant};

    fn workflow() -> (AuthWorkflow, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let workflow = AuthWorkflow::new(
            store.clone(),
            Arc::new(cheap_hasher()),
            Arc::new(test_tokens()),
        );
        (workflow, store)
    }

    fn sign_up(email: &str) -> SignUpRequest {
        SignUpRequest {
            first_name: "Ada".to_string(),
            name: "Lovelace".to_string(),
            birthday: Utc.with_ymd_and_hms(1990, 12, 10, 0, 0, 0).unwrap(),
            gender: "female".to_string(),
            email: email.to_string(),
            password: "Password1.".to_string(),
        }
    }

    fn sign_in(email: &str, password: &str) -> SignInRequest {
        SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_defaults() {
        let (workflow, store) = workflow();
        let created = workflow.register(sign_up("Ada@Example.com")).await.unwrap();

        assert_eq!(created.email, "ada@example.com");
        assert_eq!(created.role, Role::User);
        assert!(!created.verified);
        assert!(created.is_active);
        assert_ne!(created.password_hash, "Password1.");

        let stored = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored, created);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_case_insensitive() {
        let (workflow, _) = workflow();
        workflow.register(sign_up("ada@example.com")).await.unwrap();

        let err = workflow
            .register(sign_up("ADA@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let (workflow, _) = workflow();
        let mut request = sign_up("ada@example.com");
        request.password = "Password123".to_string();

        match workflow.register(request).await {
            Err(ApiError::Validation(msg)) => {
                assert!(msg.contains("must contain at least one special character"))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sign_in_issues_token_pair() {
        let (workflow, _) = workflow();
        let created = workflow.register(sign_up("ada@example.com")).await.unwrap();

        let tokens = workflow
            .sign_in(sign_in("ADA@example.com", "Password1."))
            .await
            .unwrap();

        let issuer = test_tokens();
        assert_eq!(
            issuer.validate_access(&tokens.access).unwrap(),
            created.id.to_string()
        );
        assert_eq!(
            issuer.validate_refresh(&tokens.refresh).unwrap(),
            created.id.to_string()
        );
    }

    #[tokio::test]
    async fn test_sign_in_failures_are_indistinguishable() {
        let (workflow, _) = workflow();
        workflow.register(sign_up("ada@example.com")).await.unwrap();

        let wrong_password = workflow
            .sign_in(sign_in("ada@example.com", "Password2."))
            .await
            .unwrap_err();
        let unknown_email = workflow
            .sign_in(sign_in("bob@example.com", "Password1."))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, ApiError::InvalidCredentials));
        assert!(matches!(unknown_email, ApiError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_unknown_email_pays_for_a_verification() {
        let store = Arc::new(MemoryStore::new());
        let hasher = CredentialHasher::new(HasherConfig {
            memory_kib: 8192,
            iterations: 3,
            parallelism: 1,
        })
        .unwrap();
        let workflow = AuthWorkflow::new(store, Arc::new(hasher), Arc::new(test_tokens()));
        workflow.register(sign_up("ada@example.com")).await.unwrap();

        let mut wrong_password = Duration::ZERO;
        let mut unknown_email = Duration::ZERO;
        for _ in 0..3 {
            let started = Instant::now();
            let _ = workflow
                .sign_in(sign_in("ada@example.com", "Password2."))
                .await;
            wrong_password += started.elapsed();

            let started = Instant::now();
            let _ = workflow
                .sign_in(sign_in("bob@example.com", "Password2."))
                .await;
            unknown_email += started.elapsed();
        }

        assert!(
            unknown_email * 4 >= wrong_password,
            "unknown email {:?} vs wrong password {:?}",
            unknown_email,
            wrong_password
        );
    }

    #[tokio::test]
    async fn test_deactivated_account_cannot_sign_in() {
        let (workflow, store) = workflow();
        let mut created = workflow.register(sign_up("ada@example.com")).await.unwrap();
        created.is_active = false;
        store.update(created).await.unwrap();

        let err = workflow
            .sign_in(sign_in("ada@example.com", "Password1."))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_refresh_mints_access_token() {
        let (workflow, _) = workflow();
        let created = workflow.register(sign_up("ada@example.com")).await.unwrap();
        let pair = workflow
            .sign_in(sign_in("ada@example.com", "Password1."))
            .await
            .unwrap();

        let access = workflow.refresh(&pair.refresh).await.unwrap();
        assert_eq!(
            test_tokens().validate_access(&access).unwrap(),
            created.id.to_string()
        );

        // An access token cannot be used to refresh
        assert!(matches!(
            workflow.refresh(&pair.access).await,
            Err(ApiError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_for_deleted_identity_is_not_found() {
        let (workflow, store) = workflow();
        let created = workflow.register(sign_up("ada@example.com")).await.unwrap();
        let refresh = test_tokens().issue_refresh(created.id).unwrap();
        store.delete(created.id).await.unwrap();

        assert!(matches!(
            workflow.refresh(&refresh).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
