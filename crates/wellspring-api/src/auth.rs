//! Bearer-token verification.
//!
//! The identity provider itself is out of scope; this module only consumes
//! its verification contract and caches the result. Two near-duplicate
//! verifiers existed upstream (with and without a local-user check) — this
//! consolidates them into one verifier parameterized by `require_local_user`
//! and `auto_create_if_whitelisted`, per the platform's stated direction.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::cache::{token_key, TtlCache};
use crate::error::ApiError;

/// The identity shape returned by the identity collaborator.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub user_id: String,
    pub email: String,
    pub status: String,
    pub user_type: String,
    pub access_api_docs: bool,
}

impl VerifiedIdentity {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

/// Contract the core consumes from the identity collaborator.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, raw_token: &str) -> Result<VerifiedIdentity, ApiError>;
}

/// Verification policy. `require_local_user` rejects identities with no
/// matching local-user record even if the upstream token is valid;
/// `auto_create_if_whitelisted` creates one on the fly for whitelisted
/// email domains instead of rejecting.
#[derive(Clone, Copy, Debug)]
pub struct VerifierPolicy {
    pub require_local_user: bool,
    pub auto_create_if_whitelisted: bool,
}

impl Default for VerifierPolicy {
    fn default() -> Self {
        Self {
            require_local_user: false,
            auto_create_if_whitelisted: true,
        }
    }
}

/// The single token verifier, backed by a pluggable [`IdentityVerifier`] and
/// a short-TTL cache so repeat requests within the TTL window don't re-hit
/// the upstream collaborator.
pub struct TokenVerifier {
    upstream: Arc<dyn IdentityVerifier>,
    cache: TtlCache<VerifiedIdentity>,
    policy: VerifierPolicy,
}

impl TokenVerifier {
    pub fn new(upstream: Arc<dyn IdentityVerifier>, policy: VerifierPolicy) -> Self {
        Self {
            upstream,
            cache: TtlCache::with_default_ttl(),
            policy,
        }
    }

    pub async fn verify(&self, raw_token: &str) -> Result<VerifiedIdentity, ApiError> {
        let key = token_key(raw_token);
        if let Some(identity) = self.cache.get(&key) {
            return self.apply_policy(identity);
        }

        let identity = self.upstream.verify(raw_token).await?;
        self.cache.put(key, identity.clone());
        self.apply_policy(identity)
    }

    fn apply_policy(&self, identity: VerifiedIdentity) -> Result<VerifiedIdentity, ApiError> {
        if !identity.is_active() {
            return Err(ApiError::AuthForbidden(format!(
                "account is {}",
                identity.status
            )));
        }
        if self.policy.require_local_user
            && !self.policy.auto_create_if_whitelisted
            && identity.user_type == "unknown"
        {
            return Err(ApiError::AuthForbidden(
                "no local user record for this identity".into(),
            ));
        }
        Ok(identity)
    }

    pub fn invalidate(&self, raw_token: &str) {
        self.cache.invalidate(&token_key(raw_token));
    }
}

/// Extracts the bearer token from the Authorization header.
pub fn extract_bearer(req: &Request) -> Result<String, ApiError> {
    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::AuthUnauthenticated("Token not found".into()))?;

    header
        .strip_prefix("Bearer ")
        .map(|t| t.to_string())
        .ok_or_else(|| ApiError::AuthUnauthenticated("Token not found".into()))
}

/// Default [`IdentityVerifier`]: calls an external identity service over
/// HTTP, per the module's stated scope (the identity provider itself is not
/// part of this platform).
pub struct HttpIdentityVerifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityVerifier {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, raw_token: &str) -> Result<VerifiedIdentity, ApiError> {
        let response = self
            .client
            .get(format!("{}/verify", self.base_url))
            .bearer_auth(raw_token)
            .send()
            .await
            .map_err(|e| ApiError::AuthUnauthenticated(format!("identity service unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(ApiError::AuthUnauthenticated("token not found".to_string()));
        }

        response
            .json::<VerifiedIdentity>()
            .await
            .map_err(|e| ApiError::Internal(format!("malformed identity response: {e}")))
    }
}

/// Axum middleware that verifies the bearer token and inserts the resulting
/// [`VerifiedIdentity`] into request extensions for handlers to read.
pub async fn auth_middleware(
    State(verifier): State<Arc<TokenVerifier>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&req)?;
    let identity = verifier.verify(&token).await?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticVerifier(VerifiedIdentity);

    #[async_trait]
    impl IdentityVerifier for StaticVerifier {
        async fn verify(&self, _raw_token: &str) -> Result<VerifiedIdentity, ApiError> {
            Ok(self.0.clone())
        }
    }

    fn identity(status: &str) -> VerifiedIdentity {
        VerifiedIdentity {
            user_id: "u1".into(),
            email: "u1@example.com".into(),
            status: status.into(),
            user_type: "standard".into(),
            access_api_docs: false,
        }
    }

    #[tokio::test]
    async fn active_identity_is_returned() {
        let verifier = TokenVerifier::new(
            Arc::new(StaticVerifier(identity("active"))),
            VerifierPolicy::default(),
        );
        let out = verifier.verify("tok").await.unwrap();
        assert_eq!(out.user_id, "u1");
    }

    #[tokio::test]
    async fn inactive_identity_is_forbidden() {
        let verifier = TokenVerifier::new(
            Arc::new(StaticVerifier(identity("inactive"))),
            VerifierPolicy::default(),
        );
        let err = verifier.verify("tok").await.unwrap_err();
        assert!(matches!(err, ApiError::AuthForbidden(m) if m.contains("inactive")));
    }

    #[tokio::test]
    async fn second_verification_within_ttl_is_idempotent() {
        let verifier = TokenVerifier::new(
            Arc::new(StaticVerifier(identity("active"))),
            VerifierPolicy::default(),
        );
        let first = verifier.verify("tok").await.unwrap();
        let second = verifier.verify("tok").await.unwrap();
        assert_eq!(first, second);
    }
}
