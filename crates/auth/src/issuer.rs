//! Login and refresh.

use std::sync::Arc;

use genusdb_core::Clock;

use crate::credentials::{Authenticator, CredentialVerifier, UserLookup};
use crate::{AuthError, ClaimSet, TokenCodec};

/// A freshly minted token together with the claims it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub access_token: String,
    pub claims: ClaimSet,
}

/// Answers login and refresh requests.
#[derive(Clone)]
pub struct TokenIssuer {
    codec: Arc<TokenCodec>,
    credentials: CredentialVerifier,
    users: Arc<dyn UserLookup>,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(
        codec: Arc<TokenCodec>,
        authenticator: Arc<dyn Authenticator>,
        users: Arc<dyn UserLookup>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            codec,
            credentials: CredentialVerifier::new(authenticator, clock.clone()),
            users,
            clock,
        }
    }

    /// Exchange credentials for a token.
    ///
    /// Any failure, including a signing failure, is reported as
    /// [`AuthError::InvalidCredentials`].
    #[tracing::instrument(skip_all)]
    pub async fn login(
        &self,
        identifier: &str,
        secret: &str,
        origin: &str,
    ) -> Result<IssuedToken, AuthError> {
        let claims = self.credentials.verify(identifier, secret, origin).await?;
        let access_token = self.codec.encode(&claims).map_err(|e| {
            tracing::error!(error = %e, "failed to sign login token");
            AuthError::InvalidCredentials
        })?;

        tracing::info!(
            subject = %claims.subject(),
            genus = %claims.tenant(),
            role = claims.role().code(),
            "login succeeded"
        );
        Ok(IssuedToken {
            access_token,
            claims,
        })
    }

    /// Mint a brand-new token for the holder of `current`.
    ///
    /// The live user record is re-read so role and genus changes are picked
    /// up. The old token is left untouched and stays valid until its own expiry.
    #[tracing::instrument(skip_all, fields(subject = %current.subject()))]
    pub async fn refresh(&self, current: &ClaimSet) -> Result<IssuedToken, AuthError> {
        let user = self
            .users
            .load_user(current.subject())
            .await
            .map_err(|e| AuthError::internal(e.to_string()))?
            .ok_or(AuthError::StaleToken)?;

        let claims = ClaimSet::issue(&user, self.clock.now(), current.origin_reference());
        let access_token = self.codec.encode(&claims)?;

        tracing::info!(
            genus = %claims.tenant(),
            role = claims.role().code(),
            "token refreshed"
        );
        Ok(IssuedToken {
            access_token,
            claims,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryUserDirectory;
    use crate::{Role, TOKEN_TTL_SECS, TokenKey, UserRecord, validate_claims};
    use genusdb_core::{Genus, ManualClock, Subject};

    const NOW: i64 = 1_700_000_000;

    struct Fixture {
        issuer: TokenIssuer,
        codec: Arc<TokenCodec>,
        directory: Arc<InMemoryUserDirectory>,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let codec = Arc::new(TokenCodec::new(
            TokenKey::hmac(b"issuer-test-secret-issuer-test-secret".to_vec()).unwrap(),
        ));
        let directory = Arc::new(InMemoryUserDirectory::fast());
        directory
            .insert(
                "alice",
                "correct",
                UserRecord::new(1, "Alice", Role::Writer, Genus::new("hymenobacter").unwrap()),
            )
            .unwrap();
        let clock = Arc::new(ManualClock::new(NOW));
        let issuer = TokenIssuer::new(
            codec.clone(),
            directory.clone(),
            directory.clone(),
            clock.clone(),
        );
        Fixture {
            issuer,
            codec,
            directory,
            clock,
        }
    }

    #[tokio::test]
    async fn login_issues_decodable_token() {
        let f = fixture();
        let issued = f.issuer.login("alice", "correct", "").await.unwrap();

        let decoded = f.codec.decode(&issued.access_token).unwrap();
        assert_eq!(decoded.subject(), &Subject::Id(1));
        assert_eq!(decoded.role(), Role::Writer);
        assert_eq!(decoded.tenant().as_str(), "hymenobacter");
        assert_eq!(decoded.expires_at() - decoded.issued_at(), 86_400);
        assert_eq!(decoded, issued.claims);
    }

    #[tokio::test]
    async fn login_failures_share_one_shape() {
        let f = fixture();
        let unknown = f.issuer.login("unknown-user", "any-secret", "").await.unwrap_err();
        let wrong = f.issuer.login("alice", "wrong-secret", "").await.unwrap_err();
        assert_eq!(unknown, AuthError::InvalidCredentials);
        assert_eq!(unknown, wrong);
    }

    #[tokio::test]
    async fn refresh_mints_new_token_and_keeps_old_one_valid() {
        let f = fixture();
        let old = f.issuer.login("alice", "correct", "https://app").await.unwrap();

        // One second before the old token dies.
        f.clock.advance(TOKEN_TTL_SECS - 1);
        let refreshed = f.issuer.refresh(&old.claims).await.unwrap();

        assert!(refreshed.claims.issued_at() > old.claims.issued_at());
        assert_ne!(refreshed.access_token, old.access_token);
        assert_ne!(refreshed.claims.token_id(), old.claims.token_id());
        assert_eq!(refreshed.claims.origin_reference(), "https://app");

        let still_old = f.codec.decode(&old.access_token).unwrap();
        assert_eq!(validate_claims(&still_old, f.clock.now()), Ok(()));

        f.clock.advance(1);
        assert_eq!(
            validate_claims(&still_old, f.clock.now()),
            Err(AuthError::ExpiredToken)
        );
        let fresh = f.codec.decode(&refreshed.access_token).unwrap();
        assert_eq!(validate_claims(&fresh, f.clock.now()), Ok(()));
    }

    #[tokio::test]
    async fn refresh_picks_up_role_change() {
        let f = fixture();
        let old = f.issuer.login("alice", "correct", "").await.unwrap();
        f.directory.set_role(&Subject::Id(1), Role::Admin).unwrap();

        let refreshed = f.issuer.refresh(&old.claims).await.unwrap();
        assert_eq!(refreshed.claims.role(), Role::Admin);
    }

    #[tokio::test]
    async fn refresh_for_deleted_user_is_stale() {
        let f = fixture();
        let old = f.issuer.login("alice", "correct", "").await.unwrap();
        f.directory.remove(&Subject::Id(1)).unwrap();

        assert_eq!(
            f.issuer.refresh(&old.claims).await.unwrap_err(),
            AuthError::StaleToken
        );
    }
}
