//! Session token codec.
//!
//! A session token is an HS256 JWT carrying the username (`sub`), the role
//! and the numeric account id (`uid`). Tokens are valid for
//! [`SESSION_TTL_MINUTES`] from issuance. Expiry is checked against the
//! caller-supplied instant rather than the system clock so decoding is
//! deterministic.
//!
//! The signing key is fixed for the life of the process. Restarting with a
//! different key invalidates every outstanding token.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use arcade_core::{AccountId, ArcadeError, Principal, Result, Role};

/// Lifetime of a session token.
pub const SESSION_TTL_MINUTES: i64 = 30;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionClaims {
    /// Username.
    sub: String,
    /// Role name.
    role: String,
    /// Account id.
    uid: i64,
    /// Issued at (seconds since epoch).
    iat: i64,
    /// Expiry (seconds since epoch).
    exp: i64,
}

/// Issues and decodes session tokens with one process-wide key.
pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SessionCodec {
    /// Build a codec signing with `secret`.
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller's clock in `decode`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a token for `subject` valid until `now + 30 minutes`.
    ///
    /// # Errors
    ///
    /// Returns `ArcadeError::Identity` if `account_id` is absent or signing
    /// fails.
    pub fn issue(
        &self,
        subject: &str,
        role: Role,
        account_id: Option<AccountId>,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let account_id = account_id.ok_or_else(|| {
            ArcadeError::Identity("cannot issue a session without an account id".into())
        })?;

        let claims = SessionClaims {
            sub: subject.to_string(),
            role: role.as_str().to_string(),
            uid: account_id.get(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(SESSION_TTL_MINUTES)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ArcadeError::Identity(format!("failed to sign token: {e}")))
    }

    /// Verify `token` and turn it into a principal.
    ///
    /// # Errors
    ///
    /// Returns `ArcadeError::Identity` if the signature does not verify, a
    /// claim is missing or malformed, or `now` is at or past the expiry.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<Principal> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Session token rejected");
            ArcadeError::Identity(format!("invalid token: {e}"))
        })?;
        let claims = data.claims;

        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .ok_or_else(|| ArcadeError::Identity("expiry out of range".into()))?;
        if now >= expires_at {
            return Err(ArcadeError::Identity("token expired".into()));
        }
        if claims.uid < 0 {
            return Err(ArcadeError::Identity("negative account id".into()));
        }

        Ok(Principal {
            subject: claims.sub,
            account_id: AccountId::new(claims.uid),
            role: claims.role.parse()?,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &[u8] = b"test-secret";

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn decode_returns_issued_identity() {
        let codec = SessionCodec::new(SECRET);
        for (subject, role, id) in [("alice", Role::User, 7), ("root", Role::Admin, 1)] {
            let token = codec
                .issue(subject, role, Some(AccountId::new(id)), now())
                .unwrap();
            let principal = codec
                .decode(&token, now() + Duration::minutes(29))
                .unwrap();
            assert_eq!(principal.subject, subject);
            assert_eq!(principal.role, role);
            assert_eq!(principal.account_id, AccountId::new(id));
            assert_eq!(principal.expires_at, now() + Duration::minutes(30));
        }
    }

    #[test]
    fn issue_without_account_id_fails() {
        let codec = SessionCodec::new(SECRET);
        let result = codec.issue("ghost", Role::User, None, now());
        assert!(matches!(result, Err(ArcadeError::Identity(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = SessionCodec::new(SECRET);
        let token = codec
            .issue("alice", Role::User, Some(AccountId::new(7)), now())
            .unwrap();

        for later in [Duration::minutes(30), Duration::minutes(31), Duration::days(2)] {
            let result = codec.decode(&token, now() + later);
            assert!(matches!(result, Err(ArcadeError::Identity(_))));
        }
    }

    #[test]
    fn tampered_token_is_rejected() {
        let codec = SessionCodec::new(SECRET);
        let user = codec
            .issue("alice", Role::User, Some(AccountId::new(7)), now())
            .unwrap();
        let admin = codec
            .issue("root", Role::Admin, Some(AccountId::new(1)), now())
            .unwrap();

        // Splice the admin payload onto the user's signature.
        let user_parts: Vec<&str> = user.split('.').collect();
        let admin_parts: Vec<&str> = admin.split('.').collect();
        let forged = format!("{}.{}.{}", user_parts[0], admin_parts[1], user_parts[2]);

        assert!(matches!(
            codec.decode(&forged, now()),
            Err(ArcadeError::Identity(_))
        ));
    }

    #[test]
    fn token_from_other_key_is_rejected() {
        let token = SessionCodec::new(b"other-secret")
            .issue("alice", Role::User, Some(AccountId::new(7)), now())
            .unwrap();
        let result = SessionCodec::new(SECRET).decode(&token, now());
        assert!(matches!(result, Err(ArcadeError::Identity(_))));
    }

    #[test]
    fn token_missing_account_id_is_rejected() {
        let claims = json!({
            "sub": "alice",
            "role": "user",
            "iat": now().timestamp(),
            "exp": (now() + Duration::minutes(30)).timestamp(),
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        let result = SessionCodec::new(SECRET).decode(&token, now());
        assert!(matches!(result, Err(ArcadeError::Identity(_))));
    }

    #[test]
    fn token_with_unknown_role_is_rejected() {
        let claims = json!({
            "sub": "alice",
            "role": "superuser",
            "uid": 7,
            "iat": now().timestamp(),
            "exp": (now() + Duration::minutes(30)).timestamp(),
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        let result = SessionCodec::new(SECRET).decode(&token, now());
        assert!(matches!(result, Err(ArcadeError::Identity(_))));
    }

    #[test]
    fn garbage_is_rejected() {
        let codec = SessionCodec::new(SECRET);
        for junk in ["", "abc", "a.b.c", "Bearer xyz"] {
            assert!(codec.decode(junk, now()).is_err());
        }
    }
}
