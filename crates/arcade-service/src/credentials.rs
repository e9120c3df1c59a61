//! Password hashing and credential checks.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

use arcade_core::{Account, ArcadeError, Credential, Result};
use arcade_store::StoreSession;

/// Argon2id hasher producing PHC strings.
#[derive(Clone, Default)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    /// A hasher with explicit cost parameters (memory in KiB, iterations,
    /// lanes).
    ///
    /// # Errors
    ///
    /// Returns `ArcadeError::Internal` if the parameters are out of range.
    pub fn with_cost(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| ArcadeError::Internal(format!("invalid argon2 params: {e}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash `password` with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns `ArcadeError::Internal` if hashing fails.
    pub fn hash(&self, password: &str) -> Result<Credential> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ArcadeError::Internal(format!("failed to hash password: {e}")))?
            .to_string();

        Ok(Credential {
            password_hash,
            salt: salt.as_str().to_string(),
        })
    }

    /// Whether `password` matches `credential`. A malformed stored hash
    /// never matches.
    #[must_use]
    pub fn verify(&self, password: &str, credential: &Credential) -> bool {
        match PasswordHash::new(&credential.password_hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                false
            }
        }
    }
}

/// Check a username/password pair against the store.
///
/// # Errors
///
/// - `ArcadeError::Unauthorized` if the account does not exist or the
///   password does not match.
/// - `ArcadeError::Internal` if the lookup fails.
pub async fn authenticate_credentials(
    session: &mut dyn StoreSession,
    hasher: &CredentialHasher,
    username: &str,
    password: &str,
) -> Result<Account> {
    let account = session
        .find_account(username)
        .await
        .map_err(|e| ArcadeError::Internal(e.to_string()))?;

    match account {
        Some(account) if hasher.verify(password, &account.credential) => Ok(account),
        _ => {
            tracing::info!(username = %username, "Login rejected");
            Err(ArcadeError::Unauthorized)
        }
    }
}
