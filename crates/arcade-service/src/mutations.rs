//! State-changing operations.
//!
//! Each operation issues exactly one store mutation, which commits or
//! changes nothing. Admin operations check the caller's token role before
//! touching the store, then confirm the caller's account is still an admin
//! before mutating.

use arcade_core::{Account, ArcadeError, GameId, Principal, PurchaseRecord, Result, Role};
use arcade_store::{StoreError, StoreSession};

use crate::credentials::CredentialHasher;

/// Buy `game_id` for the principal.
///
/// # Errors
///
/// - `ArcadeError::Unauthorized` if the principal's account no longer exists.
/// - `ArcadeError::Purchase` if the store refuses the purchase (unknown
///   game, already owned, insufficient balance) or the write fails.
pub async fn purchase(
    session: &mut dyn StoreSession,
    principal: &Principal,
    game_id: GameId,
) -> Result<PurchaseRecord> {
    match session.make_purchase(principal.account_id, game_id).await {
        Ok(record) => {
            tracing::info!(
                account_id = %principal.account_id,
                game_id = %game_id,
                price_cents = record.price_cents,
                "Purchase recorded"
            );
            Ok(record)
        }
        Err(StoreError::NotFound { .. }) => {
            tracing::warn!(account_id = %principal.account_id, "Purchasing account no longer exists");
            Err(ArcadeError::Unauthorized)
        }
        Err(StoreError::Rejected(reason)) => {
            tracing::warn!(
                account_id = %principal.account_id,
                game_id = %game_id,
                reason = %reason,
                "Purchase rejected"
            );
            Err(ArcadeError::Purchase(reason))
        }
        Err(e) => {
            tracing::error!(error = %e, game_id = %game_id, "Purchase failed");
            Err(ArcadeError::Purchase(e.to_string()))
        }
    }
}

/// Replace the principal's password. The caller must end the session on
/// success.
///
/// # Errors
///
/// - `ArcadeError::InvalidInput` if the new password is blank.
/// - `ArcadeError::Unauthorized` if the principal's account no longer exists.
/// - `ArcadeError::Internal` if hashing or the write fails.
pub async fn change_password(
    session: &mut dyn StoreSession,
    hasher: &CredentialHasher,
    principal: &Principal,
    new_password: &str,
) -> Result<()> {
    if new_password.trim().is_empty() {
        return Err(ArcadeError::InvalidInput("password must not be blank".into()));
    }

    let credential = hasher.hash(new_password)?;
    match session.change_password(principal.account_id, &credential).await {
        Ok(()) => {
            tracing::info!(account_id = %principal.account_id, "Password changed");
            Ok(())
        }
        Err(StoreError::NotFound { .. }) => {
            tracing::warn!(account_id = %principal.account_id, "Password change for missing account");
            Err(ArcadeError::Unauthorized)
        }
        Err(e) => Err(ArcadeError::Internal(e.to_string())),
    }
}

/// Set the role of `target`. Admin only.
///
/// Returns `true` when the caller demoted their own account, in which case
/// the caller's session must end.
///
/// # Errors
///
/// - `ArcadeError::Forbidden` if the caller is not an admin. The store is
///   not touched.
/// - `ArcadeError::Unauthorized` if the caller's account was deleted or
///   demoted after the session was issued.
/// - `ArcadeError::NotFound` if `target` does not exist.
/// - `ArcadeError::Internal` if the store fails.
pub async fn change_role(
    session: &mut dyn StoreSession,
    caller: &Principal,
    target: &str,
    role: Role,
) -> Result<bool> {
    require_live_admin(session, caller).await?;

    session
        .change_role(target, role)
        .await
        .map_err(|e| admin_failure(e, target))?;

    tracing::info!(caller = %caller.subject, target = %target, role = %role, "Role changed");
    Ok(target == caller.subject && role != caller.role)
}

/// Delete the account named `target`. Admin only, irreversible.
///
/// Returns `true` when the caller deleted their own account.
///
/// # Errors
///
/// - `ArcadeError::Forbidden` if the caller is not an admin. The store is
///   not touched.
/// - `ArcadeError::Unauthorized` if the caller's account was deleted or
///   demoted after the session was issued.
/// - `ArcadeError::NotFound` if `target` does not exist.
/// - `ArcadeError::Internal` if the store fails.
pub async fn delete_account(
    session: &mut dyn StoreSession,
    caller: &Principal,
    target: &str,
) -> Result<bool> {
    require_live_admin(session, caller).await?;

    session
        .delete_account(target)
        .await
        .map_err(|e| admin_failure(e, target))?;

    tracing::info!(caller = %caller.subject, target = %target, "Account deleted");
    Ok(target == caller.subject)
}

/// Token roles are fixed at issuance, so an admin mutation re-reads the
/// caller's account first.
async fn require_live_admin(session: &mut dyn StoreSession, caller: &Principal) -> Result<()> {
    caller.require_role(Role::Admin)?;

    match session.find_account(&caller.subject).await {
        Ok(Some(account)) if account.id == caller.account_id && account.role == Role::Admin => {
            Ok(())
        }
        Ok(_) => {
            tracing::warn!(caller = %caller.subject, "Admin session outlived its admin account");
            Err(ArcadeError::Unauthorized)
        }
        Err(e) => {
            tracing::error!(error = %e, caller = %caller.subject, "Admin lookup failed");
            Err(ArcadeError::Internal(e.to_string()))
        }
    }
}

fn admin_failure(err: StoreError, target: &str) -> ArcadeError {
    match err {
        StoreError::NotFound { .. } => ArcadeError::account_not_found(target),
        other => {
            tracing::error!(error = %other, target = %target, "Admin mutation failed");
            ArcadeError::Internal(other.to_string())
        }
    }
}

/// Create a `user` account.
///
/// # Errors
///
/// - `ArcadeError::InvalidInput` if the username or password is blank.
/// - `ArcadeError::Conflict` if the username is taken.
pub async fn register(
    session: &mut dyn StoreSession,
    hasher: &CredentialHasher,
    username: &str,
    password: &str,
) -> Result<Account> {
    if username.trim().is_empty() || password.trim().is_empty() {
        return Err(ArcadeError::InvalidInput(
            "username and password are required".into(),
        ));
    }

    let credential = hasher.hash(password)?;
    let account = session
        .create_account(username, &credential, Role::User)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(reason) => ArcadeError::Conflict(reason),
            other => ArcadeError::Internal(other.to_string()),
        })?;

    tracing::info!(account_id = %account.id, username = %account.username, "Account registered");
    Ok(account)
}
