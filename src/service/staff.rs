use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::validation::{validate_email, validate_name};
use crate::auth::{CredentialHasher, TokenGenerator};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{NewStaff, Staff, Token};

const MIN_PASSWORD_LEN: usize = 6;
const TOKEN_CREATE_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct StaffRequest {
    pub name: String,
    pub email: String,
    pub role: String,
    pub password: String,
}

/// Fields to change on an existing staff member. `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct StaffChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    /// Replaces the password when present and non-empty.
    pub password: Option<String>,
}

/// A successful login.
#[derive(Debug)]
pub struct Session {
    /// Raw bearer token. Only its hash is stored.
    pub token: String,
    pub token_id: String,
    pub staff: Staff,
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::bad_request(format!(
            "senha must have at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Emails compare without regard to ASCII case, as the staff table does.
fn is_admin(staff: &Staff, admin_email: &str) -> bool {
    staff.email.eq_ignore_ascii_case(admin_email)
}

pub fn create_staff(
    store: &dyn Store,
    hasher: &CredentialHasher,
    request: StaffRequest,
) -> Result<Staff> {
    validate_password(&request.password)?;

    let staff = NewStaff {
        name: validate_name("nome", &request.name)?,
        email: validate_email(&request.email)?,
        role: validate_name("cargo", &request.role)?,
        password_hash: hasher.hash(&request.password)?,
    };

    let created = store.create_staff(&staff)?;
    info!(staff_id = created.id, role = %created.role, "staff member created");
    Ok(created)
}

pub fn list_staff(store: &dyn Store) -> Result<Vec<Staff>> {
    store.list_staff()
}

pub fn update_staff(
    store: &dyn Store,
    hasher: &CredentialHasher,
    admin_email: &str,
    id: i64,
    changes: StaffChanges,
) -> Result<Staff> {
    let mut staff = store
        .get_staff(id)?
        .ok_or_else(|| Error::not_found("Staff member not found"))?;

    if let Some(name) = changes.name {
        staff.name = validate_name("nome", &name)?;
    }
    if let Some(email) = changes.email {
        let email = validate_email(&email)?;
        if is_admin(&staff, admin_email) && !email.eq_ignore_ascii_case(admin_email) {
            return Err(Error::forbidden(
                "The main administrator's email cannot be changed",
            ));
        }
        staff.email = email;
    }
    if let Some(role) = changes.role {
        staff.role = validate_name("cargo", &role)?;
    }
    if let Some(password) = changes.password.filter(|p| !p.is_empty()) {
        validate_password(&password)?;
        staff.password_hash = hasher.hash(&password)?;
    }

    store.update_staff(&staff)?;
    Ok(staff)
}

/// Deletes a staff member. The main administrator is protected.
pub fn delete_staff(store: &dyn Store, admin_email: &str, id: i64) -> Result<()> {
    let staff = store
        .get_staff(id)?
        .ok_or_else(|| Error::not_found("Staff member not found"))?;

    if is_admin(&staff, admin_email) {
        return Err(Error::forbidden(
            "The main administrator cannot be deleted",
        ));
    }

    store.delete_staff(id)?;
    info!(staff_id = id, "staff member deleted");
    Ok(())
}

/// Checks an email/password pair and issues a bearer token valid for `ttl`.
pub fn authenticate(
    store: &dyn Store,
    email: &str,
    password: &str,
    ttl: Duration,
) -> Result<Session> {
    let generator = TokenGenerator::new();
    let hasher = CredentialHasher::new();

    let staff = store
        .get_staff_by_email(email.trim())?
        .ok_or(Error::Unauthorized)?;

    if !hasher.verify(password, &staff.password_hash)? {
        warn!(staff_id = staff.id, "login rejected");
        return Err(Error::Unauthorized);
    }

    let now = Utc::now();
    let expires_at = now
        .checked_add_signed(ttl)
        .ok_or_else(|| Error::Config(format!("token lifetime {ttl} is out of range")))?;

    let purged = store.delete_expired_tokens(now)?;
    if purged > 0 {
        info!(count = purged, "expired tokens removed");
    }

    for _ in 0..TOKEN_CREATE_RETRIES {
        let (raw_token, lookup, hash) = generator.generate()?;
        let token = Token {
            id: Uuid::new_v4().to_string(),
            token_hash: hash,
            token_lookup: lookup,
            staff_id: staff.id,
            created_at: now,
            expires_at,
            last_used_at: None,
        };

        match store.create_token(&token) {
            Ok(()) => {
                info!(staff_id = staff.id, "login succeeded");
                return Ok(Session {
                    token: raw_token,
                    token_id: token.id,
                    staff,
                });
            }
            Err(Error::TokenLookupCollision) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(Error::TokenLookupCollision)
}

/// Revokes a token issued by [`authenticate`].
pub fn logout(store: &dyn Store, token_id: &str) -> Result<()> {
    if !store.delete_token(token_id)? {
        return Err(Error::not_found("Session not found"));
    }
    Ok(())
}

/// Creates the protected administrator account. Fails if it already exists.
pub fn create_admin(
    store: &dyn Store,
    hasher: &CredentialHasher,
    admin_email: &str,
    password: &str,
) -> Result<Staff> {
    if store.get_staff_by_email(admin_email)?.is_some() {
        return Err(Error::conflict("Administrator account already exists"));
    }

    create_staff(
        store,
        hasher,
        StaffRequest {
            name: "Administrador".to_string(),
            email: admin_email.to_string(),
            role: "admin".to_string(),
            password: password.to_string(),
        },
    )
}
