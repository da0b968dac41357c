use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use uuid::Uuid;

use tickethub_core::models::{ROLE_ADMIN, ROLE_ORGANIZER};

/// Role claim header, populated by the upstream gateway after it has
/// validated the caller's session. Values are trusted as-is.
pub const ROLE_HEADER: &str = "x-user-role";

/// Identity claim header, same trust model as [`ROLE_HEADER`].
pub const USER_ID_HEADER: &str = "x-user-id";

/// Raw claims lifted off the request headers. Extraction never rejects;
/// each endpoint applies its own gate explicitly.
#[derive(Debug, Clone, Default)]
pub struct AuthClaims {
    pub user_id: Option<Uuid>,
    pub role: Option<String>,
}

/// Fully identified caller, produced by a gate that required both claims.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Insufficient permissions")]
    Forbidden,
}

impl AuthClaims {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let role = headers
            .get(ROLE_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        // An unparseable id is treated the same as a missing one.
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok());

        Self { user_id, role }
    }
}

impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(AuthClaims::from_headers(&parts.headers))
    }
}

/// Helper function to check if the caller has one of the allowed roles.
pub fn has_role(claims: &AuthClaims, allowed_roles: &[&str]) -> bool {
    claims
        .role
        .as_deref()
        .map(|role| allowed_roles.contains(&role))
        .unwrap_or(false)
}

/// Gate for the admin report: the role claim must be present and must be
/// Admin. Identity is not required.
pub fn require_admin(claims: &AuthClaims) -> Result<(), AuthError> {
    let role = claims.role.as_deref().ok_or(AuthError::Unauthorized)?;
    if role == ROLE_ADMIN {
        Ok(())
    } else {
        tracing::warn!(role, "admin report denied for non-admin role");
        Err(AuthError::Forbidden)
    }
}

/// Gate for the organizer report: both claims must be present and the role
/// must be Admin or Organizer.
pub fn require_organizer(claims: &AuthClaims) -> Result<AuthUser, AuthError> {
    let role = claims.role.as_deref().ok_or(AuthError::Unauthorized)?;
    let user_id = claims.user_id.ok_or(AuthError::Unauthorized)?;
    if has_role(claims, &[ROLE_ADMIN, ROLE_ORGANIZER]) {
        Ok(AuthUser {
            user_id,
            role: role.to_string(),
        })
    } else {
        tracing::warn!(role, %user_id, "organizer report denied for role");
        Err(AuthError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(role: Option<&str>, id: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(role) = role {
            map.insert(ROLE_HEADER, HeaderValue::from_str(role).unwrap());
        }
        if let Some(id) = id {
            map.insert(USER_ID_HEADER, HeaderValue::from_str(id).unwrap());
        }
        map
    }

    #[test]
    fn missing_role_is_unauthorized() {
        let claims = AuthClaims::from_headers(&headers(None, None));
        assert_eq!(require_admin(&claims), Err(AuthError::Unauthorized));
        assert_eq!(
            require_organizer(&claims).unwrap_err(),
            AuthError::Unauthorized
        );
    }

    #[test]
    fn non_admin_role_is_forbidden_on_admin_gate() {
        let id = Uuid::new_v4().to_string();
        let claims = AuthClaims::from_headers(&headers(Some("Organizer"), Some(&id)));
        assert_eq!(require_admin(&claims), Err(AuthError::Forbidden));
    }

    #[test]
    fn admin_passes_both_gates() {
        let id = Uuid::new_v4().to_string();
        let claims = AuthClaims::from_headers(&headers(Some("Admin"), Some(&id)));
        assert!(require_admin(&claims).is_ok());
        let user = require_organizer(&claims).unwrap();
        assert_eq!(user.role, "Admin");
    }

    #[test]
    fn organizer_gate_needs_identity() {
        let claims = AuthClaims::from_headers(&headers(Some("Organizer"), None));
        assert_eq!(
            require_organizer(&claims).unwrap_err(),
            AuthError::Unauthorized
        );
    }

    #[test]
    fn unparseable_identity_is_unauthorized() {
        let claims = AuthClaims::from_headers(&headers(Some("Organizer"), Some("not-a-uuid")));
        assert!(claims.user_id.is_none());
        assert_eq!(
            require_organizer(&claims).unwrap_err(),
            AuthError::Unauthorized
        );
    }

    #[test]
    fn plain_user_role_is_forbidden_on_organizer_gate() {
        let id = Uuid::new_v4().to_string();
        let claims = AuthClaims::from_headers(&headers(Some("User"), Some(&id)));
        assert_eq!(
            require_organizer(&claims).unwrap_err(),
            AuthError::Forbidden
        );
    }

    #[test]
    fn empty_role_header_counts_as_missing() {
        let claims = AuthClaims::from_headers(&headers(Some(""), None));
        assert!(claims.role.is_none());
        assert_eq!(require_admin(&claims), Err(AuthError::Unauthorized));
    }

    #[test]
    fn has_role_matches_allowed_set() {
        let id = Uuid::new_v4().to_string();
        let claims = AuthClaims::from_headers(&headers(Some("Organizer"), Some(&id)));
        assert!(has_role(&claims, &["Admin", "Organizer"]));
        assert!(!has_role(&claims, &["Admin"]));
    }
}
