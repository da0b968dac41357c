pub mod claims;

// Re-export commonly used items
pub use claims::{
    has_role,
    require_admin,
    require_organizer,
    AuthClaims,
    AuthError,
    AuthUser,
    ROLE_HEADER,
    USER_ID_HEADER,
};
