//! Claims carried inside a session token
//!
//! Wire format (claims version 1):
//!
//! ```json
//! {"ver":1,"identity_id":"<uuid>","role":"Admin","token_class":"access",
//!  "iat":1700000000,"exp":1700003600,"jti":"<uuid>"}
//! ```
//!
//! `role` is always the variant name. An integer role is not a valid version 1
//! token and fails to decode.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Current claims wire version
pub const CLAIMS_VERSION: u8 = 1;

/// Role of an identity, ordered by privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Admin => "Admin",
            Role::SuperAdmin => "SuperAdmin",
        }
    }

    /// True when this role carries at least the privilege of `required`
    pub fn satisfies(&self, required: Role) -> bool {
        *self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminates access tokens from refresh tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    Access,
    Refresh,
}

impl TokenClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenClass::Access => "access",
            TokenClass::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed claim bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Wire version, see [`CLAIMS_VERSION`]
    pub ver: u8,
    pub identity_id: Uuid,
    pub role: Role,
    pub token_class: TokenClass,
    /// Issued at (Unix timestamp)
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Expiration time (Unix timestamp)
    #[serde(rename = "exp")]
    pub expires_at: i64,
    /// Unique token id; keeps two tokens minted in the same second distinct
    pub jti: String,
}

impl Claims {
    pub fn new(
        identity_id: Uuid,
        role: Role,
        token_class: TokenClass,
        issued_at: i64,
        expires_at: i64,
    ) -> Self {
        Self {
            ver: CLAIMS_VERSION,
            identity_id,
            role,
            token_class,
            issued_at,
            expires_at,
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Seconds left before `exp`, relative to `now`
    pub fn remaining_lifetime(&self, now: i64) -> i64 {
        self.expires_at - now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_privilege_order() {
        assert!(Role::User < Role::Admin);
        assert!(Role::Admin < Role::SuperAdmin);
        assert!(Role::SuperAdmin.satisfies(Role::Admin));
        assert!(Role::Admin.satisfies(Role::Admin));
        assert!(!Role::User.satisfies(Role::Admin));
    }

    #[test]
    fn test_role_serializes_as_name() {
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"SuperAdmin\"");
        assert_eq!(serde_json::from_str::<Role>("\"Admin\"").unwrap(), Role::Admin);
        assert!(serde_json::from_str::<Role>("2").is_err());
    }

    #[test]
    fn test_token_class_wire_names() {
        assert_eq!(serde_json::to_string(&TokenClass::Access).unwrap(), "\"access\"");
        assert_eq!(
            serde_json::from_str::<TokenClass>("\"refresh\"").unwrap(),
            TokenClass::Refresh
        );
    }

    #[test]
    fn test_claims_field_names() {
        let claims = Claims::new(Uuid::new_v4(), Role::User, TokenClass::Access, 100, 200);
        let value = serde_json::to_value(&claims).unwrap();

        assert_eq!(value["ver"], 1);
        assert_eq!(value["iat"], 100);
        assert_eq!(value["exp"], 200);
        assert_eq!(value["token_class"], "access");
        assert_eq!(value["role"], "User");
        assert!(value.get("issued_at").is_none());
    }

    #[test]
    fn test_fresh_claims_get_distinct_jti() {
        let id = Uuid::new_v4();
        let a = Claims::new(id, Role::User, TokenClass::Access, 100, 200);
        let b = Claims::new(id, Role::User, TokenClass::Access, 100, 200);
        assert_ne!(a.jti, b.jti);
    }
}
