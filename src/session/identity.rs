use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Authorization level attached to a user account.
///
/// The backend is not consistent about the wire type: login replies carry the
/// role as a number, user listings and stored identities carry it as the
/// string "0"/"1"/"2". Deserialization accepts both; serialization always
/// emits the integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Pending,
    Admin,
    User,
}

impl Role {
    pub fn from_code(code: i64) -> Option<Role> {
        match code {
            0 => Some(Role::Pending),
            1 => Some(Role::Admin),
            2 => Some(Role::User),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Role::Pending => 0,
            Role::Admin => 1,
            Role::User => 2,
        }
    }

    /// Label shown in user listings ("Wait" is the historical name for the
    /// not-yet-approved state).
    pub fn display_name(self) -> &'static str {
        match self {
            Role::Pending => "Wait",
            Role::Admin => "Admin",
            Role::User => "User",
        }
    }

    /// Parse console input: accepts the numeric code or the label.
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "wait" | "pending" => Some(Role::Pending),
            "1" | "admin" => Some(Role::Admin),
            "2" | "user" => Some(Role::User),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

struct RoleVisitor;

impl<'de> Visitor<'de> for RoleVisitor {
    type Value = Role;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a role code 0..=2 as integer or string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Role, E> {
        Role::from_code(v).ok_or_else(|| E::custom(format!("unknown role code {}", v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Role, E> {
        self.visit_i64(v as i64)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Role, E> {
        let code: i64 = v.trim().parse().map_err(|_| E::custom(format!("unknown role {:?}", v)))?;
        self.visit_i64(code)
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Role, D::Error> {
        deserializer.deserialize_any(RoleVisitor)
    }
}

/// Profile associated with the current session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Opaque bearer tokens issued by the backend. The client never inspects
/// their contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
}

/// In-memory authenticated state: tokens plus the profile they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub credential: Credential,
    pub identity: Identity,
}
