//! Operator profile as returned by the upstream on login and profile refresh.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dashgate_core::{RoleId, UserId};

use crate::Role;

// ─────────────────────────────────────────────────────────────────────────────
// User Profile
// ─────────────────────────────────────────────────────────────────────────────

/// The signed-in operator.
///
/// # Invariants
/// - `role.meta` is the only source of permissions; nothing else on the
///   profile grants access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub role_id: RoleId,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub push: bool,
    pub role: Role,
}

impl UserProfile {
    /// Extract a profile from a gateway response body.
    ///
    /// Upstream wraps the profile differently per endpoint: `{user}`,
    /// `{data: {user}}`, `{data}` or the bare profile object.
    pub fn from_payload(payload: &Value) -> Result<Self, serde_json::Error> {
        let candidate = payload
            .get("user")
            .or_else(|| payload.get("data").and_then(|d| d.get("user")))
            .or_else(|| payload.get("data").filter(|d| d.get("role").is_some()))
            .unwrap_or(payload);

        Self::deserialize(candidate)
    }
}
