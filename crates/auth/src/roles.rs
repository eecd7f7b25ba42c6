use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// A named bundle of permissions, as assigned by the upstream.
///
/// `meta` is the authoritative permission set for the operator holding the
/// role. Upstream sends it as a JSON array; duplicates collapse.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub meta: BTreeSet<Permission>,
}

impl Role {
    pub fn new(name: impl Into<String>, meta: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            name: name.into(),
            meta: meta.into_iter().collect(),
        }
    }

    pub fn grants(&self, permission: &Permission) -> bool {
        self.meta.contains(permission)
    }

    /// Permissions held by this role that are not in the catalog.
    ///
    /// Useful for spotting drift between the upstream role admin and this build.
    pub fn unknown_permissions(&self) -> impl Iterator<Item = &Permission> {
        self.meta.iter().filter(|p| !p.is_known())
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}
