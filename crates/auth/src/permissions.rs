use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are flat strings (e.g. "view_roles") assigned to roles by the
/// upstream. Values arriving from upstream are kept even when they are not in
/// the [`catalog`]; only the route map is restricted to catalog entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier is part of the closed catalog.
    pub fn is_known(&self) -> bool {
        catalog::is_known(self.as_str())
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

/// The closed set of permission identifiers the dashboard knows about.
///
/// Additions are backward compatible. Removing an entry is a breaking change
/// and requires the route map to be updated in the same change.
pub mod catalog {
    use super::Permission;

    macro_rules! permissions {
        ($($konst:ident => $name:literal),+ $(,)?) => {
            $(pub const $konst: Permission = Permission::from_static($name);)+

            /// Every catalog entry, in declaration order.
            pub const ALL: &[Permission] = &[$($konst),+];
        };
    }

    permissions! {
        VIEW_DASHBOARD => "view_dashboard",

        VIEW_CAMPAIGNS => "view_campaigns",
        CREATE_CAMPAIGN => "create_campaign",
        EDIT_CAMPAIGN => "edit_campaign",
        DELETE_CAMPAIGN => "delete_campaign",

        VIEW_SCREENS => "view_screens",
        CREATE_SCREEN => "create_screen",
        EDIT_SCREEN => "edit_screen",
        DELETE_SCREEN => "delete_screen",

        VIEW_EVENTS => "view_events",
        CREATE_EVENT => "create_event",
        EDIT_EVENT => "edit_event",
        DELETE_EVENT => "delete_event",

        VIEW_ROLES => "view_roles",
        CREATE_ROLE => "create_role",
        EDIT_ROLE => "edit_role",
        DELETE_ROLE => "delete_role",

        VIEW_USERS => "view_users",
        CREATE_USER => "create_user",
        EDIT_USER => "edit_user",
        DELETE_USER => "delete_user",

        VIEW_MEDIA => "view_media",
        UPLOAD_MEDIA => "upload_media",
        DELETE_MEDIA => "delete_media",

        VIEW_PERMISSIONS => "view_permissions",
        ASSIGN_PERMISSIONS => "assign_permissions",
    }

    pub fn is_known(name: &str) -> bool {
        ALL.iter().any(|p| p.as_str() == name)
    }
}
