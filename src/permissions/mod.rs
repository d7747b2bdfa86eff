//! Static permission catalog.
//!
//! Permissions are `domain:action` strings. The set is closed: anything not
//! listed in [`PERMISSION_GROUPS`] is rejected on write paths. Groups carry
//! presentation metadata only and have no behavior attached.

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Product management
pub mod products {
    pub const VIEW: &str = "products:view";
    pub const CREATE: &str = "products:create";
    pub const EDIT: &str = "products:edit";
    pub const DELETE: &str = "products:delete";
    pub const RESEARCH: &str = "products:research";
    pub const DATASHEET: &str = "products:datasheet";
    pub const FINISH: &str = "products:finish";
}

/// Marketing and campaigns
pub mod marketing {
    pub const VIEW: &str = "marketing:view";
    pub const CREATE_CAMPAIGNS: &str = "marketing:create_campaigns";
    pub const EDIT_CAMPAIGNS: &str = "marketing:edit_campaigns";
    pub const DELETE_CAMPAIGNS: &str = "marketing:delete_campaigns";
}

/// Blog content
pub mod blogs {
    pub const VIEW: &str = "blogs:view";
    pub const CREATE: &str = "blogs:create";
    pub const EDIT: &str = "blogs:edit";
    pub const DELETE: &str = "blogs:delete";
    pub const PUBLISH: &str = "blogs:publish";
}

/// User administration
pub mod users {
    pub const VIEW: &str = "users:view";
    pub const CREATE: &str = "users:create";
    pub const EDIT: &str = "users:edit";
    pub const DELETE: &str = "users:delete";
    pub const MANAGE_PERMISSIONS: &str = "users:manage_permissions";
}

/// System configuration
pub mod system {
    pub const VIEW_ANALYTICS: &str = "system:view_analytics";
    pub const MANAGE_SETTINGS: &str = "system:manage_settings";
    pub const BACKUP_RESTORE: &str = "system:backup_restore";
}

/// One entry of the catalog with its UI label.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PermissionInfo {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

/// A presentation group. `icon` is a reference name resolved by the client.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PermissionGroup {
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub permissions: &'static [PermissionInfo],
}

const fn info(key: &'static str, label: &'static str, description: &'static str) -> PermissionInfo {
    PermissionInfo { key, label, description }
}

pub static PERMISSION_GROUPS: &[PermissionGroup] = &[
    PermissionGroup {
        title: "Product management",
        description: "Research and datasheet permissions for products",
        icon: "package",
        permissions: &[
            info(products::VIEW, "View products", "See the product list"),
            info(products::CREATE, "Create products", "Add new products"),
            info(products::EDIT, "Edit products", "Change existing product information"),
            info(products::DELETE, "Delete products", "Remove products"),
            info(products::RESEARCH, "Run research", "Generate product research"),
            info(products::DATASHEET, "Generate datasheets", "Create and edit product datasheets"),
            info(products::FINISH, "Finish products", "Mark products as finished"),
        ],
    },
    PermissionGroup {
        title: "Marketing & campaigns",
        description: "Manage marketing strategies",
        icon: "trending-up",
        permissions: &[
            info(marketing::VIEW, "View marketing", "See campaigns and strategies"),
            info(marketing::CREATE_CAMPAIGNS, "Create campaigns", "Design new marketing campaigns"),
            info(marketing::EDIT_CAMPAIGNS, "Edit campaigns", "Change existing campaigns"),
            info(marketing::DELETE_CAMPAIGNS, "Delete campaigns", "Remove marketing campaigns"),
        ],
    },
    PermissionGroup {
        title: "Content management",
        description: "Write and manage blog content",
        icon: "edit",
        permissions: &[
            info(blogs::VIEW, "View blogs", "See blog content"),
            info(blogs::CREATE, "Create blogs", "Write new blog posts"),
            info(blogs::EDIT, "Edit blogs", "Change existing posts"),
            info(blogs::DELETE, "Delete blogs", "Remove blog posts"),
            info(blogs::PUBLISH, "Publish blogs", "Publish and schedule posts"),
        ],
    },
    PermissionGroup {
        title: "User administration",
        description: "Manage system users",
        icon: "users",
        permissions: &[
            info(users::VIEW, "View users", "See the user list"),
            info(users::CREATE, "Create users", "Register new users"),
            info(users::EDIT, "Edit users", "Change user information"),
            info(users::DELETE, "Delete users", "Remove users"),
            info(users::MANAGE_PERMISSIONS, "Manage permissions", "Assign and change user permissions"),
        ],
    },
    PermissionGroup {
        title: "System configuration",
        description: "Advanced system administration",
        icon: "settings",
        permissions: &[
            info(system::VIEW_ANALYTICS, "View analytics", "Access reports and statistics"),
            info(system::MANAGE_SETTINGS, "Manage settings", "Change system configuration"),
            info(system::BACKUP_RESTORE, "Backup and restore", "Run backups and restores"),
        ],
    },
];

/// Every identifier in the catalog.
pub fn list_all_permissions() -> BTreeSet<&'static str> {
    PERMISSION_GROUPS
        .iter()
        .flat_map(|group| group.permissions.iter().map(|p| p.key))
        .collect()
}

pub fn is_valid_permission(candidate: &str) -> bool {
    PERMISSION_GROUPS
        .iter()
        .any(|group| group.permissions.iter().any(|p| p.key == candidate))
}

/// Returns the submitted identifiers that are not in the catalog, in order.
pub fn invalid_permissions<'a, I>(candidates: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    candidates
        .into_iter()
        .map(String::as_str)
        .filter(|p| !is_valid_permission(p))
        .collect()
}

/// Roles predate per-user permissions. They survive only to backfill
/// accounts created before permissions were stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LegacyRole {
    Admin,
    Viewer,
    Other,
}

impl FromStr for LegacyRole {
    type Err = Infallible;

    /// Unknown role names map to [`LegacyRole::Other`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "ADMIN" => LegacyRole::Admin,
            "VIEWER" => LegacyRole::Viewer,
            _ => LegacyRole::Other,
        })
    }
}

pub fn permissions_for_default_role(role: LegacyRole) -> BTreeSet<&'static str> {
    match role {
        LegacyRole::Admin => list_all_permissions(),
        LegacyRole::Viewer => [products::VIEW, marketing::VIEW, blogs::VIEW, users::VIEW]
            .into_iter()
            .collect(),
        LegacyRole::Other => BTreeSet::new(),
    }
}

/// Membership-only permission collection held by a user or a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    pub fn has_any(&self, permissions: &[&str]) -> bool {
        permissions.iter().any(|p| self.has(p))
    }

    pub fn has_all(&self, permissions: &[&str]) -> bool {
        permissions.iter().all(|p| self.has(p))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_no_duplicate_keys() {
        let total: usize = PERMISSION_GROUPS.iter().map(|g| g.permissions.len()).sum();
        assert_eq!(total, list_all_permissions().len());
        assert_eq!(total, 24);
    }

    #[test]
    fn every_key_is_domain_action() {
        for key in list_all_permissions() {
            let (domain, action) = key.split_once(':').expect("missing separator");
            assert!(!domain.is_empty() && !action.is_empty(), "bad key {key}");
        }
    }

    #[test]
    fn validity_is_closed_set_membership() {
        assert!(is_valid_permission(products::RESEARCH));
        assert!(is_valid_permission("users:manage_permissions"));
        assert!(!is_valid_permission("products:VIEW"));
        assert!(!is_valid_permission("products:fly"));
        assert!(!is_valid_permission(""));
    }

    #[test]
    fn invalid_permissions_reports_only_unknown_entries() {
        let submitted = vec![
            "products:view".to_string(),
            "admin".to_string(),
            "blogs:publish".to_string(),
            "blogs:burn".to_string(),
        ];
        assert_eq!(invalid_permissions(&submitted), vec!["admin", "blogs:burn"]);
    }

    #[test]
    fn legacy_roles_map_to_fixed_sets() {
        assert_eq!(permissions_for_default_role(LegacyRole::Admin), list_all_permissions());
        let viewer = permissions_for_default_role(LegacyRole::Viewer);
        assert_eq!(viewer.len(), 4);
        assert!(viewer.contains(users::VIEW));
        assert!(!viewer.contains(users::DELETE));
        assert!(permissions_for_default_role("editor".parse().unwrap()).is_empty());
        assert_eq!("admin".parse::<LegacyRole>(), Ok(LegacyRole::Admin));
    }

    #[test]
    fn permission_set_ignores_duplicates() {
        let set: PermissionSet = ["products:view", "products:view", "users:view"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.has_all(&["products:view", "users:view"]));
        assert!(set.has_any(&["blogs:view", "users:view"]));
        assert!(!set.has_any(&["blogs:view"]));
    }
}
