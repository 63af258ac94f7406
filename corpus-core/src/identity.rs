//! Request identities and permissions
//!
//! One identity per request, resolved by the auth gateway before routing.
//! The identity decides the document visibility tier, whether CSRF checks
//! apply, and which schema fields are visible.

use crate::registry::{ContentKind, ContentRegistry, ContentType};
use serde::{Deserialize, Serialize};

/// Closed permission set consumed by exhaustive matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Full administrative permission over every content type.
    Admin,
    /// Administrative permission over the page tree. Pages are a
    /// distinguished type; module-scoped credentials for the pages type
    /// carry this instead of a per-type edit grant.
    AdminPages,
    /// Edit permission on one content type, by name.
    Edit(String),
}

/// Scope of a configured API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyScope {
    /// Skeleton key: valid everywhere, full admin.
    Global,
    /// Valid only for one content type.
    Module(String),
}

/// The authenticated (or anonymous) principal behind a request.
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    /// A real user, authenticated by session cookie or bearer token.
    User {
        id: String,
        username: String,
        permissions: Vec<Permission>,
    },
    /// Synthetic system identity resolved from an API key.
    System { scope: KeyScope },
}

impl Identity {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Identity::User { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn has_permission(&self, permission: &Permission) -> bool {
        match self {
            Identity::Anonymous => false,
            Identity::User { permissions, .. } => {
                permissions.contains(&Permission::Admin) || permissions.contains(permission)
            }
            Identity::System { scope } => match scope {
                KeyScope::Global => true,
                KeyScope::Module(name) => match permission {
                    Permission::Admin | Permission::AdminPages => false,
                    Permission::Edit(ty) => ty == name,
                },
            },
        }
    }

    /// Whether this identity may mutate documents of the given type.
    pub fn can_edit(&self, ty: &ContentType) -> bool {
        match self {
            Identity::Anonymous => false,
            Identity::User { permissions, .. } => {
                permissions.contains(&Permission::Admin)
                    || permissions.contains(&Permission::Edit(ty.name.clone()))
                    || (ty.kind == ContentKind::Page
                        && permissions.contains(&Permission::AdminPages))
            }
            Identity::System { scope } => match scope {
                KeyScope::Global => true,
                KeyScope::Module(name) => *name == ty.name,
            },
        }
    }

    /// Page-admin: required for full-tree reads and page moves.
    pub fn can_admin_pages(&self, pages: &ContentType) -> bool {
        match self {
            Identity::Anonymous => false,
            Identity::User { permissions, .. } => {
                permissions.contains(&Permission::Admin)
                    || permissions.contains(&Permission::AdminPages)
            }
            Identity::System { scope } => match scope {
                KeyScope::Global => true,
                KeyScope::Module(name) => *name == pages.name,
            },
        }
    }

    /// Whether this identity may edit anything at all. Gates uploads.
    pub fn can_edit_some(&self, registry: &ContentRegistry) -> bool {
        registry.types().iter().any(|ty| self.can_edit(ty))
    }
}

/// Per-request context produced by the auth gateway and threaded through
/// every handler as a request extension.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub identity: Identity,
    /// Set when the request was authenticated by a non-cookie credential
    /// (or hit a configured exception); cookie-based CSRF protection does
    /// not apply to it.
    pub csrf_exempt: bool,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self {
            identity: Identity::Anonymous,
            csrf_exempt: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ContentType;

    fn products() -> ContentType {
        ContentType::piece("products")
    }

    fn pages() -> ContentType {
        ContentType::page("pages")
    }

    #[test]
    fn anonymous_edits_nothing() {
        assert!(!Identity::Anonymous.can_edit(&products()));
        assert!(!Identity::Anonymous.can_edit(&pages()));
    }

    #[test]
    fn global_key_edits_everything() {
        let identity = Identity::System {
            scope: KeyScope::Global,
        };
        assert!(identity.can_edit(&products()));
        assert!(identity.can_edit(&pages()));
        assert!(identity.can_admin_pages(&pages()));
    }

    #[test]
    fn module_key_is_scope_limited() {
        let identity = Identity::System {
            scope: KeyScope::Module("products".to_string()),
        };
        assert!(identity.can_edit(&products()));
        assert!(!identity.can_edit(&pages()));
        assert!(!identity.can_admin_pages(&pages()));
    }

    #[test]
    fn pages_key_is_page_admin() {
        let identity = Identity::System {
            scope: KeyScope::Module("pages".to_string()),
        };
        assert!(identity.can_edit(&pages()));
        assert!(identity.can_admin_pages(&pages()));
        assert!(!identity.can_edit(&products()));
    }

    #[test]
    fn admin_user_implies_every_permission() {
        let identity = Identity::User {
            id: "u1".to_string(),
            username: "admin".to_string(),
            permissions: vec![Permission::Admin],
        };
        assert!(identity.can_edit(&products()));
        assert!(identity.can_admin_pages(&pages()));
        assert!(identity.has_permission(&Permission::Edit("products".to_string())));
    }

    #[test]
    fn page_admin_grants_edit_on_the_page_type_only() {
        let identity = Identity::User {
            id: "u2".to_string(),
            username: "editor".to_string(),
            permissions: vec![Permission::AdminPages],
        };
        assert!(identity.can_edit(&pages()));
        assert!(!identity.can_edit(&products()));
    }
}
