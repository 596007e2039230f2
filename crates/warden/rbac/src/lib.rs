//! Warden RBAC - user and role registry
//!
//! This crate owns every identity in the system. Permission is derived from a
//! user's assigned role when one exists, falling back to the permission the
//! account was created with.

#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use warden_types::{Permission, Role, RoleId, User, UserId};

/// Registry for users, roles, and role assignments.
pub struct RbacRegistry {
    users: RwLock<HashMap<UserId, User>>,
    roles: RwLock<HashMap<RoleId, Role>>,
    api_keys: RwLock<HashMap<String, UserId>>,
}

impl RbacRegistry {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            roles: RwLock::new(HashMap::new()),
            api_keys: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new user and mint its bearer credential.
    ///
    /// The API key is returned as part of the user record; callers decide how
    /// long to keep showing it.
    pub fn create_user(&self, request: NewUser) -> Result<User, RbacError> {
        if request.mail.trim().is_empty() {
            return Err(RbacError::Validation("mail must not be empty".to_string()));
        }
        if request.name.trim().is_empty() {
            return Err(RbacError::Validation("name must not be empty".to_string()));
        }

        let mut users = self.users.write().map_err(|_| RbacError::LockError)?;
        if users.values().any(|user| user.mail == request.mail) {
            return Err(RbacError::AlreadyExists(format!(
                "user with mail '{}' already exists",
                request.mail
            )));
        }

        let user = User {
            user_id: UserId::generate(),
            api_key: mint_api_key(&request.mail),
            mail: request.mail,
            name: request.name,
            phone: request.phone,
            permission: request.permission,
            role_id: None,
            created_at: chrono::Utc::now(),
        };

        let mut api_keys = self.api_keys.write().map_err(|_| RbacError::LockError)?;
        api_keys.insert(user.api_key.clone(), user.user_id.clone());
        users.insert(user.user_id.clone(), user.clone());

        tracing::info!(user_id = %user.user_id, "registered user");
        Ok(user)
    }

    /// Register the bootstrap administrator if no user holds that mail yet.
    /// Returns the user and whether it was newly created.
    pub fn upsert_admin(&self, mail: &str, name: &str, phone: &str) -> Result<(User, bool), RbacError> {
        {
            let users = self.users.read().map_err(|_| RbacError::LockError)?;
            if let Some(existing) = users.values().find(|user| user.mail == mail) {
                return Ok((existing.clone(), false));
            }
        }
        let user = self.create_user(NewUser {
            mail: mail.to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            permission: Permission::Admin,
        })?;
        Ok((user, true))
    }

    pub fn get_user(&self, user_id: &UserId) -> Result<User, RbacError> {
        let users = self.users.read().map_err(|_| RbacError::LockError)?;
        users
            .get(user_id)
            .cloned()
            .ok_or_else(|| RbacError::UserNotFound(user_id.0.clone()))
    }

    pub fn list_users(&self) -> Result<Vec<User>, RbacError> {
        let users = self.users.read().map_err(|_| RbacError::LockError)?;
        let mut list: Vec<_> = users.values().cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(list)
    }

    /// Resolve a bearer credential to its user, if any.
    pub fn resolve_api_key(&self, api_key: &str) -> Result<Option<User>, RbacError> {
        // Taken one at a time; mutations lock users before api_keys.
        let user_id = {
            let api_keys = self.api_keys.read().map_err(|_| RbacError::LockError)?;
            api_keys.get(api_key).cloned()
        };
        let Some(user_id) = user_id else {
            return Ok(None);
        };
        let users = self.users.read().map_err(|_| RbacError::LockError)?;
        Ok(users.get(&user_id).cloned())
    }

    pub fn delete_user(&self, user_id: &UserId) -> Result<User, RbacError> {
        let mut users = self.users.write().map_err(|_| RbacError::LockError)?;
        let user = users
            .remove(user_id)
            .ok_or_else(|| RbacError::UserNotFound(user_id.0.clone()))?;
        let mut api_keys = self.api_keys.write().map_err(|_| RbacError::LockError)?;
        api_keys.remove(&user.api_key);
        Ok(user)
    }

    /// Apply the provided fields; absent fields are left untouched.
    pub fn update_user(&self, user_id: &UserId, update: UserUpdate) -> Result<User, RbacError> {
        let mut users = self.users.write().map_err(|_| RbacError::LockError)?;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| RbacError::UserNotFound(user_id.0.clone()))?;

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(RbacError::Validation("name must not be empty".to_string()));
            }
            user.name = name;
        }
        if let Some(phone) = update.phone {
            user.phone = phone;
        }
        if let Some(permission) = update.permission {
            user.permission = permission;
        }
        Ok(user.clone())
    }

    pub fn create_role(&self, request: NewRole) -> Result<Role, RbacError> {
        if request.name.trim().is_empty() {
            return Err(RbacError::Validation("role name must not be empty".to_string()));
        }
        let mut roles = self.roles.write().map_err(|_| RbacError::LockError)?;
        if roles.values().any(|role| role.name == request.name) {
            return Err(RbacError::AlreadyExists(format!(
                "role '{}' already exists",
                request.name
            )));
        }

        let grants = request
            .grants
            .unwrap_or_else(|| derive_grant(&request.name));
        let role = Role {
            role_id: RoleId::generate(),
            name: request.name,
            description: request.description,
            grants,
            created_at: chrono::Utc::now(),
        };
        roles.insert(role.role_id.clone(), role.clone());
        Ok(role)
    }

    pub fn get_role(&self, role_id: &RoleId) -> Result<Role, RbacError> {
        let roles = self.roles.read().map_err(|_| RbacError::LockError)?;
        roles
            .get(role_id)
            .cloned()
            .ok_or_else(|| RbacError::RoleNotFound(role_id.0.clone()))
    }

    pub fn list_roles(&self) -> Result<Vec<Role>, RbacError> {
        let roles = self.roles.read().map_err(|_| RbacError::LockError)?;
        let mut list: Vec<_> = roles.values().cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(list)
    }

    pub fn update_role(&self, role_id: &RoleId, update: RoleUpdate) -> Result<Role, RbacError> {
        let mut roles = self.roles.write().map_err(|_| RbacError::LockError)?;
        if let Some(ref name) = update.name {
            if roles
                .values()
                .any(|role| role.name == *name && role.role_id != *role_id)
            {
                return Err(RbacError::AlreadyExists(format!(
                    "role '{}' already exists",
                    name
                )));
            }
        }
        let role = roles
            .get_mut(role_id)
            .ok_or_else(|| RbacError::RoleNotFound(role_id.0.clone()))?;
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(RbacError::Validation("role name must not be empty".to_string()));
            }
            role.grants = derive_grant(&name);
            role.name = name;
        }
        if let Some(description) = update.description {
            role.description = description;
        }
        Ok(role.clone())
    }

    /// Delete a role. Fails while any user still holds it.
    pub fn delete_role(&self, role_id: &RoleId) -> Result<Role, RbacError> {
        let users = self.users.read().map_err(|_| RbacError::LockError)?;
        let holders = users
            .values()
            .filter(|user| user.role_id.as_ref() == Some(role_id))
            .count();
        if holders > 0 {
            return Err(RbacError::RoleInUse {
                role_id: role_id.0.clone(),
                holders,
            });
        }
        drop(users);

        let mut roles = self.roles.write().map_err(|_| RbacError::LockError)?;
        roles
            .remove(role_id)
            .ok_or_else(|| RbacError::RoleNotFound(role_id.0.clone()))
    }

    /// Assign a role to a user. Both must exist.
    pub fn assign_role(&self, user_id: &UserId, role_id: &RoleId) -> Result<User, RbacError> {
        {
            let roles = self.roles.read().map_err(|_| RbacError::LockError)?;
            if !roles.contains_key(role_id) {
                return Err(RbacError::RoleNotFound(role_id.0.clone()));
            }
        }
        let mut users = self.users.write().map_err(|_| RbacError::LockError)?;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| RbacError::UserNotFound(user_id.0.clone()))?;
        user.role_id = Some(role_id.clone());
        tracing::info!(user_id = %user.user_id, role_id = %role_id, "assigned role");
        Ok(user.clone())
    }

    /// Effective permission: the assigned role's grant wins over the account's
    /// own permission. A dangling role reference falls back to the account.
    pub fn effective_permission(&self, user: &User) -> Result<Permission, RbacError> {
        let Some(ref role_id) = user.role_id else {
            return Ok(user.permission);
        };
        let roles = self.roles.read().map_err(|_| RbacError::LockError)?;
        Ok(roles
            .get(role_id)
            .map(|role| role.grants)
            .unwrap_or(user.permission))
    }
}

impl Default for RbacRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Role names spelling ADMIN grant admin; everything else is member-level.
fn derive_grant(name: &str) -> Permission {
    if name.trim().eq_ignore_ascii_case("admin") {
        Permission::Admin
    } else {
        Permission::Member
    }
}

/// Bearer credentials are one-way digests of the mail plus fresh entropy, so
/// a leaked key never reveals account data.
fn mint_api_key(mail: &str) -> String {
    let seed = format!("{}:{}", mail, uuid::Uuid::new_v4());
    blake3::hash(seed.as_bytes()).to_hex().to_string()
}

/// Request to register a new user.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewUser {
    pub mail: String,
    pub name: String,
    pub phone: String,
    pub permission: Permission,
}

/// Partial user update; `None` fields are untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub permission: Option<Permission>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewRole {
    pub name: String,
    pub description: String,
    /// Explicit grant; derived from the name when absent.
    pub grants: Option<Permission>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// RBAC-related errors
#[derive(Debug, Error)]
pub enum RbacError {
    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("role not found: {0}")]
    RoleNotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("role {role_id} still assigned to {holders} user(s)")]
    RoleInUse { role_id: String, holders: usize },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("lock error")]
    LockError,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(mail: &str) -> NewUser {
        NewUser {
            mail: mail.to_string(),
            name: "Test Member".to_string(),
            phone: "1234567890".to_string(),
            permission: Permission::Member,
        }
    }

    #[test]
    fn create_and_resolve_by_api_key() {
        let registry = RbacRegistry::new();
        let user = registry.create_user(member("m@example.com")).unwrap();

        let resolved = registry.resolve_api_key(&user.api_key).unwrap();
        assert_eq!(resolved.unwrap().user_id, user.user_id);
        assert!(registry.resolve_api_key("bogus").unwrap().is_none());
    }

    #[test]
    fn duplicate_mail_is_rejected() {
        let registry = RbacRegistry::new();
        registry.create_user(member("dup@example.com")).unwrap();
        let err = registry.create_user(member("dup@example.com")).unwrap_err();
        assert!(matches!(err, RbacError::AlreadyExists(_)));
    }

    #[test]
    fn upsert_admin_is_idempotent() {
        let registry = RbacRegistry::new();
        let (first, created) = registry
            .upsert_admin("root@example.com", "Root", "000")
            .unwrap();
        assert!(created);
        let (second, created_again) = registry
            .upsert_admin("root@example.com", "Root", "000")
            .unwrap();
        assert!(!created_again);
        assert_eq!(first.user_id, second.user_id);
    }

    #[test]
    fn assigned_role_overrides_account_permission() {
        let registry = RbacRegistry::new();
        let user = registry.create_user(member("ops@example.com")).unwrap();
        assert_eq!(
            registry.effective_permission(&user).unwrap(),
            Permission::Member
        );

        let role = registry
            .create_role(NewRole {
                name: "ADMIN".to_string(),
                description: "operators".to_string(),
                grants: None,
            })
            .unwrap();
        assert_eq!(role.grants, Permission::Admin);

        let user = registry.assign_role(&user.user_id, &role.role_id).unwrap();
        assert_eq!(
            registry.effective_permission(&user).unwrap(),
            Permission::Admin
        );
    }

    #[test]
    fn assigning_missing_role_or_user_fails() {
        let registry = RbacRegistry::new();
        let user = registry.create_user(member("a@example.com")).unwrap();
        let err = registry
            .assign_role(&user.user_id, &RoleId::new("missing"))
            .unwrap_err();
        assert!(matches!(err, RbacError::RoleNotFound(_)));

        let role = registry
            .create_role(NewRole {
                name: "auditor".to_string(),
                description: String::new(),
                grants: None,
            })
            .unwrap();
        let err = registry
            .assign_role(&UserId::new("missing"), &role.role_id)
            .unwrap_err();
        assert!(matches!(err, RbacError::UserNotFound(_)));
    }

    #[test]
    fn role_with_holders_cannot_be_deleted() {
        let registry = RbacRegistry::new();
        let user = registry.create_user(member("held@example.com")).unwrap();
        let role = registry
            .create_role(NewRole {
                name: "auditor".to_string(),
                description: String::new(),
                grants: None,
            })
            .unwrap();
        registry.assign_role(&user.user_id, &role.role_id).unwrap();

        let err = registry.delete_role(&role.role_id).unwrap_err();
        assert!(matches!(err, RbacError::RoleInUse { holders: 1, .. }));

        registry.delete_user(&user.user_id).unwrap();
        registry.delete_role(&role.role_id).unwrap();
    }

    #[test]
    fn deleted_user_key_no_longer_resolves() {
        let registry = RbacRegistry::new();
        let user = registry.create_user(member("gone@example.com")).unwrap();
        registry.delete_user(&user.user_id).unwrap();
        assert!(registry.resolve_api_key(&user.api_key).unwrap().is_none());
    }

    #[test]
    fn partial_update_touches_only_present_fields() {
        let registry = RbacRegistry::new();
        let user = registry.create_user(member("patch@example.com")).unwrap();
        let updated = registry
            .update_user(
                &user.user_id,
                UserUpdate {
                    phone: Some("999".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.phone, "999");
        assert_eq!(updated.name, user.name);
        assert_eq!(updated.permission, user.permission);
    }
}
