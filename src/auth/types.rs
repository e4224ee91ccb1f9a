use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub use crate::db::entities::UserRole as Role;

/// Roles a user of `role` acts with. Higher roles include the ones below.
pub fn role_set(role: Role) -> Vec<Role> {
    match role {
        Role::Admin => vec![Role::Admin, Role::Manager, Role::Executive, Role::Worker],
        Role::Manager => vec![Role::Manager, Role::Worker],
        Role::Executive => vec![Role::Executive, Role::Worker],
        Role::Worker => vec![Role::Worker],
    }
}

/// Marker for guards: a principal passes when it holds any of `allowed()`.
pub trait RequiredRole {
    fn allowed() -> &'static [Role];
}

pub struct AnyRole;

impl RequiredRole for AnyRole {
    fn allowed() -> &'static [Role] {
        &[Role::Admin, Role::Manager, Role::Executive, Role::Worker]
    }
}

pub struct WorkerRole;

impl RequiredRole for WorkerRole {
    fn allowed() -> &'static [Role] {
        &[Role::Worker]
    }
}

pub struct ManagerRole;

impl RequiredRole for ManagerRole {
    fn allowed() -> &'static [Role] {
        &[Role::Manager]
    }
}

pub struct AdminRole;

impl RequiredRole for AdminRole {
    fn allowed() -> &'static [Role] {
        &[Role::Admin]
    }
}

pub struct ReportRole;

impl RequiredRole for ReportRole {
    fn allowed() -> &'static [Role] {
        &[Role::Executive, Role::Manager]
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>, // session id, absent for api-key principals
    pub exp: usize,
    pub iat: usize,
    pub roles: Vec<Role>,
}

impl Claims {
    pub fn has_any(&self, allowed: &[Role]) -> bool {
        self.roles.iter().any(|role| allowed.contains(role))
    }

    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::unauthorized("Token carries an invalid subject"))
    }
}

#[cfg(test)]
mod tests {
    use super::{AnyRole, ManagerRole, ReportRole, RequiredRole, Role, role_set};

    #[test]
    fn admin_expands_to_every_role() {
        let roles = role_set(Role::Admin);

        assert_eq!(roles.len(), 4);
        assert!(roles.contains(&Role::Executive));
    }

    #[test]
    fn executive_is_not_a_manager() {
        let roles = role_set(Role::Executive);

        assert!(!roles.iter().any(|role| ManagerRole::allowed().contains(role)));
        assert!(roles.iter().any(|role| ReportRole::allowed().contains(role)));
    }

    #[test]
    fn worker_passes_only_open_guards() {
        let roles = role_set(Role::Worker);

        assert_eq!(roles, vec![Role::Worker]);
        assert!(roles.iter().any(|role| AnyRole::allowed().contains(role)));
        assert!(!roles.iter().any(|role| ReportRole::allowed().contains(role)));
    }
}
