// src/models/scope.rs

use uuid::Uuid;

use crate::models::crm::EntityRole;

// Base scopes handed out by the IDM role object.
pub const SCOPE_INTERNAL: &str = "internal";
pub const SCOPE_EXTERNAL: &str = "external";

// Company roles granted through CRM entity_roles.
pub const ROLE_PRIMARY_USER: &str = "primary_user";
pub const ROLE_USER: &str = "user";
pub const ROLE_USER_RETURNS: &str = "user_returns";

/// A single capability, tagged by where it came from.
///
/// The IDM role object and the CRM entity_roles rows both contribute
/// capability strings but have different shapes; keeping the origin in the
/// type means call sites never have to duck-type a mixed array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// From the identity record's role object (e.g. "internal", "external").
    Base(String),
    /// From an EntityRole row matching the selected company (e.g. "user_returns").
    CompanyRole(String),
}

impl Scope {
    pub fn as_str(&self) -> &str {
        match self {
            Scope::Base(s) => s,
            Scope::CompanyRole(s) => s,
        }
    }
}

/// Merge base scopes with the roles that match the currently selected
/// company. Pure; recomputed whenever the company selection changes.
///
/// No company selected means base scopes only, so company privileges never
/// leak into a session that has not picked a company.
pub fn resolve_scopes(
    base: &[String],
    roles: &[EntityRole],
    selected_company: Option<Uuid>,
) -> Vec<Scope> {
    let mut scopes: Vec<Scope> = base.iter().cloned().map(Scope::Base).collect();

    if let Some(company_id) = selected_company {
        for row in roles {
            if row.company_entity_id == company_id {
                let scope = Scope::CompanyRole(row.role.clone());
                if !scopes.contains(&scope) {
                    scopes.push(scope);
                }
            }
        }
    }

    scopes
}

/// Flatten to the plain string array stored on the session.
pub fn flatten(scopes: &[Scope]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(scopes.len());
    for scope in scopes {
        if !out.iter().any(|s| s == scope.as_str()) {
            out.push(scope.as_str().to_string());
        }
    }
    out
}

/// Where a freshly signed-in user lands.
pub fn post_sign_in_path(scope: &[String]) -> &'static str {
    if scope.iter().any(|s| s == SCOPE_INTERNAL) {
        "/admin/licences"
    } else {
        "/licences"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(company: Uuid, name: &str) -> EntityRole {
        EntityRole {
            entity_role_id: Uuid::new_v4(),
            entity_id: Uuid::new_v4(),
            company_entity_id: company,
            role: name.to_string(),
            created_at: None,
        }
    }

    #[test]
    fn base_scopes_only_when_no_company_selected() {
        let company = Uuid::new_v4();
        let roles = vec![role(company, ROLE_USER), role(company, ROLE_USER_RETURNS)];

        let scopes = resolve_scopes(&[SCOPE_EXTERNAL.to_string()], &roles, None);

        assert_eq!(scopes, vec![Scope::Base(SCOPE_EXTERNAL.to_string())]);
    }

    #[test]
    fn company_roles_merge_for_the_selected_company() {
        let selected = Uuid::new_v4();
        let other = Uuid::new_v4();
        let roles = vec![
            role(selected, ROLE_USER),
            role(selected, ROLE_USER_RETURNS),
            role(other, ROLE_PRIMARY_USER),
        ];

        let scopes = resolve_scopes(&[SCOPE_EXTERNAL.to_string()], &roles, Some(selected));
        let flat = flatten(&scopes);

        assert_eq!(flat, vec!["external", "user", "user_returns"]);
        // The other company's primary_user must not leak in.
        assert!(!flat.iter().any(|s| s == ROLE_PRIMARY_USER));
    }

    #[test]
    fn duplicate_roles_collapse() {
        let selected = Uuid::new_v4();
        let roles = vec![role(selected, ROLE_USER), role(selected, ROLE_USER)];

        let flat = flatten(&resolve_scopes(&[], &roles, Some(selected)));

        assert_eq!(flat, vec!["user"]);
    }

    #[test]
    fn internal_users_land_on_admin_licences() {
        assert_eq!(post_sign_in_path(&["internal".to_string()]), "/admin/licences");
        assert_eq!(post_sign_in_path(&["external".to_string()]), "/licences");
        assert_eq!(
            post_sign_in_path(&["external".to_string(), "user".to_string()]),
            "/licences"
        );
    }
}
