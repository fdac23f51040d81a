//! Company-scoped authorization gate.
//!
//! Every mutating handler runs the same pipeline: authenticate (middleware),
//! authorize (here), validate input, mutate, respond. Platform admins bypass
//! the company role check; everyone else needs a membership row whose role
//! passes the operation-specific rule.

use tablero_core::{models::MemberRole, AppError};
use tablero_db::MemberRepository;
use uuid::Uuid;

use crate::auth::models::CallerContext;

/// Resolve the caller's effective role within a company. Platform admins act
/// as company admins everywhere; non-members are rejected with 403.
pub async fn effective_role(
    members: &MemberRepository,
    caller: &CallerContext,
    company_id: Uuid,
) -> Result<MemberRole, AppError> {
    if caller.is_platform_admin {
        return Ok(MemberRole::Admin);
    }
    members
        .get_role(company_id, caller.user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("Not a member of this company".to_string()))
}

/// Require any role that may mutate company rows (admin or editor).
pub async fn require_editor(
    members: &MemberRepository,
    caller: &CallerContext,
    company_id: Uuid,
) -> Result<MemberRole, AppError> {
    let role = effective_role(members, caller, company_id).await?;
    if !role.can_edit() {
        return Err(AppError::Forbidden(
            "Viewers cannot modify company data".to_string(),
        ));
    }
    Ok(role)
}

/// Require the company admin role.
pub async fn require_admin(
    members: &MemberRepository,
    caller: &CallerContext,
    company_id: Uuid,
) -> Result<(), AppError> {
    match effective_role(members, caller, company_id).await? {
        MemberRole::Admin => Ok(()),
        _ => Err(AppError::Forbidden(
            "Only company admins may perform this action".to_string(),
        )),
    }
}

/// Rule for creating or inviting a member: admins grant any role, editors
/// grant only viewer, viewers grant nothing.
pub fn check_member_grant(actor: MemberRole, granted: MemberRole) -> Result<(), AppError> {
    match actor {
        MemberRole::Admin => Ok(()),
        MemberRole::Editor if granted == MemberRole::Viewer => Ok(()),
        MemberRole::Editor => Err(AppError::Forbidden(
            "Editors may only create members with the viewer role".to_string(),
        )),
        MemberRole::Viewer => Err(AppError::Forbidden(
            "Viewers cannot create members".to_string(),
        )),
    }
}

/// Rule for changing an existing member's role. Editors may target viewer or
/// editor but never admin; the rule is deliberately not symmetric with
/// `check_member_grant`.
pub fn check_role_change(actor: MemberRole, new_role: MemberRole) -> Result<(), AppError> {
    match actor {
        MemberRole::Admin => Ok(()),
        MemberRole::Editor if matches!(new_role, MemberRole::Viewer | MemberRole::Editor) => Ok(()),
        MemberRole::Editor => Err(AppError::Forbidden(
            "Editors cannot assign the admin role".to_string(),
        )),
        MemberRole::Viewer => Err(AppError::Forbidden(
            "Viewers cannot change member roles".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_grants_any_role() {
        for granted in [MemberRole::Admin, MemberRole::Editor, MemberRole::Viewer] {
            assert!(check_member_grant(MemberRole::Admin, granted).is_ok());
        }
    }

    #[test]
    fn test_editor_grants_only_viewer() {
        assert!(check_member_grant(MemberRole::Editor, MemberRole::Viewer).is_ok());
        assert!(check_member_grant(MemberRole::Editor, MemberRole::Editor).is_err());
        assert!(check_member_grant(MemberRole::Editor, MemberRole::Admin).is_err());
    }

    #[test]
    fn test_viewer_grants_nothing() {
        assert!(check_member_grant(MemberRole::Viewer, MemberRole::Viewer).is_err());
    }

    #[test]
    fn test_editor_role_change_targets() {
        assert!(check_role_change(MemberRole::Editor, MemberRole::Viewer).is_ok());
        assert!(check_role_change(MemberRole::Editor, MemberRole::Editor).is_ok());
        assert!(check_role_change(MemberRole::Editor, MemberRole::Admin).is_err());
    }

    #[test]
    fn test_role_change_rejections_are_forbidden() {
        let err = check_role_change(MemberRole::Editor, MemberRole::Admin).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = check_role_change(MemberRole::Viewer, MemberRole::Viewer).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
