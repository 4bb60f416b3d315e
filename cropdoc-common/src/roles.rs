//! Role and authorization model
//!
//! Roles are a closed enum with exhaustive matching in `can_perform` so a
//! new role cannot silently pass an authorization check it was never
//! granted. The predicate is pure: callers re-resolve the account row per
//! request, so role or active-flag changes take effect on the next call.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::Account;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Farmer,
    Agronomist,
    Admin,
}

impl Role {
    /// Database/wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Farmer => "FARMER",
            Role::Agronomist => "AGRONOMIST",
            Role::Admin => "ADMIN",
        }
    }

    /// Parse from the database/wire representation
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "FARMER" => Some(Role::Farmer),
            "AGRONOMIST" => Some(Role::Agronomist),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations gated by the authorization predicate
///
/// Actions that depend on a resource carry the relevant resource fields so
/// the predicate stays a pure function of (action, account).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SubmitDiagnosis,
    AnnotateDiagnosis,
    ApproveDiagnosis,
    RejectDiagnosis,
    ListPendingDiagnoses,
    ListOwnDiagnoses,
    ViewDiagnosis { owner_id: Uuid },
    AuthorArticles,
    ListAccounts,
    CreateAccount,
    UpdateAccount { target_id: Uuid },
    ChangeAccountRole { target_id: Uuid },
    SetAccountStatus { target_id: Uuid },
    DeleteAccount { target_id: Uuid },
    ManageModels,
}

/// Authorization predicate: may `account` perform `action`?
///
/// Inactive accounts are denied everything. Admins may view any diagnosis
/// but may not change their own role or delete their own account.
pub fn can_perform(action: Action, account: &Account) -> bool {
    if !account.is_active {
        return false;
    }

    match action {
        Action::SubmitDiagnosis | Action::ListOwnDiagnoses => account.role == Role::Farmer,

        Action::AnnotateDiagnosis
        | Action::ApproveDiagnosis
        | Action::RejectDiagnosis
        | Action::ListPendingDiagnoses => account.role == Role::Agronomist,

        // Farmers see only their own records; reviewers and admins see all
        Action::ViewDiagnosis { owner_id } => match account.role {
            Role::Farmer => account.id == owner_id,
            Role::Agronomist | Role::Admin => true,
        },

        Action::AuthorArticles => account.role == Role::Agronomist,

        Action::ListAccounts
        | Action::CreateAccount
        | Action::UpdateAccount { .. }
        | Action::SetAccountStatus { .. }
        | Action::ManageModels => account.role == Role::Admin,

        // Self-demotion guard
        Action::ChangeAccountRole { target_id } => {
            account.role == Role::Admin && target_id != account.id
        }

        // Self-delete guard
        Action::DeleteAccount { target_id } => {
            account.role == Role::Admin && target_id != account.id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Account;
    use chrono::Utc;

    fn account(role: Role, is_active: bool) -> Account {
        Account {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            password_hash: String::new(),
            role,
            is_active,
            last_login_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_farmer_can_submit_and_list_own() {
        let farmer = account(Role::Farmer, true);
        assert!(can_perform(Action::SubmitDiagnosis, &farmer));
        assert!(can_perform(Action::ListOwnDiagnoses, &farmer));
        assert!(!can_perform(Action::ApproveDiagnosis, &farmer));
        assert!(!can_perform(Action::ListPendingDiagnoses, &farmer));
    }

    #[test]
    fn test_agronomist_reviews_but_does_not_submit() {
        let agro = account(Role::Agronomist, true);
        assert!(can_perform(Action::AnnotateDiagnosis, &agro));
        assert!(can_perform(Action::ApproveDiagnosis, &agro));
        assert!(can_perform(Action::RejectDiagnosis, &agro));
        assert!(can_perform(Action::ListPendingDiagnoses, &agro));
        assert!(!can_perform(Action::SubmitDiagnosis, &agro));
    }

    #[test]
    fn test_inactive_account_denied_everything() {
        let inactive = account(Role::Agronomist, false);
        assert!(!can_perform(Action::ApproveDiagnosis, &inactive));
        assert!(!can_perform(Action::ListPendingDiagnoses, &inactive));

        let inactive_admin = account(Role::Admin, false);
        assert!(!can_perform(Action::ListAccounts, &inactive_admin));
    }

    #[test]
    fn test_farmer_views_only_own_records() {
        let farmer = account(Role::Farmer, true);
        assert!(can_perform(Action::ViewDiagnosis { owner_id: farmer.id }, &farmer));
        assert!(!can_perform(
            Action::ViewDiagnosis { owner_id: Uuid::new_v4() },
            &farmer
        ));

        let agro = account(Role::Agronomist, true);
        assert!(can_perform(
            Action::ViewDiagnosis { owner_id: Uuid::new_v4() },
            &agro
        ));
    }

    #[test]
    fn test_admin_self_guards() {
        let admin = account(Role::Admin, true);
        let other = Uuid::new_v4();

        assert!(can_perform(Action::ChangeAccountRole { target_id: other }, &admin));
        assert!(can_perform(Action::DeleteAccount { target_id: other }, &admin));

        // An admin may not change their own role or delete their own account
        assert!(!can_perform(Action::ChangeAccountRole { target_id: admin.id }, &admin));
        assert!(!can_perform(Action::DeleteAccount { target_id: admin.id }, &admin));

        // Status edits on self are not guarded
        assert!(can_perform(Action::SetAccountStatus { target_id: admin.id }, &admin));
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Farmer, Role::Agronomist, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("SUPERUSER"), None);
        assert_eq!(Role::parse("farmer"), None);
    }
}
