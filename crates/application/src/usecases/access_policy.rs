use domain::value_objects::{enums::roles::Role, iam::Principal};
use tracing::warn;
use uuid::Uuid;

use super::errors::{BookingError, UseCaseResult};

/// Who, besides an administrator, may perform an operation on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredRole {
    Administrator,
    ResourceOwner,
    MunicipalityOwner,
    OwnerOrMunicipality,
}

#[cfg_attr(test, mockall::automock)]
pub trait AccessPolicy: Send + Sync {
    fn can_act(
        &self,
        principal: &Principal,
        resource_owner_id: Option<Uuid>,
        municipality_owner_id: Option<Uuid>,
        required: RequiredRole,
    ) -> bool;
}

/// Role matrix: administrators may do anything; owners act on what they own;
/// municipality principals act on resources under a municipality they own.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleAccessPolicy;

impl RoleAccessPolicy {
    fn is_owner(principal: &Principal, resource_owner_id: Option<Uuid>) -> bool {
        resource_owner_id == Some(principal.user_id)
    }

    fn is_municipality_owner(principal: &Principal, municipality_owner_id: Option<Uuid>) -> bool {
        principal.has_role(Role::Municipality) && municipality_owner_id == Some(principal.user_id)
    }
}

impl AccessPolicy for RoleAccessPolicy {
    fn can_act(
        &self,
        principal: &Principal,
        resource_owner_id: Option<Uuid>,
        municipality_owner_id: Option<Uuid>,
        required: RequiredRole,
    ) -> bool {
        if principal.is_admin() {
            return true;
        }

        match required {
            RequiredRole::Administrator => false,
            RequiredRole::ResourceOwner => Self::is_owner(principal, resource_owner_id),
            RequiredRole::MunicipalityOwner => {
                Self::is_municipality_owner(principal, municipality_owner_id)
            }
            RequiredRole::OwnerOrMunicipality => {
                Self::is_owner(principal, resource_owner_id)
                    || Self::is_municipality_owner(principal, municipality_owner_id)
            }
        }
    }
}

/// Runs the policy and turns a refusal into `Forbidden`.
pub(crate) fn authorize<A>(
    policy: &A,
    principal: &Principal,
    resource_owner_id: Option<Uuid>,
    municipality_owner_id: Option<Uuid>,
    required: RequiredRole,
    action: &str,
) -> UseCaseResult<()>
where
    A: AccessPolicy + ?Sized,
{
    if policy.can_act(principal, resource_owner_id, municipality_owner_id, required) {
        return Ok(());
    }

    warn!(
        user_id = %principal.user_id,
        ?required,
        action,
        "access_policy: principal is not allowed to act"
    );
    Err(BookingError::Forbidden(format!("not allowed to {action}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(roles: Vec<Role>) -> Principal {
        Principal::new(Uuid::new_v4(), roles)
    }

    #[test]
    fn administrator_may_do_anything() {
        let admin = principal(vec![Role::Admin]);
        for required in [
            RequiredRole::Administrator,
            RequiredRole::ResourceOwner,
            RequiredRole::MunicipalityOwner,
            RequiredRole::OwnerOrMunicipality,
        ] {
            assert!(RoleAccessPolicy.can_act(&admin, None, None, required));
        }
    }

    #[test]
    fn owner_acts_only_on_own_resource() {
        let user = principal(vec![Role::User]);
        let policy = RoleAccessPolicy;

        assert!(policy.can_act(&user, Some(user.user_id), None, RequiredRole::ResourceOwner));
        assert!(!policy.can_act(&user, Some(Uuid::new_v4()), None, RequiredRole::ResourceOwner));
        assert!(!policy.can_act(&user, Some(user.user_id), None, RequiredRole::MunicipalityOwner));
        assert!(!policy.can_act(&user, Some(user.user_id), None, RequiredRole::Administrator));
    }

    #[test]
    fn municipality_owner_needs_the_role_and_the_ownership() {
        let municipality = principal(vec![Role::Municipality]);
        let policy = RoleAccessPolicy;

        assert!(policy.can_act(
            &municipality,
            None,
            Some(municipality.user_id),
            RequiredRole::MunicipalityOwner
        ));
        assert!(!policy.can_act(
            &municipality,
            None,
            Some(Uuid::new_v4()),
            RequiredRole::MunicipalityOwner
        ));

        let plain_user = principal(vec![Role::User]);
        assert!(!policy.can_act(
            &plain_user,
            None,
            Some(plain_user.user_id),
            RequiredRole::MunicipalityOwner
        ));
    }

    #[test]
    fn owner_or_municipality_accepts_either() {
        let user = principal(vec![Role::User]);
        let municipality = principal(vec![Role::Municipality]);
        let policy = RoleAccessPolicy;

        let owner = Some(user.user_id);
        let municipality_owner = Some(municipality.user_id);

        assert!(policy.can_act(&user, owner, municipality_owner, RequiredRole::OwnerOrMunicipality));
        assert!(policy.can_act(
            &municipality,
            owner,
            municipality_owner,
            RequiredRole::OwnerOrMunicipality
        ));
        assert!(!policy.can_act(
            &principal(vec![Role::Entrepreneur]),
            owner,
            municipality_owner,
            RequiredRole::OwnerOrMunicipality
        ));
    }

    #[test]
    fn refusal_is_reported_as_forbidden() {
        let user = principal(vec![Role::User]);
        let err = authorize(
            &RoleAccessPolicy,
            &user,
            None,
            None,
            RequiredRole::Administrator,
            "list all payments",
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::Forbidden(_)));
    }
}
