// src/middleware/policy.rs
//
// Every authorization decision goes through `authorize`; handlers never
// inspect user flags themselves.

use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::user::{User, UserType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    Anonymous,
    Customer,
    Vendor,
    Admin,
    Staff,
    Superuser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Catalog,
    SeoMetadata,
    SitemapEntries,
    Users,
    AdminAccounts,
    CustomerProfiles,
    VendorProfiles,
    AdminProfiles,
    Permissions,
    Roles,
    AdminRoles,
    Notifications,
    PushSubscriptions,
    OfflineActions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Activate,
    Verify,
    Sync,
}

/// How much of a resource a principal may touch. Ordered: the widest grant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Access {
    Deny,
    /// Only rows owned by the caller.
    Own,
    All,
}

impl Access {
    /// Owner filter for list queries: `None` means every row.
    pub fn owner_filter(self, caller: &User) -> Option<Uuid> {
        match self {
            Access::All => None,
            _ => Some(caller.id),
        }
    }

    /// Whether a row owned by `owner` is visible to `caller`.
    pub fn permits(self, caller: &User, owner: Uuid) -> bool {
        match self {
            Access::All => true,
            Access::Own => caller.id == owner,
            Access::Deny => false,
        }
    }
}

pub fn access(principal: Principal, resource: Resource, action: Action) -> Access {
    use Access::*;
    use Action::*;
    use Principal::*;
    use Resource::*;

    match (principal, resource, action) {
        // Public reads
        (_, Catalog | SeoMetadata, Read) => All,

        // Marketplace administration
        (Admin | Superuser, Catalog, Create | Update | Delete) => All,
        (Admin | Superuser, Permissions | Roles | AdminRoles, Read | Create | Update | Delete) => All,
        (Admin | Superuser, Roles, Activate) => All,
        (Admin | Superuser, SitemapEntries, Read | Create | Update | Delete) => All,
        (Admin | Superuser, Notifications, Create) => All,

        // Account management
        (Staff | Superuser, Users | CustomerProfiles | VendorProfiles | AdminProfiles, Read | Update | Delete) => All,
        (Staff | Superuser, VendorProfiles, Verify) => All,
        (Superuser, Users, Activate) => All,
        (Superuser, AdminAccounts, Create) => All,

        // Self service
        (Customer | Vendor | Admin, Users, Read | Update | Delete) => Own,
        (Customer, CustomerProfiles, Read | Update | Delete) => Own,
        (Vendor, VendorProfiles, Read | Update | Delete) => Own,
        (Admin, AdminProfiles, Read | Update | Delete) => Own,
        (Customer | Vendor | Admin, PushSubscriptions, Read | Create | Delete) => Own,
        (Customer | Vendor | Admin, OfflineActions, Read | Create | Delete | Sync) => Own,

        _ => Deny,
    }
}

pub fn principals(user: Option<&User>) -> Vec<Principal> {
    let Some(user) = user else {
        return vec![Principal::Anonymous];
    };

    let mut principals = vec![match user.user_type {
        UserType::Customer => Principal::Customer,
        UserType::Vendor => Principal::Vendor,
        UserType::Admin => Principal::Admin,
    }];
    if user.is_staff {
        principals.push(Principal::Staff);
    }
    if user.is_superuser {
        principals.push(Principal::Superuser);
    }
    principals
}

/// Widest access any of the caller's principals grants, or the matching rejection.
pub fn authorize(user: Option<&User>, resource: Resource, action: Action) -> Result<Access, AppError> {
    let granted = principals(user)
        .into_iter()
        .map(|p| access(p, resource, action))
        .max()
        .unwrap_or(Access::Deny);

    match (granted, user) {
        (Access::Deny, None) => Err(AppError::NotAuthenticated),
        (Access::Deny, Some(_)) => Err(AppError::Forbidden(
            "You do not have permission to perform this action.".into(),
        )),
        (access, _) => Ok(access),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(user_type: UserType, is_staff: bool, is_superuser: bool) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            mobile: Some("9876543210".into()),
            email: None,
            first_name: String::new(),
            last_name: String::new(),
            user_type,
            is_active: true,
            is_staff,
            is_superuser,
            password_hash: None,
            date_joined: now,
            updated_at: now,
        }
    }

    #[test]
    fn catalog_is_public_to_read_and_admin_only_to_write() {
        assert_eq!(authorize(None, Resource::Catalog, Action::Read).unwrap(), Access::All);
        assert!(matches!(authorize(None, Resource::Catalog, Action::Create), Err(AppError::NotAuthenticated)));

        let customer = user(UserType::Customer, false, false);
        assert!(matches!(
            authorize(Some(&customer), Resource::Catalog, Action::Update),
            Err(AppError::Forbidden(_))
        ));

        let admin = user(UserType::Admin, false, false);
        assert_eq!(authorize(Some(&admin), Resource::Catalog, Action::Delete).unwrap(), Access::All);
    }

    #[test]
    fn ordinary_users_only_see_themselves() {
        let vendor = user(UserType::Vendor, false, false);
        let access = authorize(Some(&vendor), Resource::Users, Action::Read).unwrap();

        assert_eq!(access, Access::Own);
        assert_eq!(access.owner_filter(&vendor), Some(vendor.id));
        assert!(access.permits(&vendor, vendor.id));
        assert!(!access.permits(&vendor, Uuid::new_v4()));
    }

    #[test]
    fn staff_flag_widens_the_users_own_grant() {
        let staff = user(UserType::Customer, true, false);
        let access = authorize(Some(&staff), Resource::Users, Action::Read).unwrap();

        assert_eq!(access, Access::All);
        assert_eq!(access.owner_filter(&staff), None);
    }

    #[test]
    fn vendor_verification_needs_staff_or_superuser() {
        let vendor = user(UserType::Vendor, false, false);
        let admin = user(UserType::Admin, false, false);
        let staff = user(UserType::Admin, true, false);
        let root = user(UserType::Customer, false, true);

        assert!(authorize(Some(&vendor), Resource::VendorProfiles, Action::Verify).is_err());
        assert!(authorize(Some(&admin), Resource::VendorProfiles, Action::Verify).is_err());
        assert!(authorize(Some(&staff), Resource::VendorProfiles, Action::Verify).is_ok());
        assert!(authorize(Some(&root), Resource::VendorProfiles, Action::Verify).is_ok());
    }

    #[test]
    fn only_superusers_manage_accounts() {
        let staff = user(UserType::Admin, true, false);
        let root = user(UserType::Admin, true, true);

        assert!(authorize(Some(&staff), Resource::Users, Action::Activate).is_err());
        assert!(authorize(Some(&staff), Resource::AdminAccounts, Action::Create).is_err());
        assert_eq!(authorize(Some(&root), Resource::Users, Action::Activate).unwrap(), Access::All);
        assert_eq!(authorize(Some(&root), Resource::AdminAccounts, Action::Create).unwrap(), Access::All);
    }

    #[test]
    fn push_and_offline_queues_are_per_user() {
        let customer = user(UserType::Customer, false, false);
        assert_eq!(authorize(Some(&customer), Resource::OfflineActions, Action::Sync).unwrap(), Access::Own);
        assert_eq!(authorize(Some(&customer), Resource::PushSubscriptions, Action::Create).unwrap(), Access::Own);
        assert!(matches!(
            authorize(None, Resource::PushSubscriptions, Action::Read),
            Err(AppError::NotAuthenticated)
        ));
        assert!(authorize(Some(&customer), Resource::Notifications, Action::Create).is_err());
    }
}
