use crate::{
    api::models::users::{CurrentUser, Role},
    errors::Error,
    types::{Operation, Resource, UserId},
    AppState,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

pub mod resource {
    use crate::types::Resource;

    // Resource types
    #[derive(Default)]
    pub struct Users;

    #[derive(Default)]
    pub struct Products;

    #[derive(Default)]
    pub struct TopUps;

    #[derive(Default)]
    pub struct Purchases;

    #[derive(Default)]
    pub struct Tickets;

    #[derive(Default)]
    pub struct BlogPosts;

    // Convert type-level markers to enum values using Into
    impl From<Users> for Resource {
        fn from(_: Users) -> Resource {
            Resource::Users
        }
    }
    impl From<Products> for Resource {
        fn from(_: Products) -> Resource {
            Resource::Products
        }
    }
    impl From<TopUps> for Resource {
        fn from(_: TopUps) -> Resource {
            Resource::TopUps
        }
    }
    impl From<Purchases> for Resource {
        fn from(_: Purchases) -> Resource {
            Resource::Purchases
        }
    }
    impl From<Tickets> for Resource {
        fn from(_: Tickets) -> Resource {
            Resource::Tickets
        }
    }
    impl From<BlogPosts> for Resource {
        fn from(_: BlogPosts) -> Resource {
            Resource::BlogPosts
        }
    }
}

pub mod operation {
    use crate::types::Operation;

    // Operation types
    #[derive(Default)]
    pub struct CreateAll;

    #[derive(Default)]
    pub struct CreateOwn;

    #[derive(Default)]
    pub struct ReadAll;

    #[derive(Default)]
    pub struct ReadOwn;

    #[derive(Default)]
    pub struct UpdateAll;

    impl From<CreateAll> for Operation {
        fn from(_: CreateAll) -> Operation {
            Operation::CreateAll
        }
    }
    impl From<CreateOwn> for Operation {
        fn from(_: CreateOwn) -> Operation {
            Operation::CreateOwn
        }
    }
    impl From<ReadAll> for Operation {
        fn from(_: ReadAll) -> Operation {
            Operation::ReadAll
        }
    }
    impl From<ReadOwn> for Operation {
        fn from(_: ReadOwn) -> Operation {
            Operation::ReadOwn
        }
    }
    impl From<UpdateAll> for Operation {
        fn from(_: UpdateAll) -> Operation {
            Operation::UpdateAll
        }
    }
}

pub struct RequiresPermission<R, O>
where
    R: Into<Resource> + Default,
    O: Into<Operation> + Default,
{
    pub current_user: CurrentUser,
    _marker: PhantomData<(R, O)>,
}

impl<R, O> FromRequestParts<AppState> for RequiresPermission<R, O>
where
    R: Into<Resource> + Default,
    O: Into<Operation> + Default,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let current_user = CurrentUser::from_request_parts(parts, state).await?;

        // Convert the types to enum values using Default + Into
        let resource = R::default().into();
        let operation = O::default().into();

        if has_permission(&current_user, resource, operation) {
            Ok(RequiresPermission {
                current_user,
                _marker: PhantomData,
            })
        } else {
            Err(Error::InsufficientPermissions {
                required: crate::types::Permission::Allow(resource, operation),
                action: operation,
                resource: format!("{resource:?}"),
            })
        }
    }
}

// Implement Deref so RequiresPermission<R, O> behaves like CurrentUser
impl<R, O> std::ops::Deref for RequiresPermission<R, O>
where
    R: Into<Resource> + Default,
    O: Into<Operation> + Default,
{
    type Target = CurrentUser;

    fn deref(&self) -> &Self::Target {
        &self.current_user
    }
}

/// Check if a user has permission to perform an operation on a resource
pub fn has_permission(user: &CurrentUser, resource: Resource, operation: Operation) -> bool {
    role_has_permission(&user.role(), resource, operation)
}

/// Check if a role grants permission for a resource/operation
pub fn role_has_permission(role: &Role, resource: Resource, operation: Operation) -> bool {
    match role {
        // Admins manage the catalog, review top-ups and publish the blog
        Role::Admin => true,
        Role::Customer => {
            matches!(
                (resource, operation),
                (Resource::Users, Operation::ReadOwn)
                    | (Resource::Products, Operation::ReadAll)
                    | (Resource::TopUps, Operation::CreateOwn)
                    | (Resource::TopUps, Operation::ReadOwn)
                    | (Resource::Purchases, Operation::CreateOwn)
                    | (Resource::Purchases, Operation::ReadOwn)
                    | (Resource::Tickets, Operation::CreateOwn)
                    | (Resource::Tickets, Operation::ReadOwn)
                    | (Resource::BlogPosts, Operation::ReadAll)
            )
        }
    }
}

/// Generic helper to check if user can perform an operation on their own resources
/// (combines ID matching and Own permission check)
fn can_perform_own_operation(user: &CurrentUser, resource: Resource, operation: Operation, target_user_id: UserId) -> bool {
    user.id == target_user_id && has_permission(user, resource, operation)
}

fn can_perform_all_operation(user: &CurrentUser, resource: Resource, operation: Operation) -> bool {
    has_permission(user, resource, operation)
}

// Macro to generate convenience functions for each operation type
macro_rules! generate_permission_helpers {
    ($operation_name:ident, $all_operation:expr, $own_operation:expr) => {
        paste::paste! {
            /// Check if user can [<$operation_name:lower>] their own resources (combines ID matching and [<$operation_name>]Own permission)
            pub fn [<can_ $operation_name:lower _own_resource>](user: &CurrentUser, resource: Resource, target_user_id: UserId) -> bool {
                can_perform_own_operation(user, resource, $own_operation, target_user_id)
            }

            /// Check if user can [<$operation_name:lower>] all resources of a type (admin-level access)
            pub fn [<can_ $operation_name:lower _all_resources>](user: &CurrentUser, resource: Resource) -> bool {
                can_perform_all_operation(user, resource, $all_operation)
            }
        }
    };
}

// i.e can_read_own_resource, can_read_all_resources
generate_permission_helpers!(read, Operation::ReadAll, Operation::ReadOwn);

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn create_user(is_admin: bool) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            username: "test".to_string(),
            email: "test@example.com".to_string(),
            is_admin,
        }
    }

    #[test]
    fn test_admin_has_everything() {
        let admin = create_user(true);

        assert!(has_permission(&admin, Resource::Products, Operation::CreateAll));
        assert!(has_permission(&admin, Resource::TopUps, Operation::UpdateAll));
        assert!(has_permission(&admin, Resource::TopUps, Operation::ReadAll));
        assert!(has_permission(&admin, Resource::BlogPosts, Operation::CreateAll));
        assert!(has_permission(&admin, Resource::Users, Operation::ReadAll));
    }

    #[test]
    fn test_customer_allow_list() {
        let customer = create_user(false);

        assert!(has_permission(&customer, Resource::Users, Operation::ReadOwn));
        assert!(has_permission(&customer, Resource::TopUps, Operation::CreateOwn));
        assert!(has_permission(&customer, Resource::Purchases, Operation::CreateOwn));
        assert!(has_permission(&customer, Resource::Tickets, Operation::ReadOwn));
        assert!(has_permission(&customer, Resource::BlogPosts, Operation::ReadAll));

        // Admin-only operations
        assert!(!has_permission(&customer, Resource::Products, Operation::CreateAll));
        assert!(!has_permission(&customer, Resource::Products, Operation::UpdateAll));
        assert!(!has_permission(&customer, Resource::TopUps, Operation::ReadAll));
        assert!(!has_permission(&customer, Resource::TopUps, Operation::UpdateAll));
        assert!(!has_permission(&customer, Resource::BlogPosts, Operation::CreateAll));
        assert!(!has_permission(&customer, Resource::Users, Operation::ReadAll));
        assert!(!has_permission(&customer, Resource::Tickets, Operation::ReadAll));
    }

    #[test]
    fn test_permission_helpers() {
        let user = create_user(false);
        let other_id = Uuid::new_v4();

        assert!(can_read_own_resource(&user, Resource::Purchases, user.id));
        assert!(!can_read_own_resource(&user, Resource::Purchases, other_id));
        assert!(!can_read_all_resources(&user, Resource::Purchases));

        let admin = create_user(true);
        assert!(can_read_all_resources(&admin, Resource::Purchases));
    }

    #[test]
    fn test_requires_permission_deref() {
        let user = create_user(false);
        let requires_permission = RequiresPermission::<resource::Purchases, operation::CreateOwn> {
            current_user: user.clone(),
            _marker: PhantomData,
        };

        assert_eq!(requires_permission.id, user.id);
        assert_eq!(requires_permission.username, user.username);
        assert_eq!(requires_permission.is_admin, user.is_admin);
    }
}
