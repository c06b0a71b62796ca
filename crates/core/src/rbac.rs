//! Role-based visibility rules.
//!
//! A static table maps each `(Role, Resource)` pair to the set of
//! [`Action`]s that role may perform, plus a handful of role-wide
//! [`Capability`] flags. Both tables are exhaustive `match`es over closed
//! enums, so a new role or resource does not compile until its row exists.
//!
//! Every check takes `Option<Role>`: a session whose role string did not
//! parse is treated as least privilege and every check returns `false`.
//!
//! These rules only decide which affordances and routes are shown. The
//! backend enforces permissions on its own; nothing here is a security
//! boundary.

use serde::{Deserialize, Serialize};

use crate::types::Role;

/// A resource (feature area) guarded by the permission table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    Hoardings,
    Bookings,
    BookingTokens,
    Contracts,
    Proposals,
    Enquiries,
    Clients,
    Users,
    Roles,
    Notifications,
    Tasks,
    Rent,
    LocationCheckIns,
}

impl Resource {
    /// Every resource, in navigation order.
    pub const ALL: [Self; 13] = [
        Self::Hoardings,
        Self::Bookings,
        Self::BookingTokens,
        Self::Contracts,
        Self::Proposals,
        Self::Enquiries,
        Self::Clients,
        Self::Users,
        Self::Roles,
        Self::Notifications,
        Self::Tasks,
        Self::Rent,
        Self::LocationCheckIns,
    ];

    /// Parse a resource name.
    ///
    /// Case, `-`, `_` and spaces are ignored, so `booking-tokens`,
    /// `bookingTokens` and `BOOKING_TOKENS` all resolve to the same value.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match fold(name).as_str() {
            "hoardings" | "hoarding" => Some(Self::Hoardings),
            "bookings" | "booking" => Some(Self::Bookings),
            "bookingtokens" | "bookingtoken" | "tokens" => Some(Self::BookingTokens),
            "contracts" | "contract" => Some(Self::Contracts),
            "proposals" | "proposal" => Some(Self::Proposals),
            "enquiries" | "enquiry" => Some(Self::Enquiries),
            "clients" | "client" => Some(Self::Clients),
            "users" | "user" => Some(Self::Users),
            "roles" | "role" => Some(Self::Roles),
            "notifications" | "notification" => Some(Self::Notifications),
            "tasks" | "task" => Some(Self::Tasks),
            "rent" | "rents" => Some(Self::Rent),
            "locationcheckins" | "location" | "checkins" => Some(Self::LocationCheckIns),
            _ => None,
        }
    }

    /// Canonical name, matching the serde representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hoardings => "hoardings",
            Self::Bookings => "bookings",
            Self::BookingTokens => "bookingTokens",
            Self::Contracts => "contracts",
            Self::Proposals => "proposals",
            Self::Enquiries => "enquiries",
            Self::Clients => "clients",
            Self::Users => "users",
            Self::Roles => "roles",
            Self::Notifications => "notifications",
            Self::Tasks => "tasks",
            Self::Rent => "rent",
            Self::LocationCheckIns => "locationCheckIns",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-resource action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    /// Update only records the user created or is assigned to.
    EditOwn,
}

impl Action {
    /// Parse an action name, ignoring case, `-` and `_`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match fold(name).as_str() {
            "create" => Some(Self::Create),
            "read" | "view" => Some(Self::Read),
            "update" | "edit" => Some(Self::Update),
            "delete" | "remove" => Some(Self::Delete),
            "editown" => Some(Self::EditOwn),
            _ => None,
        }
    }
}

/// A role-wide capability not tied to a single resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    AssignTasks,
    ViewRent,
    AccessLocationTracking,
    AccessAdminSettings,
}

impl Capability {
    /// Parse a capability name, ignoring case, `-` and `_`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match fold(name).as_str() {
            "assigntasks" => Some(Self::AssignTasks),
            "viewrent" => Some(Self::ViewRent),
            "accesslocationtracking" | "locationtracking" => Some(Self::AccessLocationTracking),
            "accessadminsettings" | "adminsettings" => Some(Self::AccessAdminSettings),
            _ => None,
        }
    }
}

fn fold(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .collect::<String>()
        .to_ascii_lowercase()
}

use Action::{Create, Delete, EditOwn, Read, Update};

const NONE: &[Action] = &[];
const FULL: &[Action] = &[Create, Read, Update, Delete, EditOwn];
const READ_ONLY: &[Action] = &[Read];
const ACKNOWLEDGE: &[Action] = &[Read, Update];
const AUTHOR: &[Action] = &[Create, Read, EditOwn];
const OWN_WORK: &[Action] = &[Read, EditOwn];
const FIELD_LOG: &[Action] = &[Create, Read, EditOwn];

/// Actions `role` may perform on `resource`.
#[must_use]
pub const fn allowed_actions(role: Role, resource: Resource) -> &'static [Action] {
    use Resource as R;

    match role {
        Role::Owner | Role::Admin => FULL,
        Role::Manager => match resource {
            R::Hoardings
            | R::Bookings
            | R::BookingTokens
            | R::Contracts
            | R::Proposals
            | R::Enquiries
            | R::Clients
            | R::Tasks => FULL,
            R::LocationCheckIns => READ_ONLY,
            R::Notifications => ACKNOWLEDGE,
            R::Rent => &[Create, Read, Update],
            R::Users | R::Roles => NONE,
        },
        Role::Sales => match resource {
            R::Hoardings | R::Tasks => READ_ONLY,
            R::Bookings | R::BookingTokens | R::Proposals | R::Enquiries => AUTHOR,
            R::Contracts => &[Create, Read, EditOwn],
            R::Clients => &[Create, Read, Update],
            R::Notifications => ACKNOWLEDGE,
            R::LocationCheckIns => FIELD_LOG,
            R::Users | R::Roles | R::Rent => NONE,
        },
        Role::Designer => match resource {
            R::Hoardings | R::Bookings | R::Proposals => READ_ONLY,
            R::Tasks => OWN_WORK,
            R::Notifications => ACKNOWLEDGE,
            R::BookingTokens
            | R::Contracts
            | R::Enquiries
            | R::Clients
            | R::Users
            | R::Roles
            | R::Rent
            | R::LocationCheckIns => NONE,
        },
        Role::Supervisor => match resource {
            R::Hoardings => &[Read, Update],
            R::Bookings | R::Contracts => READ_ONLY,
            R::Tasks => &[Create, Read, Update, EditOwn],
            R::LocationCheckIns => FIELD_LOG,
            R::Notifications => ACKNOWLEDGE,
            R::BookingTokens
            | R::Proposals
            | R::Enquiries
            | R::Clients
            | R::Users
            | R::Roles
            | R::Rent => NONE,
        },
        Role::Accountant => match resource {
            R::Hoardings | R::Bookings | R::Proposals | R::Clients => READ_ONLY,
            R::Contracts => &[Read, Update],
            R::Rent => &[Create, Read, Update],
            R::Notifications => ACKNOWLEDGE,
            R::BookingTokens
            | R::Enquiries
            | R::Users
            | R::Roles
            | R::Tasks
            | R::LocationCheckIns => NONE,
        },
        Role::Fitter => match resource {
            R::Hoardings => READ_ONLY,
            R::Tasks => OWN_WORK,
            R::LocationCheckIns => FIELD_LOG,
            R::Notifications => ACKNOWLEDGE,
            R::Bookings
            | R::BookingTokens
            | R::Contracts
            | R::Proposals
            | R::Enquiries
            | R::Clients
            | R::Users
            | R::Roles
            | R::Rent => NONE,
        },
    }
}

/// Whether `role` holds the role-wide `capability`.
#[must_use]
pub const fn grants(role: Role, capability: Capability) -> bool {
    match capability {
        Capability::AssignTasks | Capability::AccessLocationTracking => matches!(
            role,
            Role::Owner | Role::Admin | Role::Manager | Role::Supervisor
        ),
        Capability::ViewRent => matches!(
            role,
            Role::Owner | Role::Admin | Role::Manager | Role::Accountant
        ),
        Capability::AccessAdminSettings => matches!(role, Role::Owner | Role::Admin),
    }
}

/// Whether `role` may perform `action` on `resource`.
///
/// `None` (missing or unrecognized role) is always denied.
#[must_use]
pub fn can(role: Option<Role>, resource: Resource, action: Action) -> bool {
    role.is_some_and(|role| allowed_actions(role, resource).contains(&action))
}

/// Whether `role` holds `capability`. `None` is always denied.
#[must_use]
pub fn has_capability(role: Option<Role>, capability: Capability) -> bool {
    role.is_some_and(|role| grants(role, capability))
}

/// Whether `role` may create `resource` records.
#[must_use]
pub fn can_create(role: Option<Role>, resource: Resource) -> bool {
    can(role, resource, Action::Create)
}

/// Whether `role` may list and view `resource` records.
#[must_use]
pub fn can_read(role: Option<Role>, resource: Resource) -> bool {
    can(role, resource, Action::Read)
}

/// Whether `role` may update any `resource` record.
#[must_use]
pub fn can_update(role: Option<Role>, resource: Resource) -> bool {
    can(role, resource, Action::Update)
}

/// Whether `role` may delete `resource` records.
#[must_use]
pub fn can_delete(role: Option<Role>, resource: Resource) -> bool {
    can(role, resource, Action::Delete)
}

/// Whether `role` may update `resource` records it owns.
#[must_use]
pub fn can_edit_own(role: Option<Role>, resource: Resource) -> bool {
    can(role, resource, Action::EditOwn)
}

/// Whether `role` may modify a specific record, given whether the current
/// user owns (created or is assigned to) it.
#[must_use]
pub fn can_modify(role: Option<Role>, resource: Resource, is_owner: bool) -> bool {
    can_update(role, resource) || (is_owner && can_edit_own(role, resource))
}

#[must_use]
pub fn can_assign_tasks(role: Option<Role>) -> bool {
    has_capability(role, Capability::AssignTasks)
}

#[must_use]
pub fn can_view_rent(role: Option<Role>) -> bool {
    has_capability(role, Capability::ViewRent)
}

#[must_use]
pub fn can_access_location_tracking(role: Option<Role>) -> bool {
    has_capability(role, Capability::AccessLocationTracking)
}

#[must_use]
pub fn can_access_admin_settings(role: Option<Role>) -> bool {
    has_capability(role, Capability::AccessAdminSettings)
}

/// Check a permission given as free-text names.
///
/// `permission` is either an [`Action`] name (checked against `resource`)
/// or a [`Capability`] name (where `resource` is ignored). Any name that
/// does not parse denies.
#[must_use]
pub fn check_names(role: &str, resource: &str, permission: &str) -> bool {
    let role = Role::parse(role);
    if let Some(capability) = Capability::parse(permission) {
        return has_capability(role, capability);
    }
    match (Resource::parse(resource), Action::parse(permission)) {
        (Some(resource), Some(action)) => can(role, resource, action),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIONS: [Action; 5] = [Create, Read, Update, Delete, EditOwn];

    fn sales() -> Option<Role> {
        Role::parse("sales")
    }

    /// Columns follow `Role::ALL`: owner, manager, sales, designer,
    /// supervisor, accountant, admin, fitter.
    const TABLE: [(Resource, [&str; 8]); 13] = [
        (Resource::Hoardings, ["CRUDE", "CRUDE", "R", "R", "RU", "R", "CRUDE", "R"]),
        (Resource::Bookings, ["CRUDE", "CRUDE", "CRE", "R", "R", "R", "CRUDE", ""]),
        (Resource::BookingTokens, ["CRUDE", "CRUDE", "CRE", "", "", "", "CRUDE", ""]),
        (Resource::Contracts, ["CRUDE", "CRUDE", "CRE", "", "R", "RU", "CRUDE", ""]),
        (Resource::Proposals, ["CRUDE", "CRUDE", "CRE", "R", "", "R", "CRUDE", ""]),
        (Resource::Enquiries, ["CRUDE", "CRUDE", "CRE", "", "", "", "CRUDE", ""]),
        (Resource::Clients, ["CRUDE", "CRUDE", "CRU", "", "", "R", "CRUDE", ""]),
        (Resource::Users, ["CRUDE", "", "", "", "", "", "CRUDE", ""]),
        (Resource::Roles, ["CRUDE", "", "", "", "", "", "CRUDE", ""]),
        (Resource::Notifications, ["CRUDE", "RU", "RU", "RU", "RU", "RU", "CRUDE", "RU"]),
        (Resource::Tasks, ["CRUDE", "CRUDE", "R", "RE", "CRUE", "", "CRUDE", "RE"]),
        (Resource::Rent, ["CRUDE", "CRU", "", "", "", "CRU", "CRUDE", ""]),
        (Resource::LocationCheckIns, ["CRUDE", "R", "CRE", "", "CRE", "", "CRUDE", "CRE"]),
    ];

    const fn letter(action: Action) -> char {
        match action {
            Create => 'C',
            Read => 'R',
            Update => 'U',
            Delete => 'D',
            EditOwn => 'E',
        }
    }

    #[test]
    fn test_permission_table() {
        for (resource, row) in TABLE {
            for (role, granted) in Role::ALL.into_iter().zip(row) {
                for action in ACTIONS {
                    assert_eq!(
                        can(Some(role), resource, action),
                        granted.contains(letter(action)),
                        "{role} {resource} {action:?}"
                    );
                    assert_eq!(
                        check_names(role.label(), resource.as_str(), &format!("{action:?}")),
                        granted.contains(letter(action)),
                        "{role} {resource} {action:?} by name"
                    );
                }
            }
        }
        let covered: Vec<Resource> = TABLE.iter().map(|(resource, _)| *resource).collect();
        assert_eq!(covered, Resource::ALL);
    }

    #[test]
    fn test_sales_can_create_bookings() {
        assert!(can_create(sales(), Resource::Bookings));
        assert!(check_names("sales", "bookings", "create"));
    }

    #[test]
    fn test_designer_cannot_create_bookings() {
        assert!(!can_create(Some(Role::Designer), Resource::Bookings));
        assert!(can_read(Some(Role::Designer), Resource::Bookings));
    }

    #[test]
    fn test_role_names_are_case_folded() {
        for name in ["SALES", "Sales", " sales "] {
            assert!(check_names(name, "bookings", "create"), "{name}");
        }
    }

    #[test]
    fn test_unknown_role_denies_everything() {
        for resource in Resource::ALL {
            for action in ACTIONS {
                assert!(!can(None, resource, action));
                assert!(!check_names("intern", resource.as_str(), "read"));
            }
        }
        assert!(!can_assign_tasks(None));
        assert!(!can_view_rent(None));
        assert!(!can_access_location_tracking(None));
        assert!(!can_access_admin_settings(None));
        assert!(!check_names("", "", "viewRent"));
    }

    #[test]
    fn test_owner_and_admin_have_full_access() {
        for role in [Role::Owner, Role::Admin] {
            for resource in Resource::ALL {
                for action in ACTIONS {
                    assert!(can(Some(role), resource, action), "{role} {resource}");
                }
            }
            assert!(can_access_admin_settings(Some(role)));
            assert!(can_view_rent(Some(role)));
        }
    }

    #[test]
    fn test_every_role_can_read_notifications() {
        for role in Role::ALL {
            assert!(can_read(Some(role), Resource::Notifications));
            assert!(can_update(Some(role), Resource::Notifications));
        }
    }

    #[test]
    fn test_capability_table() {
        let expect = |capability: Capability, allowed: &[Role]| {
            for role in Role::ALL {
                assert_eq!(
                    grants(role, capability),
                    allowed.contains(&role),
                    "{role} {capability:?}"
                );
            }
        };

        expect(
            Capability::AssignTasks,
            &[Role::Owner, Role::Admin, Role::Manager, Role::Supervisor],
        );
        expect(
            Capability::AccessLocationTracking,
            &[Role::Owner, Role::Admin, Role::Manager, Role::Supervisor],
        );
        expect(
            Capability::ViewRent,
            &[Role::Owner, Role::Admin, Role::Manager, Role::Accountant],
        );
        expect(Capability::AccessAdminSettings, &[Role::Owner, Role::Admin]);
    }

    #[test]
    fn test_admin_resources_restricted() {
        for role in Role::ALL {
            let admin = can_access_admin_settings(Some(role));
            for resource in [Resource::Users, Resource::Roles] {
                assert_eq!(can_read(Some(role), resource), admin, "{role} {resource}");
            }
        }
    }

    #[test]
    fn test_edit_own_without_update() {
        assert!(!can_update(Some(Role::Fitter), Resource::Tasks));
        assert!(can_edit_own(Some(Role::Fitter), Resource::Tasks));
        assert!(can_modify(Some(Role::Fitter), Resource::Tasks, true));
        assert!(!can_modify(Some(Role::Fitter), Resource::Tasks, false));
        assert!(can_modify(Some(Role::Supervisor), Resource::Tasks, false));
    }

    #[test]
    fn test_sales_edit_only_their_own_deals() {
        for resource in [Resource::Bookings, Resource::BookingTokens, Resource::Proposals] {
            assert!(!can_update(sales(), resource), "{resource}");
            assert!(can_modify(sales(), resource, true), "{resource}");
            assert!(!can_modify(sales(), resource, false), "{resource}");
        }
        assert!(can_update(sales(), Resource::Clients));
    }

    #[test]
    fn test_rent_visibility() {
        assert!(can_read(Some(Role::Accountant), Resource::Rent));
        assert!(!can_read(Some(Role::Sales), Resource::Rent));
        assert!(!can_delete(Some(Role::Manager), Resource::Rent));
    }

    #[test]
    fn test_resource_parse_aliases() {
        assert_eq!(Resource::parse("booking-tokens"), Some(Resource::BookingTokens));
        assert_eq!(Resource::parse("BOOKING_TOKENS"), Some(Resource::BookingTokens));
        assert_eq!(Resource::parse("location"), Some(Resource::LocationCheckIns));
        assert_eq!(Resource::parse("billboards"), None);
        for resource in Resource::ALL {
            assert_eq!(Resource::parse(resource.as_str()), Some(resource));
        }
    }

    #[test]
    fn test_check_names_capabilities() {
        assert!(check_names("accountant", "", "viewRent"));
        assert!(check_names("Supervisor", "ignored", "assign_tasks"));
        assert!(!check_names("fitter", "", "accessLocationTracking"));
        assert!(!check_names("sales", "bookings", "approve"));
    }
}
