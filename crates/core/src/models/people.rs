//! Clients, enquiries, staff users and role records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{NOT_AVAILABLE, Owned, Record, lenient};
use crate::types::role::deserialize_lenient;
use crate::types::{ClientId, EnquiryId, Role, RoleId, UserId};

/// An advertiser renting hoardings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Client {
    #[serde(deserialize_with = "lenient::value")]
    pub id: Option<ClientId>,
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub company: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub gst: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Client {
    const COLLECTION_KEY: &'static str = "clients";
    const RECORD_KEY: &'static str = "client";
    const ALIASES: &'static [(&'static str, &'static str)] =
        &[("companyName", "company"), ("gstNumber", "gst")];
}

impl Client {
    /// `Company (Name)`, or whichever of the two is present.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.company.as_deref(), self.name.as_deref()) {
            (Some(company), Some(name)) if company != name => format!("{company} ({name})"),
            (Some(company), _) => company.to_owned(),
            (None, Some(name)) => name.to_owned(),
            (None, None) => "Unnamed client".to_owned(),
        }
    }
}

/// An inbound request for hoarding availability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Enquiry {
    #[serde(deserialize_with = "lenient::value")]
    pub id: Option<EnquiryId>,
    #[serde(deserialize_with = "lenient::text")]
    pub client_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub requirement: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::value")]
    pub assigned_to: Option<UserId>,
    #[serde(deserialize_with = "lenient::value")]
    pub created_by: Option<UserId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Enquiry {
    const COLLECTION_KEY: &'static str = "enquiries";
    const RECORD_KEY: &'static str = "enquiry";
}

impl Owned for Enquiry {
    fn owners(&self) -> Vec<&UserId> {
        self.created_by.iter().chain(&self.assigned_to).collect()
    }
}

impl Enquiry {
    #[must_use]
    pub fn status_label(&self) -> &str {
        self.status.as_deref().unwrap_or("new")
    }
}

/// A staff user as listed on the admin settings page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    #[serde(deserialize_with = "lenient::value")]
    pub id: Option<UserId>,
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient")]
    pub role: Option<Role>,
    #[serde(deserialize_with = "lenient::flag")]
    pub active: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for User {
    const COLLECTION_KEY: &'static str = "users";
    const RECORD_KEY: &'static str = "user";
    const ALIASES: &'static [(&'static str, &'static str)] = &[("isActive", "active")];
}

impl User {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(NOT_AVAILABLE)
    }

    #[must_use]
    pub fn role_label(&self) -> &str {
        self.role.as_ref().map_or("No role", Role::label)
    }

    /// Users are active unless the backend says otherwise.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }
}

/// A role record as managed by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleRecord {
    #[serde(deserialize_with = "lenient::value")]
    pub id: Option<RoleId>,
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for RoleRecord {
    const COLLECTION_KEY: &'static str = "roles";
    const RECORD_KEY: &'static str = "role";
}

impl RoleRecord {
    /// The fixed role this record corresponds to, if any.
    #[must_use]
    pub fn known_role(&self) -> Option<Role> {
        self.name.as_deref().and_then(Role::parse)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_client_display_name() {
        let both = Client {
            name: Some("Ravi".to_string()),
            company: Some("Acme Ads".to_string()),
            ..Client::default()
        };
        assert_eq!(both.display_name(), "Acme Ads (Ravi)");
        assert_eq!(Client::default().display_name(), "Unnamed client");
    }

    #[test]
    fn test_user_with_unknown_role_still_decodes() {
        let user = User::decode(json!({"_id": "u1", "name": "Asha", "role": "intern"})).unwrap();
        assert_eq!(user.role, None);
        assert_eq!(user.role_label(), "No role");
        assert!(user.is_active());
    }

    #[test]
    fn test_user_role_object() {
        let user = User::decode(json!({"role": {"name": "Supervisor"}, "isActive": "false"})).unwrap();
        assert_eq!(user.role, Some(Role::Supervisor));
        assert!(!user.is_active());
    }

    #[test]
    fn test_enquiry_owners() {
        let enquiry = Enquiry {
            created_by: Some(UserId::new("u1")),
            assigned_to: Some(UserId::new("u2")),
            ..Enquiry::default()
        };
        assert!(enquiry.is_owned_by(&UserId::new("u2")));
        assert!(!enquiry.is_owned_by(&UserId::new("u3")));
        assert_eq!(enquiry.status_label(), "new");
    }

    #[test]
    fn test_role_record() {
        let record = RoleRecord::decode(json!({"name": "Fitter"})).unwrap();
        assert_eq!(record.known_role(), Some(Role::Fitter));
    }
}
