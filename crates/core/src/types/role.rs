//! Staff roles.
//!
//! The set of roles is closed. Role strings coming from the backend are
//! free text (`"Sales"`, `"sales "`, `{"name": "SALES"}`), so parsing is
//! lenient and anything unrecognized becomes `None`, which every permission
//! check treats as least privilege.

use serde::{Deserialize, Deserializer, Serialize};

/// Staff role with a fixed permission profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Business owner. Full access.
    Owner,
    /// Operations manager.
    Manager,
    /// Sales executive handling enquiries, proposals and bookings.
    Sales,
    /// Creative designer working on design tasks.
    Designer,
    /// Field supervisor coordinating fitters.
    Supervisor,
    /// Accounts staff handling rent and contract billing.
    Accountant,
    /// System administrator. Full access.
    Admin,
    /// Field fitter mounting flex on hoardings.
    Fitter,
}

impl Role {
    /// Every role, in display order.
    pub const ALL: [Self; 8] = [
        Self::Owner,
        Self::Manager,
        Self::Sales,
        Self::Designer,
        Self::Supervisor,
        Self::Accountant,
        Self::Admin,
        Self::Fitter,
    ];

    /// Parse a role name, ignoring surrounding whitespace and case.
    ///
    /// Returns `None` for anything outside the fixed role set.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "owner" => Some(Self::Owner),
            "manager" => Some(Self::Manager),
            "sales" => Some(Self::Sales),
            "designer" => Some(Self::Designer),
            "supervisor" => Some(Self::Supervisor),
            "accountant" => Some(Self::Accountant),
            "admin" => Some(Self::Admin),
            "fitter" => Some(Self::Fitter),
            _ => None,
        }
    }

    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Manager => "manager",
            Self::Sales => "sales",
            Self::Designer => "designer",
            Self::Supervisor => "supervisor",
            Self::Accountant => "accountant",
            Self::Admin => "admin",
            Self::Fitter => "fitter",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Owner => "Owner",
            Self::Manager => "Manager",
            Self::Sales => "Sales",
            Self::Designer => "Designer",
            Self::Supervisor => "Supervisor",
            Self::Accountant => "Accountant",
            Self::Admin => "Admin",
            Self::Fitter => "Fitter",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid role: {s}"))
    }
}

/// Deserialize a role leniently for use with `#[serde(deserialize_with)]`.
///
/// Accepts a role name, an object carrying `name` or `role`, or null.
/// Unknown names and unexpected shapes become `None` instead of failing
/// the surrounding record.
///
/// # Errors
///
/// Only fails when the underlying deserializer itself fails.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(role_from_value(&raw))
}

/// Resolve a role from an arbitrary JSON value.
#[must_use]
pub fn role_from_value(value: &serde_json::Value) -> Option<Role> {
    match value {
        serde_json::Value::String(name) => Role::parse(name),
        serde_json::Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("role"))
            .and_then(role_from_value),
        _ => None,
    }
}
