//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.
//!
//! The backend hands out ids as strings on most endpoints, as integers on a
//! few older ones, and as populated objects (`{"_id": "...", ...}`) where a
//! reference was expanded server-side. Every id deserializes from all three
//! and is stored as a string.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize` as a plain JSON string
/// - `Deserialize` from a JSON string, integer, or object carrying `id`/`_id`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Display`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<&str>` and `From<String>` implementations
///
/// # Example
///
/// ```rust
/// # use hoarding_core::define_id;
/// define_id!(SiteId);
/// define_id!(PosterId);
///
/// let site_id = SiteId::new("h1");
/// let poster_id = PosterId::new("h1");
///
/// // These are different types, so this won't compile:
/// // let _: SiteId = poster_id;
/// # let _ = (site_id, poster_id);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ::serde::Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                #[derive(::serde::Deserialize)]
                #[serde(untagged)]
                enum Raw {
                    Text(String),
                    Signed(i64),
                    Unsigned(u64),
                    Populated {
                        #[serde(alias = "_id")]
                        id: Box<Raw>,
                    },
                }

                fn flatten(raw: Raw) -> String {
                    match raw {
                        Raw::Text(s) => s,
                        Raw::Signed(n) => n.to_string(),
                        Raw::Unsigned(n) => n.to_string(),
                        Raw::Populated { id } => flatten(*id),
                    }
                }

                Raw::deserialize(deserializer).map(|raw| Self(flatten(raw)))
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(HoardingId);
define_id!(BookingId);
define_id!(BookingTokenId);
define_id!(ContractId);
define_id!(ProposalId);
define_id!(ClientId);
define_id!(EnquiryId);
define_id!(NotificationId);
define_id!(CheckInId);
define_id!(RentRecordId);
define_id!(TaskId);
define_id!(RoleId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_string() {
        let id: HoardingId = serde_json::from_str("\"h1\"").unwrap();
        assert_eq!(id.as_str(), "h1");
    }

    #[test]
    fn test_deserialize_from_integer() {
        let id: BookingId = serde_json::from_str("42").unwrap();
        assert_eq!(id, BookingId::new("42"));
    }

    #[test]
    fn test_serializes_as_string() {
        let id = ContractId::new("c-9");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"c-9\"");
    }

    #[test]
    fn test_deserialize_from_populated_reference() {
        let id: HoardingId =
            serde_json::from_str(r#"{"_id": "h7", "title": "Station Road"}"#).unwrap();
        assert_eq!(id.as_str(), "h7");
    }

    #[test]
    fn test_rejects_other_shapes() {
        assert!(serde_json::from_str::<UserId>("true").is_err());
        assert!(serde_json::from_str::<UserId>(r#"{"name": "x"}"#).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(NotificationId::from("n1").to_string(), "n1");
    }
}
