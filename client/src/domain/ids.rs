//! Record identifiers shared by the auth service and the data tables.
//!
//! Every table keys its rows by UUID, so each identifier wraps a [`Uuid`] and
//! serialises as its hyphenated string form.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned when parsing an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdValidationError {
    /// The input was empty.
    Empty {
        /// Kind of identifier being parsed.
        kind: &'static str,
    },
    /// The input was not a UUID.
    Invalid {
        /// Kind of identifier being parsed.
        kind: &'static str,
    },
}

impl fmt::Display for IdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { kind } => write!(f, "{kind} id must not be empty"),
            Self::Invalid { kind } => write!(f, "{kind} id must be a valid UUID"),
        }
    }
}

impl std::error::Error for IdValidationError {}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Validate and construct the identifier from its string form.
            pub fn new(id: impl AsRef<str>) -> Result<Self, IdValidationError> {
                let raw = id.as_ref();
                if raw.trim().is_empty() {
                    return Err(IdValidationError::Empty { kind: $kind });
                }
                Uuid::parse_str(raw.trim())
                    .map(Self)
                    .map_err(|_| IdValidationError::Invalid { kind: $kind })
            }

            /// Generate a new random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an already parsed UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0.hyphenated(), f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdValidationError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Self::new(value)
            }
        }
    };
}

define_id!(
    /// Auth-service user identifier, also the primary key of `profiles`.
    UserId,
    "user"
);
define_id!(
    /// Primary key of `projects`; doubles as the invite code.
    ProjectId,
    "project"
);
define_id!(
    /// Primary key of `todos`.
    TaskId,
    "task"
);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const VALID_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    #[rstest]
    #[case("", IdValidationError::Empty { kind: "user" })]
    #[case("   ", IdValidationError::Empty { kind: "user" })]
    #[case("not-a-uuid", IdValidationError::Invalid { kind: "user" })]
    fn rejects_malformed_user_ids(#[case] raw: &str, #[case] expected: IdValidationError) {
        let err = UserId::new(raw).expect_err("malformed ids must fail");
        assert_eq!(err, expected);
    }

    #[test]
    fn accepts_surrounding_whitespace() {
        let id = ProjectId::new(format!("  {VALID_ID} ")).expect("padded id parses");
        assert_eq!(id.to_string(), VALID_ID);
    }

    #[test]
    fn serialises_as_plain_string() {
        let id = TaskId::new(VALID_ID).expect("valid id");
        let json = serde_json::to_value(id).expect("serialise");
        assert_eq!(json, serde_json::json!(VALID_ID));
        let back: TaskId = serde_json::from_value(json).expect("deserialise");
        assert_eq!(back, id);
    }
}
