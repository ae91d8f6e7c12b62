//! Strongly typed entity identifiers.
//!
//! Every aggregate is keyed by a UUID; wrapping each in its own type keeps a
//! `ClientId` from being passed where a `ProductId` is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raised when a string cannot be parsed into an identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} must be a valid UUID")]
pub struct IdParseError {
    kind: &'static str,
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse the canonical hyphenated form.
            pub fn parse(raw: &str) -> Result<Self, IdParseError> {
                Uuid::parse_str(raw.trim())
                    .map(Self)
                    .map_err(|_| IdParseError { kind: $label })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Tenant boundary identifier.
    OrganizationId,
    "organization id"
);
define_id!(
    /// Back-office user identifier (distinct from the Firebase UID).
    UserId,
    "user id"
);
define_id!(
    /// Customer identifier.
    ClientId,
    "client id"
);
define_id!(
    /// Catalog product identifier.
    ProductId,
    "product id"
);
define_id!(
    /// Catalog category identifier.
    CategoryId,
    "category id"
);
define_id!(
    /// Order (pedido) identifier.
    OrderId,
    "order id"
);
define_id!(
    /// Courier (repartidor) identifier.
    CourierId,
    "courier id"
);
define_id!(
    /// Organization invitation identifier.
    InvitationId,
    "invitation id"
);
define_id!(
    /// Organization join request identifier.
    JoinRequestId,
    "request id"
);
define_id!(
    /// Notification identifier.
    NotificationId,
    "notification id"
);
