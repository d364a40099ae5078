//! Strongly typed identifiers for marketplace aggregates.
//!
//! Each identifier wraps a UUID so a proposal id can never be passed where a
//! booking id is expected. All identifiers serialise as bare UUID strings.

use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Generate a fresh random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the inner UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

define_id!(
    /// Customer account identifier.
    CustomerId
);
define_id!(
    /// Mechanic account identifier.
    MechanicId
);
define_id!(
    /// Service request identifier.
    RequestId
);
define_id!(
    /// Proposal identifier.
    ProposalId
);
define_id!(
    /// Booking identifier.
    BookingId
);
define_id!(
    /// Wallet ledger entry identifier.
    TransactionId
);
define_id!(
    /// Review identifier.
    ReviewId
);

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    #[test]
    fn identifiers_serialise_as_plain_uuid_strings() {
        let id: BookingId = "3fa85f64-5717-4562-b3fc-2c963f66afa6"
            .parse()
            .expect("valid uuid");
        let value = serde_json::to_value(id).expect("id serialises");
        assert_eq!(value, serde_json::json!("3fa85f64-5717-4562-b3fc-2c963f66afa6"));
    }

    #[test]
    fn random_identifiers_differ() {
        assert_ne!(RequestId::random(), RequestId::random());
    }
}
