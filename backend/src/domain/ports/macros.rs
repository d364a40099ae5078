//! `define_port_error!`: typed error enums for driven ports.
//!
//! Each variant gets a `thiserror` message and a snake_case constructor whose
//! parameters accept anything convertible into the field type, so adapters
//! can write `WalletRepositoryError::query(err.to_string())` or
//! `ProposalRepositoryError::duplicate(mechanic_id, request_id)`.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),+ $(,)? }) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),+) -> Self {
                Self::$variant { $($field: $field.into()),+ }
            }
        }
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::domain::MechanicId;

    define_port_error! {
        pub enum LedgerError {
            Closed => "ledger closed",
            Query { message: String } => "ledger query failed: {message}",
            Short { mechanic_id: MechanicId, balance: u32 } =>
                "mechanic {mechanic_id} holds only {balance} diamonds",
        }
    }

    #[rstest]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(LedgerError::closed(), LedgerError::Closed);
        assert_eq!(LedgerError::closed().to_string(), "ledger closed");
    }

    #[rstest]
    fn string_fields_accept_str() {
        let err = LedgerError::query("timeout");
        assert_eq!(err.to_string(), "ledger query failed: timeout");
    }

    #[rstest]
    fn typed_fields_keep_their_type() {
        let mechanic_id = MechanicId::random();
        let err = LedgerError::short(mechanic_id, 0_u32);
        assert_eq!(
            err,
            LedgerError::Short {
                mechanic_id,
                balance: 0
            }
        );
        assert_eq!(
            err.to_string(),
            format!("mechanic {mechanic_id} holds only 0 diamonds")
        );
    }
}
