//! Key newtypes. Each wraps exactly 24 bytes and is zeroed on drop; `Debug`
//! never prints key material.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, KEY_LEN};

macro_rules! key_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
        pub struct $name([u8; KEY_LEN]);

        impl $name {
            pub fn new(bytes: [u8; KEY_LEN]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "(redacted)"))
            }
        }

        impl From<[u8; KEY_LEN]> for $name {
            fn from(bytes: [u8; KEY_LEN]) -> Self {
                Self(bytes)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = CryptoError;

            fn try_from(bytes: &[u8]) -> Result<Self, CryptoError> {
                let arr: [u8; KEY_LEN] = bytes
                    .try_into()
                    .map_err(|_| CryptoError::BadKeyLength { len: bytes.len() })?;
                Ok(Self(arr))
            }
        }
    };
}

key_newtype! {
    /// The passphrase-derived master key that opens the DB blob.
    MasterKey
}

key_newtype! {
    /// The database wrapping key: encrypts every per-item content key.
    WrappingKey
}

key_newtype! {
    /// A per-item content key from the symmetric-key table.
    ContentKey
}
