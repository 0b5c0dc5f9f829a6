//! # kych: Forensic reader for legacy macOS keychain databases
//!
//! Given a `.keychain` file and one credential (a passphrase, the raw
//! 24-byte database wrapping key, or a system unlock file), this crate
//! parses the container, recovers the wrapping key, rebuilds the per-item
//! key list from the symmetric-key table, and decrypts the payloads of
//! password, certificate, and key records into a [`Dump`].
//!
//! ```no_run
//! use kych::{Credential, Keychain};
//!
//! # fn main() -> Result<(), kych::KeychainError> {
//! let keychain = Keychain::open("login.keychain")?;
//! let dump = keychain.dump(&Credential::Password("test".into()))?;
//! for record in &dump.generic_passwords {
//!     println!("{:?} {:?}", record.account, record.password);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The reader never mutates its input and holds the whole file in one
//! buffer; every record borrows from that buffer. Only two conditions abort
//! a dump: a structurally broken container and a wrapping key that cannot
//! be recovered. Everything else (missing tables, corrupt records, items
//! wrapped under unknown keys) degrades to empty fields so the rest of the
//! database still comes out.

mod dump;
mod keychain;
mod keylist;

pub use dump::Dump;
pub use keychain::{Credential, Keychain};
pub use keylist::KeyList;

use std::path::PathBuf;

/// Top-level errors. Only the structural and credential categories abort;
/// everything else is folded into the dump as empty fields or notices.
#[derive(Debug, thiserror::Error)]
pub enum KeychainError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Format(#[from] kych_format::FormatError),

    #[error("keychain has no metadata table")]
    MissingMetadataTable,

    #[error("password or master key candidate is invalid")]
    InvalidCredential,
}
