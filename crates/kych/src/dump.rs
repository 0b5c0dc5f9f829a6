//! The structured result of reading a keychain.

use kych_types::{
    AppleShareRecord, CertificateRecord, GenericPasswordRecord, InternetPasswordRecord, KeyRecord,
    TableNotice,
};
use serde::Serialize;

/// Everything recovered from one keychain under one credential.
///
/// Vectors are empty (and a [`TableNotice`] is recorded) when the backing
/// table is absent; individual records keep their place with empty decrypted
/// fields when their item key is unknown or their payload is corrupt.
#[derive(Debug, Default, Serialize)]
pub struct Dump {
    pub generic_passwords: Vec<GenericPasswordRecord>,
    pub internet_passwords: Vec<InternetPasswordRecord>,
    pub appleshare_passwords: Vec<AppleShareRecord>,
    pub certificates: Vec<CertificateRecord>,
    pub public_keys: Vec<KeyRecord>,
    pub private_keys: Vec<KeyRecord>,
    /// Tables the reader looked for but the schema does not list.
    pub notices: Vec<TableNotice>,
}

impl Dump {
    /// Total number of records across every table.
    pub fn record_count(&self) -> usize {
        self.generic_passwords.len()
            + self.internet_passwords.len()
            + self.appleshare_passwords.len()
            + self.certificates.len()
            + self.public_keys.len()
            + self.private_keys.len()
    }
}
