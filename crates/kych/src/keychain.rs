//! The orchestrator: load, validate, index, unlock, and dump.

use std::fs;
use std::path::Path;

use bytes::Bytes;
use kych_crypto::{WrappingKey, decrypt_ssgp, derive_master_key, recover_wrapping_key,
    unwrap_private_key};
use kych_format::{
    DbBlob, Header, Image, Schema, SsgpBlob, Table, TableDirectory, UnlockBlob, appleshare,
    certificate, generic_password, internet_password, key, layout, parse_header, parse_schema,
    parse_table,
};
use kych_types::{KeyTag, RecordClass, SecretBytes, TableNotice};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::keylist::KeyList;
use crate::{Dump, KeychainError};

/// One of the three ways a keychain can be unlocked.
///
/// Zeroed on drop: a credential is as sensitive as what it unlocks.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub enum Credential {
    /// The user passphrase; runs the PBKDF2 + DB-blob pipeline.
    Password(String),
    /// The 24-byte database wrapping key, used directly.
    WrappingKey([u8; 24]),
    /// The raw contents of a system unlock file (`/var/db/SystemKey`),
    /// whose master-key field is the pre-unwrapped wrapping key.
    UnlockFile(Vec<u8>),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Password(_) => write!(f, "Credential::Password(redacted)"),
            Credential::WrappingKey(_) => write!(f, "Credential::WrappingKey(redacted)"),
            Credential::UnlockFile(_) => write!(f, "Credential::UnlockFile(redacted)"),
        }
    }
}

/// A validated, table-indexed keychain image.
#[derive(Debug)]
pub struct Keychain {
    image: Image,
    header: Header,
    schema: Schema,
    directory: TableDirectory,
}

impl Keychain {
    /// Reads a keychain file into memory and validates its structure.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KeychainError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| KeychainError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_bytes(Bytes::from(data))
    }

    /// Validates an in-memory image: signature, schema directory, tables.
    pub fn from_bytes(data: Bytes) -> Result<Self, KeychainError> {
        let image = Image::new(data);
        let header = parse_header(&image)?;
        let schema = parse_schema(&image, header.schema_offset)?;
        let directory = TableDirectory::build(&image, &schema);
        tracing::info!(
            version = header.version,
            tables = directory.len(),
            "keychain validated"
        );
        Ok(Self {
            image,
            header,
            schema,
            directory,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Number of tables the schema directory lists.
    pub fn table_count(&self) -> usize {
        self.schema.table_offsets.len()
    }

    fn table(&self, class: RecordClass) -> Option<Table> {
        let offset = self.directory.get(class)?;
        parse_table(&self.image, offset).ok()
    }

    /// Recovers the database wrapping key from whichever credential the
    /// caller supplied.
    ///
    /// Only the passphrase path touches the DB blob: the raw-key and
    /// unlock-file paths carry the wrapping key itself. A corrupt DB blob
    /// and a wrong passphrase are deliberately indistinguishable.
    pub fn unlock(&self, credential: &Credential) -> Result<WrappingKey, KeychainError> {
        match credential {
            Credential::Password(passphrase) => {
                let metadata = self
                    .directory
                    .get(RecordClass::Metadata)
                    .ok_or(KeychainError::MissingMetadataTable)?;
                let blob = DbBlob::parse(&self.image, metadata)
                    .ok_or(KeychainError::InvalidCredential)?;
                let master = derive_master_key(passphrase.as_bytes(), &blob.salt);
                recover_wrapping_key(&master, &blob.iv, &blob.ciphertext)
                    .ok_or(KeychainError::InvalidCredential)
            }
            Credential::WrappingKey(key) => Ok(WrappingKey::new(*key)),
            Credential::UnlockFile(data) => UnlockBlob::parse(data)
                .map(|blob| WrappingKey::new(blob.master_key))
                .ok_or(KeychainError::InvalidCredential),
        }
    }

    /// Unlocks the keychain and decrypts every supported record type.
    ///
    /// The symmetric-key table is processed first so password records can
    /// resolve their content keys by tag. Missing tables become notices;
    /// records that fail to decrypt keep empty decrypted fields.
    pub fn dump(&self, credential: &Credential) -> Result<Dump, KeychainError> {
        let wrapping = self.unlock(credential)?;
        tracing::info!("wrapping key recovered");

        let mut dump = Dump::default();

        let key_list = match self.table(RecordClass::SymmetricKey) {
            Some(table) => KeyList::build(&self.image, &table, &wrapping),
            None => {
                self.notice(&mut dump, RecordClass::SymmetricKey);
                KeyList::default()
            }
        };

        self.each_record(&mut dump, RecordClass::GenericPassword, |d, off, rec| {
            let mut record = generic_password(&self.image, off, rec);
            record.password = decrypt_password(&key_list, &record.ssgp);
            d.generic_passwords.push(record);
        });

        self.each_record(&mut dump, RecordClass::InternetPassword, |d, off, rec| {
            let mut record = internet_password(&self.image, off, rec);
            record.password = decrypt_password(&key_list, &record.ssgp);
            d.internet_passwords.push(record);
        });

        self.each_record(&mut dump, RecordClass::AppleSharePassword, |d, off, rec| {
            let mut record = appleshare(&self.image, off, rec);
            record.password = decrypt_password(&key_list, &record.ssgp);
            d.appleshare_passwords.push(record);
        });

        self.each_record(&mut dump, RecordClass::X509Certificate, |d, off, rec| {
            d.certificates.push(certificate(&self.image, off, rec));
        });

        self.each_record(&mut dump, RecordClass::PublicKey, |d, off, rec| {
            d.public_keys.push(key(&self.image, off, rec));
        });

        self.each_record(&mut dump, RecordClass::PrivateKey, |d, off, rec| {
            let mut record = key(&self.image, off, rec);
            if let Some(iv) = record.blob_iv {
                if let Some((label, material)) =
                    unwrap_private_key(&wrapping, &iv, &record.key_blob)
                {
                    record.unwrapped_label = Some(SecretBytes::new(label.to_vec()));
                    record.key_material = Some(SecretBytes::new(material.to_vec()));
                } else {
                    tracing::warn!(record_offset = rec, "private key did not unwrap");
                }
            }
            d.private_keys.push(record);
        });

        tracing::info!(records = dump.record_count(), "dump complete");
        Ok(dump)
    }

    /// Runs `emit` for every record of `class`, or records a notice when the
    /// table is absent.
    fn each_record(
        &self,
        dump: &mut Dump,
        class: RecordClass,
        mut emit: impl FnMut(&mut Dump, u32, u32),
    ) {
        let Some(table) = self.table(class) else {
            self.notice(dump, class);
            return;
        };
        let table_offset = (table.base - layout::header::SIZE) as u32;
        tracing::debug!(%class, records = table.record_offsets.len(), "reading table");
        for &record_offset in &table.record_offsets {
            emit(dump, table_offset, record_offset);
        }
    }

    fn notice(&self, dump: &mut Dump, class: RecordClass) {
        tracing::warn!(%class, "table not available");
        dump.notices.push(TableNotice { class });
    }
}

/// Resolves an SSGP payload against the key list and decrypts it. `None`
/// when the payload is absent or malformed, the tag is unknown, or the
/// decryption comes back empty.
fn decrypt_password(key_list: &KeyList, ssgp: &Bytes) -> Option<SecretBytes> {
    if ssgp.is_empty() {
        return None;
    }
    let blob = SsgpBlob::parse(ssgp)?;
    let tag = KeyTag(blob.tag);
    let Some(content_key) = key_list.get(&tag) else {
        tracing::debug!(%tag, "no content key for payload tag");
        return None;
    };
    let plain = decrypt_ssgp(content_key, &blob.iv, &blob.ciphertext);
    if plain.is_empty() {
        return None;
    }
    Some(SecretBytes::new(plain.to_vec()))
}
