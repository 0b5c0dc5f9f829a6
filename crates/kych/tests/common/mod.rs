//! Synthetic keychain builder for end-to-end tests.
//!
//! Constructs a complete container from chosen plaintexts: header, schema
//! directory, metadata table (with a DB blob wrapping a known key),
//! symmetric-key table, and optional password / certificate / private-key
//! tables. The forward (encrypting) constructions here invert the reader's
//! pipeline stage by stage.

use cipher::block_padding::{NoPadding, Pkcs7};
use cipher::{BlockEncryptMut, KeyIvInit};
use des::TdesEde3;
use kych_crypto::{MAGIC_CMS_IV, derive_master_key};

type Des3CbcEnc = cbc::Encryptor<TdesEde3>;

pub const PASSWORD: &str = "test";

/// The 24-byte wrapping key every fixture hides: `00 01 02 .. 17`.
pub const WRAPPING_KEY: [u8; 24] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
    0x0F, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17,
];

pub const SALT: [u8; 20] = *b"0123456789abcdefghij";
pub const DB_IV: [u8; 8] = [0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17];

const BLOCK: usize = 8;
const BLOB_MAGIC: u32 = 0xFADE_0711;

const METADATA: u32 = 0x8000_8000;
const GENERIC_PASSWORD: u32 = 0x8000_0000;
const X509_CERTIFICATE: u32 = 0x8000_1000;
const PRIVATE_KEY: u32 = 0x0000_0010;
const SYMMETRIC_KEY: u32 = 0x0000_0011;

pub fn encrypt_pkcs7(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Vec<u8> {
    let padded = (plaintext.len() / BLOCK + 1) * BLOCK;
    let mut buf = vec![0u8; padded];
    buf[..plaintext.len()].copy_from_slice(plaintext);
    let encryptor = Des3CbcEnc::new_from_slices(key, iv).expect("fixture key/iv sizes");
    encryptor
        .encrypt_padded_mut::<Pkcs7>(&mut buf, plaintext.len())
        .expect("buffer sized for padding")
        .to_vec()
}

fn encrypt_raw(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Vec<u8> {
    assert_eq!(plaintext.len() % BLOCK, 0);
    let mut buf = plaintext.to_vec();
    let encryptor = Des3CbcEnc::new_from_slices(key, iv).expect("fixture key/iv sizes");
    encryptor
        .encrypt_padded_mut::<NoPadding>(&mut buf, plaintext.len())
        .expect("whole blocks")
        .to_vec()
}

/// Forward construction of the two-stage item-key wrap.
fn wrap_item_key(wrapping: &[u8; 24], iv: &[u8; 8], key: &[u8; 24]) -> Vec<u8> {
    let mut inner = vec![0u8, 0, 0, 24];
    inner.extend_from_slice(key);
    inner.extend_from_slice(&[4u8; 4]);
    let mut stage2 = encrypt_raw(wrapping, iv, &inner);
    stage2.reverse();
    encrypt_pkcs7(wrapping, &MAGIC_CMS_IV, &stage2)
}

/// Forward construction of the two-stage private-key wrap.
fn wrap_private_key(wrapping: &[u8; 24], iv: &[u8; 8], label: &[u8; 12], material: &[u8]) -> Vec<u8> {
    let mut inner = label.to_vec();
    inner.extend_from_slice(material);
    let mut stage2 = encrypt_pkcs7(wrapping, iv, &inner);
    stage2.reverse();
    encrypt_pkcs7(wrapping, &MAGIC_CMS_IV, &stage2)
}

fn be(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

fn put(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_be_bytes());
}

/// Length-prefixed value as stored: big-endian length, bytes, NUL pad to 4.
fn lv(value: &[u8]) -> Vec<u8> {
    let mut out = be(value.len() as u32).to_vec();
    out.extend_from_slice(value);
    while out.len() % 4 != 0 {
        out.push(0);
    }
    out
}

#[derive(Default)]
pub struct Fixture {
    sym_records: Vec<Vec<u8>>,
    generic_records: Vec<Vec<u8>>,
    cert_records: Vec<Vec<u8>>,
    private_key_records: Vec<Vec<u8>>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a symmetric-key record wrapping `key` under the fixture
    /// wrapping key, tagged `"ssgp" + label`.
    pub fn add_content_key(&mut self, label: [u8; 16], key: [u8; 24]) {
        self.sym_records.push(sym_record(BLOB_MAGIC, label, &key));
    }

    /// Adds a symmetric-key record whose blob magic is wrong; the reader
    /// must skip it.
    pub fn add_corrupt_content_key(&mut self, label: [u8; 16]) {
        self.sym_records
            .push(sym_record(0xDEAD_BEEF, label, &[0u8; 24]));
    }

    /// Adds a generic-password record whose SSGP payload hides `secret`
    /// under `content_key`, tagged `"ssgp" + label`.
    pub fn add_generic_password(
        &mut self,
        label: [u8; 16],
        content_key: [u8; 24],
        secret: &[u8],
        account: &[u8],
        service: &[u8],
    ) {
        let ssgp_iv = [0x88u8; 8];
        let ct = encrypt_pkcs7(&content_key, &ssgp_iv, secret);
        let mut payload = b"ssgp".to_vec();
        payload.extend_from_slice(&label);
        payload.extend_from_slice(&ssgp_iv);
        payload.extend_from_slice(&ct);

        const HEADER: usize = 88;
        let mut data = payload.clone();
        let created_off = HEADER + data.len();
        data.extend_from_slice(b"20210430115958Z\0");
        let account_off = HEADER + data.len();
        data.extend_from_slice(&lv(account));
        let service_off = HEADER + data.len();
        data.extend_from_slice(&lv(service));

        let mut rec = vec![0u8; HEADER];
        put(&mut rec, 0, (HEADER + data.len()) as u32); // RecordSize
        put(&mut rec, 16, payload.len() as u32); // SSGPArea
        put(&mut rec, 24, created_off as u32); // CreationDate
        // Low flag bit set on purpose; the reader must mask it.
        put(&mut rec, 76, account_off as u32 | 1); // Account
        put(&mut rec, 80, service_off as u32); // Service
        rec.extend_from_slice(&data);
        self.generic_records.push(rec);
    }

    /// Adds an X.509 certificate record carrying `der` verbatim.
    pub fn add_certificate(&mut self, der: &[u8]) {
        const HEADER: usize = 60;
        let mut padded = der.to_vec();
        while padded.len() % 4 != 0 {
            padded.push(0);
        }
        let print_name_off = HEADER + padded.len();
        let mut data = padded;
        data.extend_from_slice(&lv(b"fixture cert"));

        let mut rec = vec![0u8; HEADER];
        put(&mut rec, 0, (HEADER + data.len()) as u32); // RecordSize
        put(&mut rec, 16, der.len() as u32); // CertSize
        put(&mut rec, 32, print_name_off as u32); // PrintName
        rec.extend_from_slice(&data);
        self.cert_records.push(rec);
    }

    /// Adds a private-key record whose blob unwraps to `label || material`.
    pub fn add_private_key(&mut self, label: &[u8; 12], material: &[u8]) {
        const HEADER: usize = 132;
        let iv = [0x99u8; 8];
        let ct = wrap_private_key(&WRAPPING_KEY, &iv, label, material);

        let mut area = Vec::new();
        area.extend_from_slice(&be(BLOB_MAGIC));
        area.extend_from_slice(&be(0x0100));
        area.extend_from_slice(&be(24)); // startCryptoBlob
        area.extend_from_slice(&be((24 + ct.len()) as u32)); // totalLength
        area.extend_from_slice(&iv);
        area.extend_from_slice(&ct);

        let print_name_off = HEADER + area.len();
        let mut data = area.clone();
        data.extend_from_slice(&lv(b"fixture key"));

        let mut rec = vec![0u8; HEADER];
        put(&mut rec, 0, (HEADER + data.len()) as u32); // RecordSize
        put(&mut rec, 16, area.len() as u32); // BlobSize
        put(&mut rec, 28, print_name_off as u32); // PrintName
        rec.extend_from_slice(&data);
        self.private_key_records.push(rec);
    }

    /// Assembles the container image, deriving the DB blob from `password`.
    pub fn build_with_password(&self, password: &str) -> Vec<u8> {
        let mut tables = vec![
            metadata_table(password),
            table(SYMMETRIC_KEY, &self.sym_records),
        ];
        if !self.generic_records.is_empty() {
            tables.push(table(GENERIC_PASSWORD, &self.generic_records));
        }
        if !self.cert_records.is_empty() {
            tables.push(table(X509_CERTIFICATE, &self.cert_records));
        }
        if !self.private_key_records.is_empty() {
            tables.push(table(PRIVATE_KEY, &self.private_key_records));
        }

        let schema_size = 8 + 4 * tables.len();
        let mut offsets = Vec::new();
        let mut cursor = schema_size;
        for t in &tables {
            offsets.push(cursor as u32);
            cursor += t.len();
        }

        let mut out = Vec::new();
        out.extend_from_slice(b"kych");
        out.extend_from_slice(&be(0x0001_0000)); // version
        out.extend_from_slice(&be(20)); // header size
        out.extend_from_slice(&be(20)); // schema offset
        out.extend_from_slice(&be(0)); // auth offset
        out.extend_from_slice(&be(schema_size as u32));
        out.extend_from_slice(&be(tables.len() as u32));
        for offset in offsets {
            out.extend_from_slice(&be(offset));
        }
        for t in tables {
            out.extend_from_slice(&t);
        }
        out
    }

    /// Assembles the container with the canonical fixture password.
    pub fn build(&self) -> Vec<u8> {
        self.build_with_password(PASSWORD)
    }
}

/// A system unlock file whose master-key field is the fixture wrapping key.
pub fn unlock_file_bytes() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&be(BLOB_MAGIC));
    out.extend_from_slice(&be(0x0100));
    out.extend_from_slice(&WRAPPING_KEY);
    out.extend_from_slice(&[0u8; 16]); // blob signature
    out
}

fn sym_record(magic: u32, label: [u8; 16], key: &[u8; 24]) -> Vec<u8> {
    const HEADER: usize = 0x84;
    let iv = [0x77u8; 8];
    let ct = wrap_item_key(&WRAPPING_KEY, &iv, key);

    let mut area = Vec::new();
    area.extend_from_slice(&be(magic));
    area.extend_from_slice(&be(0x0100)); // blob version
    area.extend_from_slice(&be(24)); // startCryptoBlob
    area.extend_from_slice(&be((24 + ct.len()) as u32)); // totalLength
    area.extend_from_slice(&iv);
    area.extend_from_slice(&ct);
    area.extend_from_slice(&[0u8; 8]); // gap before the tag
    area.extend_from_slice(b"ssgp");
    area.extend_from_slice(&label);

    let mut rec = vec![0u8; HEADER];
    put(&mut rec, 0, (HEADER + area.len()) as u32); // RecordSize
    put(&mut rec, 4, 1); // RecordNumber
    rec.extend_from_slice(&area);
    rec
}

/// Metadata table: empty record vector, DB blob at +0x38 from the base.
fn metadata_table(password: &str) -> Vec<u8> {
    let master = derive_master_key(password.as_bytes(), &SALT);
    let ct = encrypt_pkcs7(master.as_bytes(), &DB_IV, &WRAPPING_KEY);

    let mut blob = Vec::new();
    blob.extend_from_slice(&be(BLOB_MAGIC));
    blob.extend_from_slice(&be(0x0100)); // blob version
    blob.extend_from_slice(&be(92)); // startCryptoBlob
    blob.extend_from_slice(&be((92 + ct.len()) as u32)); // totalLength
    blob.extend_from_slice(&[0u8; 16]); // random signature
    blob.extend_from_slice(&be(1)); // sequence
    blob.extend_from_slice(&be(0)); // idle timeout
    blob.extend_from_slice(&be(0)); // lock on sleep
    blob.extend_from_slice(&SALT);
    blob.extend_from_slice(&DB_IV);
    blob.extend_from_slice(&[0u8; 20]); // blob signature
    blob.extend_from_slice(&ct);

    let size = 0x38 + blob.len();
    let mut out = vec![0u8; 0x38];
    put(&mut out, 0, size as u32); // table size
    put(&mut out, 4, METADATA); // table id
    put(&mut out, 8, 0); // record count
    out.extend_from_slice(&blob);
    out
}

/// A table with a dense slot vector: header, offsets, records.
fn table(id: u32, records: &[Vec<u8>]) -> Vec<u8> {
    let first_record = 28 + 4 * records.len();
    let mut slots = Vec::new();
    let mut body = Vec::new();
    let mut cursor = first_record;
    for rec in records {
        assert_eq!(rec.len() % 4, 0, "fixture records stay 4-aligned");
        slots.push(cursor as u32);
        body.extend_from_slice(rec);
        cursor += rec.len();
    }

    let mut out = vec![0u8; 28];
    put(&mut out, 0, cursor as u32); // table size
    put(&mut out, 4, id);
    put(&mut out, 8, records.len() as u32);
    for slot in slots {
        out.extend_from_slice(&be(slot));
    }
    out.extend_from_slice(&body);
    out
}
