//! Record extractors, one per supported record type.
//!
//! Every extractor projects a [`View`] at the record base
//! (`file header + table offset + record offset`) and resolves each declared
//! column. Missing or unreadable columns yield empty values; extraction
//! itself never fails for the password, certificate, and key families. The
//! symmetric-key extractor is the exception: a blob that fails its magic or
//! group-marker checks is reported as `None` so the caller can skip it.

use bytes::Bytes;
use kych_types::{
    AppleShareRecord, CertificateRecord, GenericPasswordRecord, InternetPasswordRecord, KeyRecord,
    KeyTag,
};

use crate::blob::EncryptedKeyBlob;
use crate::image::{Image, View, cstr};
use crate::layout;

fn record_view<'a>(image: &'a Image, table_offset: u32, record_offset: u32) -> View<'a> {
    View::new(
        image,
        layout::header::SIZE + table_offset as usize + record_offset as usize,
    )
}

/// The opaque encrypted payload area: the leading `SSGPArea` bytes of the
/// buffer that follows the fixed record header.
fn ssgp_area(view: &View<'_>, header_size: usize, ssgp_len_field: usize) -> Bytes {
    let len = view.u32_at(ssgp_len_field).unwrap_or(0) as usize;
    if len == 0 {
        return Bytes::new();
    }
    view.bytes_at(header_size, len).unwrap_or_default()
}

/// Extracts a generic-password record.
pub fn generic_password(
    image: &Image,
    table_offset: u32,
    record_offset: u32,
) -> GenericPasswordRecord {
    use layout::generic_password as col;
    let view = record_view(image, table_offset, record_offset);
    let c = |rel| view.u32_at(rel).unwrap_or(0);
    GenericPasswordRecord {
        created: view.col_time(c(col::CREATION_DATE)),
        modified: view.col_time(c(col::MOD_DATE)),
        description: view.col_lv(c(col::DESCRIPTION)),
        creator: view.col_fourcc(c(col::CREATOR)),
        type_code: view.col_fourcc(c(col::TYPE)),
        print_name: view.col_lv(c(col::PRINT_NAME)),
        alias: view.col_lv(c(col::ALIAS)),
        account: view.col_lv(c(col::ACCOUNT)),
        service: view.col_lv(c(col::SERVICE)),
        ssgp: ssgp_area(&view, col::SIZE, col::SSGP_AREA),
        password: None,
    }
}

/// Extracts an internet-password record.
pub fn internet_password(
    image: &Image,
    table_offset: u32,
    record_offset: u32,
) -> InternetPasswordRecord {
    use layout::internet_password as col;
    let view = record_view(image, table_offset, record_offset);
    let c = |rel| view.u32_at(rel).unwrap_or(0);
    InternetPasswordRecord {
        created: view.col_time(c(col::CREATION_DATE)),
        modified: view.col_time(c(col::MOD_DATE)),
        description: view.col_lv(c(col::DESCRIPTION)),
        comment: view.col_lv(c(col::COMMENT)),
        creator: view.col_fourcc(c(col::CREATOR)),
        type_code: view.col_fourcc(c(col::TYPE)),
        print_name: view.col_lv(c(col::PRINT_NAME)),
        alias: view.col_lv(c(col::ALIAS)),
        protected: view.col_lv(c(col::PROTECTED)),
        account: view.col_lv(c(col::ACCOUNT)),
        security_domain: view.col_lv(c(col::SECURITY_DOMAIN)),
        server: view.col_lv(c(col::SERVER)),
        protocol: view.col_fourcc(c(col::PROTOCOL)),
        auth_type: view.col_lv(c(col::AUTH_TYPE)),
        port: view.col_u32(c(col::PORT)),
        path: view.col_lv(c(col::PATH)),
        ssgp: ssgp_area(&view, col::SIZE, col::SSGP_AREA),
        password: None,
    }
}

/// Extracts an AppleShare-password record.
///
/// `Protected` and the address columns are read length-prefixed, matching
/// the historical reader; no real sample has contradicted that choice.
pub fn appleshare(image: &Image, table_offset: u32, record_offset: u32) -> AppleShareRecord {
    use layout::appleshare as col;
    let view = record_view(image, table_offset, record_offset);
    let c = |rel| view.u32_at(rel).unwrap_or(0);
    AppleShareRecord {
        created: view.col_time(c(col::CREATION_DATE)),
        modified: view.col_time(c(col::MOD_DATE)),
        description: view.col_lv(c(col::DESCRIPTION)),
        comment: view.col_lv(c(col::COMMENT)),
        creator: view.col_fourcc(c(col::CREATOR)),
        type_code: view.col_fourcc(c(col::TYPE)),
        print_name: view.col_lv(c(col::PRINT_NAME)),
        alias: view.col_lv(c(col::ALIAS)),
        protected: view.col_lv(c(col::PROTECTED)),
        account: view.col_lv(c(col::ACCOUNT)),
        volume: view.col_lv(c(col::VOLUME)),
        server: view.col_lv(c(col::SERVER)),
        protocol: view.col_fourcc(c(col::PROTOCOL)),
        address: view.col_lv(c(col::ADDRESS)),
        signature: view.col_lv(c(col::SIGNATURE)),
        ssgp: ssgp_area(&view, col::SIZE, col::SSGP_AREA),
        password: None,
    }
}

/// Extracts an X.509 certificate record. The DER image sits immediately
/// after the fixed header, `CertSize` bytes long.
pub fn certificate(image: &Image, table_offset: u32, record_offset: u32) -> CertificateRecord {
    use layout::certificate as col;
    let view = record_view(image, table_offset, record_offset);
    let c = |rel| view.u32_at(rel).unwrap_or(0);
    let cert_size = view.u32_at(col::CERT_SIZE).unwrap_or(0) as usize;
    CertificateRecord {
        cert_type: view.col_u32(c(col::CERT_TYPE)),
        cert_encoding: view.col_u32(c(col::CERT_ENCODING)),
        print_name: view.col_lv(c(col::PRINT_NAME)),
        alias: view.col_lv(c(col::ALIAS)),
        subject: view.col_lv(c(col::SUBJECT)),
        issuer: view.col_lv(c(col::ISSUER)),
        serial_number: view.col_lv(c(col::SERIAL_NUMBER)),
        subject_key_identifier: view.col_lv(c(col::SUBJECT_KEY_IDENTIFIER)),
        public_key_hash: view.col_lv(c(col::PUBLIC_KEY_HASH)),
        certificate: view.bytes_at(col::SIZE, cert_size).unwrap_or_default(),
    }
}

/// Extracts a key record (public- or private-key table). The key blob
/// (`BlobSize` bytes after the fixed header) is parsed for its IV and
/// ciphertext bounds; a blob with the wrong magic leaves both empty.
pub fn key(image: &Image, table_offset: u32, record_offset: u32) -> KeyRecord {
    use layout::seckey as col;
    let view = record_view(image, table_offset, record_offset);
    let c = |rel| view.u32_at(rel).unwrap_or(0);
    let blob_size = view.u32_at(col::BLOB_SIZE).unwrap_or(0) as usize;
    let blob_area = view.bytes_at(col::SIZE, blob_size).unwrap_or_default();
    let parsed = EncryptedKeyBlob::parse(&blob_area);
    let creator = view.col_lv(c(col::KEY_CREATOR));
    KeyRecord {
        print_name: view.col_lv(c(col::PRINT_NAME)),
        label: view.col_lv(c(col::LABEL)),
        key_class: view.col_u32(c(col::KEY_CLASS)),
        private: view.col_u32(c(col::PRIVATE)),
        key_type: view.col_u32(c(col::KEY_TYPE)),
        key_size_bits: view.col_u32(c(col::KEY_SIZE_IN_BITS)),
        effective_key_size: view.col_u32(c(col::EFFECTIVE_KEY_SIZE)),
        extractable: view.col_u32(c(col::EXTRACTABLE)),
        creator_module: String::from_utf8_lossy(cstr(&creator)).into_owned(),
        blob_iv: parsed.as_ref().map(|b| b.iv),
        key_blob: parsed.map(|b| b.ciphertext).unwrap_or_default(),
        unwrapped_label: None,
        key_material: None,
    }
}

/// A wrapped content key pulled from the symmetric-key table.
#[derive(Debug, Clone)]
pub struct RawKeyBlob {
    /// 20-byte lookup tag (`"ssgp"` + item label).
    pub tag: KeyTag,
    pub iv: [u8; 8],
    pub ciphertext: Bytes,
}

/// Extracts one symmetric-key blob record, or `None` when the record fails
/// its structural checks (wrong blob magic, missing `"ssgp"` group marker,
/// or a ciphertext area that is not a positive multiple of the block size).
pub fn key_blob(image: &Image, table_offset: u32, record_offset: u32) -> Option<RawKeyBlob> {
    use layout::key_blob as kb;
    let view = record_view(image, table_offset, record_offset);
    let record_size = view.u32_at(layout::keyblob_record::RECORD_SIZE)? as usize;
    if record_size <= layout::keyblob_record::SIZE {
        return None;
    }
    // The blob area spans from the end of the record header to RecordSize.
    let area = view.bytes_at(
        layout::keyblob_record::SIZE,
        record_size - layout::keyblob_record::SIZE,
    )?;
    let blob = EncryptedKeyBlob::parse(&area)?;
    if blob.ciphertext.is_empty() || blob.ciphertext.len() % layout::BLOCK_SIZE != 0 {
        tracing::debug!(record_offset, "key blob ciphertext is not block-aligned");
        return None;
    }

    let total = blob.total_length as usize;
    let marker = area.get(total + kb::TAG_GAP..total + kb::TAG_GAP + 4)?;
    if marker != layout::SECURE_STORAGE_GROUP {
        tracing::debug!(record_offset, "key blob without secure-storage group marker");
        return None;
    }
    let tag: [u8; 20] = area
        .get(total + kb::TAG_GAP..total + kb::TAG_GAP + kb::TAG_LEN)?
        .try_into()
        .ok()?;

    Some(RawKeyBlob {
        tag: KeyTag(tag),
        iv: blob.iv,
        ciphertext: blob.ciphertext,
    })
}
