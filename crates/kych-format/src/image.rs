//! Bounded big-endian reads over the buffered keychain file.
//!
//! [`Image`] owns the file bytes (one allocation for the whole session;
//! extracted slices are refcounted views into it). [`View`] projects the
//! image at a record base and resolves column offsets, centralising the
//! low-bit mask every column offset carries.

use bytes::Bytes;
use chrono::NaiveDateTime;
use kych_types::FourCc;

use crate::layout;

/// The fully buffered keychain file.
///
/// Every read is bounds-checked; out-of-range reads return `None` and the
/// caller decides whether that is structural (header, schema) or merely an
/// absent field.
#[derive(Debug, Clone)]
pub struct Image {
    data: Bytes,
}

impl Image {
    pub fn new(data: Bytes) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Big-endian `u32` at an absolute offset.
    pub fn read_u32(&self, offset: usize) -> Option<u32> {
        let bytes = self.data.get(offset..offset.checked_add(4)?)?;
        Some(u32::from_be_bytes(bytes.try_into().expect("4-byte slice")))
    }

    /// Refcounted sub-slice at an absolute offset.
    pub fn read_bytes(&self, offset: usize, len: usize) -> Option<Bytes> {
        let end = offset.checked_add(len)?;
        if end > self.data.len() {
            return None;
        }
        Some(self.data.slice(offset..end))
    }

    /// Fixed-width array at an absolute offset.
    pub fn read_array<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        let bytes = self.data.get(offset..offset.checked_add(N)?)?;
        Some(bytes.try_into().expect("N-byte slice"))
    }
}

impl From<Vec<u8>> for Image {
    fn from(data: Vec<u8>) -> Self {
        Self::new(Bytes::from(data))
    }
}

/// A record-relative window into the image.
///
/// Header fields are read with the `*_at` accessors; column values are read
/// with the `col_*` accessors, which clear the low flag bit and treat a zero
/// offset as "column absent".
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    image: &'a Image,
    base: usize,
}

impl<'a> View<'a> {
    pub fn new(image: &'a Image, base: usize) -> Self {
        Self { image, base }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    /// Inline header field: big-endian `u32` at a fixed relative offset.
    pub fn u32_at(&self, rel: usize) -> Option<u32> {
        self.image.read_u32(self.base.checked_add(rel)?)
    }

    /// Raw bytes at a fixed relative offset.
    pub fn bytes_at(&self, rel: usize, len: usize) -> Option<Bytes> {
        self.image.read_bytes(self.base.checked_add(rel)?, len)
    }

    /// Fixed-width array at a fixed relative offset.
    pub fn array_at<const N: usize>(&self, rel: usize) -> Option<[u8; N]> {
        self.image.read_array(self.base.checked_add(rel)?)
    }

    /// Resolves a stored column offset: clears the low flag bit and maps a
    /// zero offset to "absent". The single place the mask is applied.
    fn column(&self, stored: u32) -> Option<usize> {
        let masked = stored & !1;
        if masked == 0 {
            return None;
        }
        self.base.checked_add(masked as usize)
    }

    /// `u32` column (ports, type/encoding enums). Absent -> 0.
    pub fn col_u32(&self, stored: u32) -> u32 {
        self.column(stored)
            .and_then(|at| self.image.read_u32(at))
            .unwrap_or(0)
    }

    /// Four-character-code column.
    pub fn col_fourcc(&self, stored: u32) -> Option<FourCc> {
        let at = self.column(stored)?;
        self.image.read_array::<4>(at).map(FourCc)
    }

    /// Timestamp column: 16 bytes of `YYYYMMDDHHMMSSZ` plus NUL padding.
    pub fn col_time(&self, stored: u32) -> Option<NaiveDateTime> {
        let at = self.column(stored)?;
        let raw = self.image.read_array::<16>(at)?;
        parse_keychain_time(&raw)
    }

    /// Length-prefixed column: a big-endian length, then the value padded to
    /// the 4-byte grid. Returns the padded bytes as stored (callers trim NUL
    /// padding when they want a C string). Absent or short -> empty.
    pub fn col_lv(&self, stored: u32) -> Bytes {
        let Some(at) = self.column(stored) else {
            return Bytes::new();
        };
        let Some(len) = self.image.read_u32(at) else {
            return Bytes::new();
        };
        let padded = layout::round_up_to_atom(len as usize);
        let Some(value_at) = at.checked_add(4) else {
            return Bytes::new();
        };
        self.image.read_bytes(value_at, padded).unwrap_or_default()
    }
}

/// Parses the 16-byte timestamp column format (`YYYYMMDDHHMMSSZ`, NUL
/// padded). Unparseable input is an absent timestamp, not an error.
pub(crate) fn parse_keychain_time(raw: &[u8; 16]) -> Option<NaiveDateTime> {
    let text = std::str::from_utf8(raw).ok()?;
    let text = text.trim_end_matches('\0');
    NaiveDateTime::parse_from_str(text, "%Y%m%d%H%M%SZ").ok()
}

/// Trims a value at the first NUL, the explicit C-string read.
pub fn cstr(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}
