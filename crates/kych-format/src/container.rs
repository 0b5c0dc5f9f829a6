//! Container walking: file header, schema directory, tables.
//!
//! The schema directory lists one offset per table (relative to the end of
//! the file header). Each table carries a dense offset vector whose slots
//! become sparse as records are deleted; a slot is live iff its offset is
//! non-zero and 4-byte aligned, and the walk collects live slots until the
//! header's record count is satisfied or the vector region ends.

use std::collections::HashMap;

use kych_types::RecordClass;

use crate::image::Image;
use crate::layout;
use crate::{FormatError, View};

/// Parsed file header.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub signature: [u8; 4],
    pub version: u32,
    pub header_size: u32,
    pub schema_offset: u32,
    pub auth_offset: u32,
}

/// Parses and validates the file header.
pub fn parse_header(image: &Image) -> Result<Header, FormatError> {
    let view = View::new(image, 0);
    let signature: [u8; 4] =
        view.array_at(layout::header::SIGNATURE)
            .ok_or(FormatError::Truncated {
                offset: 0,
                needed: layout::header::SIZE,
            })?;
    if &signature != layout::header::MAGIC {
        return Err(FormatError::BadSignature { found: signature });
    }
    let field = |rel| {
        view.u32_at(rel).ok_or(FormatError::Truncated {
            offset: rel,
            needed: 4,
        })
    };
    Ok(Header {
        signature,
        version: field(layout::header::VERSION)?,
        header_size: field(layout::header::HEADER_SIZE)?,
        schema_offset: field(layout::header::SCHEMA_OFFSET)?,
        auth_offset: field(layout::header::AUTH_OFFSET)?,
    })
}

/// Parsed schema directory: the table-offset vector, each offset relative to
/// the end of the file header.
#[derive(Debug, Clone)]
pub struct Schema {
    pub schema_size: u32,
    pub table_offsets: Vec<u32>,
}

/// Parses the schema directory found at `schema_offset` (absolute).
pub fn parse_schema(image: &Image, schema_offset: u32) -> Result<Schema, FormatError> {
    let base = schema_offset as usize;
    let view = View::new(image, base);
    let schema_size = view
        .u32_at(layout::schema::SCHEMA_SIZE)
        .ok_or(FormatError::Truncated {
            offset: base,
            needed: layout::schema::SIZE,
        })?;
    let table_count = view
        .u32_at(layout::schema::TABLE_COUNT)
        .ok_or(FormatError::Truncated {
            offset: base + layout::schema::TABLE_COUNT,
            needed: 4,
        })? as usize;

    let vector = base + layout::schema::SIZE;
    let mut table_offsets = Vec::with_capacity(table_count);
    for slot in 0..table_count {
        let offset = vector + slot * layout::ATOM;
        table_offsets.push(image.read_u32(offset).ok_or(FormatError::Truncated {
            offset,
            needed: layout::ATOM,
        })?);
    }
    Ok(Schema {
        schema_size,
        table_offsets,
    })
}

/// Parsed table header.
#[derive(Debug, Clone, Copy)]
pub struct TableHeader {
    pub table_size: u32,
    pub table_id: u32,
    pub record_count: u32,
    pub records_offset: u32,
    pub indexes_offset: u32,
    pub free_list_head: u32,
    pub record_numbers_count: u32,
}

/// A table: its header, absolute base, and the live record offsets
/// (relative to the base) in slot order.
#[derive(Debug, Clone)]
pub struct Table {
    pub header: TableHeader,
    /// Absolute offset of the table header in the image.
    pub base: usize,
    pub record_offsets: Vec<u32>,
}

/// Parses one table given its schema-directory offset.
///
/// The record-offset vector is walked with two cursors (slot index and live
/// records collected); dead slots (zero or unaligned) are passed over. The
/// record count does not bound the slot cursor: the image end does, so a
/// table claiming more records than its vector holds yields the records
/// actually present.
pub fn parse_table(image: &Image, table_offset: u32) -> Result<Table, FormatError> {
    let base = layout::header::SIZE + table_offset as usize;
    let view = View::new(image, base);
    let field = |rel| {
        view.u32_at(rel).ok_or(FormatError::Truncated {
            offset: base + rel,
            needed: 4,
        })
    };
    let header = TableHeader {
        table_size: field(layout::table::TABLE_SIZE)?,
        table_id: field(layout::table::TABLE_ID)?,
        record_count: field(layout::table::RECORD_COUNT)?,
        records_offset: field(layout::table::RECORDS)?,
        indexes_offset: field(layout::table::INDEXES_OFFSET)?,
        free_list_head: field(layout::table::FREE_LIST_HEAD)?,
        record_numbers_count: field(layout::table::RECORD_NUMBERS_COUNT)?,
    };

    let vector = base + layout::table::SIZE;
    let wanted = header.record_count as usize;
    let mut record_offsets = Vec::with_capacity(wanted);
    let mut slot = 0usize;
    while record_offsets.len() < wanted {
        let Some(offset) = image.read_u32(vector + slot * layout::ATOM) else {
            tracing::warn!(
                table_id = header.table_id,
                collected = record_offsets.len(),
                wanted,
                "record-offset vector ended before the claimed record count"
            );
            break;
        };
        if offset != 0 && offset % 4 == 0 {
            record_offsets.push(offset);
        }
        slot += 1;
    }

    Ok(Table {
        header,
        base,
        record_offsets,
    })
}

/// Lookup of tables by CSSM record-type constant.
///
/// Built once per session by walking every schema entry; tables whose
/// headers cannot be read are skipped (the rest of the database is still
/// usable).
#[derive(Debug, Clone, Default)]
pub struct TableDirectory {
    by_class: HashMap<u32, u32>,
}

impl TableDirectory {
    pub fn build(image: &Image, schema: &Schema) -> Self {
        let mut by_class = HashMap::with_capacity(schema.table_offsets.len());
        for &table_offset in &schema.table_offsets {
            match parse_table(image, table_offset) {
                Ok(table) => {
                    by_class.insert(table.header.table_id, table_offset);
                }
                Err(err) => {
                    tracing::warn!(table_offset, %err, "skipping unreadable table");
                }
            }
        }
        Self { by_class }
    }

    /// The schema-directory offset of the table for a record class.
    pub fn get(&self, class: RecordClass) -> Option<u32> {
        self.by_class.get(&class.id()).copied()
    }

    pub fn contains(&self, class: RecordClass) -> bool {
        self.by_class.contains_key(&class.id())
    }

    pub fn len(&self) -> usize {
        self.by_class.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_class.is_empty()
    }
}
