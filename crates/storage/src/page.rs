//! Slotted 4096-byte page format.
//!
//! Layout: `page_id: u32` @0, `slot_count: u16` @4, `free_space_offset: u16`
//! @6, `checksum: u32` (CRC-32 of bytes `[12..4096)`) @8. The slot directory
//! starts at byte 12 and grows upward as `(offset: u16, length: u16)` pairs;
//! record bytes grow downward from the end of the page. A slot with
//! `length == 0` is a tombstone.

use common::DbError;

pub const PAGE_SIZE: usize = 4096;
const HEADER_LEN: usize = 12;
const SLOT_ENTRY_LEN: usize = 4;

fn storage_err(kind: &'static str, message: impl Into<String>) -> DbError {
    DbError::Storage {
        kind,
        message: message.into(),
    }
}

/// An in-memory 4096-byte page.
#[derive(Clone)]
pub struct Page {
    data: [u8; PAGE_SIZE],
}

impl Page {
    /// A freshly allocated, empty page for the given id.
    pub fn new(page_id: u32) -> Self {
        let mut page = Page { data: [0u8; PAGE_SIZE] };
        page.set_page_id(page_id);
        page.set_slot_count(0);
        page.set_free_space_offset(PAGE_SIZE as u16);
        page
    }

    pub fn page_id(&self) -> u32 {
        u32::from_le_bytes(self.data[0..4].try_into().unwrap())
    }

    fn set_page_id(&mut self, id: u32) {
        self.data[0..4].copy_from_slice(&id.to_le_bytes());
    }

    pub fn slot_count(&self) -> u16 {
        u16::from_le_bytes(self.data[4..6].try_into().unwrap())
    }

    fn set_slot_count(&mut self, count: u16) {
        self.data[4..6].copy_from_slice(&count.to_le_bytes());
    }

    pub fn free_space_offset(&self) -> u16 {
        u16::from_le_bytes(self.data[6..8].try_into().unwrap())
    }

    fn set_free_space_offset(&mut self, offset: u16) {
        self.data[6..8].copy_from_slice(&offset.to_le_bytes());
    }

    fn checksum_field(&self) -> u32 {
        u32::from_le_bytes(self.data[8..12].try_into().unwrap())
    }

    fn set_checksum_field(&mut self, sum: u32) {
        self.data[8..12].copy_from_slice(&sum.to_le_bytes());
    }

    fn computed_checksum(&self) -> u32 {
        crc32fast::hash(&self.data[HEADER_LEN..])
    }

    fn slot_entry_offset(&self, slot_id: u16) -> usize {
        HEADER_LEN + slot_id as usize * SLOT_ENTRY_LEN
    }

    fn slot_dir_end(&self) -> usize {
        HEADER_LEN + self.slot_count() as usize * SLOT_ENTRY_LEN
    }

    fn read_slot(&self, slot_id: u16) -> Option<(u16, u16)> {
        if slot_id >= self.slot_count() {
            return None;
        }
        let at = self.slot_entry_offset(slot_id);
        let offset = u16::from_le_bytes(self.data[at..at + 2].try_into().unwrap());
        let length = u16::from_le_bytes(self.data[at + 2..at + 4].try_into().unwrap());
        Some((offset, length))
    }

    fn write_slot(&mut self, slot_id: u16, offset: u16, length: u16) {
        let at = self.slot_entry_offset(slot_id);
        self.data[at..at + 2].copy_from_slice(&offset.to_le_bytes());
        self.data[at + 2..at + 4].copy_from_slice(&length.to_le_bytes());
    }

    /// Appends a record from the high end of the page and a slot entry at
    /// the low end, returning the new slot id. Fails with a `PageFull`-style
    /// storage error when the slot directory and record would overlap.
    pub fn insert(&mut self, record: &[u8]) -> Result<u16, DbError> {
        let needed_slot_dir_end = self.slot_dir_end() + SLOT_ENTRY_LEN;
        if needed_slot_dir_end + record.len() > self.free_space_offset() as usize {
            return Err(storage_err("PageFull", "page has no room for this record"));
        }

        let new_offset = self.free_space_offset() as usize - record.len();
        self.data[new_offset..new_offset + record.len()].copy_from_slice(record);

        let slot_id = self.slot_count();
        self.write_slot(slot_id, new_offset as u16, record.len() as u16);
        self.set_slot_count(slot_id + 1);
        self.set_free_space_offset(new_offset as u16);

        Ok(slot_id)
    }

    /// Returns the record bytes for `slot_id`, or a `DecodeError`-style
    /// storage error if the slot is out of range or a tombstone.
    pub fn read(&self, slot_id: u16) -> Result<&[u8], DbError> {
        let (offset, length) = self
            .read_slot(slot_id)
            .ok_or_else(|| storage_err("DecodeError", format!("slot {slot_id} out of range")))?;
        if length == 0 {
            return Err(storage_err("DecodeError", format!("slot {slot_id} is a tombstone")));
        }
        Ok(&self.data[offset as usize..offset as usize + length as usize])
    }

    /// Marks the slot's length as 0 (tombstone). Idempotent on an
    /// already-deleted slot; no physical compaction is performed.
    pub fn delete(&mut self, slot_id: u16) -> Result<(), DbError> {
        let (offset, _) = self
            .read_slot(slot_id)
            .ok_or_else(|| storage_err("DecodeError", format!("slot {slot_id} out of range")))?;
        self.write_slot(slot_id, offset, 0);
        Ok(())
    }

    pub fn is_tombstone(&self, slot_id: u16) -> bool {
        matches!(self.read_slot(slot_id), Some((_, 0)))
    }

    /// Serializes the page to its exact 4096-byte on-disk form, stamping
    /// the checksum over bytes `[12..4096)`.
    pub fn to_bytes(&self) -> [u8; PAGE_SIZE] {
        let mut out = self.data;
        let sum = crc32fast::hash(&out[HEADER_LEN..]);
        out[8..12].copy_from_slice(&sum.to_le_bytes());
        out
    }

    /// Reconstructs a page from its on-disk bytes, verifying the checksum.
    pub fn from_bytes(buf: [u8; PAGE_SIZE]) -> Result<Self, DbError> {
        let page = Page { data: buf };
        let stored = page.checksum_field();
        let computed = page.computed_checksum();
        if stored != computed {
            return Err(storage_err(
                "PageCorrupt",
                format!("checksum mismatch: stored {stored:#x}, computed {computed:#x}"),
            ));
        }
        Ok(page)
    }
}
