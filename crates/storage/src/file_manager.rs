//! Maps each table to a file of page-aligned 4096-byte pages. Holds no
//! in-memory cache of page contents; it is the serialization boundary
//! between `Page` and disk.

use crate::page::{Page, PAGE_SIZE};
use common::DbError;
use std::{
    collections::HashMap,
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

fn storage_err(kind: &'static str, message: impl Into<String>) -> DbError {
    DbError::Storage {
        kind,
        message: message.into(),
    }
}

/// Opens and tracks the `<table>.tbl` files that back every table in a
/// data directory.
pub struct FileManager {
    data_dir: PathBuf,
    open_files: HashMap<String, File>,
}

impl FileManager {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            open_files: HashMap::new(),
        }
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{table}.tbl"))
    }

    /// Opens (creating if necessary) the backing file for `table`.
    pub fn open(&mut self, table: &str) -> Result<(), DbError> {
        if self.open_files.contains_key(table) {
            return Ok(());
        }
        std::fs::create_dir_all(&self.data_dir)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(self.table_path(table))?;
        self.open_files.insert(table.to_string(), file);
        Ok(())
    }

    fn file_mut(&mut self, table: &str) -> Result<&mut File, DbError> {
        if !self.open_files.contains_key(table) {
            self.open(table)?;
        }
        Ok(self.open_files.get_mut(table).unwrap())
    }

    /// Number of 4096-byte pages currently in `table`'s file.
    pub fn page_count(&mut self, table: &str) -> Result<u32, DbError> {
        let file = self.file_mut(table)?;
        let len = file.metadata()?.len();
        Ok((len / PAGE_SIZE as u64) as u32)
    }

    /// Reads and checksum-verifies one page.
    pub fn read_page(&mut self, table: &str, page_id: u32) -> Result<Page, DbError> {
        let file = self.file_mut(table)?;
        let offset = page_id as u64 * PAGE_SIZE as u64;
        file.seek(SeekFrom::Start(offset))?;

        let mut buf = [0u8; PAGE_SIZE];
        file.read_exact(&mut buf)?;
        Page::from_bytes(buf)
    }

    /// Writes one page at its page-aligned offset.
    pub fn write_page(&mut self, table: &str, page_id: u32, page: &Page) -> Result<(), DbError> {
        let file = self.file_mut(table)?;
        let offset = page_id as u64 * PAGE_SIZE as u64;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&page.to_bytes())?;
        Ok(())
    }

    /// Extends the file by one zeroed page and returns its new id.
    pub fn allocate_page(&mut self, table: &str) -> Result<u32, DbError> {
        let new_id = self.page_count(table)?;
        let page = Page::new(new_id);
        self.write_page(table, new_id, &page)?;
        Ok(new_id)
    }

    pub fn flush(&mut self, table: &str) -> Result<(), DbError> {
        if let Some(file) = self.open_files.get_mut(table) {
            file.sync_all()?;
        }
        Ok(())
    }

    /// True if `<table>.tbl` already exists in the data directory.
    pub fn table_exists(&self, table: &str) -> bool {
        self.table_path(table).exists()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
