//! Record-level storage engine: creates tables, inserts and deletes rows,
//! and scans a table's rows, all routed through a [`buffer::BufferPool`]
//! rather than touching page files directly.

use buffer::BufferPool;
use common::{DbError, RecordId, Row};
use std::collections::HashMap;
use storage::{decode_row, encode_row};
use types::{SqlType, Value};

fn exec_err(kind: &'static str, message: impl Into<String>) -> DbError {
    DbError::Exec {
        kind,
        message: message.into(),
    }
}

fn storage_err(kind: &'static str, message: impl Into<String>) -> DbError {
    DbError::Storage {
        kind,
        message: message.into(),
    }
}

/// One column's name, type, and nullability, as the engine needs them to
/// encode/decode rows and enforce `NOT NULL`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub ty: SqlType,
    pub not_null: bool,
}

/// A table's physical schema: column definitions plus the column indices
/// that make up its primary key (empty if the table has none).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
    pub primary_key: Vec<usize>,
}

impl TableSchema {
    pub fn column_types(&self) -> Vec<SqlType> {
        self.columns.iter().map(|c| c.ty.clone()).collect()
    }
}

/// Record-level API over page storage: `create_table`, `insert_row`,
/// `seq_scan`, `delete_row`.
pub struct StorageEngine {
    buffer_pool: BufferPool,
    schemas: HashMap<String, TableSchema>,
}

impl StorageEngine {
    pub fn new(buffer_pool: BufferPool) -> Self {
        Self {
            buffer_pool,
            schemas: HashMap::new(),
        }
    }

    fn schema(&self, table: &str) -> Result<&TableSchema, DbError> {
        self.schemas
            .get(table)
            .ok_or_else(|| storage_err("TableNotOpen", format!("table '{table}' is not open in this engine")))
    }

    /// Registers `schema` and ensures the table's backing file has at
    /// least one page to insert into.
    pub fn create_table(&mut self, schema: TableSchema) -> Result<(), DbError> {
        let name = schema.name.clone();
        if self.buffer_pool.page_count(&name)? == 0 {
            let (_page_id, handle) = self.buffer_pool.new_page(&name)?;
            self.buffer_pool.unpin(handle);
            self.buffer_pool.flush_all()?;
        }
        self.schemas.insert(name, schema);
        Ok(())
    }

    fn check_not_null(&self, schema: &TableSchema, row: &Row) -> Result<(), DbError> {
        for (col, value) in schema.columns.iter().zip(row.values.iter()) {
            if col.not_null && value.is_null() {
                return Err(exec_err(
                    "NotNullViolation",
                    format!("column '{}' cannot be NULL", col.name),
                ));
            }
        }
        Ok(())
    }

    fn check_primary_key(&mut self, table: &str, schema: &TableSchema, row: &Row) -> Result<(), DbError> {
        if schema.primary_key.is_empty() {
            return Ok(());
        }
        for (_rid, existing) in self.seq_scan(table)? {
            let matches = schema
                .primary_key
                .iter()
                .all(|&i| values_equal(&existing.values[i], &row.values[i]));
            if matches {
                return Err(exec_err(
                    "DuplicatePrimaryKey",
                    format!("duplicate primary key value in table '{table}'"),
                ));
            }
        }
        Ok(())
    }

    /// Inserts `row` into `table`, enforcing `NOT NULL` and primary-key
    /// uniqueness, and returns its new record id.
    pub fn insert_row(&mut self, table: &str, row: Row) -> Result<RecordId, DbError> {
        let schema = self.schema(table)?.clone();
        self.check_not_null(&schema, &row)?;
        self.check_primary_key(table, &schema, &row)?;

        let bytes = encode_row(&schema.column_types(), &row);
        let page_count = self.buffer_pool.page_count(table)?;

        for page_id in 0..page_count {
            let handle = self.buffer_pool.get(table, page_id)?;
            let result = self.buffer_pool.page_mut(handle).insert(&bytes);
            match result {
                Ok(slot) => {
                    self.buffer_pool.unpin(handle);
                    log::debug!("inserted row into {table}:{page_id}:{slot}");
                    return Ok(RecordId {
                        page_id: common::PageId(page_id),
                        slot,
                    });
                }
                Err(err) if err.kind() == "PageFull" => {
                    self.buffer_pool.unpin(handle);
                    continue;
                }
                Err(err) => {
                    self.buffer_pool.unpin(handle);
                    return Err(err);
                }
            }
        }

        let (page_id, handle) = self.buffer_pool.new_page(table)?;
        let slot = self.buffer_pool.page_mut(handle).insert(&bytes)?;
        self.buffer_pool.unpin(handle);
        Ok(RecordId {
            page_id: common::PageId(page_id),
            slot,
        })
    }

    /// Scans every live (non-tombstone) row in `table`, in `(page_id,
    /// slot_id)` order.
    pub fn seq_scan(&mut self, table: &str) -> Result<Vec<(RecordId, Row)>, DbError> {
        let schema = self.schema(table)?.clone();
        let column_types = schema.column_types();
        let page_count = self.buffer_pool.page_count(table)?;
        let mut out = Vec::new();

        for page_id in 0..page_count {
            let handle = self.buffer_pool.get(table, page_id)?;
            let slot_count = self.buffer_pool.page(handle).slot_count();
            for slot in 0..slot_count {
                if self.buffer_pool.page(handle).is_tombstone(slot) {
                    continue;
                }
                let bytes = self.buffer_pool.page(handle).read(slot)?;
                let row = decode_row(&column_types, bytes)?;
                let rid = RecordId {
                    page_id: common::PageId(page_id),
                    slot,
                };
                out.push((rid, row.with_rid(rid)));
            }
            self.buffer_pool.unpin(handle);
        }

        Ok(out)
    }

    /// Marks `rid`'s slot as a tombstone. Idempotent on an already-deleted
    /// record.
    pub fn delete_row(&mut self, table: &str, rid: RecordId) -> Result<(), DbError> {
        let handle = self.buffer_pool.get(table, rid.page_id.0)?;
        self.buffer_pool.page_mut(handle).delete(rid.slot)?;
        self.buffer_pool.unpin(handle);
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), DbError> {
        self.buffer_pool.flush_all()
    }

    pub fn table_schema(&self, table: &str) -> Option<&TableSchema> {
        self.schemas.get(table)
    }

    /// Number of pages currently allocated for `table`.
    pub fn page_count(&mut self, table: &str) -> Result<u32, DbError> {
        self.buffer_pool.page_count(table)
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    a.eq_same_type(b).unwrap_or(false)
}
