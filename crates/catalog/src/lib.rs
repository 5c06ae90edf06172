//! Self-hosted catalog: table schemas live in the ordinary tables
//! `sys_tables`, `sys_columns`, `sys_indexes`, stored through the same
//! [`engine::StorageEngine`] as user data, and bootstrapped with a fixed
//! schema on first open.

use common::{DbError, Row};
use engine::{ColumnSchema as EngineColumn, StorageEngine, TableSchema as EngineSchema};
use serde::{Deserialize, Serialize};
use types::{SqlType, Value};

const NAME_WIDTH: u16 = 256;

fn storage_err(kind: &'static str, message: impl Into<String>) -> DbError {
    DbError::Storage {
        kind,
        message: message.into(),
    }
}

/// One column of a user table's schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ty: SqlType,
    pub not_null: bool,
    pub primary_key: bool,
}

/// A user table's full schema, as reconstructed from `sys_tables`/
/// `sys_columns` rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub table_name: String,
    pub columns: Vec<Column>,
}

impl Schema {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    fn primary_key_indices(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.primary_key)
            .map(|(i, _)| i)
            .collect()
    }

    fn to_engine_schema(&self) -> EngineSchema {
        EngineSchema {
            name: self.table_name.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| EngineColumn {
                    name: c.name.clone(),
                    ty: c.ty,
                    not_null: c.not_null || c.primary_key,
                })
                .collect(),
            primary_key: self.primary_key_indices(),
        }
    }
}

fn type_code(ty: &SqlType) -> (i64, i64) {
    match ty {
        SqlType::Int => (0, 0),
        SqlType::Varchar(n) => (1, *n as i64),
        SqlType::Bool => (2, 0),
    }
}

fn decode_type(code: i64, param: i64) -> Result<SqlType, DbError> {
    match code {
        0 => Ok(SqlType::Int),
        1 => Ok(SqlType::Varchar(param as u16)),
        2 => Ok(SqlType::Bool),
        other => Err(storage_err("DecodeError", format!("unknown catalog type code {other}"))),
    }
}

fn sys_tables_schema() -> EngineSchema {
    EngineSchema {
        name: "sys_tables".into(),
        columns: vec![
            EngineColumn { name: "table_name".into(), ty: SqlType::Varchar(NAME_WIDTH), not_null: true },
            EngineColumn { name: "first_page".into(), ty: SqlType::Int, not_null: true },
            EngineColumn { name: "page_count".into(), ty: SqlType::Int, not_null: true },
        ],
        primary_key: vec![0],
    }
}

fn sys_columns_schema() -> EngineSchema {
    EngineSchema {
        name: "sys_columns".into(),
        columns: vec![
            EngineColumn { name: "table_name".into(), ty: SqlType::Varchar(NAME_WIDTH), not_null: true },
            EngineColumn { name: "ordinal".into(), ty: SqlType::Int, not_null: true },
            EngineColumn { name: "col_name".into(), ty: SqlType::Varchar(NAME_WIDTH), not_null: true },
            EngineColumn { name: "type_code".into(), ty: SqlType::Int, not_null: true },
            EngineColumn { name: "type_param".into(), ty: SqlType::Int, not_null: true },
            EngineColumn { name: "nullable".into(), ty: SqlType::Bool, not_null: true },
            EngineColumn { name: "primary_key".into(), ty: SqlType::Bool, not_null: true },
        ],
        primary_key: vec![],
    }
}

fn sys_indexes_schema() -> EngineSchema {
    EngineSchema {
        name: "sys_indexes".into(),
        columns: vec![
            EngineColumn { name: "table_name".into(), ty: SqlType::Varchar(NAME_WIDTH), not_null: true },
            EngineColumn { name: "col_name".into(), ty: SqlType::Varchar(NAME_WIDTH), not_null: true },
            EngineColumn { name: "kind".into(), ty: SqlType::Int, not_null: true },
        ],
        primary_key: vec![],
    }
}

fn text_value(v: &Value) -> Option<&str> {
    match v {
        Value::Text(s) => Some(s.as_str()),
        _ => None,
    }
}

fn int_value(v: &Value) -> Option<i64> {
    match v {
        Value::Int(i) => Some(*i),
        _ => None,
    }
}

fn bool_value(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        _ => None,
    }
}

/// Schema registry layered on top of an [`engine::StorageEngine`]. All
/// mutations go through the engine so the catalog durably shares the
/// buffer pool's write path.
pub struct Catalog {
    engine: StorageEngine,
}

impl Catalog {
    /// Bootstraps the three system tables (a no-op if they already exist)
    /// and re-registers every previously created user table's schema with
    /// the engine so it knows how to encode/decode their rows.
    pub fn open(mut engine: StorageEngine) -> Result<Self, DbError> {
        engine.create_table(sys_tables_schema())?;
        engine.create_table(sys_columns_schema())?;
        engine.create_table(sys_indexes_schema())?;
        engine.flush()?;

        let mut catalog = Self { engine };
        catalog.reload_existing_tables()?;
        Ok(catalog)
    }

    fn reload_existing_tables(&mut self) -> Result<(), DbError> {
        let table_names: Vec<String> = self
            .engine
            .seq_scan("sys_tables")?
            .into_iter()
            .filter_map(|(_, row)| text_value(&row.values[0]).map(|s| s.to_string()))
            .collect();

        for name in table_names {
            if let Some(schema) = self.read_schema_rows(&name)? {
                self.engine.create_table(schema.to_engine_schema())?;
            }
        }
        Ok(())
    }

    fn read_schema_rows(&mut self, table_name: &str) -> Result<Option<Schema>, DbError> {
        let found = self
            .engine
            .seq_scan("sys_tables")?
            .into_iter()
            .any(|(_, row)| text_value(&row.values[0]) == Some(table_name));
        if !found {
            return Ok(None);
        }

        let mut columns: Vec<(i64, Column)> = self
            .engine
            .seq_scan("sys_columns")?
            .into_iter()
            .filter(|(_, row)| text_value(&row.values[0]) == Some(table_name))
            .map(|(_, row)| {
                let ordinal = int_value(&row.values[1]).unwrap_or(0);
                let name = text_value(&row.values[2]).unwrap_or_default().to_string();
                let ty = decode_type(
                    int_value(&row.values[3]).unwrap_or(0),
                    int_value(&row.values[4]).unwrap_or(0),
                )?;
                let not_null = bool_value(&row.values[5]).unwrap_or(false);
                let primary_key = bool_value(&row.values[6]).unwrap_or(false);
                Ok::<_, DbError>((
                    ordinal,
                    Column {
                        name,
                        ty,
                        not_null,
                        primary_key,
                    },
                ))
            })
            .collect::<Result<_, _>>()?;
        columns.sort_by_key(|(ordinal, _)| *ordinal);

        Ok(Some(Schema {
            table_name: table_name.to_string(),
            columns: columns.into_iter().map(|(_, c)| c).collect(),
        }))
    }

    /// Registers a new table: writes its `sys_tables`/`sys_columns` rows
    /// and opens its backing file through the engine.
    pub fn create_table(&mut self, schema: Schema) -> Result<(), DbError> {
        self.engine.create_table(schema.to_engine_schema())?;
        let page_count = self.engine.page_count(&schema.table_name)?;

        self.engine.insert_row(
            "sys_tables",
            Row::new(vec![
                Value::Text(schema.table_name.clone()),
                Value::Int(0),
                Value::Int(page_count as i64),
            ]),
        )?;

        for (ordinal, col) in schema.columns.iter().enumerate() {
            let (code, param) = type_code(&col.ty);
            self.engine.insert_row(
                "sys_columns",
                Row::new(vec![
                    Value::Text(schema.table_name.clone()),
                    Value::Int(ordinal as i64),
                    Value::Text(col.name.clone()),
                    Value::Int(code),
                    Value::Int(param),
                    Value::Bool(col.not_null),
                    Value::Bool(col.primary_key),
                ]),
            )?;
        }

        self.engine.flush()?;
        Ok(())
    }

    /// Removes a table's catalog rows. The table's backing file is left in
    /// place; only its schema registration is torn down.
    pub fn drop_table(&mut self, table_name: &str) -> Result<(), DbError> {
        let table_rids: Vec<_> = self
            .engine
            .seq_scan("sys_tables")?
            .into_iter()
            .filter(|(_, row)| text_value(&row.values[0]) == Some(table_name))
            .map(|(rid, _)| rid)
            .collect();
        for rid in &table_rids {
            self.engine.delete_row("sys_tables", *rid)?;
        }

        let column_rids: Vec<_> = self
            .engine
            .seq_scan("sys_columns")?
            .into_iter()
            .filter(|(_, row)| text_value(&row.values[0]) == Some(table_name))
            .map(|(rid, _)| rid)
            .collect();
        for rid in &column_rids {
            self.engine.delete_row("sys_columns", *rid)?;
        }

        self.engine.flush()?;
        Ok(())
    }

    /// Looks up a table's schema. Returns `Ok(None)` (not an error) when
    /// the table does not exist; callers that need a `sem`-phase error
    /// raise it themselves with line/col context.
    pub fn get_schema(&mut self, table_name: &str) -> Result<Option<Schema>, DbError> {
        self.read_schema_rows(table_name)
    }

    pub fn list_tables(&mut self) -> Result<Vec<String>, DbError> {
        Ok(self
            .engine
            .seq_scan("sys_tables")?
            .into_iter()
            .filter_map(|(_, row)| text_value(&row.values[0]).map(|s| s.to_string()))
            .collect())
    }

    pub fn engine(&mut self) -> &mut StorageEngine {
        &mut self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buffer::BufferPool;
    use common::ReplacementPolicyKind;
    use storage::FileManager;
    use tempfile::tempdir;

    fn open_catalog(dir: &std::path::Path) -> Catalog {
        let fm = FileManager::new(dir);
        let bp = BufferPool::new(fm, 16, ReplacementPolicyKind::Lru);
        Catalog::open(StorageEngine::new(bp)).unwrap()
    }

    fn people_schema() -> Schema {
        Schema {
            table_name: "people".into(),
            columns: vec![
                Column { name: "id".into(), ty: SqlType::Int, not_null: true, primary_key: true },
                Column { name: "name".into(), ty: SqlType::Varchar(32), not_null: false, primary_key: false },
            ],
        }
    }

    #[test]
    fn create_table_registers_sys_rows() {
        let dir = tempdir().unwrap();
        let mut catalog = open_catalog(dir.path());
        catalog.create_table(people_schema()).unwrap();

        let schema = catalog.get_schema("people").unwrap().unwrap();
        assert_eq!(schema.columns.len(), 2);
        assert_eq!(schema.column_index("name"), Some(1));
        assert!(schema.columns[0].primary_key);
    }

    #[test]
    fn unknown_table_returns_none_not_error() {
        let dir = tempdir().unwrap();
        let mut catalog = open_catalog(dir.path());
        assert!(catalog.get_schema("ghost").unwrap().is_none());
    }

    #[test]
    fn schema_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let mut catalog = open_catalog(dir.path());
            catalog.create_table(people_schema()).unwrap();
        }

        let fm = FileManager::new(dir.path());
        let bp = BufferPool::new(fm, 16, ReplacementPolicyKind::Lru);
        let mut reopened = Catalog::open(StorageEngine::new(bp)).unwrap();

        let schema = reopened.get_schema("people").unwrap().unwrap();
        assert_eq!(schema.columns.len(), 2);
        assert_eq!(reopened.list_tables().unwrap(), vec!["people".to_string()]);
    }

    #[test]
    fn drop_table_removes_catalog_rows() {
        let dir = tempdir().unwrap();
        let mut catalog = open_catalog(dir.path());
        catalog.create_table(people_schema()).unwrap();
        catalog.drop_table("people").unwrap();

        assert!(catalog.get_schema("people").unwrap().is_none());
        assert!(catalog.list_tables().unwrap().is_empty());
    }
}
