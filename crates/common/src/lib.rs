
pub mod pretty;

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::PathBuf};
use thiserror::Error;
use types::Value;

/// Identifier for a column within a table schema.
pub type ColumnId = u16;

/// Logical identifier for a page in the storage layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(pub u32);

/// Logical identifier for a table registered in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableId(pub u64);

/// Fully-qualified identifier for a record within a page: (page_id, slot_id).
/// Stable while the slot is live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: u16,
}

/// Positional row representation backed by `types::Value`, carrying its
/// record id once it has been materialized from storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
    #[serde(skip)]
    #[serde(default)]
    rid: Option<RecordId>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values, rid: None }
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        Self::new(values)
    }

    pub fn with_rid(mut self, rid: RecordId) -> Self {
        self.rid = Some(rid);
        self
    }

    pub fn set_rid(&mut self, rid: Option<RecordId>) {
        self.rid = rid;
    }

    pub fn rid(&self) -> Option<RecordId> {
        self.rid
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::new(values)
    }
}

/// Named projection of a row keyed by column name.
pub type RowMap = HashMap<String, Value>;

/// Rectangular result set carrying column labels and rows, as produced by
/// `--show=result`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Replacement policy a `BufferPool` evicts frames with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplacementPolicyKind {
    #[default]
    Lru,
    Fifo,
}

impl std::fmt::Display for ReplacementPolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplacementPolicyKind::Lru => write!(f, "lru"),
            ReplacementPolicyKind::Fifo => write!(f, "fifo"),
        }
    }
}

/// The compiler/runtime phase that raised a [`DbError`]. Mirrors the closed
/// phase set of the error taxonomy: lexing, parsing, semantic analysis,
/// execution, and storage. Planning is total over a validated AST and never
/// raises.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Lex,
    Parse,
    Sem,
    Exec,
    Storage,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Lex => "lex",
            Phase::Parse => "parse",
            Phase::Sem => "sem",
            Phase::Exec => "exec",
            Phase::Storage => "storage",
        };
        write!(f, "{s}")
    }
}

/// Canonical error type shared across database subsystems. Each variant
/// belongs to exactly one phase and carries the fields the CLI boundary
/// serializes into `{phase, kind, line, col, message}` (spec.md §7).
/// `line`/`col` are `0` for phases that don't track source position.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("lex error at {line}:{col}: {message}")]
    Lex {
        kind: &'static str,
        line: u32,
        col: u32,
        message: String,
    },
    #[error("parse error at {line}:{col}: {message}")]
    Parse {
        kind: &'static str,
        line: u32,
        col: u32,
        message: String,
    },
    #[error("semantic error at {line}:{col}: {message}")]
    Sem {
        kind: &'static str,
        line: u32,
        col: u32,
        message: String,
    },
    #[error("execution error: {message}")]
    Exec { kind: &'static str, message: String },
    #[error("storage error: {message}")]
    Storage { kind: &'static str, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DbError {
    pub fn phase(&self) -> Phase {
        match self {
            DbError::Lex { .. } => Phase::Lex,
            DbError::Parse { .. } => Phase::Parse,
            DbError::Sem { .. } => Phase::Sem,
            DbError::Exec { .. } => Phase::Exec,
            DbError::Storage { .. } | DbError::Io(_) => Phase::Storage,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DbError::Lex { kind, .. }
            | DbError::Parse { kind, .. }
            | DbError::Sem { kind, .. }
            | DbError::Exec { kind, .. }
            | DbError::Storage { kind, .. } => kind,
            DbError::Io(_) => "IoFailure",
        }
    }

    pub fn line(&self) -> u32 {
        match self {
            DbError::Lex { line, .. } | DbError::Parse { line, .. } | DbError::Sem { line, .. } => {
                *line
            }
            _ => 0,
        }
    }

    pub fn col(&self) -> u32 {
        match self {
            DbError::Lex { col, .. } | DbError::Parse { col, .. } | DbError::Sem { col, .. } => {
                *col
            }
            _ => 0,
        }
    }

    /// The process exit code the CLI boundary maps this error to
    /// (spec.md §6: 0 success, 2 compilation error, 3 runtime error, 1 I/O error).
    pub fn exit_code(&self) -> i32 {
        match self.phase() {
            Phase::Lex | Phase::Parse | Phase::Sem => 2,
            Phase::Exec => 3,
            Phase::Storage => {
                if matches!(self, DbError::Io(_)) {
                    1
                } else {
                    3
                }
            }
        }
    }

    /// Serializes this error into the `{phase, kind, line, col, message}`
    /// record the CLI boundary prints on failure.
    pub fn to_boundary_json(&self) -> serde_json::Value {
        serde_json::json!({
            "phase": self.phase().to_string(),
            "kind": self.kind(),
            "line": self.line(),
            "col": self.col(),
            "message": self.to_string(),
        })
    }
}

/// Result alias that carries a `DbError`.
pub type DbResult<T> = Result<T, DbError>;

/// Runtime configuration for the database components.
///
/// # Example
/// ```
/// use common::{Config, ReplacementPolicyKind};
/// use std::path::PathBuf;
///
/// let config = Config::builder()
///     .data_dir(PathBuf::from("./my_db"))
///     .page_size(8192)
///     .buffer_pool_pages(512)
///     .replacement_policy(ReplacementPolicyKind::Fifo)
///     .build();
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, bon::Builder)]
pub struct Config {
    /// Directory where table files and catalog metadata live.
    #[builder(default = PathBuf::from("./db_data"))]
    pub data_dir: PathBuf,
    /// Fixed-size page allocation in bytes.
    #[builder(default = 4096)]
    pub page_size: usize,
    /// Number of pages the buffer pool keeps resident.
    #[builder(default = 64)]
    pub buffer_pool_pages: usize,
    /// Frame eviction policy the buffer pool uses.
    #[builder(default)]
    pub replacement_policy: ReplacementPolicyKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./db_data"),
            page_size: 4096,
            buffer_pool_pages: 64,
            replacement_policy: ReplacementPolicyKind::default(),
        }
    }
}

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{Config, DbError, DbResult, Phase, RecordBatch, ReplacementPolicyKind, Row, RowMap};
    pub use types::{SqlType, Value};
}
