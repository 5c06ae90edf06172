//! Row serialization: a 2-byte column count, a null bitmap
//! (`ceil(n/8)` bytes), then packed payload for the non-null columns in
//! order (`INT` = 8 bytes little-endian, `BOOLEAN` = 1 byte, `VARCHAR` =
//! 2-byte length prefix + UTF-8 bytes).

use common::{DbError, Row};
use types::{SqlType, Value};

fn storage_err(kind: &'static str, message: impl Into<String>) -> DbError {
    DbError::Storage {
        kind,
        message: message.into(),
    }
}

fn bitmap_len(n: usize) -> usize {
    n.div_ceil(8)
}

/// Encodes a row's values against a fixed column-type schema.
pub fn encode_row(schema: &[SqlType], row: &Row) -> Vec<u8> {
    let values = &row.values;
    let mut buf = Vec::new();
    buf.extend_from_slice(&(values.len() as u16).to_le_bytes());

    let mut bitmap = vec![0u8; bitmap_len(values.len())];
    for (i, v) in values.iter().enumerate() {
        if v.is_null() {
            bitmap[i / 8] |= 1 << (i % 8);
        }
    }
    buf.extend_from_slice(&bitmap);

    for (ty, v) in schema.iter().zip(values.iter()) {
        match (ty, v) {
            (_, Value::Null) => {}
            (SqlType::Int, Value::Int(n)) => buf.extend_from_slice(&n.to_le_bytes()),
            (SqlType::Bool, Value::Bool(b)) => buf.push(*b as u8),
            (SqlType::Varchar(_), Value::Text(s)) => {
                let bytes = s.as_bytes();
                buf.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
                buf.extend_from_slice(bytes);
            }
            _ => unreachable!("semantic analysis guarantees value/column type agreement"),
        }
    }

    buf
}

/// Decodes a row previously produced by [`encode_row`] against the same
/// column-type schema.
pub fn decode_row(schema: &[SqlType], bytes: &[u8]) -> Result<Row, DbError> {
    if bytes.len() < 2 {
        return Err(storage_err("DecodeError", "row buffer shorter than column count field"));
    }
    let col_count = u16::from_le_bytes(bytes[0..2].try_into().unwrap()) as usize;
    if col_count != schema.len() {
        return Err(storage_err(
            "DecodeError",
            format!("row declares {col_count} columns, schema has {}", schema.len()),
        ));
    }

    let bmp_len = bitmap_len(col_count);
    let bitmap_start = 2;
    let bitmap_end = bitmap_start + bmp_len;
    let bitmap = bytes.get(bitmap_start..bitmap_end).ok_or_else(|| {
        storage_err("DecodeError", "row buffer truncated in null bitmap")
    })?;

    let mut cursor = bitmap_end;
    let mut values = Vec::with_capacity(col_count);

    for (i, ty) in schema.iter().enumerate() {
        let is_null = bitmap[i / 8] & (1 << (i % 8)) != 0;
        if is_null {
            values.push(Value::Null);
            continue;
        }
        match ty {
            SqlType::Int => {
                let end = cursor + 8;
                let slice = bytes
                    .get(cursor..end)
                    .ok_or_else(|| storage_err("DecodeError", "row buffer truncated in INT field"))?;
                values.push(Value::Int(i64::from_le_bytes(slice.try_into().unwrap())));
                cursor = end;
            }
            SqlType::Bool => {
                let b = *bytes
                    .get(cursor)
                    .ok_or_else(|| storage_err("DecodeError", "row buffer truncated in BOOLEAN field"))?;
                values.push(Value::Bool(b != 0));
                cursor += 1;
            }
            SqlType::Varchar(n) => {
                let len_end = cursor + 2;
                let len_bytes = bytes.get(cursor..len_end).ok_or_else(|| {
                    storage_err("DecodeError", "row buffer truncated in VARCHAR length")
                })?;
                let len = u16::from_le_bytes(len_bytes.try_into().unwrap()) as usize;
                if len > *n as usize {
                    return Err(storage_err(
                        "DecodeError",
                        format!("VARCHAR length {len} exceeds declared bound {n}"),
                    ));
                }
                let str_end = len_end + len;
                let str_bytes = bytes
                    .get(len_end..str_end)
                    .ok_or_else(|| storage_err("DecodeError", "row buffer truncated in VARCHAR payload"))?;
                let s = std::str::from_utf8(str_bytes)
                    .map_err(|_| storage_err("DecodeError", "VARCHAR payload is not valid UTF-8"))?;
                values.push(Value::Text(s.to_string()));
                cursor = str_end;
            }
        }
    }

    Ok(Row::new(values))
}
