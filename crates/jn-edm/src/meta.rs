//! Singleton metadata records: `JM::FileMetaData` and `JM::UniqueIDTable`.
//!
//! Both are decoded once per file, not per entry: look up the class in
//! the streamer info, dispatch a descriptor for it, run the reader over
//! the whole remaining byte range as one logical row, and convert that
//! row into an in-memory record. The full range is always consumed; the
//! encoding has no end-of-record marker, so the record's own byte count
//! is the only authority on where it ends.

use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array,
    Int8Array, ListArray, StringArray, StructArray, UInt16Array, UInt32Array, UInt64Array,
    UInt8Array,
};
use arrow::datatypes::DataType;
use serde_json::{Map, Value};

use crate::error::{EdmError, Result};
use crate::factory::FactoryRegistry;
use crate::reader::{make_reader, read_rows};
use crate::streamer::StreamerDb;

/// Decoded `JM::FileMetaData`: the declared members as a nested
/// field-name → value tree.
#[derive(Debug, Clone)]
pub struct FileMetaData {
    /// Member values, verbatim as declared.
    pub members: Map<String, Value>,
}

impl FileMetaData {
    /// The ordered navigation-path list (`m_NavPath`).
    pub fn nav_paths(&self) -> Result<Vec<String>> {
        let paths = self
            .members
            .get("m_NavPath")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                EdmError::Deserialization("FileMetaData has no m_NavPath list".into())
            })?;
        paths
            .iter()
            .map(|v| {
                v.as_str().map(str::to_owned).ok_or_else(|| {
                    EdmError::Deserialization("non-string entry in m_NavPath".into())
                })
            })
            .collect()
    }
}

/// Decoded `JM::UniqueIDTable`: string key → {field name → value}.
#[derive(Debug, Clone)]
pub struct UniqueIdTable {
    /// Flattened table. Keys are assumed unique by the source domain;
    /// on collision the last row wins (not verified here).
    pub tables: Map<String, Value>,
}

impl UniqueIdTable {
    /// Sub-record for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.tables.get(key)
    }
}

/// Decode the `JM::FileMetaData` record from its full key payload.
pub fn decode_file_meta_data(
    registry: &FactoryRegistry,
    db: &StreamerDb,
    chunk: &[u8],
) -> Result<FileMetaData> {
    let members = decode_singleton(registry, db, chunk, "JM::FileMetaData")?;
    Ok(FileMetaData { members })
}

/// Decode the `JM::UniqueIDTable` record from its full key payload and
/// fold its `{key, val}` rows into a keyed map, discarding row order.
pub fn decode_unique_id_table(
    registry: &FactoryRegistry,
    db: &StreamerDb,
    chunk: &[u8],
) -> Result<UniqueIdTable> {
    let members = decode_singleton(registry, db, chunk, "JM::UniqueIDTable")?;
    let rows = members
        .get("m_tables")
        .and_then(Value::as_array)
        .ok_or_else(|| EdmError::Deserialization("UniqueIDTable has no m_tables list".into()))?;

    let mut tables = Map::new();
    for row in rows {
        let key = row
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| EdmError::Deserialization("m_tables row has no string key".into()))?;
        let val = row
            .get("val")
            .cloned()
            .ok_or_else(|| EdmError::Deserialization("m_tables row has no val record".into()))?;
        if tables.insert(key.to_owned(), val).is_some() {
            log::debug!("duplicate unique-ID key '{key}', keeping the later row");
        }
    }
    Ok(UniqueIdTable { tables })
}

/// Shared one-shot decode: whole chunk as a single logical row of
/// `class_name`, converted to a field-name → value map.
fn decode_singleton(
    registry: &FactoryRegistry,
    db: &StreamerDb,
    chunk: &[u8],
    class_name: &str,
) -> Result<Map<String, Value>> {
    let node = registry.build_class(class_name, db, "")?;
    let (_field, array) = read_rows(chunk, &[0, chunk.len()], make_reader(&node))?;
    let record = array
        .as_any()
        .downcast_ref::<StructArray>()
        .ok_or_else(|| EdmError::Deserialization(format!("{class_name} is not a record")))?;
    if record.is_empty() {
        return Err(EdmError::Deserialization(format!("{class_name} decoded to zero rows")));
    }
    let Value::Object(members) = value_at(record, 0)? else {
        return Err(EdmError::Deserialization(format!("{class_name} row is not an object")));
    };
    Ok(members)
}

macro_rules! scalar_at {
    ($array:expr, $row:expr, $ty:ty) => {{
        let a = $array.as_any().downcast_ref::<$ty>().expect("checked data type");
        Value::from(a.value($row))
    }};
}

/// Convert one row of an arrow array into a JSON-style value tree.
fn value_at(array: &dyn Array, row: usize) -> Result<Value> {
    let value = match array.data_type() {
        DataType::Boolean => scalar_at!(array, row, BooleanArray),
        DataType::Int8 => scalar_at!(array, row, Int8Array),
        DataType::UInt8 => scalar_at!(array, row, UInt8Array),
        DataType::Int16 => scalar_at!(array, row, Int16Array),
        DataType::UInt16 => scalar_at!(array, row, UInt16Array),
        DataType::Int32 => scalar_at!(array, row, Int32Array),
        DataType::UInt32 => scalar_at!(array, row, UInt32Array),
        DataType::Int64 => scalar_at!(array, row, Int64Array),
        DataType::UInt64 => scalar_at!(array, row, UInt64Array),
        DataType::Float32 => scalar_at!(array, row, Float32Array),
        DataType::Float64 => scalar_at!(array, row, Float64Array),
        DataType::Utf8 => scalar_at!(array, row, StringArray),
        DataType::List(_) => {
            let list = array.as_any().downcast_ref::<ListArray>().expect("checked data type");
            let values = list.value(row);
            let mut out = Vec::with_capacity(values.len());
            for i in 0..values.len() {
                out.push(value_at(values.as_ref(), i)?);
            }
            Value::Array(out)
        }
        DataType::Struct(_) => {
            let record = array.as_any().downcast_ref::<StructArray>().expect("checked data type");
            let mut out = Map::new();
            for (name, column) in record.column_names().iter().zip(record.columns()) {
                out.insert((*name).to_owned(), value_at(column.as_ref(), row)?);
            }
            Value::Object(out)
        }
        other => {
            return Err(EdmError::Deserialization(format!(
                "unsupported data type {other} in metadata record"
            )))
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streamer::StreamerField;

    fn put_record(out: &mut Vec<u8>, version: u16, body: &[u8]) {
        out.extend_from_slice(&(0x4000_0000u32 | (2 + body.len() as u32)).to_be_bytes());
        out.extend_from_slice(&version.to_be_bytes());
        out.extend_from_slice(body);
    }

    fn put_string(out: &mut Vec<u8>, s: &str) {
        out.push(s.len() as u8);
        out.extend_from_slice(s.as_bytes());
    }

    fn put_string_vector(out: &mut Vec<u8>, items: &[&str]) {
        let mut body = Vec::new();
        body.extend_from_slice(&(items.len() as i32).to_be_bytes());
        for s in items {
            put_string(&mut body, s);
        }
        put_record(out, 6, &body);
    }

    fn meta_db() -> StreamerDb {
        let mut db = StreamerDb::new();
        db.insert(
            "JM::FileMetaData",
            vec![
                StreamerField::new("m_NavPath", "vector<string>"),
                StreamerField::new("m_EventEntries", "int"),
            ],
        );
        db.insert(
            "JM::UniqueIDTable",
            vec![StreamerField::new("m_tables", "vector<JM::TablePerUUID>")],
        );
        db.insert(
            "JM::TablePerUUID",
            vec![
                StreamerField::new("key", "string"),
                StreamerField::new("val", "JM::UUIDFields"),
            ],
        );
        db.insert(
            "JM::UUIDFields",
            vec![
                StreamerField::new("EntryID", "long"),
                StreamerField::new("DetID", "int"),
            ],
        );
        db
    }

    #[test]
    fn file_meta_data_exposes_nav_paths() {
        let mut body = Vec::new();
        put_string_vector(&mut body, &["/Event/Sim", "/Event/Gen"]);
        body.extend_from_slice(&42i32.to_be_bytes());
        let mut chunk = Vec::new();
        put_record(&mut chunk, 3, &body);
        // trailing padding the decode must tolerate (defensive skip-to-end)
        chunk.extend_from_slice(&[0u8; 6]);

        let reg = FactoryRegistry::with_defaults();
        let meta = decode_file_meta_data(&reg, &meta_db(), &chunk).unwrap();
        assert_eq!(meta.nav_paths().unwrap(), ["/Event/Sim", "/Event/Gen"]);
        assert_eq!(meta.members.get("m_EventEntries"), Some(&Value::from(42)));
    }

    #[test]
    fn unique_id_table_folds_rows_by_key() {
        let mut rows_body = Vec::new();
        rows_body.extend_from_slice(&2i32.to_be_bytes());
        for (key, entry_id, det_id) in [("uuid-a", 10i64, 1i32), ("uuid-b", 20, 2)] {
            let mut row = Vec::new();
            put_string(&mut row, key);
            let mut val = Vec::new();
            val.extend_from_slice(&entry_id.to_be_bytes());
            val.extend_from_slice(&det_id.to_be_bytes());
            put_record(&mut row, 1, &val);
            put_record(&mut rows_body, 1, &row);
        }
        let mut vec_bytes = Vec::new();
        put_record(&mut vec_bytes, 6, &rows_body);
        let mut chunk = Vec::new();
        put_record(&mut chunk, 2, &vec_bytes);

        let reg = FactoryRegistry::with_defaults();
        let table = decode_unique_id_table(&reg, &meta_db(), &chunk).unwrap();
        assert_eq!(table.tables.len(), 2);
        let a = table.get("uuid-a").unwrap();
        assert_eq!(a.get("EntryID"), Some(&Value::from(10)));
        assert_eq!(a.get("DetID"), Some(&Value::from(1)));
    }

    #[test]
    fn later_duplicate_key_wins() {
        let mut rows_body = Vec::new();
        rows_body.extend_from_slice(&2i32.to_be_bytes());
        for entry_id in [1i64, 2] {
            let mut row = Vec::new();
            put_string(&mut row, "dup");
            let mut val = Vec::new();
            val.extend_from_slice(&entry_id.to_be_bytes());
            val.extend_from_slice(&0i32.to_be_bytes());
            put_record(&mut row, 1, &val);
            put_record(&mut rows_body, 1, &row);
        }
        let mut vec_bytes = Vec::new();
        put_record(&mut vec_bytes, 6, &rows_body);
        let mut chunk = Vec::new();
        put_record(&mut chunk, 2, &vec_bytes);

        let reg = FactoryRegistry::with_defaults();
        let table = decode_unique_id_table(&reg, &meta_db(), &chunk).unwrap();
        assert_eq!(table.tables.len(), 1);
        assert_eq!(table.get("dup").unwrap().get("EntryID"), Some(&Value::from(2)));
    }
}
