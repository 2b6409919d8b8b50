//! Decoder tree: turns raw branch bytes into typed arrow columns.
//!
//! Each [`Reader`] is an accumulator mirroring one [`FactoryNode`]. One
//! `read_row` call decodes a single logical row from the cursor; after
//! all rows, `finish` emits the typed column(s). Composite readers decode
//! their children in declared order, which is exactly the order the
//! paired shape declares.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array,
    Int8Array, ListArray, StringArray, StructArray, UInt16Array, UInt32Array, UInt64Array,
    UInt8Array,
};
use arrow::buffer::OffsetBuffer;
use arrow::datatypes::{DataType, Field, FieldRef};

use crate::error::{EdmError, Result};
use crate::factory::{smart_ref_fields, FactoryKind, FactoryNode, PrimType};
use crate::wire::WireCursor;

/// Build the decoder tree for a descriptor. Children are built first,
/// then wrapped, mirroring the descriptor's structure.
pub fn make_reader(node: &FactoryNode) -> Reader {
    let name = node.name.clone();
    match &node.kind {
        FactoryKind::Primitive(p) => Reader::Primitive(PrimReader::new(name, *p)),
        FactoryKind::Str => Reader::Str(StrReader { name, values: Vec::new() }),
        FactoryKind::Vector(elem) => Reader::Vector(SeqReader::new(name, make_reader(elem), true)),
        FactoryKind::RefBlock(elem) => {
            Reader::RefBlock(SeqReader::new(name, make_reader(elem), false))
        }
        FactoryKind::SmartRef => Reader::SmartRef(SmartRefReader {
            name,
            pidf: Vec::new(),
            entry: Vec::new(),
        }),
        FactoryKind::Group { children, .. } => Reader::Group(GroupReader {
            name,
            children: children.iter().map(make_reader).collect(),
        }),
    }
}

/// Decode one row per `[offsets[i], offsets[i+1])` byte span and return
/// `(field, column)` for everything read.
///
/// A span that extends past the buffer, or a row that reads beyond its
/// span, is a deserialization error.
pub fn read_rows(data: &[u8], offsets: &[usize], mut reader: Reader) -> Result<(FieldRef, ArrayRef)> {
    if offsets.is_empty() {
        return Err(EdmError::Deserialization("row offset table is empty".into()));
    }
    let mut cursor = WireCursor::new(data);
    for span in offsets.windows(2) {
        let (start, stop) = (span[0], span[1]);
        if start > stop || stop > data.len() {
            return Err(EdmError::Deserialization(format!(
                "row span {}..{} exceeds buffer of {} bytes",
                start,
                stop,
                data.len()
            )));
        }
        cursor.seek(start)?;
        reader.read_row(&mut cursor)?;
        if cursor.pos() > stop {
            return Err(EdmError::Deserialization(format!(
                "row starting at {} read past its span end {}",
                start, stop
            )));
        }
    }
    reader.finish()
}

/// Accumulating decoder for one descriptor node.
#[derive(Debug)]
pub enum Reader {
    /// Primitive scalar leaf.
    Primitive(PrimReader),
    /// String leaf.
    Str(StrReader),
    /// `vector<T>` sequence.
    Vector(SeqReader),
    /// Navigator reference block (object header + element array).
    RefBlock(SeqReader),
    /// `JM::SmartRef` two-column leaf.
    SmartRef(SmartRefReader),
    /// Composite class.
    Group(GroupReader),
}

impl Reader {
    /// Decode one logical row from the cursor.
    pub fn read_row(&mut self, c: &mut WireCursor<'_>) -> Result<()> {
        match self {
            Reader::Primitive(r) => r.read_row(c),
            Reader::Str(r) => {
                r.values.push(c.read_string()?);
                Ok(())
            }
            Reader::Vector(r) | Reader::RefBlock(r) => r.read_row(c),
            Reader::SmartRef(r) => r.read_row(c),
            Reader::Group(r) => r.read_row(c),
        }
    }

    /// Emit the accumulated column and the field describing it.
    pub fn finish(self) -> Result<(FieldRef, ArrayRef)> {
        match self {
            Reader::Primitive(r) => Ok(r.finish()),
            Reader::Str(r) => {
                let field = Arc::new(Field::new(r.name, DataType::Utf8, false));
                Ok((field, Arc::new(StringArray::from(r.values)) as ArrayRef))
            }
            Reader::Vector(r) | Reader::RefBlock(r) => r.finish(),
            Reader::SmartRef(r) => r.finish(),
            Reader::Group(r) => r.finish(),
        }
    }
}

// ── primitive leaves ───────────────────────────────────────────

/// Typed accumulator for primitive scalars.
#[derive(Debug)]
pub struct PrimReader {
    name: String,
    vals: PrimVals,
}

#[derive(Debug)]
enum PrimVals {
    Bool(Vec<bool>),
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl PrimReader {
    fn new(name: String, prim: PrimType) -> Self {
        let vals = match prim {
            PrimType::Bool => PrimVals::Bool(Vec::new()),
            PrimType::I8 => PrimVals::I8(Vec::new()),
            PrimType::U8 => PrimVals::U8(Vec::new()),
            PrimType::I16 => PrimVals::I16(Vec::new()),
            PrimType::U16 => PrimVals::U16(Vec::new()),
            PrimType::I32 => PrimVals::I32(Vec::new()),
            PrimType::U32 => PrimVals::U32(Vec::new()),
            PrimType::I64 => PrimVals::I64(Vec::new()),
            PrimType::U64 => PrimVals::U64(Vec::new()),
            PrimType::F32 => PrimVals::F32(Vec::new()),
            PrimType::F64 => PrimVals::F64(Vec::new()),
        };
        Self { name, vals }
    }

    fn read_row(&mut self, c: &mut WireCursor<'_>) -> Result<()> {
        match &mut self.vals {
            PrimVals::Bool(v) => v.push(c.read_bool()?),
            PrimVals::I8(v) => v.push(c.read_i8()?),
            PrimVals::U8(v) => v.push(c.read_u8()?),
            PrimVals::I16(v) => v.push(c.read_i16()?),
            PrimVals::U16(v) => v.push(c.read_u16()?),
            PrimVals::I32(v) => v.push(c.read_i32()?),
            PrimVals::U32(v) => v.push(c.read_u32()?),
            PrimVals::I64(v) => v.push(c.read_i64()?),
            PrimVals::U64(v) => v.push(c.read_u64()?),
            PrimVals::F32(v) => v.push(c.read_f32()?),
            PrimVals::F64(v) => v.push(c.read_f64()?),
        }
        Ok(())
    }

    fn finish(self) -> (FieldRef, ArrayRef) {
        let (dt, array): (DataType, ArrayRef) = match self.vals {
            PrimVals::Bool(v) => (DataType::Boolean, Arc::new(BooleanArray::from(v))),
            PrimVals::I8(v) => (DataType::Int8, Arc::new(Int8Array::from(v))),
            PrimVals::U8(v) => (DataType::UInt8, Arc::new(UInt8Array::from(v))),
            PrimVals::I16(v) => (DataType::Int16, Arc::new(Int16Array::from(v))),
            PrimVals::U16(v) => (DataType::UInt16, Arc::new(UInt16Array::from(v))),
            PrimVals::I32(v) => (DataType::Int32, Arc::new(Int32Array::from(v))),
            PrimVals::U32(v) => (DataType::UInt32, Arc::new(UInt32Array::from(v))),
            PrimVals::I64(v) => (DataType::Int64, Arc::new(Int64Array::from(v))),
            PrimVals::U64(v) => (DataType::UInt64, Arc::new(UInt64Array::from(v))),
            PrimVals::F32(v) => (DataType::Float32, Arc::new(Float32Array::from(v))),
            PrimVals::F64(v) => (DataType::Float64, Arc::new(Float64Array::from(v))),
        };
        (Arc::new(Field::new(self.name, dt, false)), array)
    }
}

// ── string leaf ────────────────────────────────────────────────

/// Accumulator for ROOT-encoded strings.
#[derive(Debug)]
pub struct StrReader {
    name: String,
    values: Vec<String>,
}

// ── sequences ──────────────────────────────────────────────────

/// Accumulator for `vector<T>` members and the navigator reference block.
///
/// Both decode a header, an element count and `count` elements per row;
/// an STL vector counts with a signed i32 after a versioned header, the
/// reference block with a u32 after its object header.
#[derive(Debug)]
pub struct SeqReader {
    name: String,
    lengths: Vec<usize>,
    elem: Box<Reader>,
    stl: bool,
}

impl SeqReader {
    fn new(name: String, elem: Reader, stl: bool) -> Self {
        Self { name, lengths: Vec::new(), elem: Box::new(elem), stl }
    }

    fn read_row(&mut self, c: &mut WireCursor<'_>) -> Result<()> {
        let (_ver, end) = c.read_record_header()?;
        let count = if self.stl {
            let n = c.read_i32()?;
            if n < 0 {
                return Err(EdmError::Deserialization(format!(
                    "negative element count {} in '{}'",
                    n, self.name
                )));
            }
            n as usize
        } else {
            c.read_u32()? as usize
        };
        for _ in 0..count {
            self.elem.read_row(c)?;
        }
        self.lengths.push(count);
        if let Some(end) = end {
            // no end-of-record marker inside; trust the byte count
            c.seek(end)?;
        }
        Ok(())
    }

    fn finish(self) -> Result<(FieldRef, ArrayRef)> {
        let (elem_field, values) = self.elem.finish()?;
        let offsets = OffsetBuffer::from_lengths(self.lengths.iter().copied());
        let list = ListArray::try_new(elem_field.clone(), offsets, values, None)?;
        let field = Arc::new(Field::new(self.name, DataType::List(elem_field), false));
        Ok((field, Arc::new(list) as ArrayRef))
    }
}

// ── JM::SmartRef ───────────────────────────────────────────────

/// Accumulator for `JM::SmartRef`: TObject preamble, u16 pidf, i64 entry.
#[derive(Debug)]
pub struct SmartRefReader {
    name: String,
    pidf: Vec<u16>,
    entry: Vec<i64>,
}

impl SmartRefReader {
    fn read_row(&mut self, c: &mut WireCursor<'_>) -> Result<()> {
        c.skip_tobject()?;
        self.pidf.push(c.read_u16()?);
        self.entry.push(c.read_i64()?);
        Ok(())
    }

    fn finish(self) -> Result<(FieldRef, ArrayRef)> {
        let fields = smart_ref_fields();
        let columns: Vec<ArrayRef> = vec![
            Arc::new(UInt16Array::from(self.pidf)),
            Arc::new(Int64Array::from(self.entry)),
        ];
        let array = StructArray::try_new(fields.clone(), columns, None)?;
        let field = Arc::new(Field::new(self.name, DataType::Struct(fields), false));
        Ok((field, Arc::new(array) as ArrayRef))
    }
}

// ── composite classes ──────────────────────────────────────────

/// Accumulator for JM::/CLHEP:: composite classes.
#[derive(Debug)]
pub struct GroupReader {
    name: String,
    children: Vec<Reader>,
}

impl GroupReader {
    fn read_row(&mut self, c: &mut WireCursor<'_>) -> Result<()> {
        let (_ver, end) = c.read_record_header()?;
        for child in &mut self.children {
            child.read_row(c)?;
        }
        if let Some(end) = end {
            c.seek(end)?;
        }
        Ok(())
    }

    fn finish(self) -> Result<(FieldRef, ArrayRef)> {
        let mut fields = Vec::with_capacity(self.children.len());
        let mut columns = Vec::with_capacity(self.children.len());
        for child in self.children {
            let (field, column) = child.finish()?;
            fields.push(field);
            columns.push(column);
        }
        let fields = arrow::datatypes::Fields::from(fields);
        let array = StructArray::try_new(fields.clone(), columns, None)?;
        let field = Arc::new(Field::new(self.name, DataType::Struct(fields), false));
        Ok((field, Arc::new(array) as ArrayRef))
    }
}
