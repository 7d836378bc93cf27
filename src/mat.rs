use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use flate2::read::ZlibDecoder;
use thiserror::Error;

// ---------------------------------------------------------------------------
// MATLAB Level 5 (.mat) container codec
// ---------------------------------------------------------------------------
//
// Reads the subset of the format the recording corpus uses:
// * numeric arrays of every class (double, single, int8..int64, unsigned,
//   logical), decoded to f64
// * arbitrarily nested cell arrays
// * zlib-compressed (v7) top-level elements
// * both byte orders
//
// Char, struct, sparse, object and complex arrays are surfaced as
// `MatValue::Unsupported` so callers can decide what to drop. HDF5-based
// v7.3 files are not handled and fail at the header check. Only 2-D
// arrays are reordered from column-major to row-major; arrays with three
// or more dimensions keep their storage order (the corpus channels are
// all vectors).

/// Errors produced while decoding or encoding a container.
#[derive(Debug, Error)]
pub enum MatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a MAT level 5 container: {0}")]
    Header(&'static str),

    #[error("malformed element: {0}")]
    Element(&'static str),

    #[error("corrupt zlib stream in compressed element: {0}")]
    Compression(std::io::Error),
}

// -- data element types (tag field) --
const MI_INT8: u32 = 1;
const MI_UINT8: u32 = 2;
const MI_INT16: u32 = 3;
const MI_UINT16: u32 = 4;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_SINGLE: u32 = 7;
const MI_DOUBLE: u32 = 9;
const MI_INT64: u32 = 12;
const MI_UINT64: u32 = 13;
const MI_MATRIX: u32 = 14;
const MI_COMPRESSED: u32 = 15;

// -- array classes (array flags sub-element) --
const MX_CELL: u32 = 1;
const MX_STRUCT: u32 = 2;
const MX_OBJECT: u32 = 3;
const MX_CHAR: u32 = 4;
const MX_SPARSE: u32 = 5;
const MX_DOUBLE: u32 = 6;
const MX_UINT64: u32 = 15;

const FLAG_COMPLEX: u32 = 0x0800;

const HEADER_LEN: usize = 128;

// ---------------------------------------------------------------------------
// MatValue – the polymorphic value tree stored under one variable name
// ---------------------------------------------------------------------------

/// A decoded MAT variable: flat numeric data, a nested cell array, or a
/// class this codec does not interpret.
#[derive(Debug, Clone, PartialEq)]
pub enum MatValue {
    /// Numeric array flattened to row-major order.
    Numeric(Vec<f64>),
    /// Cell array; entries may themselves be cells.
    Cell(Vec<MatValue>),
    /// Present in the file but not decodable to numbers (char, struct,
    /// sparse, object, complex).
    Unsupported(&'static str),
}

// ---------------------------------------------------------------------------
// MatFile – parsed container
// ---------------------------------------------------------------------------

/// All named variables of one container.
#[derive(Debug, Default)]
pub struct MatFile {
    vars: HashMap<String, MatValue>,
}

impl MatFile {
    /// Read and parse a container from disk.
    pub fn open(path: &Path) -> Result<Self, MatError> {
        Self::parse(&std::fs::read(path)?)
    }

    /// Parse a container from an in-memory buffer.
    pub fn parse(buf: &[u8]) -> Result<Self, MatError> {
        if buf.len() < HEADER_LEN {
            return Err(MatError::Header("shorter than the 128-byte header"));
        }
        let be = match &buf[126..128] {
            b"IM" => false,
            b"MI" => true,
            _ => return Err(MatError::Header("missing endian indicator")),
        };

        let mut vars = HashMap::new();
        parse_elements(&buf[HEADER_LEN..], be, &mut vars)?;
        Ok(MatFile { vars })
    }

    /// Look up a variable by name.
    pub fn get(&self, name: &str) -> Option<&MatValue> {
        self.vars.get(name)
    }

    /// Names of all top-level variables, in no particular order.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Element-level parsing
// ---------------------------------------------------------------------------

/// One tagged data element: its type and raw payload bytes.
struct Element<'a> {
    ty: u32,
    data: &'a [u8],
}

/// Decode the element starting at `off`; returns the element and the
/// offset of the next one (8-byte aligned). Handles the packed
/// "small data element" form where type and length share one word.
fn read_element(buf: &[u8], off: usize, be: bool) -> Result<(Element<'_>, usize), MatError> {
    if off + 8 > buf.len() {
        return Err(MatError::Element("truncated tag"));
    }
    let raw = read_u32(buf, off, be);
    if raw >> 16 != 0 {
        // Small data element: length (1..=4) packed into the upper half.
        let len = (raw >> 16) as usize;
        if len > 4 {
            return Err(MatError::Element("small element longer than 4 bytes"));
        }
        let data = &buf[off + 4..off + 4 + len];
        return Ok((Element { ty: raw & 0xFFFF, data }, off + 8));
    }
    let len = read_u32(buf, off + 4, be) as usize;
    let start = off + 8;
    let end = start
        .checked_add(len)
        .filter(|&e| e <= buf.len())
        .ok_or(MatError::Element("element overruns container"))?;
    Ok((Element { ty: raw, data: &buf[start..end] }, (end + 7) & !7))
}

/// Walk all top-level elements of `buf`, inserting named matrices into
/// `vars`. Compressed elements are inflated and recursed into.
fn parse_elements(
    buf: &[u8],
    be: bool,
    vars: &mut HashMap<String, MatValue>,
) -> Result<(), MatError> {
    let mut off = 0;
    while off + 8 <= buf.len() {
        let (el, next) = read_element(buf, off, be)?;
        match el.ty {
            MI_MATRIX => {
                let (name, value) = parse_matrix(el.data, be)?;
                if !name.is_empty() {
                    vars.insert(name, value);
                }
            }
            MI_COMPRESSED => {
                let mut inflated = Vec::new();
                ZlibDecoder::new(el.data)
                    .read_to_end(&mut inflated)
                    .map_err(MatError::Compression)?;
                parse_elements(&inflated, be, vars)?;
            }
            // Unknown top-level element types are skipped, not fatal.
            _ => {}
        }
        off = next;
    }
    Ok(())
}

/// Parse one `miMATRIX` payload: array flags, dimensions, name, then the
/// class-specific data sub-elements.
fn parse_matrix(buf: &[u8], be: bool) -> Result<(String, MatValue), MatError> {
    // MATLAB writes empty cell entries as zero-length matrix elements.
    if buf.is_empty() {
        return Ok((String::new(), MatValue::Numeric(Vec::new())));
    }

    let (flags_el, off) = read_element(buf, 0, be)?;
    if flags_el.ty != MI_UINT32 || flags_el.data.len() < 8 {
        return Err(MatError::Element("array flags missing"));
    }
    let flags = read_u32(flags_el.data, 0, be);
    let class = flags & 0xFF;

    let (dims_el, off) = read_element(buf, off, be)?;
    if dims_el.ty != MI_INT32 {
        return Err(MatError::Element("dimensions missing"));
    }
    let mut dims = Vec::with_capacity(dims_el.data.len() / 4);
    for i in 0..dims_el.data.len() / 4 {
        let d = read_u32(dims_el.data, i * 4, be) as i32;
        if d < 0 {
            return Err(MatError::Element("negative dimension"));
        }
        dims.push(d as usize);
    }

    let (name_el, off) = read_element(buf, off, be)?;
    if name_el.ty != MI_INT8 {
        return Err(MatError::Element("name missing"));
    }
    let name = String::from_utf8_lossy(name_el.data)
        .trim_end_matches('\0')
        .to_string();

    if flags & FLAG_COMPLEX != 0 {
        return Ok((name, MatValue::Unsupported("complex array")));
    }

    let value = match class {
        MX_CELL => {
            // Every entry carries at least an 8-byte tag, so the payload
            // bounds the plausible entry count.
            let count = element_count(&dims, buf.len().saturating_sub(off) / 8)?;
            let mut entries = Vec::with_capacity(count);
            let mut pos = off;
            for _ in 0..count {
                let (cell_el, next) = read_element(buf, pos, be)?;
                if cell_el.ty != MI_MATRIX {
                    return Err(MatError::Element("cell entry is not a matrix"));
                }
                let (_, entry) = parse_matrix(cell_el.data, be)?;
                entries.push(entry);
                pos = next;
            }
            MatValue::Cell(entries)
        }
        MX_DOUBLE..=MX_UINT64 => {
            let mut data = if element_count(&dims, buf.len())? == 0 {
                Vec::new()
            } else {
                let (real_el, _) = read_element(buf, off, be)?;
                decode_numeric(&real_el, be)?
            };
            // Storage is column-major; flatten row-major like the
            // downstream tabular view expects.
            if dims.len() == 2 && dims[0] > 1 && dims[1] > 1 {
                data = transpose(&data, dims[0], dims[1]);
            }
            MatValue::Numeric(data)
        }
        MX_CHAR => MatValue::Unsupported("char array"),
        MX_STRUCT => MatValue::Unsupported("struct array"),
        MX_OBJECT => MatValue::Unsupported("object array"),
        MX_SPARSE => MatValue::Unsupported("sparse array"),
        _ => MatValue::Unsupported("unknown class"),
    };
    Ok((name, value))
}

/// Decode a numeric data element to f64. The storage type may be narrower
/// than the array class (MATLAB compresses integral doubles on write).
fn decode_numeric(el: &Element<'_>, be: bool) -> Result<Vec<f64>, MatError> {
    let d = el.data;
    let out = match el.ty {
        MI_INT8 => d.iter().map(|&b| b as i8 as f64).collect(),
        MI_UINT8 => d.iter().map(|&b| b as f64).collect(),
        MI_INT16 => chunks(d, 2, |c| read_u16(c, 0, be) as i16 as f64),
        MI_UINT16 => chunks(d, 2, |c| read_u16(c, 0, be) as f64),
        MI_INT32 => chunks(d, 4, |c| read_u32(c, 0, be) as i32 as f64),
        MI_UINT32 => chunks(d, 4, |c| read_u32(c, 0, be) as f64),
        MI_SINGLE => chunks(d, 4, |c| {
            let bits = read_u32(c, 0, be);
            f32::from_bits(bits) as f64
        }),
        MI_DOUBLE => chunks(d, 8, |c| f64::from_bits(read_u64(c, 0, be))),
        MI_INT64 => chunks(d, 8, |c| read_u64(c, 0, be) as i64 as f64),
        MI_UINT64 => chunks(d, 8, |c| read_u64(c, 0, be) as f64),
        _ => return Err(MatError::Element("unexpected type for numeric data")),
    };
    Ok(out)
}

/// Element count implied by the dimensions sub-element. Dimensions are
/// untrusted input: a product that overflows or exceeds what the payload
/// could possibly hold marks the element malformed.
fn element_count(dims: &[usize], max: usize) -> Result<usize, MatError> {
    let mut count: usize = 1;
    for &d in dims {
        count = count
            .checked_mul(d)
            .ok_or(MatError::Element("dimension product overflows"))?;
    }
    if count > max {
        return Err(MatError::Element("dimensions exceed element payload"));
    }
    Ok(count)
}

fn chunks(d: &[u8], size: usize, f: impl Fn(&[u8]) -> f64) -> Vec<f64> {
    d.chunks_exact(size).map(|c| f(c)).collect()
}

fn transpose(data: &[f64], rows: usize, cols: usize) -> Vec<f64> {
    if rows * cols != data.len() {
        return data.to_vec();
    }
    let mut out = vec![0.0; data.len()];
    for r in 0..rows {
        for c in 0..cols {
            out[r * cols + c] = data[c * rows + r];
        }
    }
    out
}

fn read_u16(b: &[u8], o: usize, be: bool) -> u16 {
    let v = [b[o], b[o + 1]];
    if be { u16::from_be_bytes(v) } else { u16::from_le_bytes(v) }
}

fn read_u32(b: &[u8], o: usize, be: bool) -> u32 {
    let v = [b[o], b[o + 1], b[o + 2], b[o + 3]];
    if be { u32::from_be_bytes(v) } else { u32::from_le_bytes(v) }
}

fn read_u64(b: &[u8], o: usize, be: bool) -> u64 {
    let v: [u8; 8] = b[o..o + 8].try_into().unwrap();
    if be { u64::from_be_bytes(v) } else { u64::from_le_bytes(v) }
}

// ---------------------------------------------------------------------------
// Writer – little-endian, doubles and cells only
// ---------------------------------------------------------------------------
//
// Backs the sample generator and the test suite; not a general encoder.

/// Write a container holding the given named values. Always little-endian,
/// numeric data always stored as doubles.
pub fn write_file(path: &Path, vars: &[(&str, &MatValue)]) -> std::io::Result<()> {
    let mut out = Vec::new();
    write_header(&mut out);
    for (name, value) in vars {
        encode_matrix(name, value, &mut out)?;
    }
    std::fs::write(path, out)
}

fn write_header(out: &mut Vec<u8>) {
    let desc = b"MATLAB 5.0 MAT-file, created by oxi-dataset";
    let mut header = [0x20u8; 116];
    header[..desc.len()].copy_from_slice(desc);
    out.extend_from_slice(&header);
    out.extend_from_slice(&[0u8; 8]); // subsystem data offset
    out.extend_from_slice(&0x0100u16.to_le_bytes()); // version
    out.extend_from_slice(b"IM");
}

fn encode_matrix(name: &str, value: &MatValue, out: &mut Vec<u8>) -> std::io::Result<()> {
    let mut body = Vec::new();
    match value {
        MatValue::Numeric(values) => {
            put_flags(&mut body, MX_DOUBLE);
            put_dims(&mut body, values.len());
            put_name(&mut body, name);
            put_tag(&mut body, MI_DOUBLE, values.len() * 8);
            for v in values {
                body.extend_from_slice(&v.to_le_bytes());
            }
        }
        MatValue::Cell(entries) => {
            put_flags(&mut body, MX_CELL);
            put_dims(&mut body, entries.len());
            put_name(&mut body, name);
            for entry in entries {
                encode_matrix("", entry, &mut body)?;
            }
        }
        MatValue::Unsupported(what) => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("cannot encode {what}"),
            ));
        }
    }
    put_tag(out, MI_MATRIX, body.len());
    out.extend_from_slice(&body);
    Ok(())
}

fn put_tag(out: &mut Vec<u8>, ty: u32, len: usize) {
    out.extend_from_slice(&ty.to_le_bytes());
    out.extend_from_slice(&(len as u32).to_le_bytes());
}

fn put_flags(out: &mut Vec<u8>, class: u32) {
    put_tag(out, MI_UINT32, 8);
    out.extend_from_slice(&class.to_le_bytes());
    out.extend_from_slice(&[0u8; 4]);
}

fn put_dims(out: &mut Vec<u8>, n: usize) {
    put_tag(out, MI_INT32, 8);
    // Empty arrays are written 0x0, everything else as a 1xN row vector.
    let rows: u32 = if n == 0 { 0 } else { 1 };
    out.extend_from_slice(&rows.to_le_bytes());
    out.extend_from_slice(&(n as u32).to_le_bytes());
}

fn put_name(out: &mut Vec<u8>, name: &str) {
    put_tag(out, MI_INT8, name.len());
    out.extend_from_slice(name.as_bytes());
    pad8(out);
}

fn pad8(out: &mut Vec<u8>) {
    while out.len() % 8 != 0 {
        out.push(0);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
