//! Shared helpers: encode synthetic JM:: records the way the experiment
//! framework serializes them (big-endian, versioned byte-count headers).

/// Append a versioned record: byte-count header, version, body.
pub fn put_record(out: &mut Vec<u8>, version: u16, body: &[u8]) {
    out.extend_from_slice(&(0x4000_0000u32 | (2 + body.len() as u32)).to_be_bytes());
    out.extend_from_slice(&version.to_be_bytes());
    out.extend_from_slice(body);
}

/// Append a ROOT-encoded string (short form).
pub fn put_string(out: &mut Vec<u8>, s: &str) {
    assert!(s.len() < 255);
    out.push(s.len() as u8);
    out.extend_from_slice(s.as_bytes());
}

/// Append a `TObject` preamble with no flags set.
pub fn put_tobject(out: &mut Vec<u8>) {
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
}

/// Append a serialized `JM::SmartRef`.
pub fn put_smart_ref(out: &mut Vec<u8>, pidf: u16, entry: i64) {
    put_tobject(out);
    out.extend_from_slice(&pidf.to_be_bytes());
    out.extend_from_slice(&entry.to_be_bytes());
}
