//! Persisted state blobs
//!
//! Layout: a little-endian `i32` entry count followed by that many UTF-8
//! strings, each terminated by a NUL byte. Empty strings mark unloaded
//! lines.

use crate::error::{Result, TransportError};

/// Append a NUL-terminated string
pub fn write_string(out: &mut Vec<u8>, value: &str) {
    out.extend_from_slice(value.as_bytes());
    out.push(0);
}

/// Encode a list of filenames
pub fn encode_filenames(names: &[String]) -> Vec<u8> {
    let capacity = 4 + names.iter().map(|n| n.len() + 1).sum::<usize>();
    let mut out = Vec::with_capacity(capacity);
    out.extend_from_slice(&(names.len() as i32).to_le_bytes());
    for name in names {
        write_string(&mut out, name);
    }
    out
}

/// Decode a list of filenames
///
/// # Errors
/// * `CorruptState` - If the count is missing or negative, an entry is
///   unterminated, or an entry is not UTF-8
pub fn decode_filenames(data: &[u8]) -> Result<Vec<String>> {
    let Some((header, mut rest)) = data.split_first_chunk::<4>() else {
        return Err(corrupt("missing entry count"));
    };
    let count = i32::from_le_bytes(*header);
    if count < 0 {
        return Err(corrupt(&format!("negative entry count {}", count)));
    }
    // every entry takes at least its terminator
    if count as usize > rest.len() {
        return Err(corrupt(&format!(
            "{} entries announced, {} bytes present",
            count,
            rest.len()
        )));
    }

    let mut names = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (name, tail) = read_string(rest)?;
        names.push(name);
        rest = tail;
    }
    Ok(names)
}

/// Read one NUL-terminated string, returning it and the bytes after it
pub fn read_string(data: &[u8]) -> Result<(String, &[u8])> {
    let end = data
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| corrupt("unterminated string"))?;
    let name = std::str::from_utf8(&data[..end])
        .map_err(|e| corrupt(&format!("invalid UTF-8: {}", e)))?;
    Ok((name.to_string(), &data[end + 1..]))
}

fn corrupt(reason: &str) -> TransportError {
    TransportError::CorruptState {
        reason: reason.to_string(),
    }
}
