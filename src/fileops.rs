//! Byte-level file helpers.  Errors come back exactly as `std::fs` reports
//! them, so a missing file is still `io::ErrorKind::NotFound`.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;

pub fn read_bytes<P: AsRef<Path>>(path: P) -> io::Result<Vec<u8>> {
    fs::read(path)
}

pub fn write_bytes<P: AsRef<Path>>(path: P, data: &[u8]) -> io::Result<()> {
    fs::write(path, data)
}

pub fn read_json<P: AsRef<Path>>(path: P) -> io::Result<Value> {
    let data = fs::read(path)?;
    serde_json::from_slice(&data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Write `value` as JSON, indented when `pretty` is set.
pub fn write_json<P: AsRef<Path>>(path: P, value: &Value, pretty: bool) -> io::Result<()> {
    let data = if pretty {
        serde_json::to_vec_pretty(value)
    } else {
        serde_json::to_vec(value)
    }
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(path, data)
}
