use anyhow::{Context, Result};
use bytes::Bytes;

pub fn string_from_bytes(bytes: Bytes) -> Result<String> {
    Ok(String::from_utf8(bytes.into())?)
}

/// Parses a decimal ASCII count such as `b"42"`.
pub fn parse_count(bytes: &[u8]) -> Result<u64> {
    let s = std::str::from_utf8(bytes).context("count is not valid UTF-8")?;
    s.parse::<u64>()
        .with_context(|| format!("`{s}` is not a count"))
}
