//! Line codec for committed output: one `key<TAB>value` pair per line.

use anyhow::{anyhow, Result};
use bytes::{BufMut, Bytes, BytesMut};

use crate::KeyValue;

pub const SEPARATOR: u8 = b'\t';

/// Appends `key<TAB>value\n` to the buffer.
pub fn encode_into(kv: &KeyValue, buf: &mut BytesMut) {
    buf.reserve(kv.key.len() + kv.value.len() + 2);
    buf.put_slice(&kv.key);
    buf.put_u8(SEPARATOR);
    buf.put_slice(&kv.value);
    buf.put_u8(b'\n');
}

pub fn encode(kv: &KeyValue) -> Bytes {
    let mut buf = BytesMut::new();
    encode_into(kv, &mut buf);
    buf.freeze()
}

/// Parses one output line. A trailing `\n` is accepted and dropped.
///
/// The key never contains a tab, so the line is split on the first one.
pub fn decode(line: &str) -> Result<KeyValue> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let (key, value) = line
        .split_once(SEPARATOR as char)
        .ok_or_else(|| anyhow!("output line `{line}` has no tab separator"))?;
    Ok(KeyValue::new(key.to_string(), value.to_string()))
}
