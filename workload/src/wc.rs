//! A MapReduce-compatible implementation of word count.
//!
//! The mapper normalizes each line before splitting it: lowercase first, then
//! drop ASCII punctuation, then drop newlines. The order matters for input
//! such as `"Hello,"`, which must count as `hello`.

use anyhow::Result;
use bytes::{BufMut, Bytes, BytesMut};

use common::utils::{parse_count, string_from_bytes};
use common::{KeyValue, MapOutput};

/// Word separators: Unicode whitespace plus the ASCII information separators
/// U+001C..=U+001F, which text tools commonly treat as line and field breaks.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Splits one line of text into normalized words, in line order.
pub fn tokenize(line: &str) -> Vec<String> {
    let normalized: String = line
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation() && *c != '\n')
        .collect();

    normalized
        .split(is_separator)
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// Emits `(word, 1)` for every word of the record's line.
pub fn map(kv: KeyValue, _aux: Bytes) -> MapOutput {
    let line = string_from_bytes(kv.value)?;
    let words = tokenize(&line);

    let iter = words.into_iter().map(|word| -> Result<KeyValue> {
        Ok(KeyValue {
            key: Bytes::from(word),
            value: Bytes::from_static(b"1"),
        })
    });
    Ok(Box::new(iter))
}

/// Sums the counts of one word.
pub fn reduce(
    _key: Bytes,
    values: Box<dyn Iterator<Item = Bytes> + '_>,
    _aux: Bytes,
) -> Result<Bytes> {
    let mut count = 0u64;
    for value in values {
        count += parse_count(&value)?;
    }

    let mut writer = BytesMut::with_capacity(20);
    writer.put(count.to_string().as_bytes());
    Ok(writer.freeze())
}
