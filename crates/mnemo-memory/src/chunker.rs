// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line-based chunking of corpus files.
//!
//! Chunk sizes are configured in characters and converted to line counts at
//! 80 characters per line. This is an approximation: the chunk-size defaults
//! were chosen against it, so it stays even though lines vary in length.

use sha2::{Digest, Sha256};

use crate::types::Chunk;

/// Assumed average line length when converting character budgets to lines.
pub const CHARS_PER_LINE: usize = 80;

/// Length of the hash prefix embedded in chunk ids.
const ID_HASH_PREFIX: usize = 16;

/// SHA-256 of `text`, hex encoded.
pub fn hash_text(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Splits `content` into overlapping line windows.
///
/// `chunk_size` and `chunk_overlap` are character budgets. A window holds
/// `chunk_size / 80` lines (at least one) and consecutive windows share
/// `chunk_overlap / 80` lines, capped so every window advances by at least
/// one line. Windows consisting only of whitespace are skipped.
pub fn chunk_file(path: &str, content: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<Chunk> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.is_empty() {
        return Vec::new();
    }

    let window = (chunk_size / CHARS_PER_LINE).max(1);
    let overlap = (chunk_overlap / CHARS_PER_LINE).min(window - 1);
    let step = window - overlap;

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + window).min(lines.len());
        let text = lines[start..end].join("\n");
        if !text.trim().is_empty() {
            let hash = hash_text(&text);
            let start_line = start + 1;
            chunks.push(Chunk {
                id: format!("{path}:{start_line}:{}", &hash[..ID_HASH_PREFIX]),
                path: path.to_string(),
                start_line,
                end_line: end,
                text,
                hash,
            });
        }
        if end == lines.len() {
            break;
        }
        start += step;
    }

    chunks
}
