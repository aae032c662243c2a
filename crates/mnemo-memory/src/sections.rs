// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Section-level merge for the long-term memory file.
//!
//! A document is a preamble (text before the first heading) followed by
//! sections introduced by `#`, `##` or `###` heading lines. Writing a document
//! into `MEMORY.md` replaces same-named sections and appends new ones; every
//! other section, and the preamble unless the incoming text has one, is
//! carried over byte for byte.

use std::sync::LazyLock;

use regex::Regex;

static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{1,3}[ \t]+\S").unwrap());

/// One `{heading -> body}` pair. `heading` is `None` for the preamble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// The full heading line, including its trailing newline if present.
    pub heading: Option<String>,
    /// Everything up to the next heading, newlines included.
    pub body: String,
}

impl Section {
    /// Merge key: the heading line without surrounding whitespace.
    fn key(&self) -> Option<&str> {
        self.heading.as_deref().map(str::trim)
    }

    fn is_blank(&self) -> bool {
        self.heading.is_none() && self.body.trim().is_empty()
    }
}

/// Splits a document into its preamble and sections, losslessly.
///
/// The preamble is always the first element, possibly with an empty body.
pub fn parse_sections(doc: &str) -> Vec<Section> {
    let mut sections = vec![Section {
        heading: None,
        body: String::new(),
    }];

    for line in doc.split_inclusive('\n') {
        if HEADING.is_match(line) {
            sections.push(Section {
                heading: Some(line.to_string()),
                body: String::new(),
            });
        } else if let Some(current) = sections.last_mut() {
            current.body.push_str(line);
        }
    }

    sections
}

/// Renders sections back to text, inserting a newline where a replaced body
/// would otherwise run into the next heading.
pub fn render_sections(sections: &[Section]) -> String {
    let mut out = String::new();
    for section in sections {
        if let Some(heading) = &section.heading {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(heading);
            if !heading.ends_with('\n') && !section.body.is_empty() {
                out.push('\n');
            }
        }
        out.push_str(&section.body);
    }
    out
}

/// Merges `incoming` into `existing`.
///
/// Sections present in both take the incoming body, in the existing order;
/// sections only in `incoming` are appended in their incoming order. A
/// non-blank incoming preamble replaces the existing one.
pub fn merge_sections(existing: &str, incoming: &str) -> String {
    let mut merged = parse_sections(existing);
    let incoming = parse_sections(incoming);

    for section in incoming {
        if section.is_blank() {
            continue;
        }
        let slot = merged.iter_mut().find(|s| s.key() == section.key());
        match slot {
            Some(existing) => {
                existing.body = section.body;
            }
            None => merged.push(section),
        }
    }

    render_sections(&merged)
}
