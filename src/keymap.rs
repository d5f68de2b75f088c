//! Trigger keymap: the parsed form of the configuration document.
//!
//! The document is plain text, one entry per line:
//!
//! ```text
//! # living room
//! /livingroom_on        # path key, fired over HTTP
//! 20DF10EF              # NEC code
//! P500                  # pause 500 ms
//! @IN_1_DOWN            # event key, fired by input 1
//! 40040D:00000000       # Panasonic address:data
//! ```
//!
//! Everything from the first `#` is a comment.  Lines are trimmed and blank
//! ones skipped.  A line starting with `/` or `@` opens a section; any other
//! line is a command appended to the current section, or dropped when no
//! section is open yet.  A repeated header resets that section's commands.
//!
//! The map is always rebuilt from the whole document, never patched.
//! Headers longer than [`TRIGGER_KEY_CAP`] still parse, but no trigger can
//! ever carry them; [`KeyMap::untriggerable_keys`] lists them.

use std::collections::HashMap;

use crate::events::{TRIGGER_KEY_CAP, trigger_kind};

/// Comment marker.
pub const COMMENT_MARKER: char = '#';

/// One section: a trigger key and its ordered command lines.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    key: String,
    commands: Vec<String>,
}

/// Ordered mapping of trigger key → command lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMap {
    sections: Vec<Section>,
    index: HashMap<String, usize>,
}

/// Strip the comment and surrounding whitespace from one raw line.
pub fn clean_line(line: &str) -> &str {
    let end = line.find(COMMENT_MARKER).unwrap_or(line.len());
    line[..end].trim()
}

/// Whether a cleaned line opens a new section.
pub fn is_header(line: &str) -> bool {
    trigger_kind(line).is_some()
}

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a full document.
    pub fn parse(text: &str) -> Self {
        let mut map = Self::new();
        let mut current: Option<usize> = None;

        for raw in text.lines() {
            let line = clean_line(raw);
            if line.is_empty() {
                continue;
            }

            if is_header(line) {
                current = Some(map.open_section(line));
            } else if let Some(idx) = current {
                map.sections[idx].commands.push(line.to_owned());
            }
        }

        map
    }

    fn open_section(&mut self, key: &str) -> usize {
        if let Some(&idx) = self.index.get(key) {
            self.sections[idx].commands.clear();
            return idx;
        }
        let idx = self.sections.len();
        self.sections.push(Section {
            key: key.to_owned(),
            commands: Vec::new(),
        });
        self.index.insert(key.to_owned(), idx);
        idx
    }

    /// Command lines for `key`, if the section exists.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.index
            .get(key)
            .map(|&idx| self.sections[idx].commands.as_slice())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.key.as_str())
    }

    /// Headers too long to fit in a queued trigger, in document order.
    pub fn untriggerable_keys(&self) -> impl Iterator<Item = &str> {
        self.keys().filter(|key| key.len() > TRIGGER_KEY_CAP)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Total number of command lines across all sections.
    pub fn command_count(&self) -> usize {
        self.sections.iter().map(|s| s.commands.len()).sum()
    }

    /// Render the map back to a document without comments or blank lines.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push_str(&section.key);
            out.push('\n');
            for cmd in &section.commands {
                out.push_str(cmd);
                out.push('\n');
            }
        }
        out
    }
}
