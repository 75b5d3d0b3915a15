//! Tab-delimited glossary import
//!
//! One term per line: `source<TAB>target` or `source<TAB>target<TAB>notes`.
//! Lines with any other number of fields are skipped.

use super::error::Result;
use crate::archive::models::RecordDraft;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Default)]
pub struct TabbedParse {
    pub drafts: Vec<RecordDraft>,
    pub skipped_lines: usize,
}

/// Decodes `bytes` as UTF-8 whatever the platform default, then parses.
pub fn parse_tabbed(bytes: Vec<u8>) -> Result<TabbedParse> {
    let bytes = if bytes.starts_with(UTF8_BOM) {
        bytes[UTF8_BOM.len()..].to_vec()
    } else {
        bytes
    };
    let content = String::from_utf8(bytes)?;
    Ok(parse_tabbed_str(&content))
}

pub fn parse_tabbed_str(content: &str) -> TabbedParse {
    let mut parsed = TabbedParse::default();

    for (line_num, line) in content.lines().enumerate() {
        let fields: Vec<&str> = line.split('\t').collect();
        let draft = match fields.as_slice() {
            [source, target] => RecordDraft::new(*source, *target),
            [source, target, notes] => RecordDraft::new(*source, *target).with_notes(*notes),
            _ => {
                tracing::debug!(
                    "Skipping line {} with {} field(s)",
                    line_num + 1,
                    fields.len()
                );
                parsed.skipped_lines += 1;
                continue;
            }
        };
        parsed.drafts.push(draft);
    }

    parsed
}
