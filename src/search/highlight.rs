//! Query highlighting for search results
//!
//! Both the text and the query are HTML-escaped before matching, so the
//! highlighted output is always safe to embed in markup.

use colored::Colorize;
use regex::{Regex, RegexBuilder};
use std::ops::Range;

use crate::utils::escape_html;

pub const DEFAULT_HIGHLIGHT_CLASS: &str = "highlight_query";

/// Case-insensitive literal substring matcher shared by search and
/// highlighting. An empty query matches every text.
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Option<Regex>,
}

impl Matcher {
    pub fn new(query: &str) -> Result<Self, regex::Error> {
        if query.is_empty() {
            return Ok(Self { regex: None });
        }
        let regex = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()?;
        Ok(Self { regex: Some(regex) })
    }

    pub fn is_match(&self, text: &str) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(text),
            None => true,
        }
    }

    /// Non-overlapping match spans, leftmost first, as byte ranges.
    pub fn spans(&self, text: &str) -> Vec<Range<usize>> {
        match &self.regex {
            Some(regex) => regex.find_iter(text).map(|m| m.range()).collect(),
            None => Vec::new(),
        }
    }

    /// Like [`Matcher::spans`], but for escaped text: a match may not start or
    /// end inside a character entity such as `&amp;`.
    fn escaped_spans(&self, escaped: &str) -> Vec<Range<usize>> {
        let Some(regex) = &self.regex else {
            return Vec::new();
        };

        let mut spans = Vec::new();
        let mut pos = 0;
        while pos < escaped.len() {
            let Some(m) = regex.find_at(escaped, pos) else {
                break;
            };
            if m.is_empty() {
                break;
            }
            if splits_entity(escaped, m.start()) || splits_entity(escaped, m.end()) {
                pos = next_char_boundary(escaped, m.start());
                continue;
            }
            spans.push(m.range());
            pos = m.end();
        }
        spans
    }
}

pub struct Highlighter {
    open: String,
    close: String,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::with_class(DEFAULT_HIGHLIGHT_CLASS)
    }
}

impl Highlighter {
    pub fn with_class(class: &str) -> Self {
        Self {
            open: format!("<span class=\"{}\">", escape_html(class)),
            close: "</span>".to_string(),
        }
    }

    pub fn highlight(&self, text: &str, query: &str) -> String {
        let text = escape_html(text);
        if query.is_empty() {
            return text;
        }

        let matcher = match Matcher::new(&escape_html(query)) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Query cannot be highlighted: {}", e);
                return text;
            }
        };

        let spans = matcher.escaped_spans(&text);
        splice(text, &spans, |matched| {
            format!("{}{}{}", self.open, matched, self.close)
        })
    }
}

/// Highlights with the default `highlight_query` class.
#[allow(dead_code)]
pub fn highlight(text: &str, query: &str) -> String {
    Highlighter::default().highlight(text, query)
}

/// Terminal rendering: the raw text with matches painted, no escaping.
pub fn highlight_terminal(text: &str, matcher: &Matcher) -> String {
    let spans = matcher.spans(text);
    splice(text.to_string(), &spans, |matched| {
        matched.black().on_yellow().to_string()
    })
}

/// Replaces each span with `wrap(span)`, last span first so the earlier
/// offsets stay valid.
fn splice<F>(mut text: String, spans: &[Range<usize>], wrap: F) -> String
where
    F: Fn(&str) -> String,
{
    for span in spans.iter().rev() {
        let wrapped = wrap(&text[span.clone()]);
        text.replace_range(span.clone(), &wrapped);
    }
    text
}

/// True if `idx` falls after the `&` and at or before the `;` of an entity.
fn splits_entity(escaped: &str, idx: usize) -> bool {
    let Some(amp) = escaped[..idx].rfind('&') else {
        return false;
    };
    match escaped[amp..].find(';') {
        Some(offset) => idx <= amp + offset,
        None => false,
    }
}

fn next_char_boundary(text: &str, idx: usize) -> usize {
    text[idx..]
        .chars()
        .next()
        .map(|c| idx + c.len_utf8())
        .unwrap_or(text.len())
}
