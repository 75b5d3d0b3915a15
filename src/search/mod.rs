pub mod executor;
pub mod highlight;
pub mod query;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::fmt;

use crate::archive::Archive;
use crate::archive::models::ResourceKind;
use crate::cli::{GlobalArgs, OutputFormat, SearchArgs};
use crate::config::Config;
use crate::utils::{escape_html, truncate_display};
use executor::{SearchHit, SearchOptions, search};
use highlight::{Highlighter, Matcher, highlight_terminal};
use query::normalize_query;

/// Which records a search looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    Glossaries,
    Translations,
    /// A single resource, by exact title.
    Resource(String),
}

impl Scope {
    /// `all`, `glossaries` and `translations` are reserved; anything else
    /// names a resource.
    pub fn from_token(token: &str) -> Self {
        match token {
            "all" => Scope::All,
            "glossaries" => Scope::Glossaries,
            "translations" => Scope::Translations,
            title => Scope::Resource(title.to_string()),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => write!(f, "all resources"),
            Scope::Glossaries => write!(f, "all glossaries"),
            Scope::Translations => write!(f, "all translations"),
            Scope::Resource(title) => write!(f, "\"{}\"", title),
        }
    }
}

#[derive(Serialize)]
struct JsonHit<'a> {
    id: i64,
    resource: &'a str,
    kind: ResourceKind,
    source: &'a str,
    target: &'a str,
    notes: &'a str,
    source_html: String,
    target_html: String,
}

#[derive(Serialize)]
struct JsonResults<'a> {
    query: &'a str,
    scope: String,
    hits: usize,
    results: Vec<JsonHit<'a>>,
}

pub fn run(args: SearchArgs, global: &GlobalArgs) -> Result<()> {
    let cfg = Config::load().unwrap_or_default();
    let archive = Archive::open(cfg.database_path(global.db.as_deref())?)?;

    let query = normalize_query(&args.query);
    let scope = Scope::from_token(&args.scope);
    let options = SearchOptions {
        include_notes: cfg.search.include_notes && !args.no_notes,
    };

    let mut hits = search(&archive, &query, &scope, options)?;
    let total = hits.len();
    if let Some(limit) = args.limit {
        hits.truncate(limit);
    }

    match args.format {
        OutputFormat::Text => print_text(&query, &scope, &hits, total)?,
        OutputFormat::Html => {
            print_html(&query, &hits, &Highlighter::with_class(&cfg.search.highlight_class))
        }
        OutputFormat::Json => {
            let highlighter = Highlighter::with_class(&cfg.search.highlight_class);
            let results = JsonResults {
                query: &query,
                scope: scope.to_string(),
                hits: total,
                results: hits
                    .iter()
                    .map(|hit| JsonHit {
                        id: hit.record.id,
                        resource: &hit.resource_title,
                        kind: hit.resource_kind,
                        source: &hit.record.source,
                        target: &hit.record.target,
                        notes: &hit.record.notes,
                        source_html: highlighter.highlight(&hit.record.source, &query),
                        target_html: highlighter.highlight(&hit.record.target, &query),
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}

fn print_text(query: &str, scope: &Scope, hits: &[SearchHit], total: usize) -> Result<()> {
    println!(
        "{}",
        format!("[Search] {} hit(s) for \"{}\" in {}", total, query, scope).green()
    );

    if hits.is_empty() {
        return Ok(());
    }

    let matcher = Matcher::new(query)?;
    for hit in hits {
        let record = &hit.record;
        println!(
            "  {} {}",
            format!("[{}]", truncate_display(&hit.resource_title, 24)).cyan(),
            highlight_terminal(&record.source, &matcher)
        );
        println!("      {}", highlight_terminal(&record.target, &matcher));
        if !record.notes.is_empty() {
            println!(
                "      {}",
                highlight_terminal(&record.notes, &matcher).dimmed()
            );
        }
    }

    if hits.len() < total {
        println!("  ... {} more (raise --limit to see them)", total - hits.len());
    }

    Ok(())
}

fn print_html(query: &str, hits: &[SearchHit], highlighter: &Highlighter) {
    println!("<table class=\"search_results\">");
    for hit in hits {
        println!(
            "  <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&hit.resource_title),
            highlighter.highlight(&hit.record.source, query),
            highlighter.highlight(&hit.record.target, query),
            escape_html(&hit.record.notes)
        );
    }
    println!("</table>");
}
