//! DOCX table import
//!
//! Reads the first body-level table of a word-processing document. Column one
//! is the source text, column two the target text. The table is first pulled
//! into a grid of cell strings, and the drafts are built from that grid in a
//! second pass.

use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::{Read, Seek};

use super::error::{IngestError, Result};
use crate::archive::models::RecordDraft;

const DOCUMENT_XML: &str = "word/document.xml";

#[derive(Debug, Default)]
pub struct DocxParse {
    pub drafts: Vec<RecordDraft>,
    /// Number of body-level tables in the document.
    pub table_count: usize,
}

pub fn parse_docx<R: Read + Seek>(reader: R) -> Result<DocxParse> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let xml = read_document_xml(&mut archive)?;

    let (grid, table_count) = extract_first_table(&xml)?;
    if table_count == 0 {
        return Err(IngestError::NoContent("document: no table found".to_string()));
    }

    Ok(DocxParse {
        drafts: build_drafts(grid),
        table_count,
    })
}

fn read_document_xml<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> Result<String> {
    let mut document = archive
        .by_name(DOCUMENT_XML)
        .map_err(|e| IngestError::Docx(format!("cannot find {}: {}", DOCUMENT_XML, e)))?;

    let mut xml = String::new();
    document.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Cell texts of the first table, row by row, and the total table count.
///
/// Only tables whose parent is `w:body` count. Tables nested in a cell and
/// anything inside a text box (`w:txbxContent`, which Word writes once per
/// `mc:AlternateContent` branch) are neither counted nor read.
fn extract_first_table(xml: &str) -> Result<(Vec<Vec<String>>, usize)> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut grid: Vec<Vec<String>> = Vec::new();
    let mut table_count = 0;
    let mut parents: Vec<Vec<u8>> = Vec::new();
    let mut textbox_depth = 0usize;
    let mut in_first_table = false;
    let mut nested_tables = 0usize;
    let mut row: Option<Vec<String>> = None;
    let mut cell: Option<Vec<String>> = None;
    let mut paragraph: Option<String> = None;
    let mut in_text = false;

    loop {
        let event = reader.read_event()?;
        let collecting = in_first_table && nested_tables == 0 && textbox_depth == 0;

        match event {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if textbox_depth > 0 || name.as_slice() == b"txbxContent" {
                    textbox_depth += 1;
                } else {
                    match name.as_slice() {
                        b"tbl" => {
                            if in_first_table {
                                nested_tables += 1;
                            } else if parents.last().is_some_and(|p| p.as_slice() == b"body") {
                                table_count += 1;
                                in_first_table = table_count == 1;
                            }
                        }
                        b"tr" if collecting => row = Some(Vec::new()),
                        b"tc" if collecting && row.is_some() => cell = Some(Vec::new()),
                        b"p" if collecting && cell.is_some() => paragraph = Some(String::new()),
                        b"t" if collecting => in_text = true,
                        _ => {}
                    }
                }
                parents.push(name);
            }
            Event::Empty(e) if collecting => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(cell) = cell.as_mut() {
                        cell.push(String::new());
                    }
                }
                b"tab" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.push('\t');
                    }
                }
                b"br" | b"cr" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.push('\n');
                    }
                }
                b"tc" => {
                    if let Some(row) = row.as_mut() {
                        row.push(String::new());
                    }
                }
                _ => {}
            },
            Event::End(e) => {
                parents.pop();
                if textbox_depth > 0 {
                    textbox_depth -= 1;
                    continue;
                }
                match e.local_name().as_ref() {
                    b"tbl" if in_first_table => {
                        if nested_tables > 0 {
                            nested_tables -= 1;
                        } else {
                            in_first_table = false;
                        }
                    }
                    b"t" if collecting => in_text = false,
                    b"p" if collecting => {
                        if let (Some(cell), Some(p)) = (cell.as_mut(), paragraph.take()) {
                            cell.push(p);
                        }
                    }
                    b"tc" if collecting => {
                        if let (Some(row), Some(paragraphs)) = (row.as_mut(), cell.take()) {
                            row.push(paragraphs.join("\n"));
                        }
                    }
                    b"tr" if collecting => {
                        if let Some(row) = row.take() {
                            grid.push(row);
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(t) if collecting && in_text => {
                if let Some(p) = paragraph.as_mut() {
                    p.push_str(&t.unescape()?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    tracing::debug!(
        "Extracted {} row(s) from the first of {} table(s)",
        grid.len(),
        table_count
    );
    Ok((grid, table_count))
}

fn build_drafts(grid: Vec<Vec<String>>) -> Vec<RecordDraft> {
    grid.into_iter()
        .filter_map(|row| {
            let mut cells = row.into_iter();
            let source = cells.next()?;
            let target = cells.next().unwrap_or_default();
            Some(RecordDraft::new(source, target))
        })
        .collect()
}
