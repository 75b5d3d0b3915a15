//! TMX (Translation Memory eXchange) import

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::error::{IngestError, Result};
use crate::archive::models::RecordDraft;

/// Inline elements carrying native formatting codes rather than text.
const NATIVE_CODE_ELEMENTS: &[&[u8]] = &[b"bpt", b"ept", b"ph", b"it", b"ut"];

#[derive(Debug, Default)]
struct Variant {
    lang: Option<String>,
    seg: Option<String>,
}

pub fn parse_tmx(bytes: &[u8]) -> Result<Vec<RecordDraft>> {
    let xml = decode(bytes)?;
    parse_tmx_str(&xml)
}

/// One draft per `<tu>`, in document order.
pub fn parse_tmx_str(xml: &str) -> Result<Vec<RecordDraft>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut drafts = Vec::new();
    let mut srclang: Option<String> = None;
    let mut unit: Option<Vec<Variant>> = None;
    let mut variant: Option<Variant> = None;
    let mut seg: Option<String> = None;
    let mut code_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"header" => srclang = attribute(&e, b"srclang")?,
                b"tu" => unit = Some(Vec::new()),
                b"tuv" => {
                    variant = Some(Variant {
                        lang: attribute(&e, b"lang")?,
                        seg: None,
                    })
                }
                b"seg" if variant.is_some() => seg = Some(String::new()),
                name if seg.is_some() && NATIVE_CODE_ELEMENTS.contains(&name) => {
                    code_depth += 1
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"header" => srclang = attribute(&e, b"srclang")?,
                b"tu" => drafts.push(RecordDraft::default()),
                b"tuv" => {
                    if let Some(unit) = unit.as_mut() {
                        unit.push(Variant {
                            lang: attribute(&e, b"lang")?,
                            seg: None,
                        });
                    }
                }
                b"seg" => {
                    if let Some(variant) = variant.as_mut() {
                        variant.seg = Some(String::new());
                    }
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"seg" => {
                    if let (Some(variant), Some(text)) = (variant.as_mut(), seg.take()) {
                        variant.seg = Some(text);
                    }
                    code_depth = 0;
                }
                b"tuv" => {
                    if let (Some(unit), Some(variant)) = (unit.as_mut(), variant.take()) {
                        unit.push(variant);
                    }
                }
                b"tu" => {
                    if let Some(variants) = unit.take() {
                        drafts.push(build_draft(&variants, srclang.as_deref()));
                    }
                }
                name if code_depth > 0 && NATIVE_CODE_ELEMENTS.contains(&name) => {
                    code_depth -= 1
                }
                _ => {}
            },
            Event::Text(t) if code_depth == 0 => {
                if let Some(seg) = seg.as_mut() {
                    seg.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) if code_depth == 0 => {
                if let Some(seg) = seg.as_mut() {
                    seg.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    tracing::debug!("Parsed {} translation unit(s)", drafts.len());
    Ok(drafts)
}

/// The source variant is the one in the header's source language, or the
/// first one; the target is the first other variant.
fn build_draft(variants: &[Variant], srclang: Option<&str>) -> RecordDraft {
    let source_idx = srclang
        .and_then(|lang| {
            variants.iter().position(|v| {
                v.lang
                    .as_deref()
                    .is_some_and(|l| l.eq_ignore_ascii_case(lang))
            })
        })
        .unwrap_or(0);

    let source = variants
        .get(source_idx)
        .and_then(|v| v.seg.clone())
        .unwrap_or_default();
    let target = variants
        .iter()
        .enumerate()
        .find(|(i, _)| *i != source_idx)
        .and_then(|(_, v)| v.seg.clone());

    RecordDraft::new(source, normalize_target(target))
}

/// Some tools write a lone control character (0..=32) for "no translation".
fn normalize_target(target: Option<String>) -> String {
    let Some(target) = target else {
        return String::new();
    };
    let mut chars = target.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if (c as u32) <= 32 => String::new(),
        _ => target,
    }
}

fn attribute(e: &BytesStart<'_>, local_name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| IngestError::Xml(e.to_string()))?;
        if attr.key.local_name().as_ref() == local_name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// TMX files are often UTF-16 with a byte order mark.
fn decode(bytes: &[u8]) -> Result<String> {
    let utf16 = |be: bool| {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| {
                if be {
                    u16::from_be_bytes([pair[0], pair[1]])
                } else {
                    u16::from_le_bytes([pair[0], pair[1]])
                }
            })
            .collect();
        String::from_utf16(&units).map_err(|e| IngestError::Xml(e.to_string()))
    };

    match bytes {
        [0xFF, 0xFE, ..] => utf16(false),
        [0xFE, 0xFF, ..] => utf16(true),
        [0xEF, 0xBB, 0xBF, rest @ ..] => Ok(String::from_utf8(rest.to_vec())?),
        _ => Ok(String::from_utf8(bytes.to_vec())?),
    }
}
