#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract the plain text of a `.docx` file
#[inline]
pub fn extract_text(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file).context("Not a valid DOCX (zip) container")?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .with_context(|| format!("DOCX is missing {}", DOCUMENT_PART))?
        .read_to_string(&mut xml)
        .context("Failed to read document body")?;

    Ok(document_xml_to_text(&xml))
}

/// Flatten WordprocessingML into text: runs are concatenated, paragraphs end with a blank line
#[inline]
pub fn document_xml_to_text(xml: &str) -> String {
    let mut text = String::new();
    let mut in_run = false;
    let mut in_text_run = false;
    let mut chars = xml.chars();

    while let Some(c) = chars.next() {
        if c != '<' {
            if in_text_run {
                text.push(c);
            }
            continue;
        }

        let mut tag = String::new();
        for t in chars.by_ref() {
            if t == '>' {
                break;
            }
            tag.push(t);
        }

        let closing = tag.starts_with('/');
        let self_closing = tag.ends_with('/');
        let name = tag
            .trim_start_matches('/')
            .split(|ch: char| ch.is_whitespace() || ch == '/')
            .next()
            .unwrap_or_default();

        // Tabs and breaks only count inside a run; `w:tab` in paragraph
        // properties defines a tab stop
        match (name, closing) {
            ("w:r", false) => in_run = !self_closing,
            ("w:r", true) => in_run = false,
            ("w:t", false) => in_text_run = !self_closing,
            ("w:t", true) => in_text_run = false,
            ("w:tab", false) if in_run => text.push('\t'),
            ("w:br" | "w:cr", false) if in_run => text.push('\n'),
            ("w:p", true) => text.push_str("\n\n"),
            ("w:p", false) if self_closing => text.push_str("\n\n"),
            _ => {}
        }
    }

    decode_entities(text.trim())
}

fn decode_entities(text: &str) -> String {
    let mut decoded = String::with_capacity(text.len());
    let mut rest = text.chars();

    while let Some(c) = rest.next() {
        if c != '&' {
            decoded.push(c);
            continue;
        }

        let mut entity = String::new();
        let mut terminated = false;
        for e in rest.by_ref() {
            if e == ';' {
                terminated = true;
                break;
            }
            entity.push(e);
            if entity.len() > 10 {
                break;
            }
        }

        match (terminated, resolve_entity(&entity)) {
            (true, Some(resolved)) => decoded.push(resolved),
            (true, None) => {
                decoded.push('&');
                decoded.push_str(&entity);
                decoded.push(';');
            }
            (false, _) => {
                decoded.push('&');
                decoded.push_str(&entity);
            }
        }
    }

    decoded
}

fn resolve_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}
