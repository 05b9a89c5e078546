use std::sync::LazyLock;

use regex::Regex;

static UL_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*•]\s+(\S.*?)\s*$").unwrap());
static OL_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s+(\S.*?)\s*$").unwrap());
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(#{2,6})\s+(\S.*?)\s*$").unwrap());

/// One semantic block of a markdown-ish model answer.
///
/// Closed set: the document-store adapter renders exactly these four kinds
/// and nothing else.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: usize, text: String },
    Bullets(Vec<String>),
    Numbered(Vec<String>),
    Paragraph(String),
}

/// Parse light markdown into blocks: `##`..`######` headings, `-`/`*`/`•`
/// bullets, `1.`/`1)` numbered items, and paragraphs. Contiguous list items
/// are grouped; blank lines separate paragraphs.
pub fn parse_blocks(text: &str) -> Vec<Block> {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if line.trim().is_empty() {
            i += 1;
            continue;
        }

        if let Some(caps) = HEADING.captures(line) {
            out.push(Block::Heading {
                level: caps[1].len(),
                text: caps[2].to_string(),
            });
            i += 1;
            continue;
        }

        if UL_ITEM.is_match(line) {
            let mut items = Vec::new();
            while i < lines.len() {
                match UL_ITEM.captures(lines[i]) {
                    Some(caps) => items.push(caps[1].to_string()),
                    None => break,
                }
                i += 1;
            }
            out.push(Block::Bullets(items));
            continue;
        }

        if OL_ITEM.is_match(line) {
            let mut items = Vec::new();
            while i < lines.len() {
                match OL_ITEM.captures(lines[i]) {
                    Some(caps) => items.push(caps[1].to_string()),
                    None => break,
                }
                i += 1;
            }
            out.push(Block::Numbered(items));
            continue;
        }

        let mut buf = vec![line];
        i += 1;
        while i < lines.len()
            && !lines[i].trim().is_empty()
            && !UL_ITEM.is_match(lines[i])
            && !OL_ITEM.is_match(lines[i])
            && !HEADING.is_match(lines[i])
        {
            buf.push(lines[i]);
            i += 1;
        }
        out.push(Block::Paragraph(buf.join("\n").trim().to_string()));
    }

    out
}
