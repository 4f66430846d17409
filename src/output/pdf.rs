//! Markdown itinerary → paginated PDF.
//!
//! Layout is computed first as plain data ([`layout`]) so pagination can be
//! checked without decoding a PDF; [`export_pdf`] then draws the placed lines
//! with the built-in Helvetica faces.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};

// US Letter in points.
const PAGE_WIDTH_PT: f32 = 612.0;
const PAGE_HEIGHT_PT: f32 = 792.0;
const MARGIN_X_PT: f32 = 36.0;
const MARGIN_Y_PT: f32 = 50.4;
const BULLET_INDENT_PT: f32 = 18.0;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.52;
const LEADING: f32 = 1.3;
const PT_TO_MM: f32 = 25.4 / 72.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading2(String),
    Heading3(String),
    Bullet(String),
    Paragraph(String),
    Spacer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Style {
    size: f32,
    bold: bool,
    space_before: f32,
    space_after: f32,
}

const TITLE: Style = Style {
    size: 18.0,
    bold: true,
    space_before: 0.0,
    space_after: 12.0,
};
const META: Style = Style {
    size: 10.0,
    bold: false,
    space_before: 0.0,
    space_after: 10.0,
};
const H2: Style = Style {
    size: 14.0,
    bold: true,
    space_before: 12.0,
    space_after: 6.0,
};
const H3: Style = Style {
    size: 12.0,
    bold: true,
    space_before: 8.0,
    space_after: 4.0,
};
const BODY: Style = Style {
    size: 10.5,
    bold: false,
    space_before: 0.0,
    space_after: 2.0,
};

/// A single line of text at a fixed position, in points from the bottom-left.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub bold: bool,
}

pub type Page = Vec<PlacedLine>;

/// Split markdown into layout blocks: `## ` and `### ` headings, `- `/`* `/`•`
/// bullets, blank lines as spacers, everything else as a paragraph.
pub fn parse_blocks(markdown: &str) -> Vec<Block> {
    markdown
        .lines()
        .map(|raw| {
            let line = raw.trim_end();
            let stripped = line.trim_start();
            if stripped.is_empty() || is_rule(stripped) {
                Block::Spacer
            } else if let Some(rest) = line.strip_prefix("### ") {
                Block::Heading3(clean_inline(rest))
            } else if let Some(rest) = line.strip_prefix("## ") {
                Block::Heading2(clean_inline(rest))
            } else if let Some(rest) = stripped
                .strip_prefix("- ")
                .or_else(|| stripped.strip_prefix("* "))
                .or_else(|| stripped.strip_prefix('•'))
            {
                Block::Bullet(clean_inline(rest))
            } else {
                Block::Paragraph(clean_inline(line))
            }
        })
        .collect()
}

fn is_rule(line: &str) -> bool {
    line.len() >= 3 && (line.chars().all(|c| c == '-') || line.chars().all(|c| c == '*'))
}

/// Drop emphasis markers and heading hashes the PDF cannot express.
fn clean_inline(text: &str) -> String {
    text.trim()
        .trim_start_matches('#')
        .trim()
        .replace("**", "")
        .replace("__", "")
        .replace('`', "")
}

/// Greedy word wrap to at most `max_chars` characters per line. Words longer
/// than a line are split.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn max_chars(size: f32, indent: f32) -> usize {
    let usable = PAGE_WIDTH_PT - 2.0 * MARGIN_X_PT - indent;
    (usable / (size * AVG_GLYPH_WIDTH)).floor() as usize
}

struct Cursor {
    pages: Vec<Page>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT_PT - MARGIN_Y_PT,
        }
    }

    fn at_page_top(&self) -> bool {
        self.y >= PAGE_HEIGHT_PT - MARGIN_Y_PT
    }

    fn skip(&mut self, amount: f32) {
        if !self.at_page_top() {
            self.y = (self.y - amount).max(MARGIN_Y_PT);
        }
    }

    fn place(&mut self, text: String, indent: f32, style: Style) {
        let advance = style.size * LEADING;
        if self.y - advance < MARGIN_Y_PT {
            self.pages.push(Vec::new());
            self.y = PAGE_HEIGHT_PT - MARGIN_Y_PT;
        }
        self.y -= advance;
        if let Some(page) = self.pages.last_mut() {
            page.push(PlacedLine {
                text,
                x: MARGIN_X_PT + indent,
                y: self.y,
                size: style.size,
                bold: style.bold,
            });
        }
    }

    fn paragraph(&mut self, text: &str, indent: f32, style: Style) {
        self.skip(style.space_before);
        for line in wrap(text, max_chars(style.size, indent)) {
            self.place(line, indent, style);
        }
        self.skip(style.space_after);
    }
}

/// Place the header and every block onto Letter pages.
pub fn layout(destination: &str, generated: &str, blocks: &[Block]) -> Vec<Page> {
    let mut cursor = Cursor::new();
    cursor.paragraph(&format!("Travel Guide: {destination}"), 0.0, TITLE);
    cursor.paragraph(&format!("Generated: {generated}"), 0.0, META);

    for block in blocks {
        match block {
            Block::Heading2(text) => cursor.paragraph(text, 0.0, H2),
            Block::Heading3(text) => cursor.paragraph(text, 0.0, H3),
            Block::Bullet(text) => {
                cursor.paragraph(&format!("- {text}"), BULLET_INDENT_PT, BODY)
            }
            Block::Paragraph(text) => cursor.paragraph(text, 0.0, BODY),
            Block::Spacer => cursor.skip(6.0),
        }
    }
    cursor.pages
}

/// Built-in PDF fonts only cover Latin-1; map common typographic characters
/// and replace anything else.
fn to_latin1(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{2022}' => '-',
            '\u{2026}' => '.',
            c if (c as u32) < 0x100 => c,
            _ => '?',
        })
        .collect()
}

fn mm(pt: f32) -> Mm {
    Mm(pt * PT_TO_MM)
}

pub fn export_pdf(
    destination: &str,
    markdown: &str,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>> {
    if markdown.trim().is_empty() {
        return Err(Error::export("nothing to export: itinerary is empty"));
    }

    let generated = generated_at.format("%Y-%m-%d %H:%M").to_string();
    let pages = layout(destination, &generated, &parse_blocks(markdown));

    let (doc, first_page, first_layer) = PdfDocument::new(
        format!("Travel Guide - {destination}"),
        mm(PAGE_WIDTH_PT),
        mm(PAGE_HEIGHT_PT),
        "Layer 1".to_string(),
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| Error::export(format!("load font: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| Error::export(format!("load font: {e}")))?;

    for (i, page) in pages.iter().enumerate() {
        let (page_index, layer_index) = if i == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(mm(PAGE_WIDTH_PT), mm(PAGE_HEIGHT_PT), "Layer 1")
        };
        draw_page(&doc, page_index, layer_index, page, &regular, &bold);
    }

    doc.save_to_bytes()
        .map_err(|e| Error::export(format!("write PDF: {e}")))
}

fn draw_page(
    doc: &PdfDocumentReference,
    page_index: printpdf::PdfPageIndex,
    layer_index: printpdf::PdfLayerIndex,
    lines: &[PlacedLine],
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    let layer = doc.get_page(page_index).get_layer(layer_index);
    for line in lines {
        let font = if line.bold { bold } else { regular };
        layer.use_text(to_latin1(&line.text), line.size, mm(line.x), mm(line.y), font);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_follow_markdown_markers() {
        let blocks = parse_blocks(concat!(
            "## Trip Overview\n",
            "### Day 1\n",
            "- Visit **Senso-ji**\n",
            "* Ramen\n",
            "• Tea\n",
            "\nPlain text",
        ));
        assert_eq!(
            blocks,
            vec![
                Block::Heading2("Trip Overview".into()),
                Block::Heading3("Day 1".into()),
                Block::Bullet("Visit Senso-ji".into()),
                Block::Bullet("Ramen".into()),
                Block::Bullet("Tea".into()),
                Block::Spacer,
                Block::Paragraph("Plain text".into()),
            ]
        );
    }

    #[test]
    fn wrap_respects_width() {
        let text = "one two three four five six seven eight nine ten";
        let lines = wrap(text, 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn wrap_splits_overlong_words() {
        let lines = wrap("abcdefghijkl", 5);
        assert_eq!(lines, vec!["abcde", "fghij", "kl"]);
    }

    #[test]
    fn long_itinerary_spans_multiple_pages() {
        let md: String = (1..=120).map(|i| format!("- Activity number {i}\n")).collect();
        let pages = layout("Tokyo", "2026-01-01 10:00", &parse_blocks(&md));
        assert!(pages.len() > 1);
        for page in &pages {
            for line in page {
                assert!(line.y >= MARGIN_Y_PT);
                assert!(line.y <= PAGE_HEIGHT_PT - MARGIN_Y_PT);
            }
        }
        assert_eq!(pages[0][0].text, "Travel Guide: Tokyo");
        assert!(pages[0][0].bold);
    }

    #[test]
    fn latin1_mapping() {
        assert_eq!(
            to_latin1("Zürich \u{2014} “café” • 東京"),
            "Zürich - \"café\" - ??"
        );
    }

    #[test]
    fn empty_markdown_is_an_export_error() {
        assert!(matches!(
            export_pdf("Tokyo", "  \n", Utc::now()),
            Err(Error::Export(_))
        ));
    }

    #[test]
    fn export_produces_pdf_bytes() {
        let bytes = export_pdf("Tokyo, Japan", "## Trip Overview\n### Day 1\n- Arrive", Utc::now())
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
