//! Paginated PDF assembly.
//!
//! `assemble` turns a [`StoryBundle`] into a complete document: title page,
//! table of contents, one section per chapter (each on a fresh page), and a
//! closing page. Pages are emitted to the sink as soon as they are full, so
//! a caller streaming the document over HTTP starts sending bytes while
//! later chapters are still being laid out.
//!
//! Typography (face, size, color) is mutable layout state, reset explicitly
//! at every section boundary. Placeholder chapter bodies are rendered like
//! any other text, so a partially failed download still yields a
//! structurally complete document.

pub mod fonts;
pub mod writer;

use crate::config::OutputConfig;
use crate::error::PdfError;
use crate::wattpad::{StoryBundle, StoryInfo};
use chrono::Utc;
use fonts::{ALL_FONTS, Font, FontFamily, resolve_family, text_width};
use std::io::{self, Write};
use writer::{PdfWriter, literal_string};

const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);
const DARK_GRAY: (f32, f32, f32) = (0.25, 0.25, 0.25);
const GRAY: (f32, f32, f32) = (0.45, 0.45, 0.45);

/// Current text state carried across lines and reset per section.
#[derive(Debug, Clone, Copy)]
struct Typography {
    font: Font,
    size: f32,
    color: (f32, f32, f32),
}

impl Typography {
    fn body(family: FontFamily, size: f32) -> Self {
        Self {
            font: Font::new(family, false),
            size,
            color: BLACK,
        }
    }

    fn leading(&self) -> f32 {
        self.size * 1.45
    }
}

/// Assembles a story bundle into a PDF, writing pages to `sink` as they
/// complete. Total over bundle shapes: only sink I/O can fail.
pub fn assemble<W: Write>(
    bundle: &StoryBundle,
    config: &OutputConfig,
    sink: W,
) -> Result<(), PdfError> {
    let mut doc = Assembler::new(config, sink)?;
    doc.title_page(&bundle.info)?;
    doc.table_of_contents(bundle)?;
    for (idx, chapter) in bundle.chapters.iter().enumerate() {
        doc.chapter(idx + 1, chapter)?;
    }
    doc.closing_page(&bundle.info)?;
    doc.finish(&bundle.info)?;
    Ok(())
}

struct Assembler<'a, W: Write> {
    writer: PdfWriter<W>,
    config: &'a OutputConfig,
    family: FontFamily,
    resources_id: u32,
    pages_root_id: u32,
    page_ids: Vec<u32>,
    ops: String,
    cursor_y: f32,
    state: Typography,
}

impl<'a, W: Write> Assembler<'a, W> {
    fn new(config: &'a OutputConfig, sink: W) -> io::Result<Self> {
        let mut writer = PdfWriter::new(sink)?;
        let family = resolve_family(&config.font_family);

        // Declare every standard face once; all pages share one resource
        // dictionary.
        let mut font_refs = String::new();
        for font in ALL_FONTS {
            let id = writer.allocate();
            writer.write_object(
                id,
                &format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    font.base_name()
                ),
            )?;
            font_refs.push_str(&format!("/{} {id} 0 R ", font.resource_name()));
        }
        let resources_id = writer.allocate();
        writer.write_object(resources_id, &format!("<< /Font << {font_refs}>> >>"))?;

        let pages_root_id = writer.allocate();
        let cursor_y = config.page_height_pt - config.margin_pt;
        let state = Typography::body(family, config.base_font_size);

        Ok(Self {
            writer,
            config,
            family,
            resources_id,
            pages_root_id,
            page_ids: Vec::new(),
            ops: String::new(),
            cursor_y,
            state,
        })
    }

    fn usable_width(&self) -> f32 {
        self.config.page_width_pt - 2.0 * self.config.margin_pt
    }

    fn content_height(&self) -> f32 {
        self.config.page_height_pt - 2.0 * self.config.margin_pt
    }

    fn top(&self) -> f32 {
        self.config.page_height_pt - self.config.margin_pt
    }

    /// Resets typography to the body default. Called at the start of every
    /// section so no state leaks across section boundaries.
    fn reset_typography(&mut self) {
        self.state = Typography::body(self.family, self.config.base_font_size);
    }

    fn set_state(&mut self, font: Font, size: f32, color: (f32, f32, f32)) {
        self.state = Typography { font, size, color };
    }

    /// Flushes the current page if it has content and starts a fresh one.
    fn end_section(&mut self) -> io::Result<()> {
        self.flush_page()
    }

    fn flush_page(&mut self) -> io::Result<()> {
        if self.ops.is_empty() {
            return Ok(());
        }

        let content_id = self.writer.allocate();
        self.writer.write_stream(content_id, self.ops.as_bytes())?;

        let page_id = self.writer.allocate();
        self.writer.write_object(
            page_id,
            &format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.2} {:.2}] /Resources {} 0 R /Contents {} 0 R >>",
                self.pages_root_id,
                self.config.page_width_pt,
                self.config.page_height_pt,
                self.resources_id,
                content_id
            ),
        )?;
        self.page_ids.push(page_id);

        self.ops.clear();
        self.cursor_y = self.top();
        Ok(())
    }

    /// Breaks the page when fewer than `needed` points remain.
    fn ensure_room(&mut self, needed: f32) -> io::Result<()> {
        if self.cursor_y - needed < self.config.margin_pt && !self.ops.is_empty() {
            self.flush_page()?;
        }
        Ok(())
    }

    fn vspace(&mut self, height: f32) {
        self.cursor_y -= height;
    }

    /// Emits one line at the given x position and advances the cursor.
    fn emit_line(&mut self, text: &str, x: f32) {
        let baseline = self.cursor_y - self.state.size;
        self.ops.push_str(&format!(
            "BT /{} {:.2} Tf {:.3} {:.3} {:.3} rg {:.2} {:.2} Td {} Tj ET\n",
            self.state.font.resource_name(),
            self.state.size,
            self.state.color.0,
            self.state.color.1,
            self.state.color.2,
            x,
            baseline,
            literal_string(text)
        ));
        self.cursor_y -= self.state.leading();
    }

    fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.ensure_room(self.state.leading())?;
        self.emit_line(text, self.config.margin_pt);
        Ok(())
    }

    fn write_centered(&mut self, text: &str) -> io::Result<()> {
        self.ensure_room(self.state.leading())?;
        let width = text_width(self.state.font, text, self.state.size);
        let x = self.config.margin_pt + ((self.usable_width() - width) / 2.0).max(0.0);
        self.emit_line(text, x);
        Ok(())
    }

    fn write_wrapped(&mut self, text: &str) -> io::Result<()> {
        for line in wrap_text(self.state.font, self.state.size, self.usable_width(), text) {
            self.write_line(&line)?;
        }
        Ok(())
    }

    fn write_wrapped_centered(&mut self, text: &str) -> io::Result<()> {
        for line in wrap_text(self.state.font, self.state.size, self.usable_width(), text) {
            self.write_centered(&line)?;
        }
        Ok(())
    }

    fn title_page(&mut self, info: &StoryInfo) -> io::Result<()> {
        self.reset_typography();
        self.vspace(self.content_height() * 0.18);

        self.set_state(Font::new(self.family, true), 26.0, BLACK);
        self.write_wrapped_centered(&info.title)?;

        self.vspace(10.0);
        self.set_state(Font::new(self.family, false), 13.0, DARK_GRAY);
        let author = if info.author.trim().is_empty() {
            "Unknown author".to_string()
        } else {
            format!("by {}", info.author)
        };
        self.write_centered(&author)?;

        let description = info.description.trim();
        if !description.is_empty() {
            self.vspace(30.0);
            self.set_state(Font::new(self.family, false), 10.0, DARK_GRAY);
            let teaser =
                crate::utils::truncate_chars(description, self.config.description_limit_chars);
            for paragraph in teaser.split('\n').filter(|p| !p.trim().is_empty()) {
                self.write_wrapped(paragraph.trim())?;
            }
        }

        self.vspace(26.0);
        self.set_state(Font::new(self.family, false), 9.0, GRAY);
        let stamp = Utc::now().format("%Y-%m-%d %H:%M UTC");
        self.write_centered(&format!("Generated on {stamp}"))?;

        self.end_section()
    }

    fn table_of_contents(&mut self, bundle: &StoryBundle) -> io::Result<()> {
        self.reset_typography();

        self.set_state(Font::new(self.family, true), 18.0, BLACK);
        self.write_line("Contents")?;
        self.vspace(12.0);

        self.set_state(Font::new(self.family, false), 11.0, BLACK);
        for (idx, chapter) in bundle.chapters.iter().enumerate() {
            self.write_wrapped(&format!("{}. {}", idx + 1, chapter.title))?;
        }

        self.end_section()
    }

    fn chapter(
        &mut self,
        ordinal: usize,
        chapter: &crate::wattpad::NormalizedChapter,
    ) -> io::Result<()> {
        self.reset_typography();

        self.set_state(Font::new(self.family, false), 10.0, GRAY);
        self.write_line(&format!("CHAPTER {ordinal}"))?;
        self.vspace(2.0);

        self.set_state(Font::new(self.family, true), 16.0, BLACK);
        self.write_wrapped(&chapter.title)?;
        self.vspace(14.0);

        self.set_state(
            Font::new(self.family, false),
            self.config.base_font_size,
            BLACK,
        );
        let paragraph_gap = self.config.base_font_size * 0.6;
        for (idx, paragraph) in chapter.body.split("\n\n").enumerate() {
            if idx > 0 {
                self.vspace(paragraph_gap);
            }
            for line in paragraph.split('\n') {
                self.write_wrapped(line)?;
            }
        }

        self.end_section()
    }

    fn closing_page(&mut self, info: &StoryInfo) -> io::Result<()> {
        self.reset_typography();
        self.vspace(self.content_height() * 0.4);

        self.set_state(Font::new(self.family, true), 14.0, BLACK);
        self.write_centered("The End")?;

        self.vspace(16.0);
        self.set_state(Font::new(self.family, false), 9.0, GRAY);
        self.write_centered(&format!("{} \u{00B7} pressed by inkpress", info.title))?;

        self.end_section()
    }

    fn finish(mut self, info: &StoryInfo) -> io::Result<W> {
        self.flush_page()?;

        let kids = self
            .page_ids
            .iter()
            .map(|id| format!("{id} 0 R"))
            .collect::<Vec<_>>()
            .join(" ");
        self.writer.write_object(
            self.pages_root_id,
            &format!(
                "<< /Type /Pages /Kids [{kids}] /Count {} >>",
                self.page_ids.len()
            ),
        )?;

        let catalog_id = self.writer.allocate();
        self.writer.write_object(
            catalog_id,
            &format!("<< /Type /Catalog /Pages {} 0 R >>", self.pages_root_id),
        )?;

        let info_id = self.writer.allocate();
        let created = Utc::now().format("D:%Y%m%d%H%M%SZ");
        self.writer.write_object(
            info_id,
            &format!(
                "<< /Title {} /Author {} /Producer (inkpress) /CreationDate ({created}) >>",
                literal_string(&info.title),
                literal_string(&info.author)
            ),
        )?;

        self.writer.finish(catalog_id, info_id)
    }
}

/// Greedy word wrap against the measured line width. Words longer than a
/// whole line are hard-split so no line ever overflows the margin.
fn wrap_text(font: Font, size: f32, max_width: f32, text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if text_width(font, &candidate, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if text_width(font, word, size) <= max_width {
            current = word.to_string();
        } else {
            split_long_word(font, size, max_width, word, &mut lines, &mut current);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn split_long_word(
    font: Font,
    size: f32,
    max_width: f32,
    word: &str,
    lines: &mut Vec<String>,
    current: &mut String,
) {
    let mut piece = String::new();
    for c in word.chars() {
        piece.push(c);
        if text_width(font, &piece, size) > max_width && piece.chars().count() > 1 {
            piece.pop();
            lines.push(std::mem::take(&mut piece));
            piece.push(c);
        }
    }
    *current = piece;
}
