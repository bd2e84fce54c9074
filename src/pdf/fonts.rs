//! Base-14 font handling: selection, metrics, and WinAnsi encoding.
//!
//! The assembler uses the PDF standard fonts, so no font programs are
//! embedded; each face needs only its AFM advance widths for line wrapping.
//! Text is encoded as WinAnsi. Characters with no WinAnsi slot degrade to
//! `?` rather than failing the document.

/// A typeface family available to the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    Helvetica,
    Times,
    Courier,
}

impl FontFamily {
    /// Parses a configured family name. Accepts a few common aliases.
    pub fn from_name(name: &str) -> Option<FontFamily> {
        match name.trim().to_ascii_lowercase().as_str() {
            "helvetica" | "arial" | "sans" | "sans-serif" => Some(FontFamily::Helvetica),
            "times" | "times-roman" | "serif" => Some(FontFamily::Times),
            "courier" | "mono" | "monospace" => Some(FontFamily::Courier),
            _ => None,
        }
    }
}

/// Resolves a configured family name, falling back to Helvetica when the
/// name is unknown so a bad config degrades instead of failing assembly.
pub fn resolve_family(name: &str) -> FontFamily {
    FontFamily::from_name(name).unwrap_or_else(|| {
        tracing::warn!(family = name, "unknown font family, falling back to Helvetica");
        FontFamily::Helvetica
    })
}

/// A concrete face: family plus weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Font {
    pub family: FontFamily,
    pub bold: bool,
}

impl Font {
    pub const fn new(family: FontFamily, bold: bool) -> Self {
        Self { family, bold }
    }

    /// PDF BaseFont name.
    pub fn base_name(self) -> &'static str {
        match (self.family, self.bold) {
            (FontFamily::Helvetica, false) => "Helvetica",
            (FontFamily::Helvetica, true) => "Helvetica-Bold",
            (FontFamily::Times, false) => "Times-Roman",
            (FontFamily::Times, true) => "Times-Bold",
            (FontFamily::Courier, false) => "Courier",
            (FontFamily::Courier, true) => "Courier-Bold",
        }
    }

    /// Resource name used in content streams (`/F1` .. `/F6`).
    pub fn resource_name(self) -> &'static str {
        match (self.family, self.bold) {
            (FontFamily::Helvetica, false) => "F1",
            (FontFamily::Helvetica, true) => "F2",
            (FontFamily::Times, false) => "F3",
            (FontFamily::Times, true) => "F4",
            (FontFamily::Courier, false) => "F5",
            (FontFamily::Courier, true) => "F6",
        }
    }
}

/// Every face declared in the shared resource dictionary.
pub const ALL_FONTS: [Font; 6] = [
    Font::new(FontFamily::Helvetica, false),
    Font::new(FontFamily::Helvetica, true),
    Font::new(FontFamily::Times, false),
    Font::new(FontFamily::Times, true),
    Font::new(FontFamily::Courier, false),
    Font::new(FontFamily::Courier, true),
];

/// Measures a string in points at the given size.
pub fn text_width(font: Font, text: &str, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| char_width_units(font, c) as u32)
        .sum();
    units as f32 * size / 1000.0
}

/// Advance width in 1/1000 em units for one character.
fn char_width_units(font: Font, c: char) -> u16 {
    if font.family == FontFamily::Courier {
        return 600;
    }

    let byte = encode_char(c);
    if (0x20..=0x7E).contains(&byte) {
        let idx = (byte - 0x20) as usize;
        match (font.family, font.bold) {
            (FontFamily::Helvetica, false) => HELVETICA_WIDTHS[idx],
            (FontFamily::Helvetica, true) => HELVETICA_BOLD_WIDTHS[idx],
            (FontFamily::Times, false) => TIMES_WIDTHS[idx],
            (FontFamily::Times, true) => TIMES_BOLD_WIDTHS[idx],
            (FontFamily::Courier, _) => 600,
        }
    } else {
        // Accented and typographic characters: a representative width is
        // close enough for wrapping.
        match font.family {
            FontFamily::Times => 500,
            _ => 556,
        }
    }
}

/// Encodes text as WinAnsi bytes. Unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(encode_char).collect()
}

fn encode_char(c: char) -> u8 {
    let code = c as u32;
    match c {
        '\t' => b' ',
        // ASCII range maps directly.
        _ if (0x20..=0x7E).contains(&code) => code as u8,
        // Latin-1 supplement shares WinAnsi's upper half.
        _ if (0xA0..=0xFF).contains(&code) => code as u8,
        '\u{20AC}' => 0x80, // euro sign
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85, // ellipsis
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91, // left single quote
        '\u{2019}' => 0x92, // right single quote
        '\u{201C}' => 0x93, // left double quote
        '\u{201D}' => 0x94, // right double quote
        '\u{2022}' => 0x95, // bullet
        '\u{2013}' => 0x96, // en dash
        '\u{2014}' => 0x97, // em dash
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99, // trademark
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => b'?',
    }
}

// AFM advance widths for codes 0x20..=0x7E, in 1/1000 em units.

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD_WIDTHS: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_aliases() {
        assert_eq!(FontFamily::from_name("Helvetica"), Some(FontFamily::Helvetica));
        assert_eq!(FontFamily::from_name("TIMES"), Some(FontFamily::Times));
        assert_eq!(FontFamily::from_name("monospace"), Some(FontFamily::Courier));
        assert_eq!(FontFamily::from_name("papyrus"), None);
    }

    #[test]
    fn test_unknown_family_falls_back_to_helvetica() {
        assert_eq!(resolve_family("papyrus"), FontFamily::Helvetica);
        assert_eq!(resolve_family("times"), FontFamily::Times);
    }

    #[test]
    fn test_base_names() {
        assert_eq!(Font::new(FontFamily::Helvetica, true).base_name(), "Helvetica-Bold");
        assert_eq!(Font::new(FontFamily::Times, false).base_name(), "Times-Roman");
        assert_eq!(Font::new(FontFamily::Courier, true).base_name(), "Courier-Bold");
    }

    #[test]
    fn test_resource_names_unique() {
        let mut names: Vec<&str> = ALL_FONTS.iter().map(|f| f.resource_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ALL_FONTS.len());
    }

    #[test]
    fn test_courier_is_fixed_pitch() {
        let font = Font::new(FontFamily::Courier, false);
        assert_eq!(text_width(font, "iii", 10.0), text_width(font, "WWW", 10.0));
        assert!((text_width(font, "abc", 10.0) - 18.0).abs() < 1e-4);
    }

    #[test]
    fn test_width_grows_with_text() {
        let font = Font::new(FontFamily::Helvetica, false);
        assert!(text_width(font, "ab", 12.0) > text_width(font, "a", 12.0));
        assert!(text_width(font, "a", 12.0) > 0.0);
    }

    #[test]
    fn test_bold_is_wider() {
        let regular = Font::new(FontFamily::Helvetica, false);
        let bold = Font::new(FontFamily::Helvetica, true);
        assert!(text_width(bold, "interior", 12.0) > text_width(regular, "interior", 12.0));
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("abc"), b"abc".to_vec());
        assert_eq!(encode_win_ansi("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("\u{2014}"), vec![0x97]);
        assert_eq!(encode_win_ansi("\u{6F22}"), vec![b'?']);
    }
}
