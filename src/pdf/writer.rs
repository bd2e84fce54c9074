//! Low-level streaming PDF emission.
//!
//! Objects are written to the sink the moment they are complete; only their
//! byte offsets are retained for the cross-reference table at the end. This
//! is what lets the assembler hand finished pages to the HTTP response while
//! later chapters are still being laid out.

use super::fonts::encode_win_ansi;
use std::io::{self, Write};

/// PDF file header; the binary comment line marks the file as 8-bit data.
const HEADER: &[u8] = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n";

/// Incremental PDF object writer over any byte sink.
pub struct PdfWriter<W: Write> {
    sink: W,
    offset: u64,
    offsets: Vec<(u32, u64)>,
    next_id: u32,
}

impl<W: Write> PdfWriter<W> {
    /// Starts a document, writing the header immediately.
    pub fn new(mut sink: W) -> io::Result<Self> {
        sink.write_all(HEADER)?;
        Ok(Self {
            sink,
            offset: HEADER.len() as u64,
            offsets: Vec::new(),
            next_id: 1,
        })
    }

    /// Allocates an object id without writing it. Needed for objects that
    /// are referenced before they can be emitted (the page tree root).
    pub fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Writes a complete non-stream object.
    pub fn write_object(&mut self, id: u32, body: &str) -> io::Result<()> {
        self.offsets.push((id, self.offset));
        self.write_bytes(format!("{id} 0 obj\n{body}\nendobj\n").as_bytes())
    }

    /// Writes a stream object with the given content bytes.
    pub fn write_stream(&mut self, id: u32, data: &[u8]) -> io::Result<()> {
        self.offsets.push((id, self.offset));
        self.write_bytes(format!("{id} 0 obj\n<< /Length {} >>\nstream\n", data.len()).as_bytes())?;
        self.write_bytes(data)?;
        self.write_bytes(b"\nendstream\nendobj\n")
    }

    /// Writes the cross-reference table and trailer, flushes, and returns
    /// the sink. Every allocated id must have been written by now.
    pub fn finish(mut self, root_id: u32, info_id: u32) -> io::Result<W> {
        let xref_offset = self.offset;
        self.offsets.sort_by_key(|&(id, _)| id);

        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", self.offsets.len() + 1);
        for &(_, at) in &self.offsets {
            xref.push_str(&format!("{at:010} 00000 n \n"));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {} /Root {root_id} 0 R /Info {info_id} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            self.offsets.len() + 1
        ));

        self.write_bytes(xref.as_bytes())?;
        self.sink.flush()?;
        Ok(self.sink)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.sink.write_all(bytes)?;
        self.offset += bytes.len() as u64;
        Ok(())
    }
}

/// Renders text as a PDF literal string: WinAnsi-encoded, delimiters
/// escaped, bytes outside the printable range written as octal escapes.
pub fn literal_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('(');
    for byte in encode_win_ansi(text) {
        match byte {
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\\' => out.push_str("\\\\"),
            0x20..=0x7E => out.push(byte as char),
            _ => out.push_str(&format!("\\{byte:03o}")),
        }
    }
    out.push(')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    #[test]
    fn test_literal_string_escapes_delimiters() {
        assert_eq!(literal_string("a(b)c\\d"), "(a\\(b\\)c\\\\d)");
    }

    #[test]
    fn test_literal_string_octal_escapes_high_bytes() {
        assert_eq!(literal_string("é"), "(\\351)");
        assert_eq!(literal_string("\u{2014}"), "(\\227)");
    }

    #[test]
    fn test_minimal_document_structure() {
        let mut writer = PdfWriter::new(Vec::new()).unwrap();
        let pages = writer.allocate();
        let content = writer.allocate();
        writer.write_stream(content, b"BT ET").unwrap();
        let page = writer.allocate();
        writer
            .write_object(
                page,
                &format!("<< /Type /Page /Parent {pages} 0 R /Contents {content} 0 R >>"),
            )
            .unwrap();
        writer
            .write_object(pages, &format!("<< /Type /Pages /Kids [{page} 0 R] /Count 1 >>"))
            .unwrap();
        let catalog = writer.allocate();
        writer
            .write_object(catalog, &format!("<< /Type /Catalog /Pages {pages} 0 R >>"))
            .unwrap();
        let info = writer.allocate();
        writer.write_object(info, "<< /Producer (test) >>").unwrap();
        let bytes = writer.finish(catalog, info).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));

        // startxref points at the actual xref table.
        let xref_pos = find(&bytes, b"xref\n0 ").unwrap();
        let startxref_pos = find(&bytes, b"startxref\n").unwrap();
        let tail = &bytes[startxref_pos + "startxref\n".len()..];
        let recorded: usize = std::str::from_utf8(tail)
            .unwrap()
            .lines()
            .next()
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(recorded, xref_pos);

        // One xref entry per object, plus the free-list head.
        assert!(find(&bytes, b"0 6\n0000000000 65535 f").is_some());
    }

    #[test]
    fn test_offsets_recorded_in_id_order() {
        let mut writer = PdfWriter::new(Vec::new()).unwrap();
        let late = writer.allocate();
        let early = writer.allocate();
        // Written out of id order on purpose.
        writer.write_object(early, "<< >>").unwrap();
        writer.write_object(late, "<< >>").unwrap();
        let bytes = writer.finish(late, early).unwrap();

        // The first subsection entry must belong to object 1 (written
        // second, so at a larger offset than object 2's entry).
        let text = String::from_utf8_lossy(&bytes);
        let xref_body = text.split("xref\n").nth(1).unwrap();
        let entries: Vec<&str> = xref_body.lines().skip(2).take(2).collect();
        let first: u64 = entries[0][..10].parse().unwrap();
        let second: u64 = entries[1][..10].parse().unwrap();
        assert!(first > second);
    }
}
