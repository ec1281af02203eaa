/// Minimal PDF 1.4 writer for single-page tickets
///
/// # Layout
///
/// ```text
/// 1 0 obj  Catalog
/// 2 0 obj  Pages
/// 3 0 obj  Page (A4, 595 x 842 pt)
/// 4 0 obj  Font /Helvetica
/// 5 0 obj  Font /Helvetica-Bold
/// 6 0 obj  Content stream
/// xref + trailer
/// ```
///
/// Only the 14 standard fonts are used, so nothing is embedded. Text is
/// limited to printable ASCII; other characters render as `?`.

use std::fmt::Write as _;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Drawing operations for one page
#[derive(Debug, Default)]
pub struct PageBuilder {
    content: String,
}

impl PageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws a line of text with its baseline at `(x, y)`, origin bottom-left
    pub fn text(&mut self, x: f32, y: f32, size: f32, font: Font, text: &str) -> &mut Self {
        let _ = writeln!(
            self.content,
            "BT /{} {} Tf {} {} Td ({}) Tj ET",
            font.resource_name(),
            fmt_num(size),
            fmt_num(x),
            fmt_num(y),
            escape_text(text)
        );
        self
    }

    /// Strokes a rectangle outline
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, line_width: f32) -> &mut Self {
        let _ = writeln!(
            self.content,
            "{} w {} {} {} {} re S",
            fmt_num(line_width),
            fmt_num(x),
            fmt_num(y),
            fmt_num(width),
            fmt_num(height)
        );
        self
    }

    /// Draws a horizontal rule
    pub fn hline(&mut self, x1: f32, x2: f32, y: f32) -> &mut Self {
        let _ = writeln!(
            self.content,
            "0.5 w {} {} m {} {} l S",
            fmt_num(x1),
            fmt_num(y),
            fmt_num(x2),
            fmt_num(y)
        );
        self
    }

    /// Serializes the page into a complete PDF document
    pub fn finish(&self) -> Vec<u8> {
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /F1 4 0 R /F2 5 0 R >> >> /Contents 6 0 R >>",
                fmt_num(PAGE_WIDTH),
                fmt_num(PAGE_HEIGHT)
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
                .to_string(),
            format!(
                "<< /Length {} >>\nstream\n{}endstream",
                self.content.len(),
                self.content
            ),
        ];

        let mut out = String::from("%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());

        for (index, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            let _ = write!(out, "{} 0 obj\n{}\nendobj\n", index + 1, body);
        }

        let xref_offset = out.len();
        let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in &offsets {
            let _ = write!(out, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            out,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        );

        out.into_bytes()
    }
}

/// Escapes a string for a PDF literal string
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            ' '..='~' => escaped.push(c),
            _ => escaped.push('?'),
        }
    }
    escaped
}

fn fmt_num(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}
