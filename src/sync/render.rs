//! Document rendering: front-matter header + body.
//!
//! The header is a `---` delimited block with one `name: value` line per
//! field, in the fixed order title, date, lastmod, tags, summary, images,
//! draft. Values are written as Python literals (`'text'`, `['a', 'b']`,
//! `False`), which is what the site's content loader parses.
//!
//! Empty and absent fields are omitted. `draft` is always written.

use std::fmt::Write as _;

use crate::model::NormalizedMetadata;

/// Header start and end marker line.
pub const FRONT_MATTER_MARKER: &str = "---";

/// Render metadata and body into the final document text.
///
/// The output depends only on the inputs: the same metadata and body always
/// produce the same bytes. The body is appended verbatim.
#[must_use]
pub fn render(metadata: &NormalizedMetadata, body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 256);
    out.push_str(FRONT_MATTER_MARKER);
    out.push('\n');

    push_str_field(&mut out, "title", metadata.title.as_deref());
    push_str_field(&mut out, "date", metadata.date.as_deref());
    push_str_field(&mut out, "lastmod", metadata.lastmod.as_deref());
    push_list_field(&mut out, "tags", metadata.tags.as_deref());
    push_str_field(&mut out, "summary", metadata.summary.as_deref());
    push_list_field(&mut out, "images", metadata.images.as_deref());
    push_line(&mut out, "draft", py_bool(metadata.draft));

    out.push_str(FRONT_MATTER_MARKER);
    out.push_str("\n\n");
    out.push_str(body);
    out
}

fn push_line(out: &mut String, name: &str, value: &str) {
    let _ = writeln!(out, "{name}: {value}");
}

fn push_str_field(out: &mut String, name: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        push_line(out, name, &py_str(value));
    }
}

fn push_list_field(out: &mut String, name: &str, values: Option<&[String]>) {
    if let Some(values) = values.filter(|v| !v.is_empty()) {
        push_line(out, name, &py_list(values));
    }
}

const fn py_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

fn py_list(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| py_str(v)).collect();
    format!("[{}]", items.join(", "))
}

/// Quote a string the way Python's `repr` does.
///
/// Single quotes unless the text contains `'` and no `"`. Backslash and the
/// active quote are escaped, as is every character Python does not consider
/// printable: controls, separators other than the ASCII space, and format
/// characters. Those become `\xNN`, `\uNNNN` or `\UNNNNNNNN`. Everything
/// else, including non-ASCII text, is kept as-is.
///
/// Unassigned and private-use code points are kept as-is; Python would
/// escape them too.
#[must_use]
pub fn py_str(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if !is_printable(c) => push_escape(&mut out, c),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Python's `str.isprintable`, minus the unassigned/private-use tables.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    // `is_whitespace` covers the Zs/Zl/Zp separators plus ASCII/C1 whitespace.
    !(c.is_control() || c.is_whitespace() || is_format(c))
}

/// Unicode general category Cf.
const fn is_format(c: char) -> bool {
    matches!(
        c as u32,
        0x00AD
            | 0x0600..=0x0605
            | 0x061C
            | 0x06DD
            | 0x070F
            | 0x0890..=0x0891
            | 0x08E2
            | 0x180E
            | 0x200B..=0x200F
            | 0x202A..=0x202E
            | 0x2060..=0x2064
            | 0x2066..=0x206F
            | 0xFEFF
            | 0xFFF9..=0xFFFB
            | 0x110BD
            | 0x110CD
            | 0x13430..=0x1343F
            | 0x1BCA0..=0x1BCA3
            | 0x1D173..=0x1D17A
            | 0xE0001
            | 0xE0020..=0xE007F
    )
}

fn push_escape(out: &mut String, c: char) {
    let code = u32::from(c);
    let _ = if code < 0x100 {
        write!(out, "\\x{code:02x}")
    } else if code < 0x1_0000 {
        write!(out, "\\u{code:04x}")
    } else {
        write!(out, "\\U{code:08x}")
    };
}
