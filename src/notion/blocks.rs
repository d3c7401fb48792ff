//! Notion blocks -> Markdown.
//!
//! A deliberately plain conversion: the common text blocks, lists, code,
//! quotes, images and dividers. Anything else is skipped.

use std::fmt::Write as _;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::model::RichText;

/// A block as returned by `GET /blocks/{id}/children`.
#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub has_children: bool,

    /// Remaining fields; the type-specific payload lives under `kind`.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Block {
    fn payload(&self) -> Option<&Value> {
        self.fields.get(&self.kind)
    }

    fn rich_text(&self, key: &str) -> Vec<RichText> {
        self.payload()
            .and_then(|p| p.get(key))
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload()?.get(key)?.as_str()
    }

    /// URL of a file-like payload (`external.url` or `file.url`).
    fn file_url(&self) -> Option<&str> {
        let payload = self.payload()?;
        ["external", "file"]
            .iter()
            .find_map(|k| payload.get(*k)?.get("url")?.as_str())
            .or_else(|| payload.get("url")?.as_str())
    }
}

/// A block together with its fetched children.
#[derive(Debug, Clone)]
pub struct BlockNode {
    pub block: Block,
    pub children: Vec<BlockNode>,
}

/// Render a block tree as Markdown.
#[must_use]
pub fn render_markdown(nodes: &[BlockNode]) -> String {
    let mut out = String::new();
    render_level(&mut out, nodes, "");
    out
}

fn is_list_item(kind: &str) -> bool {
    matches!(kind, "bulleted_list_item" | "numbered_list_item" | "to_do")
}

fn render_level(out: &mut String, nodes: &[BlockNode], indent: &str) {
    let mut previous: Option<&str> = None;
    let mut number = 0usize;

    for node in nodes {
        let kind = node.block.kind.as_str();
        number = if kind == "numbered_list_item" {
            if previous == Some("numbered_list_item") {
                number + 1
            } else {
                1
            }
        } else {
            0
        };

        let Some(text) = render_block(&node.block, number) else {
            debug!(block = %node.block.id, kind, "Skipping unsupported block");
            continue;
        };

        if let Some(prev) = previous {
            let tight = is_list_item(prev) && is_list_item(kind);
            out.push_str(if tight { "\n" } else { "\n\n" });
        }

        for (i, line) in text.lines().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            if !line.is_empty() {
                out.push_str(indent);
            }
            out.push_str(line);
        }

        if !node.children.is_empty() {
            let child_indent = format!("{indent}    ");
            let mut nested = String::new();
            render_level(&mut nested, &node.children, &child_indent);
            if !nested.is_empty() {
                out.push_str(if is_list_item(kind) { "\n" } else { "\n\n" });
                out.push_str(nested.trim_end_matches('\n'));
            }
        }

        previous = Some(kind);
    }

    if previous.is_some() && indent.is_empty() {
        out.push('\n');
    }
}

/// Markdown for one block, without children. `None` if unsupported.
fn render_block(block: &Block, number: usize) -> Option<String> {
    let text = || rich_text_markdown(&block.rich_text("rich_text"));

    let rendered = match block.kind.as_str() {
        "paragraph" => text(),
        "heading_1" => format!("# {}", text()),
        "heading_2" => format!("## {}", text()),
        "heading_3" => format!("### {}", text()),
        "bulleted_list_item" | "toggle" => format!("- {}", text()),
        "numbered_list_item" => format!("{number}. {}", text()),
        "to_do" => {
            let checked = block
                .payload()
                .and_then(|p| p.get("checked"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            format!("- [{}] {}", if checked { "x" } else { " " }, text())
        }
        "quote" | "callout" => quote(&text()),
        "code" => {
            let code: String = block
                .rich_text("rich_text")
                .iter()
                .map(|t| t.plain_text.as_str())
                .collect();
            let language = block.payload_str("language").unwrap_or("");
            let language = if language == "plain text" { "" } else { language };
            format!("```{language}\n{code}\n```")
        }
        "equation" => format!("$$\n{}\n$$", block.payload_str("expression")?),
        "divider" => "---".to_string(),
        "image" => {
            let caption = RichText::join_plain(&block.rich_text("caption"));
            format!("![{caption}]({})", block.file_url()?)
        }
        "bookmark" | "embed" | "link_preview" | "video" | "file" | "pdf" => {
            let url = block.file_url()?;
            let caption = RichText::join_plain(&block.rich_text("caption"));
            let label = if caption.is_empty() { url } else { caption.as_str() };
            format!("[{label}]({url})")
        }
        _ => return None,
    };
    Some(rendered)
}

fn quote(text: &str) -> String {
    if text.is_empty() {
        return ">".to_string();
    }
    text.lines()
        .map(|l| if l.is_empty() { ">".to_string() } else { format!("> {l}") })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Concatenate rich-text runs, applying annotations and links.
#[must_use]
pub fn rich_text_markdown(runs: &[RichText]) -> String {
    let mut out = String::new();
    for run in runs {
        let text = run.plain_text.as_str();
        if text.trim().is_empty() {
            out.push_str(text);
            continue;
        }

        let mut piece = text.to_string();
        let a = run.annotations;
        if a.code {
            piece = format!("`{piece}`");
        }
        if a.bold {
            piece = format!("**{piece}**");
        }
        if a.italic {
            piece = format!("*{piece}*");
        }
        if a.strikethrough {
            piece = format!("~~{piece}~~");
        }
        if let Some(href) = &run.href {
            let _ = write!(out, "[{piece}]({href})");
        } else {
            out.push_str(&piece);
        }
    }
    out
}
