//! Renderers from the parsed description tree to ratatui text.
//!
//! Two modes share the one parser in [`crate::richtext`]:
//!
//! - **read mode** shows the decorated result: markers are gone, code
//!   blocks get per-line numbers, bullet items get a dot, links are
//!   highlighted (opening them is the caller's job via its injected
//!   open-URL callback).
//! - **overlay mode** backs a live editor: every character of the source
//!   string reappears in order, with markers kept as dimmed spans, so a
//!   caret drawn over the output lines up with the underlying string.
//!   Joining the produced lines with `\n` reconstructs the source
//!   exactly.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::richtext::Node;

fn marker_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn code_style() -> Style {
    Style::default().fg(Color::Yellow)
}

fn code_block_style() -> Style {
    Style::default().fg(Color::Green)
}

fn link_style() -> Style {
    Style::default()
        .fg(Color::Blue)
        .add_modifier(Modifier::UNDERLINED)
}

/// Accumulates spans into finished lines.
struct LineBuilder {
    done: Vec<Line<'static>>,
    cur: Vec<Span<'static>>,
}

impl LineBuilder {
    fn new() -> Self {
        LineBuilder {
            done: Vec::new(),
            cur: Vec::new(),
        }
    }

    fn push(&mut self, span: Span<'static>) {
        self.cur.push(span);
    }

    fn newline(&mut self) {
        self.done.push(Line::from(std::mem::take(&mut self.cur)));
    }

    /// Start a fresh line unless the current one is still empty.
    fn break_block(&mut self) {
        if !self.cur.is_empty() {
            self.newline();
        }
    }

    /// Push text that may contain newlines, splitting into lines.
    fn text(&mut self, text: &str, style: Style) {
        for (i, piece) in text.split('\n').enumerate() {
            if i > 0 {
                self.newline();
            }
            if !piece.is_empty() {
                self.push(Span::styled(piece.to_string(), style));
            }
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        if !self.cur.is_empty() {
            self.newline();
        }
        self.done
    }
}

/// Render the tree in read mode.
pub fn read_lines(nodes: &[Node]) -> Vec<Line<'static>> {
    let mut b = LineBuilder::new();
    // Tracks whether the previous node was a block, whose structural
    // newline separator must not produce an extra blank line.
    let mut after_block = false;
    for node in nodes {
        match node {
            Node::Text(t) => {
                let t = if after_block {
                    t.strip_prefix('\n').unwrap_or(t.as_str())
                } else {
                    t.as_str()
                };
                b.text(t, Style::default());
                after_block = false;
            }
            Node::CodeBlock(content) => {
                b.break_block();
                for (i, line) in content.split('\n').enumerate() {
                    b.push(Span::styled(format!("{:>3} │ ", i + 1), marker_style()));
                    b.push(Span::styled(line.to_string(), code_block_style()));
                    b.newline();
                }
                after_block = true;
            }
            Node::BulletList(items) => {
                b.break_block();
                for item in items {
                    b.push(Span::styled("• ".to_string(), marker_style()));
                    for inline in item {
                        read_inline(inline, &mut b);
                    }
                    b.newline();
                }
                after_block = true;
            }
            other => {
                read_inline(other, &mut b);
                after_block = false;
            }
        }
    }
    b.finish()
}

fn read_inline(node: &Node, b: &mut LineBuilder) {
    match node {
        Node::Text(t) => b.text(t, Style::default()),
        Node::Bold(t) => b.push(Span::styled(
            t.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Node::Italic(t) => b.push(Span::styled(
            t.clone(),
            Style::default().add_modifier(Modifier::ITALIC),
        )),
        Node::Underline(t) => b.push(Span::styled(
            t.clone(),
            Style::default().add_modifier(Modifier::UNDERLINED),
        )),
        Node::Strikethrough(t) => b.push(Span::styled(
            t.clone(),
            Style::default().add_modifier(Modifier::CROSSED_OUT),
        )),
        Node::Code(t) => b.push(Span::styled(t.clone(), code_style())),
        Node::Link(url) => b.push(Span::styled(url.clone(), link_style())),
        // Blocks are handled by the caller; nothing nests below an item.
        Node::CodeBlock(_) | Node::BulletList(_) => {}
    }
}

/// Render the tree in overlay mode, reproducing the source string
/// character for character.
pub fn overlay_lines(nodes: &[Node]) -> Vec<Line<'static>> {
    let mut b = LineBuilder::new();
    for node in nodes {
        overlay_node(node, &mut b);
    }
    b.finish()
}

fn overlay_node(node: &Node, b: &mut LineBuilder) {
    match node {
        Node::Text(t) => b.text(t, Style::default()),
        Node::Bold(t) => wrap_overlay(b, "*", t, Style::default().add_modifier(Modifier::BOLD)),
        Node::Italic(t) => wrap_overlay(b, "_", t, Style::default().add_modifier(Modifier::ITALIC)),
        Node::Underline(t) => wrap_overlay(
            b,
            "~",
            t,
            Style::default().add_modifier(Modifier::UNDERLINED),
        ),
        Node::Strikethrough(t) => wrap_overlay(
            b,
            "~~",
            t,
            Style::default().add_modifier(Modifier::CROSSED_OUT),
        ),
        Node::Code(t) => wrap_overlay(b, "`", t, code_style()),
        Node::CodeBlock(content) => {
            b.push(Span::styled("```".to_string(), marker_style()));
            b.text(content, code_block_style());
            b.push(Span::styled("```".to_string(), marker_style()));
        }
        Node::BulletList(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    b.newline();
                }
                b.push(Span::styled("- ".to_string(), marker_style()));
                for inline in item {
                    overlay_node(inline, b);
                }
            }
        }
        Node::Link(url) => b.push(Span::styled(url.clone(), link_style())),
    }
}

fn wrap_overlay(b: &mut LineBuilder, marker: &str, content: &str, style: Style) {
    b.push(Span::styled(marker.to_string(), marker_style()));
    b.push(Span::styled(content.to_string(), style));
    b.push(Span::styled(marker.to_string(), marker_style()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::parse;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn joined(lines: &[Line]) -> String {
        lines
            .iter()
            .map(line_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_overlay_reconstructs_source_exactly() {
        let sources = [
            "plain",
            "a *b* _c_ ~d~ ~~e~~ `f`",
            "intro\n- one\n- *two*\ntail",
            "a\n```x\ny```\nb",
            "see https://example.com now",
            "",
            "trailing *star",
        ];
        for src in sources {
            let lines = overlay_lines(&parse(src));
            assert_eq!(joined(&lines), *src, "overlay must mirror {src:?}");
        }
    }

    #[test]
    fn test_read_mode_strips_markers() {
        let lines = read_lines(&parse("a *b* c"));
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "a b c");
    }

    #[test]
    fn test_read_mode_numbers_code_block_lines() {
        let lines = read_lines(&parse("```one\ntwo```"));
        assert_eq!(lines.len(), 2);
        assert!(line_text(&lines[0]).contains("1 │ one"));
        assert!(line_text(&lines[1]).contains("2 │ two"));
    }

    #[test]
    fn test_read_mode_has_no_blank_line_around_blocks() {
        let lines = read_lines(&parse("x\n- a\ny"));
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["x", "• a", "y"]);
    }

    #[test]
    fn test_read_mode_preserves_blank_lines_in_plain_text() {
        let lines = read_lines(&parse("a\n\nb"));
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["a", "", "b"]);
    }
}
