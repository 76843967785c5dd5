//! Inline markup parsing for card descriptions.
//!
//! Descriptions use a constrained marker dialect: `*bold*`, `_italic_`,
//! `~underline~`, `~~strikethrough~~`, `` `inline code` ``, triple-backtick
//! code blocks spanning lines, `- ` bullet lines, and bare http(s) URLs.
//! The string is the single source of truth: [`parse`] rebuilds the node
//! tree on every render, so formatting is idempotent and nothing but the
//! string is ever stored.
//!
//! Parsing runs in three fixed passes: code blocks are split out first
//! (so inline markers inside them are left alone), then consecutive
//! bullet lines are grouped into lists, then each remaining line gets a
//! single left-to-right scan where inline code wins over strikethrough,
//! which wins over bold, italic, underline and URLs. There is no nesting;
//! this is deliberately not a Markdown parser.

use std::sync::LazyLock;

use regex::Regex;

/// A fenced code block, non-greedy, dot matches newline.
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(.*?)```").unwrap());

/// One alternation per marker kind; alternation order is the priority
/// order, so a backtick span can never be stolen by `~~` and `~~` is
/// never split into two underline matches.
static INLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`([^`]+)`|~~([^~]+)~~|\*([^*]+)\*|_([^_]+)_|~([^~]+)~|(https?://\S+)")
        .unwrap()
});

/// A node of the parsed description tree.
///
/// The tree is regenerated from the source string on every render and is
/// never persisted. `Text` content may span multiple lines; the styled
/// variants hold the enclosed text without its markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Bold(String),
    Italic(String),
    Underline(String),
    Strikethrough(String),
    Code(String),
    CodeBlock(String),
    /// One inline sequence per bullet item.
    BulletList(Vec<Vec<Node>>),
    Link(String),
}

/// Parse a description into its node tree.
pub fn parse(input: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut last = 0;
    for caps in FENCE_RE.captures_iter(input) {
        let whole = caps.get(0).unwrap();
        parse_plain(&input[last..whole.start()], &mut nodes);
        nodes.push(Node::CodeBlock(caps.get(1).unwrap().as_str().to_string()));
        last = whole.end();
    }
    parse_plain(&input[last..], &mut nodes);
    nodes
}

/// Extract the URLs of all link nodes, in document order.
pub fn collect_links(nodes: &[Node]) -> Vec<String> {
    let mut links = Vec::new();
    for node in nodes {
        match node {
            Node::Link(url) => links.push(url.clone()),
            Node::BulletList(items) => {
                for item in items {
                    links.extend(collect_links(item));
                }
            }
            _ => {}
        }
    }
    links
}

/// Parse a fence-free segment: group consecutive `- ` lines into one
/// list, everything else goes through the inline scan line by line. The
/// newline separating a list from surrounding text is kept as text so
/// the overlay renderer can reproduce the source exactly.
fn parse_plain(segment: &str, out: &mut Vec<Node>) {
    if segment.is_empty() {
        return;
    }
    let lines: Vec<&str> = segment.split('\n').collect();
    let mut items: Vec<Vec<Node>> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let has_sep = i + 1 < lines.len();
        if let Some(rest) = line.strip_prefix("- ") {
            items.push(parse_inline(rest));
            if has_sep && lines[i + 1].starts_with("- ") {
                continue; // next line extends the list
            }
            if has_sep {
                out.push(Node::BulletList(std::mem::take(&mut items)));
                push_text(out, "\n");
            }
        } else {
            for node in parse_inline(line) {
                push_node(out, node);
            }
            if has_sep {
                push_text(out, "\n");
            }
        }
    }
    if !items.is_empty() {
        out.push(Node::BulletList(items));
    }
}

/// Single-pass inline scan of one line.
fn parse_inline(line: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut last = 0;
    for caps in INLINE_RE.captures_iter(line) {
        let whole = caps.get(0).unwrap();
        if whole.start() > last {
            push_text(&mut nodes, &line[last..whole.start()]);
        }
        let node = if let Some(m) = caps.get(1) {
            Node::Code(m.as_str().to_string())
        } else if let Some(m) = caps.get(2) {
            Node::Strikethrough(m.as_str().to_string())
        } else if let Some(m) = caps.get(3) {
            Node::Bold(m.as_str().to_string())
        } else if let Some(m) = caps.get(4) {
            Node::Italic(m.as_str().to_string())
        } else if let Some(m) = caps.get(5) {
            Node::Underline(m.as_str().to_string())
        } else {
            Node::Link(whole.as_str().to_string())
        };
        nodes.push(node);
        last = whole.end();
    }
    if last < line.len() {
        push_text(&mut nodes, &line[last..]);
    }
    nodes
}

/// Append text, merging into a trailing text node when there is one.
fn push_text(out: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(existing)) = out.last_mut() {
        existing.push_str(text);
    } else {
        out.push(Node::Text(text.to_string()));
    }
}

fn push_node(out: &mut Vec<Node>, node: Node) {
    match node {
        Node::Text(t) => push_text(out, &t),
        other => out.push(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(parse("hello world"), vec![Node::Text("hello world".into())]);
        assert_eq!(parse(""), Vec::<Node>::new());
    }

    #[test]
    fn test_inline_markers() {
        assert_eq!(
            parse("a *b* _c_ ~d~ ~~e~~ `f`"),
            vec![
                Node::Text("a ".into()),
                Node::Bold("b".into()),
                Node::Text(" ".into()),
                Node::Italic("c".into()),
                Node::Text(" ".into()),
                Node::Underline("d".into()),
                Node::Text(" ".into()),
                Node::Strikethrough("e".into()),
                Node::Text(" ".into()),
                Node::Code("f".into()),
            ]
        );
    }

    #[test]
    fn test_strikethrough_not_split_into_underlines() {
        assert_eq!(
            parse("a~~b~~c"),
            vec![
                Node::Text("a".into()),
                Node::Strikethrough("b".into()),
                Node::Text("c".into()),
            ]
        );
    }

    #[test]
    fn test_code_wins_over_other_markers() {
        assert_eq!(
            parse("`*not bold*`"),
            vec![Node::Code("*not bold*".into())]
        );
    }

    #[test]
    fn test_unmatched_markers_stay_text() {
        assert_eq!(parse("a*b"), vec![Node::Text("a*b".into())]);
        assert_eq!(parse("~~~~"), vec![Node::Text("~~~~".into())]);
    }

    #[test]
    fn test_bare_url_terminates_at_whitespace() {
        assert_eq!(
            parse("see https://example.com/x?y=1 now"),
            vec![
                Node::Text("see ".into()),
                Node::Link("https://example.com/x?y=1".into()),
                Node::Text(" now".into()),
            ]
        );
    }

    #[test]
    fn test_bullet_lines_group_into_one_list() {
        assert_eq!(
            parse("- one\n- *two*\nrest"),
            vec![
                Node::BulletList(vec![
                    vec![Node::Text("one".into())],
                    vec![Node::Bold("two".into())],
                ]),
                Node::Text("\nrest".into()),
            ]
        );
    }

    #[test]
    fn test_plain_line_splits_bullet_lists() {
        let nodes = parse("- a\nx\n- b");
        assert_eq!(
            nodes,
            vec![
                Node::BulletList(vec![vec![Node::Text("a".into())]]),
                Node::Text("\nx\n".into()),
                Node::BulletList(vec![vec![Node::Text("b".into())]]),
            ]
        );
    }

    #[test]
    fn test_code_block_shields_inline_markers() {
        assert_eq!(
            parse("```*raw*\n- not a list```"),
            vec![Node::CodeBlock("*raw*\n- not a list".into())]
        );
    }

    #[test]
    fn test_end_to_end_mixed_description() {
        let nodes = parse("Check *this* and _that_ — see ```code\nhere```");
        assert_eq!(
            nodes,
            vec![
                Node::Text("Check ".into()),
                Node::Bold("this".into()),
                Node::Text(" and ".into()),
                Node::Italic("that".into()),
                Node::Text(" — see ".into()),
                Node::CodeBlock("code\nhere".into()),
            ]
        );
    }

    #[test]
    fn test_parse_is_idempotent_over_the_source() {
        let src = "a *b*\n- c\n```d```";
        assert_eq!(parse(src), parse(src));
    }

    #[test]
    fn test_collect_links_includes_bullet_items() {
        let nodes = parse("- https://a.example\nhttps://b.example");
        assert_eq!(
            collect_links(&nodes),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }
}
