use lazy_static::lazy_static;
use regex::Regex;

pub const MAX_HAND_LEVEL: u8 = 10;

// Spans nested deeper than this stay literal text.
const MAX_NESTING: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineNode {
    Text(String),
    Bold(Vec<InlineNode>),
    Italic(Vec<InlineNode>),
    Color(String, Vec<InlineNode>),
    Background(String, Vec<InlineNode>),
    Hand(u8, Vec<InlineNode>),
}

impl InlineNode {
    pub fn text(text: impl Into<String>) -> Self {
        InlineNode::Text(text.into())
    }

    pub fn children(&self) -> &[InlineNode] {
        match self {
            InlineNode::Text(_) => &[],
            InlineNode::Bold(children)
            | InlineNode::Italic(children)
            | InlineNode::Color(_, children)
            | InlineNode::Background(_, children)
            | InlineNode::Hand(_, children) => children,
        }
    }

    pub fn to_plain_text(&self) -> String {
        match self {
            InlineNode::Text(text) => text.clone(),
            _ => plain_text(self.children()),
        }
    }
}

pub fn plain_text(nodes: &[InlineNode]) -> String {
    nodes.iter().map(|n| n.to_plain_text()).collect()
}

lazy_static! {
    static ref COLOR_OPEN: Regex = Regex::new(r"\[color=([^\[\]]+)\]").unwrap();
    static ref BG_OPEN: Regex = Regex::new(r"\[bg=([^\[\]]+)\]").unwrap();
    static ref HAND_OPEN: Regex = Regex::new(r"\[hand(\d+)\]").unwrap();
    static ref HAND_TAG: Regex = Regex::new(r"\[(/?)hand(\d+)\]").unwrap();
    static ref BOLD: Regex = Regex::new(r"(?s)\*\*(.+?)\*\*").unwrap();
    static ref ITALIC: Regex = Regex::new(r"_([^_\n]+)_").unwrap();
}

#[derive(Debug, Clone, Copy)]
enum Style {
    Color,
    Background,
    Hand,
    Bold,
    Italic,
}

const STYLE_PRIORITY: [Style; 5] = [Style::Color, Style::Background, Style::Hand, Style::Bold, Style::Italic];

/// A located span: `start..end` covers the markup, `inner` the styled content.
struct SpanMatch {
    start: usize,
    end: usize,
    inner_start: usize,
    inner_end: usize,
    attr: String,
}

/// Styled segments of `text`. Markup is tried in priority order: color,
/// background, handwriting, bold, italic. Unmatched markup stays literal;
/// unclosed handwriting tags are dropped.
pub fn render_inline(text: &str) -> Vec<InlineNode> {
    let text = text.replace("[hand]", "[hand1]").replace("[/hand]", "[/hand1]");
    let text = balance_hand_tags(&text);
    render_segment(&text, 0)
}

// The highest-priority style found splits the text into before/span/after.
// Text before it only holds lower-priority styles and the span's inner text is
// one level deeper, so only the remainder loops. A style missing from the
// text is missing from every suffix of it and is not searched again.
fn render_segment(text: &str, depth: usize) -> Vec<InlineNode> {
    if text.is_empty() {
        return vec![];
    }
    if depth > MAX_NESTING {
        return vec![InlineNode::text(text)];
    }

    let mut nodes = vec![];
    let mut rest = text;
    let mut first_style = 0;
    while !rest.is_empty() {
        let found = STYLE_PRIORITY[first_style..].iter().enumerate()
            .find_map(|(i, &style)| find_span(style, rest).map(|span| (first_style + i, style, span)));
        let Some((index, style, span)) = found else {
            break;
        };
        first_style = index;

        nodes.extend(render_segment(&rest[..span.start], depth));
        let children = render_segment(&rest[span.inner_start..span.inner_end], depth + 1);
        nodes.push(match style {
            Style::Color => InlineNode::Color(span.attr, children),
            Style::Background => InlineNode::Background(span.attr, children),
            Style::Hand => InlineNode::Hand(span.attr.parse().unwrap_or(1), children),
            Style::Bold => InlineNode::Bold(children),
            Style::Italic => InlineNode::Italic(children),
        });
        rest = &rest[span.end..];
    }

    if !rest.is_empty() {
        nodes.push(InlineNode::text(rest));
    }
    nodes
}

fn find_span(style: Style, text: &str) -> Option<SpanMatch> {
    match style {
        Style::Color => find_bracket_span(text, &COLOR_OPEN, "[color="),
        Style::Background => find_bracket_span(text, &BG_OPEN, "[bg="),
        Style::Hand => find_hand_span(text),
        Style::Bold => find_delimited_span(text, &BOLD),
        Style::Italic => find_delimited_span(text, &ITALIC),
    }
}

fn find_delimited_span(text: &str, regex: &Regex) -> Option<SpanMatch> {
    let caps = regex.captures(text)?;
    let whole = caps.get(0)?;
    let inner = caps.get(1)?;
    Some(SpanMatch {
        start: whole.start(),
        end: whole.end(),
        inner_start: inner.start(),
        inner_end: inner.end(),
        attr: String::new(),
    })
}

/// Leftmost `[name=attr]` whose `[/name]` closes it, counting nested openers.
fn find_bracket_span(text: &str, open: &Regex, open_prefix: &str) -> Option<SpanMatch> {
    let name = &open_prefix[1..open_prefix.len() - 1];
    let close = format!("[/{}]", name);

    for caps in open.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let next_open = |from: usize| open.find_at(text, from).map(|m| (m.start(), m.end()));
        if let Some(close_start) = matching_close(text, whole.end(), &close, next_open) {
            return Some(SpanMatch {
                start: whole.start(),
                end: close_start + close.len(),
                inner_start: whole.end(),
                inner_end: close_start,
                attr: caps[1].trim().to_string(),
            });
        }
    }
    None
}

fn find_hand_span(text: &str) -> Option<SpanMatch> {
    for caps in HAND_OPEN.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let Some(level) = hand_level(&caps[1]) else {
            continue;
        };
        let open = format!("[hand{}]", level);
        let close = format!("[/hand{}]", level);
        let next_open = |from: usize| text[from..].find(&open).map(|i| (from + i, from + i + open.len()));
        if let Some(close_start) = matching_close(text, whole.end(), &close, next_open) {
            return Some(SpanMatch {
                start: whole.start(),
                end: close_start + close.len(),
                inner_start: whole.end(),
                inner_end: close_start,
                attr: level.to_string(),
            });
        }
    }
    None
}

fn matching_close<F>(text: &str, from: usize, close: &str, next_open: F) -> Option<usize>
where
    F: Fn(usize) -> Option<(usize, usize)>,
{
    let mut depth = 0;
    let mut pos = from;
    loop {
        let close_start = pos + text[pos..].find(close)?;
        match next_open(pos) {
            Some((open_start, open_end)) if open_start < close_start => {
                depth += 1;
                pos = open_end;
            }
            _ => {
                if depth == 0 {
                    return Some(close_start);
                }
                depth -= 1;
                pos = close_start + close.len();
            }
        }
    }
}

fn hand_level(digits: &str) -> Option<u8> {
    let level: u8 = digits.parse().ok()?;
    (1..=MAX_HAND_LEVEL).contains(&level).then_some(level)
}

/// Keeps properly closed `[handN]`/`[/handN]` pairs and removes every other
/// handwriting tag. A closer pops back to its opener; openers skipped on the
/// way are unclosed and dropped.
pub fn balance_hand_tags(text: &str) -> String {
    struct Tag {
        start: usize,
        end: usize,
        closing: bool,
        level: u8,
    }

    let tags: Vec<Tag> = HAND_TAG.captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Tag {
                start: whole.start(),
                end: whole.end(),
                closing: &caps[1] == "/",
                level: hand_level(&caps[2])?,
            })
        })
        .collect();

    let mut keep = vec![false; tags.len()];
    let mut stack: Vec<usize> = vec![];
    for (i, tag) in tags.iter().enumerate() {
        if !tag.closing {
            stack.push(i);
            continue;
        }
        if let Some(pos) = stack.iter().rposition(|&open| tags[open].level == tag.level) {
            keep[stack[pos]] = true;
            keep[i] = true;
            stack.truncate(pos);
        }
    }

    let mut balanced = String::with_capacity(text.len());
    let mut last = 0;
    for (tag, kept) in tags.iter().zip(keep) {
        if !kept {
            balanced.push_str(&text[last..tag.start]);
            last = tag.end;
        }
    }
    balanced.push_str(&text[last..]);
    balanced
}
