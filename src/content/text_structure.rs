use lazy_static::lazy_static;
use regex::Regex;

use crate::content::inline_renderer::{render_inline, InlineNode};

/// Block-level structure of a `text` block, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextNode {
    Heading { level: u8, content: Vec<InlineNode> },
    /// Internal line breaks are kept as `\n` inside the literals.
    Paragraph { content: Vec<InlineNode> },
    List { ordered: bool, start: u32, items: Vec<Vec<InlineNode>> },
}

enum LineKind<'a> {
    Blank,
    Heading(u8, &'a str),
    OrderedItem(u32, &'a str),
    UnorderedItem(&'a str),
    Paragraph(&'a str),
}

lazy_static! {
    static ref ORDERED_ITEM: Regex = Regex::new(r"^(\d+)[.)]\s+(.*)$").unwrap();
    static ref UNORDERED_ITEM: Regex = Regex::new(r"^[-*•+]\s+(.*)$").unwrap();
    static ref HEADING: Regex = Regex::new(r"^(#{1,3})\s+(.*)$").unwrap();
}

fn classify(line: &str) -> LineKind {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }

    if let Some(caps) = HEADING.captures(trimmed) {
        let (Some(marks), Some(text)) = (caps.get(1), caps.get(2)) else {
            return LineKind::Paragraph(trimmed);
        };
        return LineKind::Heading(marks.as_str().len() as u8, text.as_str());
    }

    if let Some(caps) = ORDERED_ITEM.captures(trimmed) {
        if let (Ok(number), Some(text)) = (caps[1].parse::<u32>(), caps.get(2)) {
            return LineKind::OrderedItem(number, text.as_str());
        }
    }

    if let Some(text) = UNORDERED_ITEM.captures(trimmed).and_then(|caps| caps.get(1)) {
        return LineKind::UnorderedItem(text.as_str());
    }

    LineKind::Paragraph(line)
}

struct PendingList<'a> {
    ordered: bool,
    start: u32,
    items: Vec<&'a str>,
}

#[derive(Default)]
struct Builder<'a> {
    nodes: Vec<TextNode>,
    paragraph: Vec<&'a str>,
    list: Option<PendingList<'a>>,
}

impl<'a> Builder<'a> {
    fn flush_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        let text = self.paragraph.join("\n");
        self.paragraph.clear();
        self.nodes.push(TextNode::Paragraph { content: render_inline(&text) });
    }

    fn flush_list(&mut self) {
        if let Some(list) = self.list.take() {
            self.nodes.push(TextNode::List {
                ordered: list.ordered,
                start: list.start,
                items: list.items.iter().map(|item| render_inline(item)).collect(),
            });
        }
    }

    fn push_item(&mut self, ordered: bool, number: u32, text: &'a str) {
        self.flush_paragraph();
        if self.list.as_ref().is_some_and(|list| list.ordered != ordered) {
            self.flush_list();
        }
        self.list
            .get_or_insert_with(|| PendingList { ordered, start: number, items: vec![] })
            .items
            .push(text);
    }
}

/// Splits a text block into headings, paragraphs and lists.
pub fn structure_text(value: &str) -> Vec<TextNode> {
    let mut builder = Builder::default();

    for line in value.lines() {
        match classify(line) {
            LineKind::Blank => {
                builder.flush_paragraph();
                builder.flush_list();
            }
            LineKind::Heading(level, text) => {
                builder.flush_paragraph();
                builder.flush_list();
                builder.nodes.push(TextNode::Heading { level, content: render_inline(text) });
            }
            LineKind::OrderedItem(number, text) => builder.push_item(true, number, text),
            LineKind::UnorderedItem(text) => builder.push_item(false, 1, text),
            LineKind::Paragraph(text) => {
                builder.flush_list();
                builder.paragraph.push(text);
            }
        }
    }

    builder.flush_paragraph();
    builder.flush_list();
    builder.nodes
}

#[cfg(test)]
mod tests {
    use crate::content::inline_renderer::InlineNode::{Bold, Text};

    use super::*;

    fn t(text: &str) -> InlineNode {
        Text(text.to_string())
    }

    #[test]
    fn test_paragraph_keeps_line_breaks() {
        let nodes = structure_text("first line\nsecond **line**");
        assert_eq!(nodes, vec![TextNode::Paragraph {
            content: vec![t("first line\nsecond "), Bold(vec![t("line")])],
        }]);
    }

    #[test]
    fn test_blank_line_splits_paragraphs() {
        let nodes = structure_text("one\n\ntwo");
        assert_eq!(nodes, vec![
            TextNode::Paragraph { content: vec![t("one")] },
            TextNode::Paragraph { content: vec![t("two")] },
        ]);
    }

    #[test]
    fn test_headings_flush_pending() {
        let nodes = structure_text("intro\n## Setup\n- a\n### Done");
        assert_eq!(nodes, vec![
            TextNode::Paragraph { content: vec![t("intro")] },
            TextNode::Heading { level: 2, content: vec![t("Setup")] },
            TextNode::List { ordered: false, start: 1, items: vec![vec![t("a")]] },
            TextNode::Heading { level: 3, content: vec![t("Done")] },
        ]);
    }

    #[test]
    fn test_ordered_list_starts_at_first_number() {
        let nodes = structure_text("3. three\n4) four");
        assert_eq!(nodes, vec![TextNode::List {
            ordered: true,
            start: 3,
            items: vec![vec![t("three")], vec![t("four")]],
        }]);
    }

    #[test]
    fn test_switching_list_mode_starts_new_list() {
        let nodes = structure_text("- a\n* b\n1. c\n• d");
        assert_eq!(nodes, vec![
            TextNode::List { ordered: false, start: 1, items: vec![vec![t("a")], vec![t("b")]] },
            TextNode::List { ordered: true, start: 1, items: vec![vec![t("c")]] },
            TextNode::List { ordered: false, start: 1, items: vec![vec![t("d")]] },
        ]);
    }

    #[test]
    fn test_paragraph_line_ends_list() {
        let nodes = structure_text("- a\nafter");
        assert_eq!(nodes, vec![
            TextNode::List { ordered: false, start: 1, items: vec![vec![t("a")]] },
            TextNode::Paragraph { content: vec![t("after")] },
        ]);
    }

    #[test]
    fn test_not_a_heading_or_item() {
        let nodes = structure_text("#hashtag\n**bold** start\n#### deep");
        assert_eq!(nodes, vec![TextNode::Paragraph {
            content: vec![t("#hashtag\n"), Bold(vec![t("bold")]), t(" start\n#### deep")],
        }]);
    }
}
