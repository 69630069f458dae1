use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use spdlog::trace;

use crate::content::ContentBlock;

pub const AUTO_LANG: &str = "auto";

const RUN_START_SCORE: u32 = 3;
const CONTINUATION_SCORE: u32 = 2;
const STRONG_LINE_SCORE: u32 = 4;
const MIN_AVERAGE_SCORE: f64 = 2.8;

lazy_static! {
    static ref FULL_TAG_LINE: Regex = Regex::new(
        r"^(?:<[a-zA-Z][^>]*>.*</[a-zA-Z][a-zA-Z0-9-]*\s*>|<[a-zA-Z][^>]*/>)$"
    ).unwrap();
    static ref DOCTYPE: Regex = Regex::new(r"(?i)^<!doctype\b").unwrap();
    static ref OPEN_TAG: Regex = Regex::new(r"<([a-zA-Z][a-zA-Z0-9-]*)(?:\s[^>]*)?>").unwrap();
    static ref CLOSE_TAG: Regex = Regex::new(r"</([a-zA-Z][a-zA-Z0-9-]*)\s*>").unwrap();
    static ref LEADING_KEYWORD: Regex = Regex::new(
        r"^\s*(?:import|export|const|let|var|function|class|return|def)\b"
    ).unwrap();
    static ref CONTROL_FLOW_CALL: Regex = Regex::new(r"\b(?:if|for|while|switch)\s*\(").unwrap();
    static ref ARROW_OR_BRACKET: Regex = Regex::new(r"=>|->|[{}()\[\]]").unwrap();
    static ref TRAILING_SEMICOLON: Regex = Regex::new(r";\s*$").unwrap();
    static ref QUOTED_KEY: Regex = Regex::new(r#"["'][\w\s.-]+["']\s*:"#).unwrap();
    static ref COMMENT_DELIMITER: Regex = Regex::new(r"(?:^|\s)//|/\*|\*/").unwrap();
    static ref SOURCE_FILENAME: Regex = Regex::new(
        r"(?i)\b[\w.-]+\.(?:tf|tfvars|js|jsx|mjs|cjs|ts|tsx|py|java|go|rb|php|json|ya?ml|xml|html?|css|scss|sh|bash)\b"
    ).unwrap();
    static ref DECORATION_RUN: Regex = Regex::new(r"[|`~\-/\\]{3,}").unwrap();
    static ref CONTINUATION_PUNCTUATION: Regex = Regex::new(r"=>|->|[{}()\[\];]").unwrap();
}

/// A trimmed line that is entirely one element (`<a>..</b>`, `<br/>`) or a doctype.
pub fn is_full_tag_line(line: &str) -> bool {
    let line = line.trim();
    FULL_TAG_LINE.is_match(line) || DOCTYPE.is_match(line)
}

/// An opening tag and a closing tag with the same name somewhere on the line.
pub fn has_tag_pair(line: &str) -> bool {
    let opened: HashSet<String> = OPEN_TAG.captures_iter(line)
        .map(|c| c[1].to_ascii_lowercase())
        .collect();
    if opened.is_empty() {
        return false;
    }
    CLOSE_TAG.captures_iter(line).any(|c| opened.contains(&c[1].to_ascii_lowercase()))
}

pub fn line_score(line: &str) -> u32 {
    let mut score = 0;
    if is_full_tag_line(line) {
        score += 3;
    }
    if has_tag_pair(line) {
        score += 3;
    }
    if LEADING_KEYWORD.is_match(line) {
        score += 3;
    }
    if CONTROL_FLOW_CALL.is_match(line) {
        score += 3;
    }
    if ARROW_OR_BRACKET.is_match(line) {
        score += 1;
    }
    if TRAILING_SEMICOLON.is_match(line) {
        score += 1;
    }
    if QUOTED_KEY.is_match(line) {
        score += 2;
    }
    if COMMENT_DELIMITER.is_match(line) {
        score += 2;
    }
    if SOURCE_FILENAME.is_match(line) {
        score += 2;
    }
    if DECORATION_RUN.is_match(line) {
        score += 2;
    }
    score
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

pub fn is_continuation_line(line: &str) -> bool {
    is_blank(line)
        || line_score(line) >= CONTINUATION_SCORE
        || is_full_tag_line(line)
        || has_tag_pair(line)
        || CONTINUATION_PUNCTUATION.is_match(line)
}

/// Decides whether a run of lines reads as code.
pub fn is_code_run(lines: &[&str]) -> bool {
    let scores: Vec<u32> = lines.iter()
        .filter(|l| !is_blank(l))
        .map(|l| line_score(l))
        .collect();

    match scores.len() {
        0 => false,
        1 => scores[0] >= STRONG_LINE_SCORE,
        n => {
            let total: u32 = scores.iter().sum();
            let average = total as f64 / n as f64;
            scores.iter().any(|&s| s >= STRONG_LINE_SCORE) || average >= MIN_AVERAGE_SCORE
        }
    }
}

/// Splits a fence-less text run into `text` and `code` (`lang = "auto"`) blocks, keeping order.
pub fn split_code_runs(lines: &[&str]) -> Vec<ContentBlock> {
    let mut blocks = vec![];
    let mut text: Vec<&str> = vec![];
    let mut i = 0;

    while i < lines.len() {
        if line_score(lines[i]) < RUN_START_SCORE {
            text.push(lines[i]);
            i += 1;
            continue;
        }

        let mut end = i + 1;
        while end < lines.len() && is_continuation_line(lines[end]) {
            end += 1;
        }
        // Blank lines after the run belong to the surrounding prose
        while end > i + 1 && is_blank(lines[end - 1]) {
            end -= 1;
        }

        let run = &lines[i..end];
        if is_code_run(run) {
            trace!("unfenced code run detected on lines {}..{}", i, end);
            flush_text(&mut text, &mut blocks);
            blocks.push(ContentBlock::code(AUTO_LANG, run.join("\n")));
        } else {
            text.extend_from_slice(run);
        }
        i = end;
    }

    flush_text(&mut text, &mut blocks);
    blocks
}

fn flush_text(text: &mut Vec<&str>, blocks: &mut Vec<ContentBlock>) {
    let joined = text.join("\n");
    text.clear();
    let value = joined.trim_matches(|c: char| c == '\n' || c == '\r');
    if !value.trim().is_empty() {
        blocks.push(ContentBlock::text(value));
    }
}
