use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

/// Origin of a stored post body. A body is one or the other, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    /// Produced by the WYSIWYG editor, rendered as a single sanitized block.
    Html,
    /// Plain text with the bracket/fence markup.
    Legacy,
}

impl ContentFormat {
    pub fn detect(body: &str) -> ContentFormat {
        if is_html_content(body) {
            ContentFormat::Html
        } else {
            ContentFormat::Legacy
        }
    }
}

/// Sniffs for an opening tag of the elements the editor produces.
/// Not a parse: prose that mentions `<p>` literally is taken as HTML too.
pub fn is_html_content(body: &str) -> bool {
    lazy_static! {
        static ref HTML_TAG_REGEX: Regex = Regex::new(
            r"(?i)<(?:p|div|span|strong|em|b|i|u|mark|font|h[1-3]|ul|ol|li|pre|code|img|video|br)(?:\s[^>]*)?/?>"
        ).unwrap();
    }
    HTML_TAG_REGEX.is_match(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_editor_tags() {
        assert!(is_html_content("<p>Hello</p>"));
        assert!(is_html_content("intro <STRONG>loud</STRONG>"));
        assert!(is_html_content("line<br/>break"));
        assert!(is_html_content("line<br>break"));
        assert!(is_html_content(r#"<img src="media/a.png">"#));
        assert!(is_html_content(r#"<span style="color: red">x</span>"#));
        assert!(is_html_content("<h3>Title</h3>"));
    }

    #[test]
    fn test_plain_text_is_legacy() {
        assert!(!is_html_content("Hello\n```js\nconsole.log(1)\n```"));
        assert!(!is_html_content("[[img:media/abc.png]]"));
        assert!(!is_html_content("a < b and c > d"));
        assert!(!is_html_content("<h4>not sniffed</h4>"));
        assert!(!is_html_content("<body>"));
        assert!(!is_html_content(""));
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(ContentFormat::detect("<p>x</p> [[img:media/a.png]]"), ContentFormat::Html);
        assert_eq!(ContentFormat::detect("**bold**"), ContentFormat::Legacy);
    }
}
