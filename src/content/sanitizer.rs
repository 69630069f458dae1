use lazy_static::lazy_static;
use regex::{Captures, Regex};
use spdlog::debug;

const MAX_PASSES: usize = 16;

lazy_static! {
    static ref SCRIPT_ELEMENT: Regex = Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap();
    static ref STYLE_ELEMENT: Regex = Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap();
    static ref STRAY_SCRIPT_STYLE_TAG: Regex = Regex::new(r"(?i)</?(?:script|style)\b[^>]*>").unwrap();
    static ref JAVASCRIPT_SCHEME: Regex = Regex::new(r"(?i)javascript\s*:").unwrap();
    static ref FONT_OPEN: Regex = Regex::new(r"(?i)<font\b([^>]*)>").unwrap();
    static ref FONT_CLOSE: Regex = Regex::new(r"(?i)</font\s*>").unwrap();
    static ref FONT_ATTR: Regex = Regex::new(
        r#"(?i)\b(color|size|face)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#
    ).unwrap();
}

pub fn sanitize_html(html: &str) -> String {
    let mut current = html.to_string();
    for _ in 0..MAX_PASSES {
        let next = sanitize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }

    if current != html {
        debug!("sanitizer rewrote markup: {} -> {} bytes", html.len(), current.len());
    }
    current
}

fn sanitize_pass(html: &str) -> String {
    let html = SCRIPT_ELEMENT.replace_all(html, "");
    let html = STYLE_ELEMENT.replace_all(&html, "");
    let html = STRAY_SCRIPT_STYLE_TAG.replace_all(&html, "");
    let html = strip_dangerous_attributes(&html);
    let html = JAVASCRIPT_SCHEME.replace_all(&html, "");
    normalize_font_tags(&html)
}

/// Walks every start tag the way a browser tokenizes it and drops `on*`
/// handlers and attributes whose decoded value carries a `javascript:` scheme.
/// A start tag that never closes is escaped so it cannot swallow later markup.
fn strip_dangerous_attributes(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        let tag = &rest[lt..];
        if !tag.as_bytes().get(1).is_some_and(|b| b.is_ascii_alphabetic()) {
            out.push('<');
            rest = &tag[1..];
            continue;
        }
        match scan_start_tag(tag) {
            Some((len, cleaned)) => {
                out.push_str(&cleaned);
                rest = &tag[len..];
            }
            None => {
                out.push_str("&lt;");
                rest = &tag[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_attr_separator(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'/'
}

/// Returns the length of the tag and its cleaned text, or `None` when the
/// input ends inside the tag.
fn scan_start_tag(tag: &str) -> Option<(usize, String)> {
    let bytes = tag.as_bytes();
    let mut i = 1;
    while i < bytes.len() && !is_attr_separator(bytes[i]) && bytes[i] != b'>' {
        i += 1;
    }
    let mut cleaned = tag[..i].to_string();

    loop {
        let attr_start = i;
        while i < bytes.len() && is_attr_separator(bytes[i]) {
            i += 1;
        }
        if i >= bytes.len() {
            return None;
        }
        if bytes[i] == b'>' {
            cleaned.push_str(&tag[attr_start..=i]);
            return Some((i + 1, cleaned));
        }

        let name_start = i;
        i += 1;
        while i < bytes.len() && !is_attr_separator(bytes[i]) && bytes[i] != b'>' && bytes[i] != b'=' {
            i += 1;
        }
        let name = &tag[name_start..i];

        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let mut value = None;
        if j < bytes.len() && bytes[j] == b'=' {
            j += 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            match bytes.get(j) {
                Some(&quote) if quote == b'"' || quote == b'\'' => {
                    let len = tag[j + 1..].find(quote as char)?;
                    value = Some(&tag[j + 1..j + 1 + len]);
                    j += len + 2;
                }
                _ => {
                    let value_start = j;
                    while j < bytes.len() && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' {
                        j += 1;
                    }
                    value = Some(&tag[value_start..j]);
                }
            }
            i = j;
        }

        if !is_dangerous_attribute(name, value) {
            cleaned.push_str(&tag[attr_start..i]);
        }
    }
}

fn is_dangerous_attribute(name: &str, value: Option<&str>) -> bool {
    if name.to_ascii_lowercase().starts_with("on") {
        return true;
    }
    value.is_some_and(carries_script_scheme)
}

// Browsers decode entities in attribute values and ignore whitespace and
// control characters inside a URL scheme.
fn carries_script_scheme(value: &str) -> bool {
    let decoded = html_escape::decode_html_entities(value);
    let compact: String = decoded.chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    compact.to_ascii_lowercase().contains("javascript:")
}

/// Rewrites `<font color size face>` into `<span style="...">`, keeping inner content.
pub fn normalize_font_tags(html: &str) -> String {
    let html = FONT_OPEN.replace_all(html, |caps: &Captures| {
        let style = font_style(&caps[1]);
        if style.is_empty() {
            "<span>".to_string()
        } else {
            format!(r#"<span style="{}">"#, style)
        }
    });
    FONT_CLOSE.replace_all(&html, "</span>").into_owned()
}

fn font_style(attrs: &str) -> String {
    let mut rules: Vec<String> = vec![];
    for caps in FONT_ATTR.captures_iter(attrs) {
        let value = caps.get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().trim())
            .unwrap_or("");
        if value.is_empty() {
            continue;
        }
        let value = value.replace('"', "'");

        match caps[1].to_ascii_lowercase().as_str() {
            "color" => rules.push(format!("color: {};", value)),
            "size" => rules.push(format!("font-size: {};", font_size(&value))),
            "face" => rules.push(format!("font-family: {};", value)),
            _ => {}
        }
    }
    rules.join(" ")
}

// HTML font sizes 1..7 map onto the CSS absolute-size keywords.
fn font_size(size: &str) -> String {
    match size {
        "1" => "x-small".to_string(),
        "2" => "small".to_string(),
        "3" => "medium".to_string(),
        "4" => "large".to_string(),
        "5" => "x-large".to_string(),
        "6" => "xx-large".to_string(),
        "7" => "xxx-large".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_script_and_style() {
        let html = r#"<p>a</p><script type="text/javascript">alert(1)</script><STYLE>p{}</STYLE><p>b</p>"#;
        assert_eq!(sanitize_html(html), "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_strips_unclosed_script_tag() {
        assert_eq!(sanitize_html("<p>a</p><script src=x.js>"), "<p>a</p>");
    }

    #[test]
    fn test_strips_event_handlers() {
        let html = r#"<img src="a.png" onerror="alert(1)"><div onClick='x()' class="c">t</div><b onmouseover=go()>x</b>"#;
        assert_eq!(sanitize_html(html), r#"<img src="a.png"><div class="c">t</div><b>x</b>"#);
    }

    #[test]
    fn test_keeps_prose_mentioning_handlers() {
        let html = "<p>set onload = true in the config</p>";
        assert_eq!(sanitize_html(html), html);
    }

    #[test]
    fn test_neutralizes_javascript_scheme() {
        let html = r#"<a href="JavaScript:alert(1)" title="t">x</a>"#;
        assert_eq!(sanitize_html(html), r#"<a title="t">x</a>"#);
        assert_eq!(sanitize_html("<p>try javascript:alert(1)</p>"), "<p>try alert(1)</p>");
    }

    #[test]
    fn test_slash_separated_handler() {
        assert_eq!(sanitize_html(r#"<p>x</p><img/onerror=alert(1) src=x>"#), "<p>x</p><img src=x>");
        assert_eq!(sanitize_html(r#"<svg/onload=alert(1)>"#), "<svg>");
    }

    #[test]
    fn test_quoted_gt_does_not_hide_handler() {
        assert_eq!(sanitize_html(r#"<img alt=">" onerror=alert(1) src=x>"#), r#"<img alt=">" src=x>"#);
        assert_eq!(sanitize_html(r#"<img alt=it's onerror=alert(1)>"#), "<img alt=it's>");
        assert_eq!(sanitize_html(r#"<a title="x"onclick="y()">z</a>"#), r#"<a title="x">z</a>"#);
    }

    #[test]
    fn test_entity_encoded_scheme() {
        assert_eq!(sanitize_html(r#"<a href="javascript&#58;alert(1)">x</a>"#), "<a>x</a>");
        assert_eq!(sanitize_html(r#"<a href="&#x6A;avascript&#x3A;alert(1)">x</a>"#), "<a>x</a>");
        assert_eq!(sanitize_html(r#"<a href="jav&#x09;ascript:alert(1)">x</a>"#), "<a>x</a>");
        assert_eq!(sanitize_html(r#"<a href="https://example.com/?a=1&amp;b=2">x</a>"#), r#"<a href="https://example.com/?a=1&amp;b=2">x</a>"#);
    }

    #[test]
    fn test_unterminated_tag_is_escaped() {
        assert_eq!(sanitize_html(r#"<p>a</p><img src="x onerror=alert(1)>"#), r#"<p>a</p>&lt;img src="x onerror=alert(1)>"#);
        assert_eq!(sanitize_html("a < b and 3<4"), "a < b and 3<4");
    }

    #[test]
    fn test_nested_payload_is_removed() {
        let html = "<p>javajavascript:script:x</p><scr<script></script>ipt>alert(1)</script>";
        let clean = sanitize_html(html);
        assert!(!clean.to_lowercase().contains("javascript:"));
        assert!(!clean.to_lowercase().contains("<script"));
    }

    #[test]
    fn test_font_to_span() {
        let html = r#"<font color="red" size="5" face='Georgia'>Hi <b>there</b></font>"#;
        assert_eq!(
            sanitize_html(html),
            r#"<span style="color: red; font-size: x-large; font-family: Georgia;">Hi <b>there</b></span>"#
        );
        assert_eq!(sanitize_html("<FONT>plain</FONT>"), "<span>plain</span>");
        assert_eq!(sanitize_html("<font color=#00ff00>g</font>"), r#"<span style="color: #00ff00;">g</span>"#);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            r#"<p onclick="x">a</p><script>1</script>"#,
            r#"<font color="blue">b</font><a href="javascript:void(0)">c</a>"#,
            r#"<img/onerror=x alt=">" src=y><a href="javascript&#58;z">w</a>"#,
            "<style>x</style><scr<script></script>ipt>",
            "plain text",
        ];
        for input in inputs {
            let once = sanitize_html(input);
            assert_eq!(sanitize_html(&once), once, "input: {}", input);
        }
    }
}
