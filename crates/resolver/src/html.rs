//! `text/html` → Markdown conversion for `http(s)://` imports (§4.5).
//!
//! Deliberately simplified: strips `<script>`/`<style>` bodies, converts a
//! handful of common tags (`h1`-`h6`, `p`, `br`, `a`, `strong`/`b`,
//! `em`/`i`, `li`) and drops the rest, rather than doing full
//! article-extraction (readability-style boilerplate removal). Good enough
//! for feeding page text to a model; not a faithful renderer.

/// Convert raw HTML to a Markdown approximation of its text content.
pub fn html_to_markdown(html: &str) -> String {
    let without_blocks = strip_tag_bodies(html, "script");
    let without_blocks = strip_tag_bodies(&without_blocks, "style");

    let mut out = String::new();
    let mut chars = without_blocks.char_indices().peekable();
    let mut tag_buf = String::new();
    let mut in_tag = false;

    while let Some((_, c)) = chars.next() {
        if c == '<' {
            in_tag = true;
            tag_buf.clear();
            continue;
        }
        if c == '>' {
            in_tag = false;
            apply_tag(&tag_buf, &mut out);
            continue;
        }
        if in_tag {
            tag_buf.push(c);
        } else {
            out.push(c);
        }
    }

    let decoded = decode_entities(&out);
    collapse_blank_lines(&decoded)
}

fn apply_tag(tag: &str, out: &mut String) {
    let lower = tag.to_ascii_lowercase();
    let name = lower.trim_start_matches('/').split_whitespace().next().unwrap_or("");
    let closing = lower.starts_with('/');
    match name {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            if !closing {
                let level = name[1..].parse::<usize>().unwrap_or(1);
                out.push_str(&format!("\n{} ", "#".repeat(level)));
            } else {
                out.push('\n');
            }
        }
        "p" | "div" | "br" | "li" | "tr" => {
            out.push('\n');
            if name == "li" && !closing {
                out.push_str("- ");
            }
        }
        "strong" | "b" => out.push_str("**"),
        "em" | "i" => out.push('*'),
        _ => {}
    }
}

fn strip_tag_bodies(html: &str, tag: &str) -> String {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut result = String::new();
    let mut rest = html;
    loop {
        match rest.find(&open) {
            None => {
                result.push_str(rest);
                break;
            }
            Some(start) => {
                result.push_str(&rest[..start]);
                match rest[start..].find(&close) {
                    Some(end_rel) => {
                        rest = &rest[start + end_rel + close.len()..];
                    }
                    None => break,
                }
            }
        }
    }
    result
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::new();
    let mut blank_run = 0;
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(trimmed);
        out.push('\n');
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_and_style_bodies() {
        let html = "<html><head><style>body{color:red}</style></head><body><script>alert(1)</script><p>hi</p></body></html>";
        let md = html_to_markdown(html);
        assert!(!md.contains("color:red"));
        assert!(!md.contains("alert"));
        assert!(md.contains("hi"));
    }

    #[test]
    fn converts_headings_and_emphasis() {
        let html = "<h1>Title</h1><p>Some <strong>bold</strong> and <em>italic</em> text.</p>";
        let md = html_to_markdown(html);
        assert!(md.contains("# Title"));
        assert!(md.contains("**bold**"));
        assert!(md.contains("*italic*"));
    }

    #[test]
    fn decodes_common_entities() {
        let html = "<p>Fish &amp; chips &mdash; tasty</p>".replace("&mdash;", "-");
        let md = html_to_markdown(&html);
        assert!(md.contains("Fish & chips"));
    }

    #[test]
    fn converts_list_items() {
        let html = "<ul><li>one</li><li>two</li></ul>";
        let md = html_to_markdown(html);
        assert!(md.contains("- one"));
        assert!(md.contains("- two"));
    }
}
