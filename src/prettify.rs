/*============================================================
  Synavera Project: Syn-OTA
  Module: synota_core::prettify
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Normalise the assembled report: one tag or text run per
    line, indented by the number of open elements.

  Security / Safety Notes:
    Pure string transformation; markup is never interpreted
    beyond tag boundaries.

  Dependencies:
    None beyond std.

  Operational Scope:
    Final pass before the report is written.

  Revision History:
    2025-11-12 COD  Authored markup normaliser.
    2025-11-19 COD  Tracked open elements; kept <pre> verbatim.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Output is a fixed point of the transformation
    - Unbalanced markup never leaks indentation past its parent
    - Author whitespace preserved where it carries meaning
============================================================*/

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is emitted exactly as written.
const VERBATIM_ELEMENTS: &[&str] = &["pre", "script", "style", "textarea"];

/// Opening any of these implicitly closes an open `<p>`.
const PARAGRAPH_CLOSERS: &[&str] = &[
    "p", "ul", "ol", "div", "pre", "table", "details", "blockquote", "h1", "h2", "h3", "h4", "h5",
    "h6", "hr",
];

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Open {
        raw: &'a str,
        name: String,
        self_closing: bool,
    },
    Close {
        raw: &'a str,
        name: String,
    },
    Other(&'a str),
    Verbatim(&'a str),
    Text(&'a str),
}

/// Pretty-print the tag structure of `input`. Running it on its own output
/// returns the same string.
pub fn prettify(input: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut open: Vec<String> = Vec::new();

    for token in tokenize(input) {
        match token {
            Token::Open {
                raw,
                name,
                self_closing,
            } => {
                close_implied(&mut open, &name);
                lines.push(indent(open.len(), raw.trim()));
                if !self_closing && !VOID_ELEMENTS.contains(&name.as_str()) {
                    open.push(name);
                }
            }
            Token::Close { raw, name } => {
                // A close with no matching open element is kept but changes nothing.
                if let Some(at) = open.iter().rposition(|tag| *tag == name) {
                    open.truncate(at);
                }
                lines.push(indent(open.len(), raw.trim()));
            }
            Token::Other(raw) => lines.push(indent(open.len(), raw.trim())),
            Token::Verbatim(raw) => {
                let name = element_name(&raw[1..]);
                close_implied(&mut open, &name);
                lines.push(indent(open.len(), raw));
            }
            Token::Text(text) => {
                for line in text_lines(text) {
                    if line.is_empty() {
                        if lines.last().is_some_and(|last| !last.is_empty()) {
                            lines.push(String::new());
                        }
                    } else {
                        lines.push(indent(open.len(), line));
                    }
                }
            }
        }
    }

    let mut output = lines.join("\n");
    output.push('\n');
    output
}

fn indent(depth: usize, content: &str) -> String {
    format!("{}{}", " ".repeat(depth), content)
}

/// Pop elements that `name` closes implicitly: a new `<li>` ends the previous
/// item of the same list, block elements end an open paragraph.
fn close_implied(open: &mut Vec<String>, name: &str) {
    if name == "li" {
        let nearest = open
            .iter()
            .rposition(|tag| matches!(tag.as_str(), "li" | "ul" | "ol"));
        if let Some(at) = nearest.filter(|&at| open[at] == "li") {
            open.truncate(at);
        }
    }
    if PARAGRAPH_CLOSERS.contains(&name) && open.last().is_some_and(|tag| tag == "p") {
        open.pop();
    }
}

/// Lines of a text run with leading and trailing blank lines dropped, the
/// common left margin removed and trailing whitespace trimmed. Blank lines
/// inside the run come back as empty strings.
fn text_lines(text: &str) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let Some(first) = lines.iter().position(|line| !line.is_empty()) else {
        return Vec::new();
    };
    let last = lines
        .iter()
        .rposition(|line| !line.is_empty())
        .unwrap_or(first);
    let body = &lines[first..=last];

    let margin = body
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    body.iter()
        .map(|line| if line.is_empty() { "" } else { &line[margin..] })
        .collect()
}

fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut text_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'<' || !starts_markup(bytes.get(pos + 1).copied()) {
            pos += 1;
            continue;
        }
        let Some(end) = markup_end(input, pos) else {
            break;
        };
        if text_start < pos {
            tokens.push(Token::Text(&input[text_start..pos]));
        }

        let token = classify(&input[pos..end]);
        let verbatim = match &token {
            Token::Open {
                name,
                self_closing: false,
                ..
            } if VERBATIM_ELEMENTS.contains(&name.as_str()) => Some(name.clone()),
            _ => None,
        };
        let end = match verbatim {
            Some(name) => {
                let close = verbatim_end(input, end, &name);
                tokens.push(Token::Verbatim(&input[pos..close]));
                close
            }
            None => {
                tokens.push(token);
                end
            }
        };
        pos = end;
        text_start = end;
    }

    if text_start < input.len() {
        tokens.push(Token::Text(&input[text_start..]));
    }
    tokens
}

/// Byte offset just past `</name>` at or after `from`, or the end of input
/// when the element is never closed.
fn verbatim_end(input: &str, from: usize, name: &str) -> usize {
    let needle = format!("</{name}");
    let lowered = input[from..].to_ascii_lowercase();
    let mut search = 0;
    while let Some(idx) = lowered[search..].find(&needle) {
        let at = search + idx;
        let after = lowered.as_bytes().get(at + needle.len()).copied();
        if matches!(after, Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r')) {
            return markup_end(input, from + at).unwrap_or(input.len());
        }
        search = at + needle.len();
    }
    input.len()
}

fn starts_markup(next: Option<u8>) -> bool {
    matches!(next, Some(b) if b.is_ascii_alphabetic() || b == b'/' || b == b'!')
}

/// Byte offset just past the markup that starts at `start`.
fn markup_end(input: &str, start: usize) -> Option<usize> {
    let rest = &input[start..];
    if rest.starts_with("<!--") {
        return rest.find("-->").map(|idx| start + idx + 3);
    }

    let mut quote: Option<u8> = None;
    for (offset, byte) in rest.bytes().enumerate().skip(1) {
        match (quote, byte) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"') | (None, b'\'') => quote = Some(byte),
            (None, b'>') => return Some(start + offset + 1),
            (None, _) => {}
        }
    }
    None
}

fn element_name(after_bracket: &str) -> String {
    after_bracket
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase()
}

fn classify(raw: &str) -> Token<'_> {
    if let Some(rest) = raw.strip_prefix("</") {
        return Token::Close {
            raw,
            name: element_name(rest),
        };
    }
    if raw.starts_with("<!") {
        return Token::Other(raw);
    }
    Token::Open {
        raw,
        name: element_name(&raw[1..]),
        self_closing: raw.ends_with("/>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nests_tags_and_text() {
        let out = prettify("<details open><summary>v1</summary><p>size</p></details>");
        assert_eq!(
            out,
            "<details open>\n <summary>\n  v1\n </summary>\n <p>\n  size\n </p>\n</details>\n"
        );
    }

    #[test]
    fn markdown_text_stays_at_top_level() {
        let out = prettify("# title\n\n## Bond (zahedan)\n<details>\n</details>\n\n### heading\n_none_");
        assert_eq!(
            out,
            "# title\n\n## Bond (zahedan)\n<details>\n</details>\n### heading\n_none_\n"
        );
    }

    #[test]
    fn unclosed_items_end_with_their_parent() {
        let out = prettify(
            "<details><summary>v</summary><ul><li>a<li>b<li>c<li>d</ul><p>x\n</details>\n\n## Daria Bond II (hormoz)\n",
        );
        assert_eq!(
            out,
            "<details>\n <summary>\n  v\n </summary>\n <ul>\n  <li>\n   a\n  <li>\n   b\n  <li>\n   c\n  <li>\n   d\n </ul>\n <p>\n  x\n</details>\n## Daria Bond II (hormoz)\n"
        );
        assert!(out.contains("\n## Daria Bond II (hormoz)\n"));
    }

    #[test]
    fn nested_lists_resume_outer_items() {
        let out = prettify("<ul><li>a<ul><li>b</ul><li>c</ul>");
        assert_eq!(
            out,
            "<ul>\n <li>\n  a\n  <ul>\n   <li>\n    b\n  </ul>\n <li>\n  c\n</ul>\n"
        );
    }

    #[test]
    fn block_tags_end_an_open_paragraph() {
        let out = prettify("<p>one<p>two<ul><li>x</ul>");
        assert_eq!(out, "<p>\n one\n<p>\n two\n<ul>\n <li>\n  x\n</ul>\n");
    }

    #[test]
    fn pre_block_is_kept_verbatim() {
        let input = "<div><pre>\n  fn main() {\n      body();\n  }\n</pre></div>";
        let out = prettify(input);
        assert_eq!(
            out,
            "<div>\n <pre>\n  fn main() {\n      body();\n  }\n</pre>\n</div>\n"
        );
        assert_eq!(prettify(&out), out);
    }

    #[test]
    fn unterminated_pre_runs_to_end() {
        let out = prettify("<PRE>\n  a\n\n\n  b");
        assert_eq!(out, "<PRE>\n  a\n\n\n  b\n");
    }

    #[test]
    fn indented_markdown_list_keeps_relative_indent() {
        let out = prettify(
            "<details>\n<summary>v</summary>\n    - fixes\n      - camera\n      - wifi\n    - docs\n</details>",
        );
        assert_eq!(
            out,
            "<details>\n <summary>\n  v\n </summary>\n - fixes\n   - camera\n   - wifi\n - docs\n</details>\n"
        );
        assert_eq!(prettify(&out), out);
    }

    #[test]
    fn void_and_self_closing_tags_do_not_nest() {
        let out = prettify("<p>a<br>b<img src=\"x.png\"/></p>");
        assert_eq!(
            out,
            "<p>\n a\n <br>\n b\n <img src=\"x.png\"/>\n</p>\n"
        );
    }

    #[test]
    fn attribute_with_angle_bracket_is_one_tag() {
        let out = prettify("<a href=\"https://x/?q=a>b\">link</a>");
        assert_eq!(out, "<a href=\"https://x/?q=a>b\">\n link\n</a>\n");
    }

    #[test]
    fn stray_closing_tag_does_not_underflow() {
        let out = prettify("</p>text");
        assert_eq!(out, "</p>\ntext\n");
    }

    #[test]
    fn unmatched_close_keeps_enclosing_element_open() {
        let out = prettify("<div></span>a</div>");
        assert_eq!(out, "<div>\n </span>\n a\n</div>\n");
    }

    #[test]
    fn literal_less_than_is_text() {
        let out = prettify("<p>1 < 2</p>");
        assert_eq!(out, "<p>\n 1 < 2\n</p>\n");
    }

    #[test]
    fn comments_are_kept() {
        let out = prettify("<div><!-- note --></div>");
        assert_eq!(out, "<div>\n <!-- note -->\n</div>\n");
    }

    #[test]
    fn output_is_a_fixed_point() {
        let input = "# t\n\n## d\n\n### h\n<details open>\n<summary>v</summary>\n<h2>توضیحات:</h2>\n<ul><li>one<li>two\n</ul><p>\nFile Size: 2.00 GB — md5sum: x —\nAPI Level: 30 — Type: N/A\n</details>\n\n\n### s\n_x_";
        let once = prettify(input);
        assert_eq!(prettify(&once), once);
        assert!(once.contains("\n### s\n"));
    }
}
