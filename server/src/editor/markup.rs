//! Inline text markup
//!
//! Text layers carry a tiny HTML subset: `<b>`/`<strong>`, `<i>`/`<em>`,
//! `<u>` and `<br>`. Markup is parsed into styled runs, edited as runs and
//! written back, so formatting state is read from structure instead of by
//! searching the serialized string. Unknown tags are dropped and their text
//! kept.
//!
//! Ranges are character offsets into the plain text.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Bold,
    Italic,
    Underline,
}

/// Formatting of one run, or the aggregate state of a range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Style {
    pub fn has(&self, format: Format) -> bool {
        match format {
            Format::Bold => self.bold,
            Format::Italic => self.italic,
            Format::Underline => self.underline,
        }
    }

    fn with(mut self, format: Format, on: bool) -> Self {
        match format {
            Format::Bold => self.bold = on,
            Format::Italic => self.italic = on,
            Format::Underline => self.underline = on,
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub style: Style,
}

/// Parse markup into coalesced runs
pub fn parse(html: &str) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    let mut bold = 0usize;
    let mut italic = 0usize;
    let mut underline = 0usize;
    let mut rest = html;

    while !rest.is_empty() {
        let style = Style {
            bold: bold > 0,
            italic: italic > 0,
            underline: underline > 0,
        };

        if let Some(after) = rest.strip_prefix('<') {
            let Some(end) = after.find('>') else {
                // Stray '<' is literal text
                push_text(&mut runs, "<", style);
                rest = after;
                continue;
            };
            let tag = after[..end].trim().to_ascii_lowercase();
            rest = &after[end + 1..];

            let closing = tag.starts_with('/');
            let name = tag
                .trim_start_matches('/')
                .split(|c: char| c.is_whitespace() || c == '/')
                .next()
                .unwrap_or_default();
            let counter = match name {
                "b" | "strong" => Some(&mut bold),
                "i" | "em" => Some(&mut italic),
                "u" => Some(&mut underline),
                "br" => {
                    push_text(&mut runs, "\n", style);
                    None
                }
                _ => None,
            };
            if let Some(counter) = counter {
                if closing {
                    *counter = counter.saturating_sub(1);
                } else {
                    *counter += 1;
                }
            }
            continue;
        }

        let end = rest.find('<').unwrap_or(rest.len());
        push_text(&mut runs, &unescape(&rest[..end]), style);
        rest = &rest[end..];
    }

    runs
}

fn push_text(runs: &mut Vec<Run>, text: &str, style: Style) {
    if text.is_empty() {
        return;
    }
    match runs.last_mut() {
        Some(last) if last.style == style => last.text.push_str(text),
        _ => runs.push(Run {
            text: text.to_string(),
            style,
        }),
    }
}

/// Serialize runs back to markup
pub fn to_html(runs: &[Run]) -> String {
    let mut out = String::new();
    for run in runs {
        let mut open = String::new();
        let mut close = String::new();
        if run.style.bold {
            open.push_str("<b>");
            close.insert_str(0, "</b>");
        }
        if run.style.italic {
            open.push_str("<i>");
            close.insert_str(0, "</i>");
        }
        if run.style.underline {
            open.push_str("<u>");
            close.insert_str(0, "</u>");
        }
        out.push_str(&open);
        out.push_str(&escape_text(&run.text).replace('\n', "<br>"));
        out.push_str(&close);
    }
    out
}

/// The text a layer shows, without markup
pub fn plain_text(html: &str) -> String {
    parse(html).into_iter().map(|r| r.text).collect()
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    text.replace("&nbsp;", "\u{a0}")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Per-character styles of the plain text
fn styled_chars(runs: &[Run]) -> Vec<(char, Style)> {
    runs.iter()
        .flat_map(|r| r.text.chars().map(move |c| (c, r.style)))
        .collect()
}

fn from_styled_chars(chars: &[(char, Style)]) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for (c, style) in chars {
        let mut buf = [0u8; 4];
        push_text(&mut runs, c.encode_utf8(&mut buf), *style);
    }
    runs
}

fn clamp_range(range: Range<usize>, len: usize) -> Range<usize> {
    let start = range.start.min(len);
    let end = range.end.clamp(start, len);
    start..end
}

/// Formatting in effect over `range`.
///
/// A format counts as active when every character in the range has it; an
/// empty range (a caret) reports the character before it.
pub fn format_state(html: &str, range: Range<usize>) -> Style {
    let chars = styled_chars(&parse(html));
    let range = clamp_range(range, chars.len());

    if range.is_empty() {
        return match range.start.checked_sub(1).and_then(|i| chars.get(i)) {
            Some((_, style)) => *style,
            None => chars.first().map(|(_, s)| *s).unwrap_or_default(),
        };
    }

    let slice = &chars[range];
    Style {
        bold: slice.iter().all(|(_, s)| s.bold),
        italic: slice.iter().all(|(_, s)| s.italic),
        underline: slice.iter().all(|(_, s)| s.underline),
    }
}

/// Toggle `format` over `range`: removed when the whole range already has
/// it, applied otherwise. An empty range leaves the markup unchanged.
pub fn toggle(html: &str, range: Range<usize>, format: Format) -> String {
    let mut chars = styled_chars(&parse(html));
    let range = clamp_range(range, chars.len());
    if range.is_empty() {
        return to_html(&from_styled_chars(&chars));
    }

    let on = !chars[range.clone()].iter().all(|(_, s)| s.has(format));
    for (_, style) in &mut chars[range] {
        *style = style.with(format, on);
    }
    to_html(&from_styled_chars(&chars))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_and_aliases() {
        let runs = parse("a<strong>b<em>c</em></strong><u>d</u>");
        assert_eq!(runs.len(), 4);
        assert_eq!(runs[1].text, "b");
        assert!(runs[1].style.bold);
        assert!(runs[2].style.bold && runs[2].style.italic);
        assert!(runs[3].style.underline && !runs[3].style.bold);
    }

    #[test]
    fn test_plain_text_and_entities() {
        assert_eq!(plain_text("Fish &amp; <b>Chips</b><br>Co"), "Fish & Chips\nCo");
        assert_eq!(plain_text("<span style=\"x\">kept</span>"), "kept");
        assert_eq!(plain_text("1 < 2"), "1 < 2");
    }

    #[test]
    fn test_toggle_bold_survives_round_trip() {
        let html = toggle("Hello world", 0..5, Format::Bold);
        assert_eq!(html, "<b>Hello</b> world");

        let reloaded = to_html(&parse(&html));
        assert_eq!(reloaded, html);
        assert!(format_state(&reloaded, 0..5).bold);
        assert!(!format_state(&reloaded, 6..11).bold);
    }

    #[test]
    fn test_toggle_removes_when_fully_applied() {
        let html = toggle("<i>abc</i>", 0..3, Format::Italic);
        assert_eq!(html, "abc");

        // Partially italic range gets italic everywhere
        let html = toggle("<i>ab</i>cd", 1..3, Format::Italic);
        assert_eq!(html, "<i>abc</i>d");
    }

    #[test]
    fn test_caret_state_follows_previous_char() {
        let html = "<u>ab</u>cd";
        assert!(format_state(html, 2..2).underline);
        assert!(!format_state(html, 3..3).underline);
        assert!(format_state(html, 0..0).underline);
    }

    #[test]
    fn test_literal_angle_brackets_are_not_formatting() {
        let html = to_html(&[Run {
            text: "<b>not bold</b>".to_string(),
            style: Style::default(),
        }]);
        assert!(!format_state(&html, 0..3).bold);
        assert_eq!(plain_text(&html), "<b>not bold</b>");
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(toggle("ab", 1..99, Format::Underline), "a<u>b</u>");
        assert_eq!(toggle("ab", 5..9, Format::Bold), "ab");
    }
}
