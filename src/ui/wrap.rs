//! Display-width aware wrapping. The transcript is pre-wrapped so the renderer
//! knows its exact height when pinning the view to the bottom.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Wraps `text` to `width` columns, breaking at spaces where possible and
/// inside words that are wider than a line. Explicit newlines are kept.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        wrap_paragraph(paragraph, width, &mut lines);
    }
    lines
}

fn wrap_paragraph(paragraph: &str, width: usize, out: &mut Vec<String>) {
    let mut line = String::new();
    let mut line_width = 0usize;

    for word in paragraph.split_inclusive(' ') {
        let word_width = word.trim_end_matches(' ').width();
        if line_width + word_width > width && line_width > 0 {
            out.push(line.trim_end_matches(' ').to_string());
            line.clear();
            line_width = 0;
        }

        if word_width > width {
            for ch in word.chars() {
                let ch_width = ch.width().unwrap_or(0);
                if line_width + ch_width > width && line_width > 0 {
                    out.push(std::mem::take(&mut line));
                    line_width = 0;
                }
                line.push(ch);
                line_width += ch_width;
            }
            continue;
        }

        line.push_str(word);
        line_width += word.width();
    }

    out.push(line.trim_end_matches(' ').to_string());
}

/// Cuts `text` to at most `width` columns, ending with `…` when shortened.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width + 1 > width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_at_word_boundaries() {
        assert_eq!(
            wrap_text("¿En qué puedo ayudarte hoy?", 12),
            vec!["¿En qué", "puedo", "ayudarte", "hoy?"]
        );
    }

    #[test]
    fn keeps_explicit_newlines_and_blank_lines() {
        assert_eq!(wrap_text("uno\n\ndos", 10), vec!["uno", "", "dos"]);
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn splits_words_longer_than_a_line() {
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn wide_characters_count_double() {
        assert_eq!(wrap_text("日本語テキスト", 6), vec!["日本語", "テキス", "ト"]);
    }

    #[test]
    fn truncation_adds_ellipsis() {
        assert_eq!(truncate_to_width("Recetas", 10), "Recetas");
        assert_eq!(truncate_to_width("Chat 2024-05-01 10:00:00", 10), "Chat 2024…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }
}
