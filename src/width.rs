//! Terminal display width helpers.
//!
//! Rendered component content may carry ANSI styling, so every measurement
//! here treats escape sequences as zero columns wide.

use unicode_width::UnicodeWidthChar;

/// Compute the display width of a string after stripping ANSI escapes.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

/// Longest prefix of `text` that fits in `columns` display columns.
///
/// Escape sequences are kept even past the cut so trailing style resets
/// survive truncation.
pub fn truncate_to_width(text: &str, columns: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    let mut full = false;
    for piece in Pieces::new(text) {
        match piece {
            Piece::Escape(seq) => out.push_str(seq),
            Piece::Char(_) if full => {}
            Piece::Char(ch) => {
                let w = ch.width().unwrap_or(0);
                if used + w > columns {
                    full = true;
                    continue;
                }
                used += w;
                out.push(ch);
            }
        }
    }
    out
}

/// Remainder of `text` after the first `columns` display columns.
///
/// A wide character straddling the cut is replaced by spaces so the
/// remainder still starts exactly at `columns`.
pub fn skip_columns(text: &str, columns: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for piece in Pieces::new(text) {
        match piece {
            Piece::Escape(seq) => {
                if used >= columns {
                    out.push_str(seq);
                }
            }
            Piece::Char(ch) => {
                let w = ch.width().unwrap_or(0);
                if used >= columns {
                    out.push(ch);
                } else if used + w > columns {
                    out.extend(std::iter::repeat_n(' ', used + w - columns));
                }
                used += w;
            }
        }
    }
    out
}

/// Overlay `content` onto `row` starting at display column `column`,
/// clipped to `width` columns. Whatever `row` held before `column` and
/// after `column + width` is kept.
pub fn splice_at_column(row: &str, column: usize, content: &str, width: usize) -> String {
    let mut out = truncate_to_width(row, column);
    let prefix_width = display_width(&out);
    if prefix_width < column {
        out.extend(std::iter::repeat_n(' ', column - prefix_width));
    }

    let body = truncate_to_width(content, width);
    let body_width = display_width(&body);
    out.push_str(&body);

    let tail = skip_columns(row, column + body_width);
    if !tail.is_empty() {
        out.push_str(&tail);
    }
    out
}

enum Piece<'a> {
    Escape(&'a str),
    Char(char),
}

struct Pieces<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Pieces<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl<'a> Iterator for Pieces<'a> {
    type Item = Piece<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.text[self.pos..];
        let mut chars = rest.char_indices();
        let (_, first) = chars.next()?;

        if first != '\x1b' {
            self.pos += first.len_utf8();
            return Some(Piece::Char(first));
        }

        // CSI sequences run until a final byte in 0x40..=0x7E; anything else
        // is treated as a two-character escape.
        let end = match chars.next() {
            Some((_, '[')) => chars
                .find(|(_, ch)| ('\u{40}'..='\u{7e}').contains(ch))
                .map(|(idx, ch)| idx + ch.len_utf8())
                .unwrap_or(rest.len()),
            Some((idx, ch)) => idx + ch.len_utf8(),
            None => rest.len(),
        };
        self.pos += end;
        Some(Piece::Escape(&rest[..end]))
    }
}
