//! Terminal display width helpers.
//!
//! Header values are styled with ANSI colors, so widths are measured after
//! stripping escapes to keep truncation aligned with what the operator sees.

/// Compute the display width of a string after stripping ANSI escapes.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

/// Truncate text to `max_width` columns, marking the cut with `…`.
///
/// CSI escape sequences are copied through with zero width, and a reset is
/// appended after a cut so styling never bleeds past the line.
pub fn truncate_display(text: &str, max_width: usize) -> String {
    if display_width(text) <= max_width {
        return text.to_string();
    }

    let mut result = String::new();
    let mut width = 0usize;
    let mut styled = false;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            styled = true;
            result.push(ch);
            for next in chars.by_ref() {
                result.push(next);
                if next != '[' && ('\x40'..='\x7e').contains(&next) {
                    break;
                }
            }
            continue;
        }
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + w >= max_width {
            if width < max_width {
                result.push('…');
            }
            break;
        }
        width += w;
        result.push(ch);
    }
    if styled {
        result.push_str("\x1b[0m");
    }
    result
}
