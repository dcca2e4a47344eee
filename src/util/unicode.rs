use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width in terminal cells. Task lines carry emoji markers that
/// occupy two cells each, so byte or char counts misalign columns.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

fn grapheme_width(g: &str) -> usize {
    // Emoji with a variation selector report 1 from some tables; clamp up.
    let w = UnicodeWidthStr::width(g);
    if g.chars().count() > 1 && g.chars().any(|c| c == '\u{FE0F}') {
        w.max(2)
    } else {
        w
    }
}

/// Truncate to at most `max_cells` cells, appending `…` when cut.
/// Never splits a grapheme cluster.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if max_cells == 0 {
        return String::new();
    }
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    if max_cells == 1 {
        return "\u{2026}".to_string();
    }
    let budget = max_cells - 1;
    let mut width = 0;
    let mut out = String::new();
    for g in s.graphemes(true) {
        let gw = grapheme_width(g);
        if width + gw > budget {
            break;
        }
        width += gw;
        out.push_str(g);
    }
    out.push('\u{2026}');
    out
}

/// Right-pad with spaces to `cells` display cells.
pub fn pad_to_width(s: &str, cells: usize) -> String {
    let w = display_width(s);
    if w >= cells {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(cells - w))
    }
}
