//! # Table Grid
//!
//! Turns backend table markup (pandas `to_html()` style) into a `Grid` and
//! draws grids as box-drawn lines:
//!
//! ```text
//! ┌──────┬───────┐
//! │ item │ count │
//! ├──────┼───────┤
//! │ Milk │    42 │
//! └──────┴───────┘
//! ```
//!
//! Only `table`, `thead`, `tr`, `th`, `td` and `br` carry meaning; every other
//! tag is dropped and its text kept. Entities are decoded with `html_escape`.
//! Markdown pipe tables reuse the same `Grid` so both look identical.

use std::sync::LazyLock;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use regex::Regex;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9]*)\b[^>]*>").expect("valid tag regex")
});
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));

/// Narrowest a column is squeezed to before giving up on fitting the width.
const MIN_COLUMN_WIDTH: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub text: String,
    pub header: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridRow {
    pub cells: Vec<GridCell>,
    /// Part of the table head; a rule is drawn after the last head row.
    pub is_header: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
    pub rows: Vec<GridRow>,
}

impl Grid {
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }

    /// Start a new row.
    pub fn push_row(&mut self, is_header: bool) {
        self.rows.push(GridRow {
            cells: Vec::new(),
            is_header,
        });
    }

    /// Append a cell to the last row, opening a row if none exists.
    pub fn push_cell(&mut self, raw: &str, header: bool) {
        if self.rows.is_empty() {
            self.push_row(false);
        }
        if let Some(row) = self.rows.last_mut() {
            row.cells.push(GridCell {
                text: raw.split_whitespace().collect::<Vec<_>>().join(" "),
                header,
            });
        }
    }
}

/// Parse trusted table markup into a grid.
pub fn parse_table_markup(markup: &str) -> Grid {
    let markup = COMMENT_RE.replace_all(markup, "");
    let mut grid = Grid::default();
    let mut in_head = false;
    // (text so far, is <th>) of the cell being read
    let mut open_cell: Option<(String, bool)> = None;
    let mut last = 0;

    let close_cell = |grid: &mut Grid, open: &mut Option<(String, bool)>| {
        if let Some((raw, header)) = open.take() {
            let decoded = html_escape::decode_html_entities(&raw);
            grid.push_cell(&decoded, header);
        }
    };

    for cap in TAG_RE.captures_iter(&markup) {
        let Some(whole) = cap.get(0) else { continue };
        if let Some((text, _)) = open_cell.as_mut() {
            text.push_str(&markup[last..whole.start()]);
        }
        last = whole.end();

        let closing = !cap[1].is_empty();
        let name = cap[2].to_ascii_lowercase();
        match (name.as_str(), closing) {
            ("thead", false) => in_head = true,
            ("thead", true) => in_head = false,
            ("tr", false) => {
                close_cell(&mut grid, &mut open_cell);
                grid.push_row(in_head);
            }
            ("tr", true) | ("table", true) => close_cell(&mut grid, &mut open_cell),
            ("td" | "th", false) => {
                close_cell(&mut grid, &mut open_cell);
                open_cell = Some((String::new(), name == "th"));
            }
            ("td" | "th", true) => close_cell(&mut grid, &mut open_cell),
            ("br", _) => {
                if let Some((text, _)) = open_cell.as_mut() {
                    text.push(' ');
                }
            }
            _ => {}
        }
    }
    close_cell(&mut grid, &mut open_cell);

    // Rows made only of <th> outside <thead> are still headings
    for row in &mut grid.rows {
        if !row.is_header && !row.cells.is_empty() && row.cells.iter().all(|c| c.header) {
            row.is_header = true;
        }
    }
    grid.rows.retain(|r| !r.cells.is_empty());
    grid
}

/// Draw a grid as styled lines no wider than `max_width` where possible.
pub fn render_grid(grid: &Grid, max_width: u16, base: Style) -> Vec<Line<'static>> {
    let columns = grid.column_count();
    if columns == 0 {
        return vec![Line::from(Span::styled(
            "(empty table)",
            base.add_modifier(Modifier::DIM),
        ))];
    }

    let widths = fit_widths(natural_widths(grid, columns), max_width as usize);
    let border = Style::default().fg(Color::DarkGray);
    let last_head = grid.rows.iter().rposition(|r| r.is_header);
    let has_body = last_head.is_none_or(|i| i + 1 < grid.rows.len());

    let mut lines = vec![rule(&widths, ('┌', '┬', '┐'), border)];
    for (i, row) in grid.rows.iter().enumerate() {
        let mut spans = vec![Span::styled("│", border)];
        for (col, width) in widths.iter().enumerate() {
            let cell = row.cells.get(col);
            let text = cell.map(|c| c.text.as_str()).unwrap_or("");
            let style = if cell.is_some_and(|c| c.header) || row.is_header {
                base.add_modifier(Modifier::BOLD)
            } else {
                base
            };
            let align_right = !row.is_header && is_numeric(text);
            spans.push(Span::styled(
                format!(" {} ", pad(text, *width, align_right)),
                style,
            ));
            spans.push(Span::styled("│", border));
        }
        lines.push(Line::from(spans));

        if Some(i) == last_head && has_body {
            lines.push(rule(&widths, ('├', '┼', '┤'), border));
        }
    }
    lines.push(rule(&widths, ('└', '┴', '┘'), border));
    lines
}

fn natural_widths(grid: &Grid, columns: usize) -> Vec<usize> {
    let mut widths = vec![1; columns];
    for row in &grid.rows {
        for (col, cell) in row.cells.iter().enumerate() {
            widths[col] = widths[col].max(cell.text.width());
        }
    }
    widths
}

/// Shrink the widest columns one cell at a time until the grid fits.
fn fit_widths(mut widths: Vec<usize>, max_width: usize) -> Vec<usize> {
    // "│" + per column " text │"
    let total = |w: &[usize]| 1 + w.iter().map(|c| c + 3).sum::<usize>();
    while total(&widths) > max_width {
        let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
            break;
        };
        if widest <= MIN_COLUMN_WIDTH {
            break;
        }
        widths[idx] -= 1;
    }
    widths
}

fn rule(widths: &[usize], (left, mid, right): (char, char, char), style: Style) -> Line<'static> {
    let body = widths
        .iter()
        .map(|w| "─".repeat(w + 2))
        .collect::<Vec<_>>()
        .join(&mid.to_string());
    Line::from(Span::styled(format!("{left}{body}{right}"), style))
}

/// Truncate to `width` display columns (adding `…`) and pad to exactly `width`.
fn pad(text: &str, width: usize, align_right: bool) -> String {
    let fitted = if text.width() > width {
        let mut out = String::new();
        let mut used = 0;
        for ch in text.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w + 1 > width {
                break;
            }
            out.push(ch);
            used += w;
        }
        out.push('…');
        out
    } else {
        text.to_string()
    };
    let fill = " ".repeat(width.saturating_sub(fitted.width()));
    if align_right {
        format!("{fill}{fitted}")
    } else {
        format!("{fitted}{fill}")
    }
}

fn is_numeric(text: &str) -> bool {
    let cleaned: String = text
        .trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    !cleaned.is_empty() && cleaned.parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn parses_single_cell_table() {
        let grid = parse_table_markup("<table><tr><td>1</td></tr></table>");
        assert_eq!(grid.rows.len(), 1);
        assert_eq!(grid.rows[0].cells[0].text, "1");
        assert!(!grid.rows[0].is_header);
    }

    #[test]
    fn parses_pandas_output() {
        let markup = r#"<table border="1" class="dataframe">
  <thead>
    <tr style="text-align: right;">
      <th></th>
      <th>item</th>
      <th>count</th>
    </tr>
  </thead>
  <tbody>
    <tr>
      <th>0</th>
      <td>Milk &amp; Honey</td>
      <td>42</td>
    </tr>
  </tbody>
</table>"#;
        let grid = parse_table_markup(markup);
        assert_eq!(grid.rows.len(), 2);
        assert!(grid.rows[0].is_header);
        assert_eq!(grid.rows[0].cells[1].text, "item");
        assert!(!grid.rows[1].is_header);
        assert!(grid.rows[1].cells[0].header, "index column stays a header cell");
        assert_eq!(grid.rows[1].cells[1].text, "Milk & Honey");
        assert_eq!(grid.column_count(), 3);
    }

    #[test]
    fn unknown_tags_keep_their_text() {
        let grid = parse_table_markup("<table><tr><td><b>bold</b> and<br>more</td></tr></table>");
        assert_eq!(grid.rows[0].cells[0].text, "bold and more");
    }

    #[test]
    fn comments_are_dropped() {
        let grid = parse_table_markup("<table><!-- <tr><td>x</td></tr> --><tr><td>y</td></tr></table>");
        assert_eq!(grid.rows.len(), 1);
        assert_eq!(grid.rows[0].cells[0].text, "y");
    }

    #[test]
    fn th_only_row_without_thead_is_header() {
        let grid = parse_table_markup("<table><tr><th>a</th></tr><tr><td>1</td></tr></table>");
        assert!(grid.rows[0].is_header);
        assert!(!grid.rows[1].is_header);
    }

    #[test]
    fn renders_box_with_header_rule() {
        let grid = parse_table_markup(
            "<table><thead><tr><th>name</th><th>n</th></tr></thead><tr><td>ab</td><td>7</td></tr></table>",
        );
        let lines = plain(&render_grid(&grid, 80, Style::default()));
        assert_eq!(
            lines,
            vec![
                "┌──────┬───┐",
                "│ name │ n │",
                "├──────┼───┤",
                "│ ab   │ 7 │",
                "└──────┴───┘",
            ]
        );
    }

    #[test]
    fn numeric_cells_align_right() {
        let grid = parse_table_markup("<table><tr><td>x</td></tr><tr><td>1,250</td></tr></table>");
        let lines = plain(&render_grid(&grid, 80, Style::default()));
        assert_eq!(lines[1], "│ x     │");
        assert_eq!(lines[2], "│ 1,250 │");
    }

    #[test]
    fn wide_columns_shrink_with_ellipsis() {
        let grid = parse_table_markup(
            "<table><tr><td>abcdefghijklmnopqrstuvwxyz</td><td>ok</td></tr></table>",
        );
        let lines = plain(&render_grid(&grid, 20, Style::default()));
        for line in &lines {
            assert!(line.width() <= 20, "{line:?} is wider than 20");
        }
        assert!(lines[1].contains('…'));
    }

    #[test]
    fn header_cells_are_bold() {
        let grid = parse_table_markup("<table><tr><th>h</th></tr><tr><td>v</td></tr></table>");
        let lines = render_grid(&grid, 80, Style::default());
        let header_span = lines[1].spans.iter().find(|s| s.content.contains('h')).unwrap();
        assert!(header_span.style.add_modifier.contains(Modifier::BOLD));
        let body_span = lines[3].spans.iter().find(|s| s.content.contains('v')).unwrap();
        assert!(!body_span.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn empty_table_renders_notice() {
        let grid = parse_table_markup("<table></table>");
        let lines = plain(&render_grid(&grid, 80, Style::default()));
        assert_eq!(lines, vec!["(empty table)"]);
    }
}
