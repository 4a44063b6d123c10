//! Markdown → ratatui `Text`.
//!
//! Assistant answers that are not table markup arrive here. `pulldown_cmark`
//! events are folded into styled lines: headings, emphasis, inline code,
//! fenced code (highlighted by syntect), lists, block quotes, links and pipe
//! tables. Raw HTML is never interpreted; it is shown as literal dim text.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use super::table::{Grid, render_grid};

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const CODE_THEME: &str = "base16-ocean.dark";

/// Render markdown with `base` as the body style. `width` bounds pipe tables.
pub fn render(content: &str, base: Style, width: u16) -> Text<'static> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TABLES);

    let mut builder = TextBuilder::new(base, width);
    for event in Parser::new_ext(content, opts) {
        builder.handle(event);
    }
    builder.text
}

/// A pipe table being collected; rendered as a grid once it closes.
struct PendingTable {
    grid: Grid,
    in_head: bool,
    cell: Option<String>,
}

struct TextBuilder {
    text: Text<'static>,
    base: Style,
    width: u16,
    /// Inline styles, each patched over its parent.
    styles: Vec<Style>,
    /// Spans repeated at the start of every line (quote bars, code gutter).
    prefixes: Vec<Span<'static>>,
    /// None = bullet list, Some(n) = numbered list at n.
    lists: Vec<Option<u64>>,
    highlighter: Option<HighlightLines<'static>>,
    in_code: bool,
    link: Option<String>,
    table: Option<PendingTable>,
    pending_gap: bool,
}

impl TextBuilder {
    fn new(base: Style, width: u16) -> Self {
        Self {
            text: Text::default(),
            base,
            width,
            styles: Vec::new(),
            prefixes: Vec::new(),
            lists: Vec::new(),
            highlighter: None,
            in_code: false,
            link: None,
            table: None,
            pending_gap: false,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or(self.base)
    }

    fn push_style(&mut self, overlay: Style) {
        self.styles.push(self.style().patch(overlay));
    }

    fn new_line(&mut self, line: Line<'static>) {
        let mut line = line;
        for prefix in self.prefixes.iter().rev() {
            line.spans.insert(0, prefix.clone());
        }
        self.text.lines.push(line);
    }

    fn append(&mut self, span: Span<'static>) {
        match self.text.lines.last_mut() {
            Some(line) => line.push_span(span),
            None => self.new_line(Line::from(span)),
        }
    }

    fn gap(&mut self) {
        if self.pending_gap {
            self.new_line(Line::default());
            self.pending_gap = false;
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        if self.table.is_some() {
            self.handle_table(event);
            return;
        }
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(tag) => self.close(tag),
            Event::Text(t) => self.text(t),
            Event::Code(c) => self.append(Span::styled(c.to_string(), inline_code_style())),
            Event::Html(raw) => self.block_html(raw),
            Event::InlineHtml(raw) => self.inline_html(raw),
            Event::SoftBreak => self.append(Span::raw(" ")),
            Event::HardBreak => self.new_line(Line::default()),
            Event::Rule => {
                self.gap();
                let len = usize::from(self.width.clamp(1, 40));
                self.new_line(Line::from(Span::styled("─".repeat(len), dim_border())));
                self.pending_gap = true;
            }
            _ => {}
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.gap();
                self.new_line(Line::default());
            }
            Tag::Heading { level, .. } => {
                self.gap();
                let style = self.base.patch(heading_style(level));
                self.new_line(Line::default());
                self.styles.push(style);
            }
            Tag::BlockQuote(_) => {
                self.gap();
                self.prefixes.push(Span::styled("▎ ", Style::default().fg(Color::Blue)));
                self.push_style(Style::default().add_modifier(Modifier::ITALIC));
            }
            Tag::CodeBlock(kind) => {
                self.gap();
                let lang = match &kind {
                    CodeBlockKind::Fenced(lang) => lang.split_whitespace().next().unwrap_or(""),
                    CodeBlockKind::Indented => "",
                };
                let mut header = vec![Span::styled("┌─", dim_border())];
                if !lang.is_empty() {
                    header.push(Span::styled(
                        format!(" {lang} "),
                        dim_border().add_modifier(Modifier::BOLD),
                    ));
                }
                self.new_line(Line::from(header));
                self.prefixes.push(Span::styled("│ ", dim_border()));
                self.highlighter = SYNTAX_SET
                    .find_syntax_by_token(lang)
                    .filter(|_| !lang.is_empty())
                    .zip(THEME_SET.themes.get(CODE_THEME))
                    .map(|(syntax, theme)| HighlightLines::new(syntax, theme));
                self.in_code = true;
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.gap();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let m = format!("{indent}{n}. ");
                        *n += 1;
                        m
                    }
                    _ => format!("{indent}• "),
                };
                self.new_line(Line::from(Span::styled(marker, Style::default().fg(Color::Blue))));
            }
            Tag::Table(_) => {
                self.gap();
                self.table = Some(PendingTable {
                    grid: Grid::default(),
                    in_head: false,
                    cell: None,
                });
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.link = Some(dest_url.to_string());
                self.push_style(link_style());
            }
            _ => {}
        }
    }

    fn close(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.pending_gap = true,
            TagEnd::Heading(_) => {
                self.styles.pop();
                self.pending_gap = true;
            }
            TagEnd::BlockQuote(_) => {
                self.prefixes.pop();
                self.styles.pop();
                self.pending_gap = true;
            }
            TagEnd::CodeBlock => {
                self.highlighter = None;
                self.in_code = false;
                self.prefixes.pop();
                self.new_line(Line::from(Span::styled("└─", dim_border())));
                self.pending_gap = true;
            }
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.pending_gap = true;
                }
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.styles.pop();
            }
            TagEnd::Link => {
                self.styles.pop();
                if let Some(url) = self.link.take() {
                    self.append(Span::styled(format!(" <{url}>"), link_style()));
                }
            }
            _ => {}
        }
    }

    fn handle_table(&mut self, event: Event<'_>) {
        let Some(table) = self.table.as_mut() else { return };
        match event {
            Event::Start(Tag::TableHead) => {
                table.in_head = true;
                table.grid.push_row(true);
            }
            Event::End(TagEnd::TableHead) => table.in_head = false,
            Event::Start(Tag::TableRow) => table.grid.push_row(false),
            Event::Start(Tag::TableCell) => table.cell = Some(String::new()),
            Event::End(TagEnd::TableCell) => {
                if let Some(raw) = table.cell.take() {
                    table.grid.push_cell(&raw, table.in_head);
                }
            }
            Event::Text(t) | Event::Code(t) | Event::Html(t) | Event::InlineHtml(t) => {
                if let Some(cell) = table.cell.as_mut() {
                    cell.push_str(&t);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(cell) = table.cell.as_mut() {
                    cell.push(' ');
                }
            }
            Event::End(TagEnd::Table) => {
                if let Some(done) = self.table.take() {
                    for line in render_grid(&done.grid, self.width, self.base) {
                        self.new_line(line);
                    }
                    self.pending_gap = true;
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, cow: CowStr<'_>) {
        let text = cow.replace('\t', "    ");

        if self.in_code {
            match self.highlighter.take() {
                Some(mut hl) => {
                    for line in LinesWithEndings::from(&text) {
                        let spans: Vec<Span<'static>> = match hl.highlight_line(line, &SYNTAX_SET) {
                            Ok(ranges) => ranges
                                .into_iter()
                                .map(|(s, frag)| {
                                    let fg = Color::Rgb(s.foreground.r, s.foreground.g, s.foreground.b);
                                    Span::styled(frag.trim_end_matches('\n').to_string(), Style::default().fg(fg))
                                })
                                .filter(|span| !span.content.is_empty())
                                .collect(),
                            Err(_) => vec![Span::raw(line.trim_end_matches('\n').to_string())],
                        };
                        self.new_line(Line::from(spans));
                    }
                    self.highlighter = Some(hl);
                }
                None => {
                    for line in text.lines() {
                        self.new_line(Line::from(Span::styled(
                            line.to_string(),
                            Style::default().fg(Color::Gray),
                        )));
                    }
                }
            }
            return;
        }

        let style = self.style();
        self.append(Span::styled(text, style));
    }

    /// Inline tags stay in the running line.
    fn inline_html(&mut self, raw: CowStr<'_>) {
        let style = self.style().add_modifier(Modifier::DIM);
        self.append(Span::styled(raw.to_string(), style));
    }

    /// Block HTML arrives one source line per event.
    fn block_html(&mut self, raw: CowStr<'_>) {
        self.gap();
        let style = self.base.add_modifier(Modifier::DIM);
        for line in raw.lines() {
            self.new_line(Line::from(Span::styled(line.to_string(), style)));
        }
    }
}

fn heading_style(level: HeadingLevel) -> Style {
    let style = Style::default().add_modifier(Modifier::BOLD);
    match level {
        HeadingLevel::H1 => style.fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
        HeadingLevel::H2 => style.fg(Color::Cyan),
        _ => style,
    }
}

fn inline_code_style() -> Style {
    Style::default().fg(Color::Yellow).bg(Color::Rgb(40, 40, 40))
}

fn link_style() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED)
}

fn dim_border() -> Style {
    Style::default().fg(Color::DarkGray)
}
