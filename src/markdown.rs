//! Markdown to terminal text.
//!
//! Answers arrive as markdown (bold school names, numbered steps, the odd
//! code block). [`render`] turns a whole document into text for a terminal,
//! with or without ANSI styling. [`MarkdownLines`] does the same one line at
//! a time so that an answer can be styled while it is still streaming.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_DIM: &str = "\x1b[2m";
const ANSI_ITALIC: &str = "\x1b[3m";
const ANSI_UNDERLINE: &str = "\x1b[4m";
const ANSI_CYAN: &str = "\x1b[36m";
const ANSI_RESET: &str = "\x1b[0m";

const BULLET: &str = "• ";
const RULE: &str = "────────────────────────────────";

/// Render a markdown document as terminal text.
pub fn render(source: &str, use_color: bool) -> String {
    let mut writer = Writer::new(use_color);
    for event in Parser::new_ext(source, Options::ENABLE_STRIKETHROUGH) {
        writer.event(event);
    }
    writer.finish()
}

/// Styles streamed markdown one complete line at a time.
///
/// Fenced code blocks span lines, so the fence state is carried between
/// calls; everything else is rendered from the line alone.
#[derive(Debug, Default)]
pub struct MarkdownLines {
    use_color: bool,
    in_fence: bool,
}

impl MarkdownLines {
    /// Creates a line renderer.
    pub fn new(use_color: bool) -> Self {
        Self {
            use_color,
            in_fence: false,
        }
    }

    /// Renders one line, without its trailing newline, and returns it newline-terminated.
    pub fn render_line(&mut self, line: &str) -> String {
        let line = line.trim_end_matches(['\r', '\n']);
        let body = line.trim_start();
        if body.starts_with("```") || body.starts_with("~~~") {
            self.in_fence = !self.in_fence;
            return format!("{}\n", self.dim(line));
        }
        if self.in_fence {
            return format!("{}\n", self.dim(&format!("    {line}")));
        }
        if body.is_empty() {
            return "\n".to_string();
        }
        let indent = &line[..line.len() - body.len()];
        let rendered = render(body, self.use_color);
        format!("{indent}{}\n", rendered.trim_end_matches('\n'))
    }

    /// Forget any open code fence; called when an answer ends.
    pub fn reset(&mut self) {
        self.in_fence = false;
    }

    fn dim(&self, text: &str) -> String {
        if self.use_color {
            format!("{ANSI_DIM}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }
}

struct Writer {
    use_color: bool,
    out: String,
    styles: Vec<&'static str>,
    lists: Vec<Option<u64>>,
    links: Vec<String>,
    in_code_block: bool,
}

impl Writer {
    fn new(use_color: bool) -> Self {
        Self {
            use_color,
            out: String::new(),
            styles: Vec::new(),
            lists: Vec::new(),
            links: Vec::new(),
            in_code_block: false,
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    for line in text.lines() {
                        self.push_styled(ANSI_DIM, &format!("    {line}"));
                        self.out.push('\n');
                    }
                } else {
                    self.out.push_str(&text);
                }
            }
            Event::Code(code) => self.push_styled(ANSI_CYAN, &code),
            Event::Html(html) | Event::InlineHtml(html) => self.out.push_str(&html),
            Event::SoftBreak | Event::HardBreak => {
                self.out.push('\n');
                self.indent_continuation();
            }
            Event::Rule => {
                self.push_styled(ANSI_DIM, RULE);
                self.out.push_str("\n\n");
            }
            Event::TaskListMarker(done) => {
                self.out.push_str(if done { "[x] " } else { "[ ] " });
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { .. } => {
                self.push_style(ANSI_BOLD);
                self.push_style(ANSI_UNDERLINE);
            }
            Tag::Strong => self.push_style(ANSI_BOLD),
            Tag::Emphasis => self.push_style(ANSI_ITALIC),
            Tag::Strikethrough => self.push_style(ANSI_DIM),
            Tag::CodeBlock(kind) => {
                self.in_code_block = true;
                if let CodeBlockKind::Fenced(lang) = kind
                    && !lang.is_empty()
                {
                    self.push_styled(ANSI_DIM, &format!("    [{lang}]"));
                    self.out.push('\n');
                }
            }
            Tag::List(start) => {
                if !self.lists.is_empty() && !self.out.ends_with('\n') {
                    self.out.push('\n');
                }
                self.lists.push(start);
            }
            Tag::Item => {
                let depth = self.lists.len().saturating_sub(1);
                self.out.push_str(&"  ".repeat(depth));
                match self.lists.last_mut() {
                    Some(Some(number)) => {
                        self.out.push_str(&format!("{number}. "));
                        *number += 1;
                    }
                    _ => self.out.push_str(BULLET),
                }
            }
            Tag::Link { dest_url, .. } => self.links.push(dest_url.to_string()),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.pop_style();
                self.pop_style();
                self.out.push_str("\n\n");
            }
            TagEnd::Strong | TagEnd::Emphasis | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Paragraph => {
                self.out.push('\n');
                if self.lists.is_empty() {
                    self.out.push('\n');
                }
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.out.push('\n');
            }
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.out.push('\n');
                }
            }
            TagEnd::Item => {
                if !self.out.ends_with('\n') {
                    self.out.push('\n');
                }
            }
            TagEnd::Link => {
                if let Some(url) = self.links.pop() {
                    self.push_styled(ANSI_DIM, &format!(" ({url})"));
                }
            }
            _ => {}
        }
    }

    fn indent_continuation(&mut self) {
        if !self.lists.is_empty() {
            self.out.push_str(&"  ".repeat(self.lists.len()));
        }
    }

    fn push_style(&mut self, style: &'static str) {
        self.styles.push(style);
        if self.use_color {
            self.out.push_str(style);
        }
    }

    // ANSI has no "undo one attribute", so reset and re-apply what is still open.
    fn pop_style(&mut self) {
        self.styles.pop();
        if self.use_color {
            self.out.push_str(ANSI_RESET);
            for style in &self.styles {
                self.out.push_str(style);
            }
        }
    }

    fn push_styled(&mut self, style: &'static str, text: &str) {
        if self.use_color {
            self.out.push_str(style);
            self.out.push_str(text);
            self.out.push_str(ANSI_RESET);
            for style in &self.styles {
                self.out.push_str(style);
            }
        } else {
            self.out.push_str(text);
        }
    }

    fn finish(mut self) -> String {
        if self.use_color && !self.styles.is_empty() {
            self.out.push_str(ANSI_RESET);
        }
        let trimmed = self.out.trim_end_matches('\n').len();
        self.out.truncate(trimmed);
        self.out.push('\n');
        self.out
    }
}
