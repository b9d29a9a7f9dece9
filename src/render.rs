//! Output rendering for the chat screen.
//!
//! The conversation controller reports every change to the conversation
//! through the [`Renderer`] trait; [`TerminalRenderer`] draws those changes
//! on stdout with optional ANSI styling and markdown.

use std::io::{self, Write};

use crate::markdown::{self, MarkdownLines};
use crate::message::{Message, Role};

/// ANSI escape code for bold text (used for speaker labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for the typing indicator).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for magenta text (used for the assistant label).
const ANSI_MAGENTA: &str = "\x1b[35m";

/// ANSI escape code for red text (used for failures).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Return to column zero and erase the line.
const ERASE_LINE: &str = "\r\x1b[2K";

/// Shown while an answer has been started but no text has arrived yet.
pub const TYPING_INDICATOR: &str = "Analyzing your question...";

/// Label printed above user messages.
pub const USER_LABEL: &str = "You:";

/// Label printed above assistant messages.
pub const ASSISTANT_LABEL: &str = "Fiqh AI:";

/// Returns the speaker label for `role`.
pub fn label(role: Role) -> &'static str {
    match role {
        Role::User => USER_LABEL,
        Role::Assistant => ASSISTANT_LABEL,
    }
}

/// Whether a message should be drawn.
///
/// An assistant message that is still empty is only meaningful while its
/// answer is in flight (it shows the typing indicator); afterwards it is hidden.
pub fn is_visible(message: &Message, in_flight: bool) -> bool {
    !(message.is_assistant() && message.is_blank() && !in_flight)
}

/// Trait for rendering the chat screen.
///
/// This abstraction allows for different rendering strategies:
/// - Styled terminal output with markdown
/// - Plain text without styling (for piping/redirecting)
/// - Recording renderers in tests
pub trait Renderer: Send {
    /// Called after the user's message has been appended.
    fn print_user(&mut self, message: &Message) {
        _ = message;
    }

    /// Called when the empty assistant message for an answer is appended.
    ///
    /// This is where the typing indicator appears.
    fn start_answer(&mut self, message: &Message);

    /// Print one decoded increment of the answer.
    ///
    /// This is called after every chunk, in arrival order, including empty ones.
    fn print_text(&mut self, text: &str);

    /// Called when the answer stream ends, normally or not.
    fn finish_answer(&mut self, message: &Message);

    /// Called when a send cycle fails and its error entry has been appended.
    fn print_failure(&mut self, message: &Message);

    /// Draw a complete message, e.g. when replaying the conversation.
    fn print_message(&mut self, message: &Message);

    /// Print an error that is not part of the conversation.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Terminal renderer with optional ANSI styling and markdown.
///
/// Every increment is written as soon as it arrives. With markdown and colour
/// both on, each line is redrawn styled once its newline arrives; the
/// unfinished tail stays raw until then.
pub struct TerminalRenderer {
    out: Box<dyn Write + Send>,
    use_color: bool,
    markdown: bool,
    lines: MarkdownLines,
    partial_line: String,
    indicator_shown: bool,
    line_start: bool,
}

impl TerminalRenderer {
    /// Creates a new TerminalRenderer that draws on stdout.
    pub fn new(use_color: bool, markdown: bool) -> Self {
        Self::with_writer(Box::new(io::stdout()), use_color, markdown)
    }

    /// Creates a renderer that draws on `out` instead of stdout.
    pub fn with_writer(out: Box<dyn Write + Send>, use_color: bool, markdown: bool) -> Self {
        Self {
            out,
            use_color,
            markdown,
            lines: MarkdownLines::new(use_color),
            partial_line: String::new(),
            indicator_shown: false,
            line_start: true,
        }
    }

    /// Creates a plain renderer: no colours, no markdown styling.
    pub fn plain() -> Self {
        Self::new(false, false)
    }

    /// Returns true if ANSI styling is enabled.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Returns true if answers are styled as markdown.
    pub fn markdown(&self) -> bool {
        self.markdown
    }

    /// Turns markdown styling on or off for subsequent output.
    pub fn set_markdown(&mut self, markdown: bool) {
        self.settle_partial_line();
        self.markdown = markdown;
    }

    /// Flushes the output to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.out.flush();
    }

    fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let _ = self.out.write_all(text.as_bytes());
        self.line_start = text.ends_with('\n');
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    fn write_label(&mut self, role: Role) {
        if !self.line_start {
            self.write("\n");
        }
        let text = match role {
            Role::User => self.styled(ANSI_BOLD, USER_LABEL),
            Role::Assistant => self.styled(&format!("{ANSI_BOLD}{ANSI_MAGENTA}"), ASSISTANT_LABEL),
        };
        self.write(&format!("{text}\n"));
    }

    // Without colour the indicator stays on its own line; erasing needs escape codes.
    fn clear_indicator(&mut self) {
        if self.indicator_shown {
            if self.use_color {
                let _ = self.out.write_all(ERASE_LINE.as_bytes());
                self.line_start = true;
            }
            self.indicator_shown = false;
        }
    }

    fn restyles_lines(&self) -> bool {
        self.markdown && self.use_color
    }

    /// Redraws the raw line on screen as `line` styled.
    fn restyle_line(&mut self, line: &str) {
        let rendered = self.lines.render_line(line);
        let _ = self.out.write_all(ERASE_LINE.as_bytes());
        self.write(&rendered);
    }

    fn settle_partial_line(&mut self) {
        if self.partial_line.is_empty() {
            return;
        }
        let line = std::mem::take(&mut self.partial_line);
        self.restyle_line(&line);
    }

    fn write_body(&mut self, content: &str) {
        if self.markdown {
            let rendered = markdown::render(content, self.use_color);
            self.write(&rendered);
        } else {
            self.write(content);
            if !self.line_start {
                self.write("\n");
            }
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl Renderer for TerminalRenderer {
    fn start_answer(&mut self, message: &Message) {
        self.write_label(message.role);
        self.lines.reset();
        let indicator = self.styled(ANSI_DIM, TYPING_INDICATOR);
        if self.use_color {
            self.write(&indicator);
        } else {
            self.write(&format!("{indicator}\n"));
        }
        self.indicator_shown = true;
        self.flush();
    }

    fn print_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.clear_indicator();
        if !self.restyles_lines() {
            self.write(text);
            self.flush();
            return;
        }
        let mut rest = text;
        while let Some(pos) = rest.find('\n') {
            let (head, tail) = rest.split_at(pos + 1);
            self.partial_line.push_str(head);
            let line = std::mem::take(&mut self.partial_line);
            self.restyle_line(&line);
            rest = tail;
        }
        if !rest.is_empty() {
            self.partial_line.push_str(rest);
            self.write(rest);
        }
        self.flush();
    }

    fn finish_answer(&mut self, message: &Message) {
        _ = message;
        self.clear_indicator();
        self.settle_partial_line();
        self.lines.reset();
        if !self.line_start {
            self.write("\n");
        }
        self.write("\n");
        self.flush();
    }

    fn print_failure(&mut self, message: &Message) {
        // An answer that never received text still shows its label and the
        // indicator; the failure takes the indicator's place.
        let answer_open = self.indicator_shown;
        self.clear_indicator();
        self.settle_partial_line();
        self.lines.reset();
        if !answer_open {
            self.write_label(message.role);
        }
        let text = self.styled(ANSI_RED, &message.content);
        self.write(&format!("{text}\n\n"));
        self.flush();
    }

    fn print_message(&mut self, message: &Message) {
        self.write_label(message.role);
        if message.is_user() {
            self.write(&format!("{}\n", message.content));
        } else {
            self.write_body(&message.content);
        }
        self.write("\n");
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.clear_indicator();
        let text = self.styled(ANSI_RED, &format!("Error: {error}"));
        eprintln!("{text}");
    }

    fn print_info(&mut self, info: &str) {
        if !self.line_start {
            self.write("\n");
        }
        self.write(&format!("{info}\n"));
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::message::IdGenerator;

    #[test]
    fn renderer_default_has_color_and_markdown() {
        let renderer = TerminalRenderer::default();
        assert!(renderer.use_color());
        assert!(renderer.markdown());
    }

    #[test]
    fn plain_renderer() {
        let renderer = TerminalRenderer::plain();
        assert!(!renderer.use_color());
        assert!(!renderer.markdown());
    }

    #[test]
    fn labels() {
        assert_eq!(label(Role::User), "You:");
        assert_eq!(label(Role::Assistant), "Fiqh AI:");
    }

    #[test]
    fn empty_answer_hidden_once_settled() {
        let mut ids = IdGenerator::new();
        let placeholder = Message::assistant(ids.next_id());
        assert!(is_visible(&placeholder, true));
        assert!(!is_visible(&placeholder, false));

        let question = Message::user(ids.next_id(), "Is tayammum valid?");
        assert!(is_visible(&question, false));

        let answer = Message::assistant_with(ids.next_id(), "Yes, when water is unavailable.");
        assert!(is_visible(&answer, false));
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn take(&self) -> String {
            let bytes = std::mem::take(&mut *self.0.lock().unwrap());
            String::from_utf8(bytes).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(use_color: bool, markdown: bool) -> (TerminalRenderer, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let renderer = TerminalRenderer::with_writer(Box::new(buffer.clone()), use_color, markdown);
        (renderer, buffer)
    }

    #[test]
    fn every_increment_shows_up_immediately() {
        let (mut renderer, buffer) = capture(true, true);
        let mut ids = IdGenerator::new();
        renderer.start_answer(&Message::assistant(ids.next_id()));
        let opening = buffer.take();
        assert!(opening.contains(ASSISTANT_LABEL));
        assert!(opening.contains(TYPING_INDICATOR));

        for increment in [
            "Eating ",
            "camel meat ",
            "breaks wudu ",
            "according to the Hanbali school.",
        ] {
            renderer.print_text(increment);
            let written = buffer.take();
            assert!(
                written.contains(increment),
                "{increment:?} not written: {written:?}"
            );
        }
    }

    #[test]
    fn indicator_stays_until_text_arrives() {
        let (mut renderer, buffer) = capture(true, true);
        let mut ids = IdGenerator::new();
        renderer.start_answer(&Message::assistant(ids.next_id()));
        renderer.print_text("");
        assert!(renderer.indicator_shown);
        assert!(!buffer.take().contains(ERASE_LINE));

        renderer.print_text("Yes.");
        assert!(!renderer.indicator_shown);
        assert_eq!(buffer.take(), format!("{ERASE_LINE}Yes."));
    }

    #[test]
    fn completed_line_is_restyled_in_place() {
        let (mut renderer, buffer) = capture(true, true);
        renderer.print_text("**Hanafi");
        assert_eq!(buffer.take(), "**Hanafi");
        renderer.print_text(" School**\nNext");
        let written = buffer.take();
        assert!(written.starts_with(ERASE_LINE));
        assert!(written.contains("Hanafi School"));
        assert!(!written.contains("**"));
        assert!(written.ends_with("\nNext"));
        assert_eq!(renderer.partial_line, "Next");

        let mut ids = IdGenerator::new();
        renderer.finish_answer(&Message::assistant(ids.next_id()));
        assert!(renderer.partial_line.is_empty());
        assert!(renderer.line_start);
        assert!(buffer.take().starts_with(ERASE_LINE));
    }

    #[test]
    fn without_color_text_stays_raw() {
        let (mut renderer, buffer) = capture(false, true);
        renderer.print_text("**Hanafi");
        renderer.print_text(" School**\n");
        assert_eq!(buffer.take(), "**Hanafi School**\n");
        assert!(renderer.partial_line.is_empty());
    }

    #[test]
    fn failure_before_text_replaces_indicator() {
        let (mut renderer, buffer) = capture(false, true);
        let mut ids = IdGenerator::new();
        renderer.start_answer(&Message::assistant(ids.next_id()));
        renderer.print_failure(&Message::assistant_with(ids.next_id(), "HTTP 500"));
        let written = buffer.take();
        assert_eq!(written.matches(ASSISTANT_LABEL).count(), 1);
        assert!(written.ends_with("HTTP 500\n\n"));
    }

    #[test]
    fn failure_after_text_gets_its_own_label() {
        let (mut renderer, buffer) = capture(false, false);
        let mut ids = IdGenerator::new();
        let answer = Message::assistant_with(ids.next_id(), "Partial");
        renderer.start_answer(&answer);
        renderer.print_text("Partial");
        renderer.finish_answer(&answer);
        renderer.print_failure(&Message::assistant_with(ids.next_id(), "Stream interrupted: eof"));
        let written = buffer.take();
        assert_eq!(written.matches(ASSISTANT_LABEL).count(), 2);
        assert!(written.contains("Partial\n"));
    }
}
