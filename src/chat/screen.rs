//! The landing screen and the empty chat screen.

const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_DIM: &str = "\x1b[2m";
const ANSI_ITALIC: &str = "\x1b[3m";
const ANSI_MAGENTA: &str = "\x1b[35m";
const ANSI_RESET: &str = "\x1b[0m";

/// Product name shown on the landing screen.
pub const TITLE: &str = "FIQH AI";

/// Tagline under the title.
pub const TAGLINE: &str = "Guiding You Through the Islamic Jurisprudence with Ease.";

/// Prompt that leads from the landing screen into the chat.
pub const GET_STARTED: &str = "Get Started (press Enter) ";

/// Greeting shown on an empty chat screen.
pub const GREETING: &str = "Hey! Have some questions? Ask away.";

/// Example question shown under the greeting.
pub const EXAMPLE_QUESTION: &str =
    "e.g. What is the ruling on performing Wudu after eating camel meat?";

/// Shown under the input on every chat screen.
pub const DISCLAIMER: &str = "*Educational purposes only. Consult a scholar for authentic advice.";

/// Which screen the application is showing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Title, tagline and the get-started prompt.
    Landing,

    /// The conversation.
    Chat,

    /// The application is shutting down.
    Exit,
}

impl Screen {
    /// The first screen to show.
    pub fn initial(show_landing: bool) -> Self {
        if show_landing {
            Screen::Landing
        } else {
            Screen::Chat
        }
    }
}

/// Text of the landing screen, without the get-started prompt.
pub fn landing_text(use_color: bool) -> String {
    if use_color {
        format!(
            "\n  {ANSI_BOLD}{ANSI_MAGENTA}{TITLE}{ANSI_RESET}\n  {ANSI_MAGENTA}{TAGLINE}{ANSI_RESET}\n"
        )
    } else {
        format!("\n  {TITLE}\n  {TAGLINE}\n")
    }
}

/// Text shown when the chat screen opens with no messages yet.
pub fn greeting_text(use_color: bool) -> String {
    let help = "Type /help for commands, /quit to exit.";
    if use_color {
        format!(
            "{ANSI_BOLD}{GREETING}{ANSI_RESET}\n{ANSI_ITALIC}{EXAMPLE_QUESTION}{ANSI_RESET}\n{ANSI_DIM}{DISCLAIMER}\n{help}{ANSI_RESET}\n"
        )
    } else {
        format!("{GREETING}\n{EXAMPLE_QUESTION}\n{DISCLAIMER}\n{help}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_screen() {
        assert_eq!(Screen::initial(true), Screen::Landing);
        assert_eq!(Screen::initial(false), Screen::Chat);
    }

    #[test]
    fn landing_mentions_title_and_tagline() {
        let text = landing_text(false);
        assert!(text.contains(TITLE));
        assert!(text.contains(TAGLINE));
        assert!(!text.contains('\x1b'));
        assert!(landing_text(true).contains('\x1b'));
    }

    #[test]
    fn greeting_carries_disclaimer() {
        let text = greeting_text(false);
        assert!(text.starts_with(GREETING));
        assert!(text.contains(EXAMPLE_QUESTION));
        assert!(text.contains(DISCLAIMER));
    }
}
