//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to navigate and inspect the session without sending a
//! question to the answering service.

/// A parsed chat command.
///
/// These commands control the chat screen and are never sent as questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Return to the landing screen; the next chat starts fresh.
    Home,

    /// Redraw the whole conversation.
    History,

    /// Turn markdown styling on or off.
    Markdown(bool),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Display session statistics.
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command,
/// or `None` if it should be sent as a question.
///
/// # Examples
///
/// ```
/// # use fiqh::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/markdown off").is_some());
/// assert!(parse_command("What breaks wudu?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "home" => ChatCommand::Home,
        "history" => ChatCommand::History,
        "markdown" => match argument.and_then(parse_on_off) {
            Some(value) => ChatCommand::Markdown(value),
            None => ChatCommand::Invalid("/markdown expects 'on' or 'off'".to_string()),
        },
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        "config" => ChatCommand::ShowConfig,
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /home                  Back to the landing screen (starts a new chat)
  /history               Show the conversation so far
  /markdown on|off       Style answers as markdown or print them raw
  /stats                 Show session statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat"#
}
