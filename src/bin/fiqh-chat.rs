//! Interactive chat application for asking the Fiqh AI answering service.
//!
//! This binary provides a landing screen followed by a streaming REPL that
//! posts each question to the answering service and prints the answer as it
//! arrives.
//!
//! # Usage
//!
//! ```bash
//! # Use the endpoint from the environment
//! FIQH_API_BASE_URL=https://fiqh.example.com/ask fiqh-chat
//!
//! # Specify the endpoint explicitly
//! fiqh-chat --endpoint http://localhost:8000/ask
//!
//! # Disable colors and markdown styling (useful for piping output)
//! fiqh-chat --no-color --plain
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/home` - Return to the landing screen
//! - `/history` - Show the conversation so far
//! - `/markdown on|off` - Toggle markdown styling
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use fiqh::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, GET_STARTED, Renderer, Screen, SessionStats,
    TerminalRenderer, greeting_text, help_text, landing_text, parse_command,
};
use fiqh::render::is_visible;
use fiqh::{AnswerClient, AnswerService};

/// Main entry point for the fiqh-chat application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("fiqh-chat [OPTIONS]");
    let config = ChatConfig::from(args);
    init_logging(config.verbose);

    let endpoint = config.endpoint_url()?;
    tracing::info!(endpoint = %endpoint, "starting fiqh-chat");
    let client = AnswerClient::new(endpoint)?;
    let mut renderer = TerminalRenderer::new(config.use_color, config.markdown);
    let mut rl = DefaultEditor::new()?;

    let mut screen = Screen::initial(config.show_landing);
    loop {
        screen = match screen {
            Screen::Landing => landing(&mut rl, config.use_color)?,
            Screen::Chat => chat(&mut rl, client.clone(), &config, &mut renderer).await?,
            Screen::Exit => break,
        };
    }

    println!("Goodbye!");
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn landing(rl: &mut DefaultEditor, use_color: bool) -> fiqh::Result<Screen> {
    println!("{}", landing_text(use_color));
    match rl.readline(GET_STARTED) {
        Ok(_) => Ok(Screen::Chat),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(Screen::Exit),
        Err(err) => Err(err.into()),
    }
}

/// Runs one chat screen; every visit starts with an empty conversation.
async fn chat(
    rl: &mut DefaultEditor,
    client: AnswerClient,
    config: &ChatConfig,
    renderer: &mut TerminalRenderer,
) -> fiqh::Result<Screen> {
    let mut session = ChatSession::new(client);
    println!("{}", greeting_text(renderer.use_color()));

    loop {
        let line = match rl.readline("You: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!();
                return Ok(Screen::Exit);
            }
            Err(err) => return Err(err.into()),
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(trimmed);

        if let Some(cmd) = parse_command(trimmed) {
            match cmd {
                ChatCommand::Quit => return Ok(Screen::Exit),
                ChatCommand::Home => return Ok(Screen::Landing),
                ChatCommand::History => print_history(&session, renderer),
                ChatCommand::Markdown(on) => {
                    renderer.set_markdown(on);
                    if on {
                        renderer.print_info("Markdown styling enabled.");
                    } else {
                        renderer.print_info("Markdown styling disabled.");
                    }
                }
                ChatCommand::Help => {
                    for line in help_text().lines() {
                        println!("    {line}");
                    }
                }
                ChatCommand::Stats => print_stats(&session.stats()),
                ChatCommand::ShowConfig => print_config(config, &session, renderer),
                ChatCommand::Invalid(message) => renderer.print_error(&message),
            }
            continue;
        }

        session.set_input(line.as_str());
        session.submit(renderer).await;
    }
}

fn print_history<S: AnswerService>(session: &ChatSession<S>, renderer: &mut TerminalRenderer) {
    let in_flight = session.is_in_flight();
    let visible: Vec<_> = session
        .messages()
        .iter()
        .filter(|message| is_visible(message, in_flight))
        .collect();
    if visible.is_empty() {
        renderer.print_info("No messages yet.");
        return;
    }
    for message in visible {
        renderer.print_message(message);
    }
}

fn print_stats(stats: &SessionStats) {
    println!("    Session Statistics:");
    println!("      Messages: {}", stats.message_count);
    println!(
        "      Questions / answers: {} / {}",
        stats.user_messages, stats.assistant_messages
    );
    println!(
        "      Requests: {} ({} failed)",
        stats.requests, stats.failures
    );
    println!(
        "      Received: {} chunks, {} bytes of text",
        stats.chunks_received, stats.text_bytes
    );
}

fn print_config(
    config: &ChatConfig,
    session: &ChatSession<AnswerClient>,
    renderer: &TerminalRenderer,
) {
    println!("    Current Configuration:");
    println!("      Endpoint: {}", session.service().endpoint());
    println!(
        "      Colors: {}",
        if config.use_color { "on" } else { "off" }
    );
    println!(
        "      Markdown: {}",
        if renderer.markdown() { "on" } else { "off" }
    );
    println!(
        "      Landing screen: {}",
        if config.show_landing { "shown" } else { "skipped" }
    );
}
