//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::env;

use arrrg_derive::CommandLine;
use url::Url;

use crate::error::{Error, Result};

/// Environment variable consulted when `--endpoint` is not given.
pub const ENDPOINT_ENV: &str = "FIQH_API_BASE_URL";

/// Command-line arguments for the fiqh-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// URL of the answering service.
    #[arrrg(optional, "Answering service URL (default: $FIQH_API_BASE_URL)", "URL")]
    pub endpoint: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Print answers verbatim instead of styling them as markdown.
    #[arrrg(flag, "Print answers as raw text")]
    pub plain: bool,

    /// Go straight to the chat screen.
    #[arrrg(flag, "Skip the landing screen")]
    pub skip_landing: bool,

    /// Log debug output to stderr.
    #[arrrg(flag, "Enable debug logging")]
    pub verbose: bool,
}

/// Configuration for the chat application.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments and the environment with appropriate defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Where questions are posted, if configured.
    pub endpoint: Option<String>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether answers are styled as markdown.
    pub markdown: bool,

    /// Whether the landing screen is shown first.
    pub show_landing: bool,

    /// Whether debug logging is enabled.
    pub verbose: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Endpoint: unset
    /// - Color: enabled
    /// - Markdown: enabled
    /// - Landing screen: shown
    pub fn new() -> Self {
        Self {
            endpoint: None,
            use_color: true,
            markdown: true,
            show_landing: true,
            verbose: false,
        }
    }

    /// Resolves arguments against the value of [`ENDPOINT_ENV`].
    ///
    /// An explicit `--endpoint` wins over the environment; blank values count as unset.
    pub fn resolve(args: ChatArgs, env_endpoint: Option<String>) -> Self {
        let endpoint = non_blank(args.endpoint).or_else(|| non_blank(env_endpoint));
        ChatConfig {
            endpoint,
            use_color: !args.no_color,
            markdown: !args.plain,
            show_landing: !args.skip_landing,
            verbose: args.verbose,
        }
    }

    /// Sets the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Disables markdown styling.
    pub fn without_markdown(mut self) -> Self {
        self.markdown = false;
        self
    }

    /// Sets whether the landing screen is shown.
    pub fn with_landing(mut self, show_landing: bool) -> Self {
        self.show_landing = show_landing;
        self
    }

    /// Sets whether debug logging is enabled.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Returns the validated endpoint URL.
    ///
    /// # Errors
    ///
    /// Fails if no endpoint is configured, if it does not parse, or if it is
    /// not an http(s) URL.
    pub fn endpoint_url(&self) -> Result<Url> {
        let Some(endpoint) = self.endpoint.as_deref() else {
            return Err(Error::validation(
                format!("no answering service configured; pass --endpoint or set {ENDPOINT_ENV}"),
                Some("endpoint".to_string()),
            ));
        };
        let url = Url::parse(endpoint)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(Error::validation(
                format!("unsupported scheme '{scheme}' in {endpoint}"),
                Some("endpoint".to_string()),
            )),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        ChatConfig::resolve(args, env::var(ENDPOINT_ENV).ok())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
