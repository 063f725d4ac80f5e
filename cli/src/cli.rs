use clap::Parser;
use std::path::PathBuf;

/// Simple CLI to chat with ProBot, a Gemini-backed assistant
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The message to send (default positional argument)
    #[arg(index = 1)]
    pub prompt: Option<String>,

    /// Attach an image file to the message
    #[arg(short, long)]
    pub attach: Option<PathBuf>,

    /// Set and save the Gemini API Key persistently
    #[arg(long)]
    pub set_api_key: Option<String>,

    /// Set and save the system prompt persistently
    #[arg(long)]
    pub set_system_prompt: Option<String>,

    /// Show the current configuration
    #[arg(long, default_value_t = false)]
    pub show_config: bool,

    /// Start a new conversation (discard stored history)
    #[arg(long, default_value_t = false)]
    pub new_chat: bool,

    /// Run an interactive chat session
    #[arg(short, long, default_value_t = false)]
    pub interactive: bool,

    /// Identity that owns the conversation (defaults to PROBOT_USER, then the OS user)
    #[arg(long)]
    pub user: Option<String>,
}
