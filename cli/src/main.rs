mod app;
mod cli;
mod identity;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::Parser;
use colored::*;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::app::ChatApp;
use crate::cli::Args;
use crate::identity::resolve_identity;
use probot_core::config::{get_default_config_dir, get_default_config_file, GatewayConfig};
use probot_core::gateway::CompletionGateway;
use probot_core::types::ImagePayload;
use probot_store::{ConversationStoreRef, JsonFileStore};

const APP_NAME: &str = "probot";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging; logs are opt-in via RUST_LOG so chat output stays clean
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let args = Args::parse();

    let config_path =
        get_default_config_file(APP_NAME).context("Could not determine config file path")?;
    let mut cfg =
        GatewayConfig::load_from_file(&config_path).context("Failed to load configuration")?;

    // --- Handle Configuration Flags --- //
    let mut config_updated = false;
    if let Some(key) = args.set_api_key {
        cfg.api_key = Some(key);
        config_updated = true;
        println!("{}", "API Key updated.".green());
    }

    if let Some(prompt) = args.set_system_prompt {
        cfg.system_prompt = Some(prompt);
        config_updated = true;
        println!("{}", "System prompt updated.".green());
    }

    if config_updated {
        cfg.save_to_file(&config_path)
            .context("Failed to save configuration")?;
        println!("{} {}", "Configuration saved to:".cyan(), config_path.display());
        return Ok(()); // Exit after saving config
    }

    if args.show_config {
        show_config(&cfg, &config_path);
        return Ok(()); // Exit after showing config
    }

    // Determine the API key: config > environment variable. The gateway
    // itself never consults the environment.
    if cfg.api_key.is_none() {
        cfg.api_key = env::var("GEMINI_API_KEY").ok();
    }

    let identity = resolve_identity(args.user);

    let data_dir = get_default_config_dir(APP_NAME).context("Could not determine data directory")?;
    let store: ConversationStoreRef = Arc::new(JsonFileStore::new(data_dir));

    if args.new_chat {
        store
            .clear(&identity)
            .await
            .context("Failed to discard stored conversation")?;
        println!("{}", "Started a new chat.".yellow());
    }

    let gateway = CompletionGateway::from_config(&cfg);
    let chat = ChatApp::new(gateway, store, identity);

    let image = match &args.attach {
        Some(path) => Some(read_attachment(path)?),
        None => None,
    };

    if let Some(prompt) = args.prompt {
        chat.run_single_query(prompt, image).await?;
    } else if args.interactive {
        chat.run_interactive_chat().await?;
    } else if !args.new_chat {
        // No prompt provided and no other action was taken
        println!(
            "{}",
            "No prompt provided. Use 'probot \"your message\"' to chat.".yellow()
        );
        println!(
            "{}",
            "Use --interactive for a chat session, --set-api-key or --show-config for configuration."
                .cyan()
        );
        println!("{}", "Use --help for more options.".cyan());
    }

    Ok(())
}

fn show_config(cfg: &GatewayConfig, config_path: &Path) {
    println!(
        "{} ({})",
        "Current Configuration".cyan().bold(),
        config_path.display()
    );
    println!(
        "  {}: {}",
        "API Key".blue(),
        cfg.api_key.as_deref().map_or("Not Set".yellow().to_string(), |k| {
            if k.len() > 8 {
                format!("{}...", &k[..8]).bright_black().to_string()
            } else {
                "Set".green().to_string()
            }
        })
    );
    println!(
        "  {}: {}",
        "System Prompt".blue(),
        cfg.system_prompt.as_deref().map_or("Default".yellow().to_string(), |p| {
            if p.len() > 50 {
                format!("{}...", &p[..50]).italic().to_string()
            } else {
                p.italic().to_string()
            }
        })
    );
    println!(
        "  {}: {}",
        "Model".blue(),
        cfg.model_name.as_deref().unwrap_or(probot_core::types::DEFAULT_MODEL)
    );
}

fn read_attachment(path: &Path) -> Result<ImagePayload> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read attachment: {}", path.display()))?;
    Ok(ImagePayload::from_base64(STANDARD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_attachment_encodes_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.jpg");
        fs::write(&path, b"fake image bytes").unwrap();

        let payload = read_attachment(&path).unwrap();
        assert_eq!(payload.data, STANDARD.encode(b"fake image bytes"));
    }

    #[test]
    fn test_read_attachment_fails_for_a_missing_file() {
        assert!(read_attachment(Path::new("/nonexistent/pic.jpg")).is_err());
    }
}
