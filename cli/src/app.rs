use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;
use tracing::{info, warn};

use probot_core::gateway::CompletionGateway;
use probot_core::types::{ImagePayload, Reply, Turn, TurnDraft, TurnRole};
use probot_store::ConversationStoreRef;

/// Greeting shown when the stored conversation is empty
const WELCOME_MESSAGE: &str =
    "Hello! I am your professional AI assistant. How can I help you today?";

/// Wires the completion gateway to the conversation store for one identity
pub struct ChatApp {
    gateway: CompletionGateway,
    store: ConversationStoreRef,
    identity: String,
}

impl ChatApp {
    pub fn new(gateway: CompletionGateway, store: ConversationStoreRef, identity: String) -> Self {
        Self {
            gateway,
            store,
            identity,
        }
    }

    /// Send one message: persist the user turn, relay it with the stored
    /// history as context, persist the reply.
    ///
    /// The history handed to the gateway excludes the turn being sent.
    pub async fn send_message(&self, message: &str, image: Option<ImagePayload>) -> Result<Reply> {
        let prior_turns = self
            .store
            .list(&self.identity)
            .await
            .context("Failed to load conversation history")?;

        let mut draft = TurnDraft::user(message);
        if let Some(image) = image.clone() {
            draft = draft.with_attachment(image);
        }
        self.store
            .append(&self.identity, draft)
            .await
            .context("Failed to persist user message")?;

        let reply = self.gateway.send(message, image.as_ref(), &prior_turns).await;
        info!(origin = ?reply.origin, "Reply produced");

        // The reply is still worth showing if persisting it fails
        if let Err(e) = self
            .store
            .append(&self.identity, TurnDraft::assistant(reply.content.clone()))
            .await
        {
            warn!(error = %e, "Failed to save assistant reply");
            eprintln!("{}: {}", "Warning: Failed to save chat history".yellow(), e);
        }

        Ok(reply)
    }

    /// Send a single prompt and display the response
    pub async fn run_single_query(&self, prompt: String, image: Option<ImagePayload>) -> Result<()> {
        let spinner = make_spinner();

        let reply = self.send_message(&prompt, image).await;
        spinner.finish_and_clear();

        let reply = reply?;
        print_turn(TurnRole::Assistant, &reply.content);
        Ok(())
    }

    /// Run an interactive chat session
    pub async fn run_interactive_chat(&self) -> Result<()> {
        println!(
            "{}",
            "Starting chat session. Type 'exit' or 'quit' to end.".cyan()
        );
        println!();

        let prior = self
            .store
            .list(&self.identity)
            .await
            .context("Failed to load conversation history")?;

        if prior.is_empty() {
            print_turn(TurnRole::Assistant, WELCOME_MESSAGE);
        } else {
            for turn in &prior {
                print_stored_turn(turn);
            }
        }

        loop {
            print!("{}: ", "You".green().bold());
            io::stdout().flush().context("Failed to flush stdout")?;

            let mut input = String::new();
            io::stdin()
                .read_line(&mut input)
                .context("Failed to read input")?;

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
                println!("Exiting chat session.");
                break;
            }

            let spinner = make_spinner();
            let reply = self.send_message(input, None).await;
            spinner.finish_and_clear();

            match reply {
                Ok(reply) => print_turn(TurnRole::Assistant, &reply.content),
                Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
            }

            println!();
        }

        Ok(())
    }
}

fn make_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner} {msg}")
            .unwrap(),
    );
    spinner.set_message("Asking ProBot...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn print_turn(role: TurnRole, content: &str) {
    match role {
        TurnRole::User => println!("{}: {}", "You".green().bold(), content),
        TurnRole::Assistant => println!("{}: {}", "ProBot".blue().bold(), content),
    }
}

fn print_stored_turn(turn: &Turn) {
    if turn.attachment.is_some() {
        match turn.role {
            TurnRole::User => println!("{}: {}", "You".green().bold(), "[image attached]".dimmed()),
            TurnRole::Assistant => {}
        }
    }
    print_turn(turn.role, &turn.content);
}
