use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::client::GeminiClient;
use crate::config::{FallbackStyle, GatewayConfig, SimulatedStyle, DEFAULT_SIMULATED_DELAY_MS};
use crate::errors::{CompletionResult, FailureKind};
use crate::request::shape_request;
use crate::types::{GenerateContentRequest, ImagePayload, Reply, Turn};

/// Fixed notice used by the strict simulated variant
pub const CONFIGURATION_NOTICE: &str = "⚠️ **Configuration Error:** No valid API key is configured. \
Set one with `--set-api-key` or the GEMINI_API_KEY environment variable to enable live replies.";

/// Fixed apology used by the generic fallback variant
pub const FALLBACK_NOTICE: &str =
    "🤖 **Fallback:** The AI service is unavailable right now. Please try again later.";

/// A remote completion backend: takes one wire request, returns the reply text
#[async_trait]
pub trait CompletionBackend: Send + Sync + std::fmt::Debug {
    async fn complete(&self, request: GenerateContentRequest) -> CompletionResult<String>;
}

/// Type alias for Arc-wrapped CompletionBackend trait objects
pub type CompletionBackendRef = Arc<dyn CompletionBackend>;

#[async_trait]
impl CompletionBackend for GeminiClient {
    async fn complete(&self, request: GenerateContentRequest) -> CompletionResult<String> {
        let response = self.generate_content(request).await?;
        self.extract_text_from_response(&response)
    }
}

/// Selected once at construction, never re-checked per call
#[derive(Debug, Clone)]
enum GatewayMode {
    Live(CompletionBackendRef),
    Simulated,
}

/// The message-exchange gateway.
///
/// `send` is total: every input combination yields a `Reply`, and failures
/// are logged and degraded rather than propagated. The gateway holds no
/// mutable state, so concurrent sends interleave freely.
#[derive(Debug, Clone)]
pub struct CompletionGateway {
    mode: GatewayMode,
    system_prompt: Option<String>,
    simulated_style: SimulatedStyle,
    fallback_style: FallbackStyle,
    simulated_delay: Duration,
}

impl CompletionGateway {
    /// Build a gateway from validated configuration.
    ///
    /// A missing or placeholder credential selects simulated mode here;
    /// nothing inside `send` ever consults the environment.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let mode = if config.has_usable_api_key() {
            match GeminiClient::new(config) {
                Ok(client) => GatewayMode::Live(Arc::new(client)),
                Err(e) => {
                    warn!(error = %e, "Failed to initialize live client, running in simulated mode");
                    GatewayMode::Simulated
                }
            }
        } else {
            info!("No usable API key configured, running in simulated mode");
            GatewayMode::Simulated
        };

        Self::assemble(mode, config)
    }

    /// Live gateway over a caller-supplied backend. Tests inject fakes here.
    pub fn with_backend(backend: CompletionBackendRef, config: &GatewayConfig) -> Self {
        Self::assemble(GatewayMode::Live(backend), config)
    }

    /// Simulated gateway, regardless of any configured credential
    pub fn simulated(config: &GatewayConfig) -> Self {
        Self::assemble(GatewayMode::Simulated, config)
    }

    fn assemble(mode: GatewayMode, config: &GatewayConfig) -> Self {
        Self {
            mode,
            system_prompt: config.system_prompt.clone(),
            simulated_style: config.simulated_style.unwrap_or_default(),
            fallback_style: config.fallback_style.unwrap_or_default(),
            simulated_delay: Duration::from_millis(
                config
                    .simulated_delay_ms
                    .unwrap_or(DEFAULT_SIMULATED_DELAY_MS),
            ),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self.mode, GatewayMode::Live(_))
    }

    /// Relay one user message and produce the normalized reply.
    ///
    /// Exactly one remote call is attempted in live mode; there is no retry
    /// and no cancellation path. `prior_turns` is never mutated.
    pub async fn send(
        &self,
        message: &str,
        image: Option<&ImagePayload>,
        prior_turns: &[Turn],
    ) -> Reply {
        match &self.mode {
            GatewayMode::Simulated => self.simulated_reply(message).await,
            GatewayMode::Live(backend) => {
                let request =
                    shape_request(message, image, prior_turns).into_request(self.system_prompt.as_deref());

                match backend.complete(request).await {
                    Ok(text) => Reply::live(text),
                    Err(e) => {
                        error!(
                            error = %e,
                            kind = %e.kind(),
                            "Completion call failed, degrading to fallback reply"
                        );
                        self.fallback_reply(e.kind(), message)
                    }
                }
            }
        }
    }

    async fn simulated_reply(&self, message: &str) -> Reply {
        match self.simulated_style {
            SimulatedStyle::EchoWithDelay => {
                // Mimic network latency so the caller's pending state is visible
                tokio::time::sleep(self.simulated_delay).await;

                Reply::simulated(format!(
                    "🤖 **Guest Mode:** I am running in simulation mode because no valid API key was found.\n\n\
                     I can't truly understand your text, but I can tell you that you said: \"{}\"",
                    message
                ))
            }
            SimulatedStyle::ConfigurationNotice => Reply::simulated(CONFIGURATION_NOTICE.to_string()),
        }
    }

    fn fallback_reply(&self, kind: FailureKind, message: &str) -> Reply {
        let content = match self.fallback_style {
            FallbackStyle::Echo => format!(
                "🤖 **Guest Mode Fallback:** The AI service is unavailable. \n\n\
                 Using simulation mode. You said: \"{}\"",
                message
            ),
            FallbackStyle::Generic => FALLBACK_NOTICE.to_string(),
        };

        Reply::fallback(kind, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::API_KEY_PLACEHOLDER;
    use crate::errors::CompletionError;
    use crate::types::{ReplyOrigin, TurnDraft, TurnRole};

    /// Backend that always answers with the same text
    #[derive(Debug)]
    struct FixedBackend(&'static str);

    #[async_trait]
    impl CompletionBackend for FixedBackend {
        async fn complete(&self, _request: GenerateContentRequest) -> CompletionResult<String> {
            Ok(self.0.to_string())
        }
    }

    /// Backend that always fails with a transport error
    #[derive(Debug)]
    struct FailingBackend;

    #[async_trait]
    impl CompletionBackend for FailingBackend {
        async fn complete(&self, _request: GenerateContentRequest) -> CompletionResult<String> {
            Err(CompletionError::Transport("connection refused".to_string()))
        }
    }

    /// Backend that answers like a remote with a malformed body
    #[derive(Debug)]
    struct MalformedBackend;

    #[async_trait]
    impl CompletionBackend for MalformedBackend {
        async fn complete(&self, _request: GenerateContentRequest) -> CompletionResult<String> {
            Err(CompletionError::Protocol("No candidates in response".to_string()))
        }
    }

    fn quick_config() -> GatewayConfig {
        GatewayConfig {
            simulated_delay_ms: Some(0),
            ..GatewayConfig::default()
        }
    }

    fn history() -> Vec<Turn> {
        vec![
            Turn::from_draft(TurnDraft::assistant("welcome")),
            Turn::from_draft(TurnDraft::user("earlier")),
        ]
    }

    #[tokio::test]
    async fn test_missing_credential_selects_simulated_mode() {
        let gateway = CompletionGateway::from_config(&quick_config());
        assert!(!gateway.is_live());

        let config = GatewayConfig {
            api_key: Some(API_KEY_PLACEHOLDER.to_string()),
            ..quick_config()
        };
        let gateway = CompletionGateway::from_config(&config);
        assert!(!gateway.is_live());
    }

    #[tokio::test]
    async fn test_real_credential_selects_live_mode() {
        let config = GatewayConfig {
            api_key: Some("AIzaSyExample".to_string()),
            ..quick_config()
        };
        let gateway = CompletionGateway::from_config(&config);
        assert!(gateway.is_live());
    }

    #[tokio::test]
    async fn test_simulated_echo_contains_the_user_text() {
        let gateway = CompletionGateway::from_config(&quick_config());

        let reply = gateway.send("hello", None, &history()).await;
        assert_eq!(reply.role, TurnRole::Assistant);
        assert_eq!(reply.origin, ReplyOrigin::Simulated);
        assert!(reply.content.contains("hello"));

        // Deterministic regardless of history content
        let again = gateway.send("hello", None, &[]).await;
        assert_eq!(reply.content, again.content);
    }

    #[tokio::test]
    async fn test_simulated_notice_is_fixed_and_does_not_echo() {
        let config = GatewayConfig {
            simulated_style: Some(SimulatedStyle::ConfigurationNotice),
            ..quick_config()
        };
        let gateway = CompletionGateway::from_config(&config);

        let reply = gateway.send("hello", None, &[]).await;
        assert_eq!(reply.content, CONFIGURATION_NOTICE);
        assert_eq!(reply.origin, ReplyOrigin::Simulated);
        assert!(!reply.content.contains("hello"));
    }

    #[tokio::test]
    async fn test_live_success_returns_the_remote_text() {
        let backend = Arc::new(FixedBackend("Paris is the capital of France."));
        let gateway = CompletionGateway::with_backend(backend, &quick_config());

        let reply = gateway.send("capital of France?", None, &[]).await;
        assert_eq!(reply.role, TurnRole::Assistant);
        assert_eq!(reply.content, "Paris is the capital of France.");
        assert_eq!(reply.origin, ReplyOrigin::Live);
    }

    #[tokio::test]
    async fn test_live_failure_degrades_to_echo_fallback() {
        let gateway = CompletionGateway::with_backend(Arc::new(FailingBackend), &quick_config());

        let reply = gateway.send("hello", None, &history()).await;
        assert_eq!(reply.role, TurnRole::Assistant);
        assert_eq!(reply.origin, ReplyOrigin::Fallback(FailureKind::Transport));
        assert!(reply.content.contains("hello"));
    }

    #[tokio::test]
    async fn test_live_failure_with_generic_style_does_not_echo() {
        let config = GatewayConfig {
            fallback_style: Some(FallbackStyle::Generic),
            ..quick_config()
        };
        let gateway = CompletionGateway::with_backend(Arc::new(FailingBackend), &config);

        let reply = gateway.send("hello", None, &[]).await;
        assert_eq!(reply.content, FALLBACK_NOTICE);
        assert_eq!(reply.origin, ReplyOrigin::Fallback(FailureKind::Transport));
        assert!(!reply.content.contains("hello"));
    }

    #[tokio::test]
    async fn test_malformed_response_is_tagged_as_protocol() {
        let gateway = CompletionGateway::with_backend(Arc::new(MalformedBackend), &quick_config());

        let reply = gateway.send("hello", None, &[]).await;
        assert_eq!(reply.origin, ReplyOrigin::Fallback(FailureKind::Protocol));
    }

    #[tokio::test]
    async fn test_send_accepts_images_with_and_without_history() {
        let gateway = CompletionGateway::with_backend(Arc::new(FixedBackend("a cat")), &quick_config());
        let image = ImagePayload::from_base64("Zm9v");

        let with_history = gateway.send("what is this?", Some(&image), &history()).await;
        let without_history = gateway.send("what is this?", Some(&image), &[]).await;
        assert_eq!(with_history.content, without_history.content);
    }
}
