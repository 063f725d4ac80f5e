// Core message-exchange functionality for ProBot:
// - Request formatter for the Gemini API
// - Completion gateway with simulate/fallback policy
// - API client and request/response data structures
// - Configuration loading
// - Shared error types

// Export client module - API client for Gemini
pub mod client;
pub use client::*;

// Export types module - Roles, turns and wire data structures
pub mod types;
pub use types::*;

// Export request module - Request formatter
pub mod request;
pub use request::*;

// Export gateway module - Completion gateway
pub mod gateway;
pub use gateway::*;

// Export config module - Configuration loading
pub mod config;
pub use config::*;

// Export errors module - Shared error types
pub mod errors;
pub use errors::*;
