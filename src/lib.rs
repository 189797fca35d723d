pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod protocol;
pub mod state;
pub mod widget;

// Re-export main types for convenience
pub use client::ApiClient;
pub use config::Config;
pub use error::{Error, Result};
pub use protocol::{AnalysisResult, ApiResponse, HealthStatus, Suggestion};
pub use state::{Message, MessageKind, Sender, WidgetState};
pub use widget::ChatWidget;
