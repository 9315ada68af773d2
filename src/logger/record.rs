use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Level used when mirroring a record to the `log` facade.
    pub fn log_level(self) -> log::Level {
        match self {
            Severity::Low => log::Level::Info,
            Severity::Medium => log::Level::Warn,
            Severity::High | Severity::Critical => log::Level::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Network,
    Api,
    Validation,
    Render,
    Auth,
    Unknown,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(name)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::Network => "network",
            Category::Api => "api",
            Category::Validation => "validation",
            Category::Render => "render",
            Category::Auth => "auth",
            Category::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A stored log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: String,
    /// Epoch milliseconds.
    pub timestamp: u64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    pub severity: Severity,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

/// What a caller hands to the logger; id and timestamp are assigned on append.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub message: String,
    pub severity: Severity,
    pub category: Category,
    pub stack: Option<String>,
    pub context: Option<Value>,
}

impl LogEntry {
    pub fn new(message: impl Into<String>, severity: Severity, category: Category) -> Self {
        Self {
            message: message.into(),
            severity,
            category,
            stack: None,
            context: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }
}

/// Duration of a measured operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    pub name: String,
    pub duration_ms: u64,
    pub timestamp: u64,
}
