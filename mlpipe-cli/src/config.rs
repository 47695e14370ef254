//! Configuration module

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the dispatcher service
    pub dispatcher_url: String,
}
