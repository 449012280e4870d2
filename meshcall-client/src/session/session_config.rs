#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name attached to outgoing chat messages.
    pub display_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            display_name: "guest".to_owned(),
        }
    }
}
