//! Console email service for development. Logs messages to tracing
//! output instead of sending them.

use async_trait::async_trait;
use markops_application::EmailService;
use markops_core::AppResult;
use tracing::info;

/// Development email service that logs verification messages.
#[derive(Clone)]
pub struct ConsoleEmailService {
    base_url: String,
}

impl ConsoleEmailService {
    /// Creates a console email service; `base_url` is used to render the
    /// verification link.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl EmailService for ConsoleEmailService {
    async fn send_verification(&self, email: &str, token: &str) -> AppResult<()> {
        info!(
            to = email,
            "--- EMAIL (console) ---\nTo: {}\nSubject: Verify your account\n\nVisit {}/auth/verify?token={} to verify your account.\n--- END EMAIL ---",
            email,
            self.base_url,
            token
        );

        Ok(())
    }
}
