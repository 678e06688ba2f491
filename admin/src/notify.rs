//! Telling users about new grants.

use crate::config::AdminConfig;
use crate::error::{AdminError, Result};
use async_trait::async_trait;
use authz::AccessMode;
use lettre::{
    message::header::ContentType, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, error};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_grant(
        &self,
        user: &str,
        repository_url: &str,
        path: &str,
        mode: AccessMode,
    ) -> Result<()>;
}

/// Sends plain-text mail through an unauthenticated SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    host: String,
    port: u16,
    from: String,
    domain: String,
}

impl SmtpNotifier {
    pub fn new(config: &AdminConfig) -> Self {
        Self {
            host: config.smtp_host.clone(),
            port: config.smtp_port,
            from: config.email_from.clone(),
            domain: config.email_domain.clone(),
        }
    }

    /// Mail address of a directory user.
    pub fn address(&self, user: &str) -> String {
        format!("{}@{}", user, self.domain)
    }
}

/// Body of the grant notification.
pub fn grant_message(user: &str, repository_url: &str, path: &str, mode: AccessMode) -> String {
    format!(
        "Hello {user},\n\n\
         You've been granted {verb} access on {path} for the repository located at {repository_url}.\n\n\
         Have fun!\n\
         SVN Admins\n",
        verb = mode.verb(),
    )
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify_grant(
        &self,
        user: &str,
        repository_url: &str,
        path: &str,
        mode: AccessMode,
    ) -> Result<()> {
        let to = self.address(user);
        let email = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| AdminError::Notification(format!("Invalid from address: {}", e)))?,
            )
            .to(to
                .parse()
                .map_err(|e| AdminError::Notification(format!("Invalid to address {}: {}", to, e)))?)
            .subject(format!("Access granted to {}", repository_url))
            .header(ContentType::TEXT_PLAIN)
            .body(grant_message(user, repository_url, path, mode))
            .map_err(|e| AdminError::Notification(format!("Failed to build email: {}", e)))?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.host)
            .port(self.port)
            .build();

        mailer.send(email).await.map_err(|e| {
            error!("Failed to send email: {}", e);
            AdminError::Notification(format!("Failed to send email: {}", e))
        })?;

        debug!("Grant notification sent to: {}", to);
        Ok(())
    }
}
