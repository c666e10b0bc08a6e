//! Email service for the verification workflow.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use bazaar_core::{Email, Username};

use crate::config::EmailConfig;

/// HTML template for the verification email.
#[derive(Template)]
#[template(path = "email/verification.html")]
struct VerificationEmailHtml<'a> {
    username: &'a str,
    verify_url: &'a str,
}

/// Plain text template for the verification email.
#[derive(Template)]
#[template(path = "email/verification.txt")]
struct VerificationEmailText<'a> {
    username: &'a str,
    verify_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailSendError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for transactional mail.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    base_url: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay hostname is invalid.
    pub fn new(config: &EmailConfig, base_url: &str) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Send the account verification email carrying a one-shot token link.
    ///
    /// # Errors
    ///
    /// Returns an error if the message fails to render, build, or send.
    pub async fn send_verification(
        &self,
        to: &Email,
        username: &Username,
        token: &str,
    ) -> Result<(), EmailSendError> {
        let verify_url = self.verification_url(token);
        let html = VerificationEmailHtml {
            username: username.as_str(),
            verify_url: &verify_url,
        }
        .render()?;
        let text = VerificationEmailText {
            username: username.as_str(),
            verify_url: &verify_url,
        }
        .render()?;

        self.send_multipart_email(to.as_str(), "Verify your Bazaar account", &text, &html)
            .await
    }

    fn verification_url(&self, token: &str) -> String {
        format!("{}/user-api/verify-email?token={token}", self.base_url)
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailSendError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailSendError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailSendError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_render_the_link() {
        let html = VerificationEmailHtml {
            username: "alice",
            verify_url: "http://localhost:8000/user-api/verify-email?token=abc",
        }
        .render()
        .expect("html template renders");
        assert!(html.contains("alice"));
        assert!(html.contains("verify-email?token=abc"));

        let text = VerificationEmailText {
            username: "alice",
            verify_url: "http://localhost:8000/user-api/verify-email?token=abc",
        }
        .render()
        .expect("text template renders");
        assert!(text.contains("verify-email?token=abc"));
    }
}
