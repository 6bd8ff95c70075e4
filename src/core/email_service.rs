use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;
use std::str::FromStr;

use crate::core::config::SmtpConfig;
use crate::core::AppError;
use crate::services::ActivationMailer;

pub struct EmailService {
    smtp_config: SmtpConfig,
}

impl EmailService {
    pub fn new(smtp_config: SmtpConfig) -> Self {
        Self { smtp_config }
    }

    fn create_smtp_transport(&self) -> Result<SmtpTransport, AppError> {
        let credentials = Credentials::new(
            self.smtp_config.username.clone(),
            self.smtp_config.password.expose_secret().clone(),
        );

        // Port 2525 is the Mailtrap sandbox, which only speaks STARTTLS
        let mailer = if self.smtp_config.port == 2525 {
            SmtpTransport::starttls_relay(&self.smtp_config.host)
                .map_err(|e| {
                    AppError::internal_error(format!("Failed to create SMTP transport: {}", e))
                })?
                .port(self.smtp_config.port)
                .credentials(credentials)
                .build()
        } else {
            SmtpTransport::relay(&self.smtp_config.host)
                .map_err(|e| {
                    AppError::internal_error(format!("Failed to create SMTP transport: {}", e))
                })?
                .port(self.smtp_config.port)
                .credentials(credentials)
                .build()
        };

        Ok(mailer)
    }

    fn send(&self, to_email: &str, subject: &str, body: String) -> Result<(), AppError> {
        let from_mailbox = Mailbox::from_str(&format!(
            "{} <{}>",
            self.smtp_config.from_name, self.smtp_config.from_email
        ))
        .map_err(|e| AppError::internal_error(format!("Invalid from email: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to_email)
            .map_err(|e| AppError::internal_error(format!("Invalid to email: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AppError::internal_error(format!("Failed to build email: {}", e)))?;

        let mailer = self.create_smtp_transport()?;

        match mailer.send(&email) {
            Ok(_) => {
                tracing::info!("Email sent successfully to: {}", to_email);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to send email to {}: {}", to_email, e);
                Err(AppError::internal_error(format!(
                    "Failed to send email: {}",
                    e
                )))
            }
        }
    }
}

#[async_trait]
impl ActivationMailer for EmailService {
    async fn send_activation(
        &self,
        to_email: &str,
        username: &str,
        activation_code: &str,
    ) -> Result<(), AppError> {
        let body = format!(
            "Hello, {}!\n\
             Welcome to File Sharing! Please, visit next link to confirm your e-mail: {}/activate/{}",
            username, self.smtp_config.activation_base_url, activation_code
        );

        self.send(to_email, "Activation code", body)
    }
}
