use crate::config::SmtpSettings;
use crate::domain::ports::{Mailer, OutgoingEmail, SendError};
use crate::utils::error::{CampaignError, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

/// Mailer backed by a lettre SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    ascii_only: bool,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self> {
        let address: Address =
            settings
                .sender_email
                .trim()
                .parse()
                .map_err(|e| CampaignError::InvalidConfigValueError {
                    field: "sender_email".to_string(),
                    value: settings.sender_email.clone(),
                    reason: format!("{}", e),
                })?;
        let from = Mailbox::new(Some(settings.sender_name.clone()), address);

        // 465 走 implicit TLS，其餘 port 用 STARTTLS
        let builder = if settings.implicit_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.server)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)
        }
        .map_err(|e| CampaignError::SmtpSetupError {
            message: format!("{}: {}", settings.server, e),
        })?;

        let transport = builder
            .port(settings.port)
            .credentials(Credentials::new(
                settings.sender_email.clone(),
                settings.sender_password.clone(),
            ))
            .timeout(Some(Duration::from_secs(settings.timeout_seconds)))
            .build();

        tracing::debug!(
            "SMTP transport ready: {}:{} (implicit TLS: {})",
            settings.server,
            settings.port,
            settings.implicit_tls()
        );

        Ok(Self {
            transport,
            from,
            ascii_only: settings.ascii_only,
        })
    }

    fn check_encoding(&self, email: &OutgoingEmail) -> std::result::Result<(), SendError> {
        if !self.ascii_only {
            return Ok(());
        }
        if !email.subject.is_ascii() {
            return Err(SendError::Encoding(
                "subject contains non-ASCII characters".to_string(),
            ));
        }
        if !email.html_body.is_ascii() {
            return Err(SendError::Encoding(
                "body contains non-ASCII characters".to_string(),
            ));
        }
        Ok(())
    }

    pub fn build_message(&self, email: &OutgoingEmail) -> std::result::Result<Message, SendError> {
        let to_address: Address = email.to_email.trim().parse().map_err(|e| {
            SendError::Delivery(format!("invalid recipient address '{}': {}", email.to_email, e))
        })?;
        let to = Mailbox::new(Some(email.to_name.clone()), to_address);

        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone());

        let html = SinglePart::html(email.html_body.clone());
        let built = match &email.attachment {
            Some(file) => {
                let content_type = ContentType::parse(&file.content_type).map_err(|e| {
                    SendError::Delivery(format!("invalid attachment content type: {}", e))
                })?;
                let attachment =
                    Attachment::new(file.filename.clone()).body(file.bytes.clone(), content_type);
                builder.multipart(MultiPart::mixed().singlepart(html).singlepart(attachment))
            }
            None => builder.singlepart(html),
        };

        built.map_err(|e| SendError::Delivery(format!("failed to build message: {}", e)))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> std::result::Result<(), SendError> {
        self.check_encoding(email)?;
        let message = self.build_message(email)?;

        self.transport
            .send(message)
            .await
            .map(|response| {
                tracing::debug!("SMTP accepted {}: {:?}", email.to_email, response.code());
            })
            .map_err(|e| classify_transport_error(&e.to_string()))
    }
}

/// Stand-in used for dry runs, where no SMTP connection is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, email: &OutgoingEmail) -> std::result::Result<(), SendError> {
        Err(SendError::Delivery(format!(
            "transport disabled, refusing to send to {}",
            email.to_email
        )))
    }
}

/// Relays without SMTPUTF8/8BITMIME reject non-ASCII content; those rejections
/// are reported as encoding errors so the controller can retry.
pub fn classify_transport_error(message: &str) -> SendError {
    let lower = message.to_ascii_lowercase();
    let encoding_markers = ["smtputf8", "8bitmime", "non-ascii", "8-bit", "utf-8 not supported"];
    if encoding_markers.iter().any(|marker| lower.contains(marker)) {
        SendError::Encoding(message.to_string())
    } else {
        SendError::Delivery(message.to_string())
    }
}
