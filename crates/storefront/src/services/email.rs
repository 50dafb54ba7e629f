//! Order confirmation email.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates. Sending is
//! best-effort: the order endpoints report a soft `emailStatus` flag instead
//! of failing the request when SMTP is down.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::Order;

/// One line item as the templates render it.
#[derive(Clone)]
struct ConfirmationItem {
    name: String,
    quantity: u32,
    price: String,
    product_link: Option<String>,
    size: Option<String>,
}

/// HTML template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    customer_name: &'a str,
    order_number: &'a str,
    status_label: String,
    items: Vec<ConfirmationItem>,
    discount_amount: Option<String>,
    total_amount: String,
}

/// Plain text template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    customer_name: &'a str,
    order_number: &'a str,
    status_label: String,
    items: Vec<ConfirmationItem>,
    discount_amount: Option<String>,
    total_amount: String,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for transactional order mail.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay address is invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
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
        })
    }

    /// Send the order confirmation email for an order.
    ///
    /// # Errors
    ///
    /// Returns error if a template fails to render or the send fails.
    pub async fn send_order_confirmation(&self, order: &Order) -> Result<(), EmailError> {
        let items: Vec<ConfirmationItem> = order
            .items
            .iter()
            .map(|item| ConfirmationItem {
                name: item.name.clone(),
                quantity: item.quantity,
                price: format!("{:.2}", item.price),
                product_link: item.product_link.clone(),
                size: item.size.clone(),
            })
            .collect();

        let discount_amount = if order.discount_amount.is_zero() {
            None
        } else {
            Some(format!("{:.2}", order.discount_amount))
        };

        let status_label = capitalize(order.order_status());
        let total_amount = format!("{:.2}", order.total_amount);

        let html = OrderConfirmationHtml {
            customer_name: &order.customer.name,
            order_number: &order.order_number,
            status_label: status_label.clone(),
            items: items.clone(),
            discount_amount: discount_amount.clone(),
            total_amount: total_amount.clone(),
        }
        .render()?;

        let text = OrderConfirmationText {
            customer_name: &order.customer.name,
            order_number: &order.order_number,
            status_label,
            items,
            discount_amount,
            total_amount,
        }
        .render()?;

        let subject = format!("Order Confirmation #{}", order.order_number);
        self.send_multipart_email(&order.customer.email, &subject, &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
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

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("confirmed"), "Confirmed");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("x"), "X");
    }
}
