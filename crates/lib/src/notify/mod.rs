//! Outbound notifications for classified messages.
//!
//! [`Notifier`] is the seam between the relay and whatever delivers the alert; the Discord
//! webhook notifier is the production implementation. [`dispatch`] is best-effort: it never
//! returns an error, only an outcome to log.

mod discord;

pub use discord::{
    format_payload, DiscordError, DiscordNotifier, Embed, EmbedField, EmbedFooter,
    WebhookPayload, CODES_FIELD_NAME,
};

use crate::brands::{BrandId, BrandRule};
use async_trait::async_trait;

/// What a notifier did with a notification it accepted without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// No endpoint configured for the brand; nothing was sent.
    NoEndpoint,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error(transparent)]
    Discord(#[from] DiscordError),
    #[error("notifier error: {0}")]
    Other(String),
}

/// Delivers a brand alert for one message.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// True if an endpoint is configured for this brand.
    fn has_endpoint(&self, brand: BrandId) -> bool;

    /// Deliver an alert with the original `text` and the extracted `codes`.
    async fn notify(
        &self,
        rule: &BrandRule,
        text: &str,
        codes: &[String],
    ) -> Result<Delivery, NotifyError>;
}

/// Result of a best-effort dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    NoEndpoint,
    Failed,
}

/// Send the alert and swallow failures. Missing endpoints are logged, not errors.
pub async fn dispatch(
    notifier: &dyn Notifier,
    rule: &BrandRule,
    text: &str,
    codes: &[String],
) -> DispatchOutcome {
    match notifier.notify(rule, text, codes).await {
        Ok(Delivery::Sent) => {
            log::info!("posted {} message to discord", rule.brand);
            DispatchOutcome::Delivered
        }
        Ok(Delivery::NoEndpoint) => {
            log::info!("no webhook URL configured for {}", rule.brand);
            DispatchOutcome::NoEndpoint
        }
        Err(e) => {
            log::warn!("error posting to discord ({}): {}", rule.brand, e);
            DispatchOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brands::default_rules;

    struct Fixed(Result<Delivery, &'static str>);

    #[async_trait]
    impl Notifier for Fixed {
        fn has_endpoint(&self, _brand: BrandId) -> bool {
            true
        }

        async fn notify(
            &self,
            _rule: &BrandRule,
            _text: &str,
            _codes: &[String],
        ) -> Result<Delivery, NotifyError> {
            self.0.map_err(|e| NotifyError::Other(e.to_string()))
        }
    }

    #[tokio::test]
    async fn dispatch_maps_outcomes() {
        let rule = &default_rules()[0];
        assert_eq!(
            dispatch(&Fixed(Ok(Delivery::Sent)), rule, "t", &[]).await,
            DispatchOutcome::Delivered
        );
        assert_eq!(
            dispatch(&Fixed(Ok(Delivery::NoEndpoint)), rule, "t", &[]).await,
            DispatchOutcome::NoEndpoint
        );
    }

    #[tokio::test]
    async fn dispatch_swallows_errors() {
        let rule = &default_rules()[0];
        let outcome = dispatch(&Fixed(Err("boom")), rule, "t", &[]).await;
        assert_eq!(outcome, DispatchOutcome::Failed);
    }
}
