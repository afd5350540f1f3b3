//! Relay pipeline: allow-list → classify → best-effort notify, one message at a time.
//!
//! A [`Relay`] only holds read-only state (rules, allow-list, notifier), so it is shared
//! across requests behind an `Arc` without locking.

use crate::brands::{rule_for, BrandId, BrandRule};
use crate::channels::InboundMessage;
use crate::classify::classify;
use crate::notify::{dispatch, DispatchOutcome, Notifier};
use std::sync::Arc;

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Source chat is not on the allow-list.
    NotAllowed,
    /// No brand keyword in the text.
    NoBrand,
    Dispatched {
        brand: BrandId,
        codes: Vec<String>,
        delivery: DispatchOutcome,
    },
}

pub struct Relay {
    rules: Vec<BrandRule>,
    allowed_chats: Vec<String>,
    notifier: Arc<dyn Notifier>,
}

impl Relay {
    pub fn new(rules: Vec<BrandRule>, allowed_chats: Vec<String>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            rules,
            allowed_chats,
            notifier,
        }
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// True when the allow-list is empty or contains the chat id.
    pub fn is_allowed(&self, chat_id: &str) -> bool {
        self.allowed_chats.is_empty() || self.allowed_chats.iter().any(|id| id == chat_id)
    }

    /// Classify one message and, if it names a brand, notify. Never fails: delivery problems
    /// are logged and reported through the outcome.
    pub async fn handle(&self, msg: &InboundMessage) -> Outcome {
        log::info!(
            "received message from {} ({})",
            msg.source_chat_title,
            msg.source_chat_id
        );
        if !self.is_allowed(&msg.source_chat_id) {
            log::debug!("ignored: chat {} not in allowed list", msg.source_chat_id);
            return Outcome::NotAllowed;
        }

        let result = classify(&msg.text, &self.rules);
        let Some(brand) = result.brand else {
            log::debug!("no casino keywords detected");
            return Outcome::NoBrand;
        };
        // Detection only ever returns brands taken from `self.rules`.
        let Some(rule) = rule_for(&self.rules, brand) else {
            return Outcome::NoBrand;
        };
        log::info!(
            "detected {} message with {} potential code(s)",
            brand,
            result.codes.len()
        );

        let delivery = dispatch(self.notifier.as_ref(), rule, &msg.text, &result.codes).await;
        Outcome::Dispatched {
            brand,
            codes: result.codes,
            delivery,
        }
    }
}
