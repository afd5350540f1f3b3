//! Porter Plays relay library — Telegram webhook intake, brand/promo-code classification,
//! and Discord webhook delivery, shared by the CLI.

pub mod brands;
pub mod channels;
pub mod classify;
pub mod config;
pub mod gateway;
pub mod notify;
pub mod relay;
