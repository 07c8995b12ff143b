//! Message delivery to chat destinations.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{LinkPreviewOptions, ParseMode};
use thiserror::Error;

use crate::models::Destination;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
    #[error("delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendOptions {
    pub html: bool,
    pub disable_link_preview: bool,
}

impl SendOptions {
    pub fn plain() -> Self {
        Self::default()
    }

    /// HTML body without link previews, used for token and gas reports.
    pub fn html_report() -> Self {
        Self {
            html: true,
            disable_link_preview: true,
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        destination: Destination,
        text: &str,
        options: SendOptions,
    ) -> Result<(), NotifyError>;
}

/// Telegram bot wrapper.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(
        &self,
        destination: Destination,
        text: &str,
        options: SendOptions,
    ) -> Result<(), NotifyError> {
        let mut req = self.bot.send_message(ChatId(destination.0), text);
        if options.html {
            req = req.parse_mode(ParseMode::Html);
        }
        if options.disable_link_preview {
            req = req.link_preview_options(LinkPreviewOptions {
                is_disabled: true,
                url: None,
                prefer_small_media: false,
                prefer_large_media: false,
                show_above_text: false,
            });
        }
        req.await?;
        Ok(())
    }
}
