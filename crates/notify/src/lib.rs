//! Outbound notification channels.
//!
//! The core hands an [`OutboundMessage`] to an [`AlertSender`]; channel
//! failures are logged and absorbed, and successful deliveries are
//! recorded in the store's notification audit table.

pub mod sender;
pub mod telegram;
pub mod traits;
pub mod webhook;

pub use sender::{AlertSender, LogNotifier};
pub use telegram::TelegramNotifier;
pub use traits::{Notifier, NotifyError, OutboundMessage};
pub use webhook::WebhookNotifier;
