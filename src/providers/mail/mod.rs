//! Mailbox provider abstraction and the Gmail implementation.

mod auth;
mod gmail;
mod traits;

pub use auth::{GoogleCredentials, TokenSource};
pub use gmail::GmailProvider;
pub use traits::{LabelInfo, MailProvider, MessageContent, ProviderError, Result};
