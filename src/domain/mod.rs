//! Domain types shared across the pipeline.

mod notification;
mod polarity;
mod types;

pub use notification::Notification;
pub use polarity::{Polarity, PolarityDecision, Signal, UnknownPolarity};
pub use types::{HistoryMarker, LabelId, MailId};
