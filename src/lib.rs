//! mailtone - A notification-driven sentiment-labeling pipeline for Gmail
//!
//! This crate classifies incoming mail by sentiment and labels it in place:
//! a push notification resolves to a newly arrived message, its subject and
//! snippet are scored as weighted signals, and the resulting polarity is
//! applied as a Gmail label and recorded for aggregate reporting.

pub mod config;
pub mod domain;
pub mod listener;
pub mod providers;
pub mod services;
pub mod storage;
