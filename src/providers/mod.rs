//! External system integrations.
//!
//! Providers are the boundary to everything the pipeline does not own: the
//! mailbox backend and the sentiment classification backend. Each is a trait
//! seam with one production implementation per backend.

pub mod classifier;
pub mod mail;
