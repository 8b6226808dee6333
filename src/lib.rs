//! Autonomous generative-AI demo program
//!
//! Generates variations of a source photo, writes a short ebook from a chat
//! completion, then holds a multi-turn conversation driven by a reusable
//! dialogue controller.

pub mod ai;
pub mod app;
pub mod dialogue;
pub mod ebook;
pub mod error;
pub mod models;
pub mod photo;
pub mod prompts;

pub use error::{Error, Result};
