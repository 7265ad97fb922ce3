//! Converts free-form lesson text into slide-deck JSON documents.
//!
//! A chat model splits the lesson into slides. Its reply is extracted,
//! validated and normalized, then committed as a raw JSON object to
//! S3-compatible storage.

pub mod ai;
pub mod app;
pub mod error;
pub mod extract;
pub mod models;
pub mod normalize;
pub mod prompts;
pub mod storage;

pub use error::{Error, Result, Stage};
