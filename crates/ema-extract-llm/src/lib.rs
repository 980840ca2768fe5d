//! Gemini-backed extraction of EMA therapeutic indications.
//!
//! This crate sends pasted label text together with a fixed instruction to a
//! hosted Gemini model and parses the JSON array it returns. The extraction
//! rules live in the instruction; the code here only moves text around.

pub mod client;
pub mod credentials;
pub mod extraction;
pub mod prompts;

pub use client::*;
pub use credentials::*;
pub use extraction::*;
pub use prompts::*;
