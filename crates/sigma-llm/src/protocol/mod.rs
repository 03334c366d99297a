//! Wire format types for the OpenAI-compatible chat completions API
//!
//! Pure serde structs used only at the HTTP boundary.

pub mod openai;
