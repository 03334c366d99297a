//! Conversion between internal canonical types and the wire format

pub mod openai;
