//! Translation between the OpenAI chat completion format and NVIDIA NIM.
//!
//! All translation functions are pure (no I/O); the single upstream call
//! lives in [`crate::proxy`].

pub mod nim_types;
pub mod openai_types;
pub mod request;
pub mod response;
