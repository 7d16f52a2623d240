//! Chat over a small set of uploaded text documents.
//!
//! Documents are split into overlapping token chunks, embedded into a
//! retrieval index, and questions are answered by a language model from the
//! most similar chunks plus recent conversation history.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub(crate) mod testing;
