//! Secret handling utilities.
//!
//! Re-exports the secrecy types used for the store credential.

pub use secrecy::{ExposeSecret, SecretString};
