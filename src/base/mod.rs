//! Base types and error handling.
//!
//! Provides foundational types shared by the config and dns modules:
//! - [`NetError`](neterror::NetError): error taxonomy for decoding and lookups
//! - [`domain`]: host name syntax checks

pub mod context;
pub mod domain;
pub mod neterror;
