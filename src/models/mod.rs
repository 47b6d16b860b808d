//! Core data model for the ephemeral file drop service.
//!
//! A stored file is one metadata record plus N raw chunk records in the
//! key-value backend, all sharing a single expiry horizon. These structs
//! serialize naturally as JSON via `serde`.

pub mod file;
