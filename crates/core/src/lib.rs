//! Core business logic for civiq.

pub mod services;

pub use services::*;
