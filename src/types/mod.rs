//! Core type definitions for the connector

mod command;
mod document;
mod error;

pub use command::*;
pub use document::*;
pub use error::*;
