#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod corpus;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Document, DocumentId, Match, Payload};
