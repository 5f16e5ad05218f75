//! Helper functions shared by the repository and templates

mod date;
mod url;

pub use date::*;
pub use url::*;
