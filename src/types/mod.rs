//! Type definitions for issuesum

mod error;
mod issue;
mod jira;
mod report;

pub use error::*;
pub use issue::*;
pub use jira::*;
pub use report::*;
