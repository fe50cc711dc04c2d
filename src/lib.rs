//! Count and sum Jira issue fields per day, week, month, sprint or custom
//! field value, split by issue type, assignee or another field.

pub mod cli;
pub mod services;
pub mod types;
