//! Command handlers

pub mod admin;
pub mod completions;
pub mod offers;
pub mod report;
