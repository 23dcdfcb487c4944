//! Report output: tab-separated text and JSON.

pub mod json;
pub mod text;
