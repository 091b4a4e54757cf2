//! HTTP route handlers

pub mod alerts;
pub mod history;
pub mod sensors;
pub mod settings;
