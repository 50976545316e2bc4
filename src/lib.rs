//! Spackbot - A GitHub App that triages pull requests.
//!
//! This library provides webhook handling, App authentication, change-set
//! classification, and maintainer-driven reviewer assignment.

pub mod auth;
pub mod config;
pub mod github;
pub mod server;
pub mod triage;
pub mod types;
pub mod webhooks;
pub mod worker;
pub mod workspace;
