//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA256 / legacy SHA1)
//! - Parsing of `pull_request` payloads into typed events
//! - Routing of events to triage pipelines

pub mod events;
pub mod parser;
pub mod router;
pub mod signature;

pub use events::{PrAction, PullRequestEvent};
pub use parser::{parse_webhook, ParseError};
pub use router::{pipelines_for, TriagePipeline};
pub use signature::{
    compute_signature, format_signature_header, parse_signature_header, verify_signature,
    SignatureAlgorithm,
};
