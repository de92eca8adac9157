//! API Request and Response Types
//!
//! This module defines the request and response types for the worktrail
//! REST API. Entities are returned as the core types themselves.

// Column types
mod column;
pub use column::*;

// Experience types
mod experience;
pub use experience::*;

// Tag types
mod tag;
pub use tag::*;

// Search and export types
mod search;
pub use search::*;
