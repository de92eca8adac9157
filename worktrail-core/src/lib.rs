//! Worktrail Core - data types, schema registry and filter engine
//!
//! Pure data structures plus the in-memory logic that works over them:
//! column key derivation and ordering, custom-field shaping, experience
//! search, and CSV export. No I/O happens here; storage and HTTP live in
//! the crates that depend on this one.

mod entities;
mod enums;
mod error;
mod export;
mod field;
mod filter;
mod identity;
mod schema;

pub use entities::*;
pub use enums::*;
pub use error::*;
pub use export::*;
pub use field::*;
pub use filter::*;
pub use identity::*;
pub use schema::*;
