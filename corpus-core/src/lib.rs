//! Core types shared across the Corpus workspace
//!
//! Everything here is plain data: errors, identities, schema descriptors,
//! the content-type registry, and configuration. No I/O happens in this
//! crate.

pub mod config;
pub mod document;
pub mod error;
pub mod identity;
pub mod logging;
pub mod registry;
pub mod schema;

pub use config::ApiConfig;
pub use document::Document;
pub use error::{CorpusResult, Error};
pub use identity::{Identity, KeyScope, Permission, RequestContext};
pub use logging::init_logging;
pub use registry::{ContentKind, ContentRegistry, ContentType};
pub use schema::{FieldDescriptor, FieldKind, FieldVisibility};
