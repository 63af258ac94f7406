//! Storage boundary for the Corpus workspace
//!
//! Every shared mutable resource lives behind this crate: the document
//! store, the bearer-token credential store, sessions, advisory locks,
//! the user directory, and uploaded attachments. All implementations here
//! are in-memory; the traits are the seams where a networked document
//! database would plug in.

pub mod attachments;
pub mod docs;
pub mod locks;
pub mod sessions;
pub mod tokens;
pub mod users;

pub use attachments::AttachmentStore;
pub use docs::{DocumentFilter, DocumentStore, MemoryDocumentStore};
pub use locks::LockService;
pub use sessions::{SessionRecord, SessionStore};
pub use tokens::BearerTokenStore;
pub use users::{UserDirectory, UserRecord};
