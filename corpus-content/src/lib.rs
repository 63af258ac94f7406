//! Content engine
//!
//! Everything between the HTTP surface and the stores: the patch operator
//! compiler, the schema subsetter, schema conversion, the field visibility
//! filter, identity-scoped queries, the page tree, and the service that
//! composes them per verb.

pub mod convert;
pub mod pages;
pub mod patch;
pub mod query;
pub mod service;
pub mod subset;
pub mod visibility;

pub use pages::{MovePosition, SimplePageTree};
pub use query::{ListParams, ListResult};
pub use service::ContentService;
pub use visibility::FieldSelection;
