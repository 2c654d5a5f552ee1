//! Catalog domain: the persisted document and the rules for what may enter it.
//!
//! # Data Flow
//! ```text
//! request payload (serde_json::Value)
//!     → validation.rs (trim, truncate, link/icon/email policy)
//!     → model.rs (Item / Lead records)
//!     → storage (mutate + persist)
//! ```

pub mod model;
pub mod validation;

pub use model::{Document, Item, ItemStatus, Lead, Settings};
pub use validation::{InputError, SubmissionPolicy};
