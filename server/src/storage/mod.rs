//! Storage module
//!
//! Path-addressed object storage for generated originals and editor
//! previews, with a public URL projection per stored object.

pub mod object_store;

pub use object_store::{FsObjectStore, ObjectStore};
