//! The record-level arkimet data model: an [`ItemSet`](itemset::ItemSet) of
//! attributes composed with a Source and a list of Notes into a
//! [`Metadata`](metadata::Metadata), plus its bundle wire form.

pub mod error;
pub mod itemset;
pub mod metadata;

pub use error::{Error, Result};
pub use itemset::ItemSet;
pub use metadata::{DataContext, Metadata, METADATA_VERSION};
