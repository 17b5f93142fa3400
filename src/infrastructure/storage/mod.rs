//! Object storage and URL signing

mod object_store;
mod signer;

pub use object_store::{validate_object_path, InMemoryObjectStore, LocalObjectStore};
pub use signer::{SignatureError, SignedUrl, UrlSigner, OBJECTS_ROUTE_PREFIX};
