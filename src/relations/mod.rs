// SPDX-License-Identifier: Apache-2.0

//! Relationship inference and caching per dataset

pub mod engine;
pub mod inference;
pub mod store;

pub use engine::{DatasetRelationships, RelationshipService, RelationshipSource};
pub use inference::{infer_relationships, snapshot_fingerprint, REFERENCES_LABEL};
pub use store::{InMemoryRelationshipStore, JsonFileRelationshipStore, RelationshipCacheStore};
