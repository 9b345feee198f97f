// SPDX-License-Identifier: Apache-2.0

//! Lakegate core: the data model shared by the annotation, relationship and
//! agent services, plus pure cache-key derivation.
//!
//! Nothing in this crate performs I/O.

pub mod agent;
pub mod error;
pub mod key;
pub mod principal;
pub mod reference;
pub mod relationship;

pub use agent::AgentHandle;
pub use error::{CoreError, CoreResult};
pub use key::{derive_cache_key, derive_cache_key_with_len, DEFAULT_MAX_KEY_LEN};
pub use principal::{AccessTier, PermissionDecision, Principal, PrincipalKind};
pub use reference::{DatasetKey, TableReference};
pub use relationship::{Column, EdgeOrigin, RelationshipCacheEntry, RelationshipEdge, Table};
