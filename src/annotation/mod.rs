// SPDX-License-Identifier: Apache-2.0

//! Access annotation: tags result items with whether the requesting
//! principal may use the underlying resource.

pub mod engine;
pub mod roles;
pub mod types;

pub use engine::AccessAnnotator;
pub use roles::{AppRole, InMemoryRoleStore, JsonFileRoleStore, RoleStore};
pub use types::*;
