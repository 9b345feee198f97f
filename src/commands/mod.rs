// SPDX-License-Identifier: Apache-2.0

//! Presentation-facing commands
//!
//! Each command takes the shared state and returns a `{ success, <payload>, error }`
//! envelope. Degraded remote behaviour shows up in the payload, not as an error.

pub mod agents;
pub mod annotation;
pub mod logs;
pub mod metrics;
pub mod relations;
