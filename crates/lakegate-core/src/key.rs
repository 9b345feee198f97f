// SPDX-License-Identifier: Apache-2.0

//! Cache key derivation for table-reference sets.
//!
//! References are canonicalized, deduplicated, sorted, joined, base64 encoded,
//! truncated and finally filtered down to `[A-Za-z0-9_]`. Input order and
//! duplicate entries never change the key.
//!
//! Truncation keeps only a prefix of the encoding, so two large sets sharing a
//! long common canonical prefix can map to the same key. This is a known
//! limitation of the scheme.

use std::collections::BTreeSet;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::reference::TableReference;

/// Maximum key length when none is configured
pub const DEFAULT_MAX_KEY_LEN: usize = 63;

/// Key returned when the encoding leaves nothing usable (e.g. an empty set)
pub const EMPTY_SET_KEY: &str = "empty";

const JOIN_DELIMITER: &str = "|";

/// Derives the cache key for a set of table references.
pub fn derive_cache_key(refs: &[TableReference]) -> String {
    derive_cache_key_with_len(refs, DEFAULT_MAX_KEY_LEN)
}

/// Same as [`derive_cache_key`] with an explicit maximum length.
pub fn derive_cache_key_with_len(refs: &[TableReference], max_len: usize) -> String {
    let canonical: BTreeSet<String> = refs.iter().map(TableReference::canonical).collect();
    let joined = canonical.into_iter().collect::<Vec<_>>().join(JOIN_DELIMITER);

    let encoded = URL_SAFE_NO_PAD.encode(joined.as_bytes());
    let key: String = encoded
        .chars()
        .take(max_len)
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    if key.is_empty() {
        EMPTY_SET_KEY.to_string()
    } else {
        key
    }
}
