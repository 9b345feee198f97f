// SPDX-License-Identifier: Apache-2.0

//! Heuristic foreign-key inference over a dataset's schema snapshot
//!
//! For every ordered pair of distinct tables `(t1, t2)`, a column of `t1`
//! references `t2` when its name is `singular(t2)_id` / `t2_id`, or equals a
//! non-generic identifying column of `t2`, and the column types are compatible.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use lakegate_core::{Column, RelationshipEdge, Table};

/// Label attached to inferred edges (`table1` references `table2`)
pub const REFERENCES_LABEL: &str = "references";

const GENERIC_ID: &str = "id";

/// Infers edges, deduplicated on the unordered table pair.
pub fn infer_relationships(tables: &[Table]) -> Vec<RelationshipEdge> {
    let mut edges: Vec<RelationshipEdge> = Vec::new();
    let mut seen_pairs: HashSet<(String, String)> = HashSet::new();

    for source in tables {
        for target in tables {
            if std::ptr::eq(source, target) || source.name.eq_ignore_ascii_case(&target.name) {
                continue;
            }
            let Some((column, referenced)) = find_reference(source, target) else {
                continue;
            };
            let edge = RelationshipEdge::inferred(
                &source.name,
                &target.name,
                REFERENCES_LABEL,
                &column.name,
                &referenced.name,
            );
            if seen_pairs.insert(edge.table_pair()) {
                edges.push(edge);
            }
        }
    }
    edges
}

/// First column of `source` that points at `target`, with the referenced column.
fn find_reference<'a>(source: &'a Table, target: &'a Table) -> Option<(&'a Column, &'a Column)> {
    let conventional = conventional_key_names(&target.name);
    let identifying = identifying_columns(target);

    for column in &source.columns {
        let name = column.name.to_lowercase();
        if name == GENERIC_ID {
            continue;
        }

        let referenced = if conventional.iter().any(|c| c == &name) {
            // `customer_id` → customers.customer_id, else customers.id
            target
                .column(&name)
                .or_else(|| target.column(GENERIC_ID))
        } else {
            identifying
                .iter()
                .copied()
                .find(|id| id.name.eq_ignore_ascii_case(&name))
        };

        if let Some(referenced) = referenced {
            if types_compatible(&column.data_type, &referenced.data_type) {
                return Some((column, referenced));
            }
        }
    }
    None
}

/// `customers` → `["customer_id", "customers_id"]`
fn conventional_key_names(table_name: &str) -> Vec<String> {
    let lower = table_name.to_lowercase();
    let singular = singularize(&lower);
    let mut names = vec![format!("{}_id", singular)];
    if singular != lower {
        names.push(format!("{}_id", lower));
    }
    names
}

/// Columns that identify rows of `table`, excluding the generic `id`.
///
/// Conventionally named keys win; otherwise a leading `*_id` column is taken
/// as the table's key.
fn identifying_columns(table: &Table) -> Vec<&Column> {
    let conventional = conventional_key_names(&table.name);
    let named: Vec<&Column> = table
        .columns
        .iter()
        .filter(|c| conventional.iter().any(|k| c.name.eq_ignore_ascii_case(k)))
        .collect();
    if !named.is_empty() {
        return named;
    }
    table
        .columns
        .first()
        .filter(|c| {
            let name = c.name.to_lowercase();
            name != GENERIC_ID && name.ends_with("_id")
        })
        .into_iter()
        .collect()
}

/// Naive English singular for table names.
pub fn singularize(word: &str) -> String {
    let lower = word.to_lowercase();
    if let Some(stem) = lower.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{}y", stem);
        }
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if lower.ends_with(suffix) {
            return lower[..lower.len() - 2].to_string();
        }
    }
    if lower.ends_with("uses") {
        return lower[..lower.len() - 2].to_string();
    }
    if lower.ends_with('s') && !lower.ends_with("ss") && lower.len() > 1 {
        return lower[..lower.len() - 1].to_string();
    }
    lower
}

#[derive(Debug, PartialEq, Eq)]
enum TypeFamily {
    Integer,
    Decimal,
    Text,
    Bytes,
    Other(String),
}

fn type_family(data_type: &str) -> TypeFamily {
    let upper = data_type.trim().to_uppercase();
    let base = upper.split(['(', '<']).next().unwrap_or("").trim();
    match base {
        "INT" | "INT64" | "INTEGER" | "BIGINT" | "SMALLINT" | "TINYINT" | "BYTEINT" => {
            TypeFamily::Integer
        }
        "NUMERIC" | "BIGNUMERIC" | "DECIMAL" | "BIGDECIMAL" => TypeFamily::Decimal,
        "STRING" | "VARCHAR" | "CHAR" | "TEXT" => TypeFamily::Text,
        "BYTES" => TypeFamily::Bytes,
        other => TypeFamily::Other(other.to_string()),
    }
}

/// Integers and decimals join with each other; anything else must match exactly.
pub fn types_compatible(a: &str, b: &str) -> bool {
    let (fa, fb) = (type_family(a), type_family(b));
    matches!(
        (&fa, &fb),
        (TypeFamily::Integer, TypeFamily::Decimal) | (TypeFamily::Decimal, TypeFamily::Integer)
    ) || fa == fb
}

/// Stable fingerprint of a schema snapshot, independent of table order.
pub fn snapshot_fingerprint(tables: &[Table]) -> String {
    let mut lines: Vec<String> = tables
        .iter()
        .map(|t| {
            let columns: Vec<String> = t
                .columns
                .iter()
                .map(|c| format!("{}:{}", c.name, c.data_type))
                .collect();
            format!("{}({})", t.name, columns.join(","))
        })
        .collect();
    lines.sort();

    let digest = Sha256::digest(lines.join("\n").as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
