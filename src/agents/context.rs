// SPDX-License-Identifier: Apache-2.0

//! Conversation context handed to callers, plus the schema summary that goes
//! into system instructions.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use lakegate_core::{AgentHandle, RelationshipEdge, Table, TableReference};

const MAX_TABLES: usize = 30;
const MAX_SCHEMA_WORDS: usize = 4000;

/// What a conversation runs against.
///
/// `Inline` is the single-request fallback used when no persistent agent
/// could be provisioned. It is never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ConversationContext {
    Persistent {
        agent: AgentHandle,
    },
    #[serde(rename_all = "camelCase")]
    Inline {
        table_references: Vec<TableReference>,
        system_instruction: String,
    },
}

impl ConversationContext {
    pub fn resolve(
        agent: Option<AgentHandle>,
        table_references: &[TableReference],
        system_instruction: &str,
    ) -> Self {
        match agent {
            Some(agent) => ConversationContext::Persistent { agent },
            None => ConversationContext::Inline {
                table_references: table_references.to_vec(),
                system_instruction: system_instruction.to_string(),
            },
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, ConversationContext::Persistent { .. })
    }
}

/// Compact text description of a schema snapshot and its relationships.
///
/// Stops describing tables after `MAX_TABLES` or roughly `MAX_SCHEMA_WORDS`
/// words and lists the rest by name.
pub fn describe_tables(tables: &[Table], edges: &[RelationshipEdge]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut total_words = 0;
    let mut described = 0;

    for table in tables.iter().take(MAX_TABLES) {
        if total_words > MAX_SCHEMA_WORDS {
            break;
        }
        let desc = format_table(table);
        total_words += desc.split_whitespace().count();
        parts.push(desc);
        described += 1;
    }

    if tables.len() > described {
        let remaining: Vec<&str> = tables
            .iter()
            .skip(described)
            .take(50)
            .map(|t| t.name.as_str())
            .collect();
        parts.push(format!("Other tables (not described): {}\n", remaining.join(", ")));
    }

    if !edges.is_empty() {
        let mut out = String::from("Relationships:");
        for edge in edges {
            let _ = match (&edge.column1, &edge.column2) {
                (Some(c1), Some(c2)) => write!(
                    out,
                    "\n    {}.{} {} {}.{}",
                    edge.table1, c1, edge.relationship_label, edge.table2, c2
                ),
                _ => write!(
                    out,
                    "\n    {} {} {}",
                    edge.table1, edge.relationship_label, edge.table2
                ),
            };
        }
        out.push('\n');
        parts.push(out);
    }

    parts.join("\n")
}

fn format_table(table: &Table) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "- {}", table.name);
    for column in &table.columns {
        let _ = writeln!(out, "    {}: {}", column.name, column.data_type);
    }
    out
}

/// Appends the schema summary to a caller-provided instruction.
pub fn build_system_instruction(instruction: &str, schema_description: &str) -> String {
    if schema_description.trim().is_empty() {
        return instruction.to_string();
    }
    format!("{}\n\nSchema:\n{}", instruction.trim_end(), schema_description)
}
