//! DBQuery agent: translates natural language into a single read-only SQL
//! statement against a configured dataset, executes it, and records a
//! spreadsheet URL as a side effect of the result.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool, TypeInfo};
use uuid::Uuid;

use crate::agents::{Agent, AgentOutput, ToolCapability};
use crate::chat_store::ChatStore;
use crate::error::ApiError;
use crate::llm::LlmClient;
use crate::models::ChatEntry;

/// Forbidden statement keywords: the agent only ever issues one read-only
/// statement, never DDL/DML, regardless of what the LLM returns.
const WRITE_KEYWORDS: &[&str] = &[
    "insert", "update", "delete", "drop", "alter", "create", "attach", "pragma", "replace",
];

pub struct DbQueryAgent {
    pub llm: Arc<dyn LlmClient>,
    pub pool: SqlitePool,
    pub dataset_name: String,
    pub schema_description: String,
    pub chats: Option<Arc<ChatStore>>,
}

fn is_read_only(sql: &str) -> bool {
    let lowered = sql.to_lowercase();
    lowered.trim_start().starts_with("select") && !WRITE_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

fn cell_to_json(row: &SqliteRow, idx: usize) -> Value {
    let column = &row.columns()[idx];
    match column.type_info().name() {
        "INTEGER" | "BIGINT" => row
            .try_get::<i64, _>(idx)
            .map(Value::from)
            .unwrap_or(Value::Null),
        "REAL" | "FLOAT" | "DOUBLE" => row
            .try_get::<f64, _>(idx)
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "BOOLEAN" => row
            .try_get::<bool, _>(idx)
            .map(Value::from)
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<String, _>(idx)
            .map(Value::from)
            .unwrap_or(Value::Null),
    }
}

fn rows_to_table(rows: &[SqliteRow]) -> (Vec<String>, Vec<Vec<Value>>) {
    let columns = rows
        .first()
        .map(|r| r.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();
    let table = rows
        .iter()
        .map(|row| (0..row.columns().len()).map(|i| cell_to_json(row, i)).collect())
        .collect();
    (columns, table)
}

#[async_trait]
impl Agent for DbQueryAgent {
    fn name(&self) -> &str {
        "dbquery"
    }

    fn capabilities(&self) -> Vec<ToolCapability> {
        vec![ToolCapability {
            name: "sql_query".to_string(),
            description: format!("Runs a read-only SQL query against {}", self.dataset_name),
            input_schema: serde_json::json!({"type": "object", "properties": {"sql": {"type": "string"}}}),
            output_schema: serde_json::json!({"type": "object", "properties": {"columns": {"type": "array"}, "rows": {"type": "array"}}}),
        }]
    }

    fn tools(&self) -> Vec<String> {
        vec!["sql_query".to_string()]
    }

    async fn run(&self, prompt: &str, chat_id: Option<&str>) -> Result<AgentOutput, ApiError> {
        let preamble = format!(
            "You translate natural-language questions into a single read-only SQL SELECT \
             statement for the dataset \"{}\" with this schema:\n{}\n\
             Respond with only the SQL statement, no commentary.",
            self.dataset_name, self.schema_description
        );
        let sql = self.llm.complete(&preamble, prompt, 0.0).await?;
        let sql = sql.trim().trim_end_matches(';').to_string();

        if !is_read_only(&sql) {
            return Err(ApiError::Validation(
                "generated statement is not a read-only SELECT".to_string(),
            ));
        }

        let started = std::time::Instant::now();
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ApiError::Internal(format!("dbquery execution failed: {e}")))?;
        let (columns, table_rows) = rows_to_table(&rows);

        crate::agents::log_invocation(0, "sql_query", &sql, "ok", started.elapsed());

        let spreadsheet_url = format!("https://sheets.internal/exports/{}", Uuid::new_v4());

        if let Some(chat_id) = chat_id {
            if let Some(chats) = &self.chats {
                chats.append_entry(
                    chat_id,
                    ChatEntry::DbResult {
                        columns: columns.clone(),
                        rows: table_rows.clone(),
                        spreadsheet_url: Some(spreadsheet_url.clone()),
                        at: Utc::now(),
                    },
                )?;
            }
        }

        Ok(AgentOutput::text_only(format!(
            "{} rows returned. Export: {spreadsheet_url}",
            table_rows.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_accepts_plain_select() {
        assert!(is_read_only("SELECT * FROM users"));
    }

    #[test]
    fn read_only_rejects_write_statements() {
        assert!(!is_read_only("DELETE FROM users"));
        assert!(!is_read_only("insert into users values (1)"));
    }
}
