use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct BlockChildrenResponse {
    pub results: Vec<Block>,
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// A child block of the parent page. The only variant the sync cares about
/// is `child_database`; the block id doubles as the database id.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    ChildDatabase {
        id: String,
        #[serde(default)]
        archived: bool,
        child_database: ChildDatabase,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
pub struct ChildDatabase {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryDatabaseResponse {
    pub results: Vec<Page>,
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Page {
    pub id: String,
    pub properties: HashMap<String, Property>,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Property {
    Title { title: Vec<RichText> },
    RichText { rich_text: Vec<RichText> },
    Number { number: Option<f64> },
    Select { select: Option<SelectOption> },
    Date { date: Option<DateValue> },
    Url { url: Option<String> },
    #[serde(other)]
    Unknown,
}

/// Accepts both the response form (`plain_text`) and the request form
/// (`text.content`), so property payloads round-trip through this parser.
#[derive(Debug, Clone, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
    #[serde(default)]
    pub text: Option<TextContent>,
}

impl RichText {
    pub fn value(&self) -> &str {
        if !self.plain_text.is_empty() {
            &self.plain_text
        } else {
            self.text.as_ref().map(|t| t.content.as_str()).unwrap_or("")
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateValue {
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryDatabaseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorts: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}
