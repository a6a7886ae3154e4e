use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::{Value, json};

use crate::error::SyncError;
use crate::models::{Assignment, AssignmentStatus};

use super::dto::Property;

/// Notion rejects rich_text content above 2000 characters.
const RICH_TEXT_LIMIT: usize = 2000;

pub fn database_title(title: &str) -> Value {
    json!([{ "type": "text", "text": { "content": title } }])
}

/// The fixed property schema of the target database.
pub fn database_properties() -> Value {
    json!({
        "Name": { "title": {} },
        "Assignment Updated Date": { "date": {} },
        "Class": { "rich_text": {} },
        "Description": { "rich_text": {} },
        "Due Date": { "date": {} },
        "ID": { "rich_text": {} },
        "Link": { "url": {} },
        "Points": { "number": {} },
        "Score": { "number": {} },
        "Status": {
            "select": {
                "options": [
                    { "name": "Overdue", "color": "red" },
                    { "name": "In Progress", "color": "yellow" },
                    { "name": "Completed", "color": "green" },
                    { "name": "Not Started", "color": "gray" }
                ]
            }
        },
        "Submitted Date": { "date": {} }
    })
}

/// Page property payload for one canonical record. The `type` keys are
/// optional on write but keep the payload parseable by the same tagged
/// `Property` enum that reads responses.
pub fn page_properties(assignment: &Assignment) -> Value {
    let mut properties = json!({});

    properties["Name"] = json!({
        "type": "title",
        "title": [{ "text": { "content": clamp(&assignment.name) } }]
    });
    properties["Class"] = json!({
        "type": "rich_text",
        "rich_text": [{ "text": { "content": clamp(&assignment.course_name) } }]
    });
    properties["Description"] = json!({
        "type": "rich_text",
        "rich_text": [{ "text": { "content": clamp(&assignment.description) } }]
    });
    properties["ID"] = json!({
        "type": "rich_text",
        "rich_text": [{ "text": { "content": assignment.id } }]
    });
    properties["Link"] = json!({ "type": "url", "url": assignment.link });
    properties["Status"] = json!({
        "type": "select",
        "select": { "name": assignment.status.as_str() }
    });
    properties["Assignment Updated Date"] = json!({
        "type": "date",
        "date": { "start": assignment.updated_date.to_rfc3339() }
    });

    if let Some(due) = assignment.due_date {
        properties["Due Date"] = json!({
            "type": "date",
            "date": { "start": due.to_rfc3339() }
        });
    }
    if let Some(points) = assignment.points_possible {
        properties["Points"] = json!({ "type": "number", "number": points });
    }
    if let Some(score) = assignment.score {
        properties["Score"] = json!({ "type": "number", "number": score });
    }
    if let Some(submitted) = assignment.submitted_date {
        properties["Submitted Date"] = json!({
            "type": "date",
            "date": { "start": submitted.to_rfc3339() }
        });
    }

    properties
}

/// Rebuild the canonical record from a page's properties. Used when reading
/// the target database back (verification and round-trip tests).
pub fn assignment_from_properties(
    properties: &HashMap<String, Property>,
) -> Result<Assignment, SyncError> {
    let status_name = select_value(properties, "Status")
        .ok_or_else(|| SyncError::MissingProperty("Status".to_string()))?;
    let status = AssignmentStatus::from_name(&status_name)
        .ok_or(SyncError::UnknownStatus(status_name))?;

    Ok(Assignment {
        id: text_value(properties, "ID")?,
        name: text_value(properties, "Name")?,
        course_name: text_value(properties, "Class")?,
        due_date: date_value(properties, "Due Date"),
        description: text_value(properties, "Description").unwrap_or_default(),
        updated_date: date_value(properties, "Assignment Updated Date")
            .ok_or_else(|| SyncError::MissingProperty("Assignment Updated Date".to_string()))?,
        link: url_value(properties, "Link").unwrap_or_default(),
        points_possible: number_value(properties, "Points"),
        score: number_value(properties, "Score"),
        status,
        submitted_date: date_value(properties, "Submitted Date"),
    })
}

fn clamp(text: &str) -> &str {
    match text.char_indices().nth(RICH_TEXT_LIMIT) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn text_value(properties: &HashMap<String, Property>, key: &str) -> Result<String, SyncError> {
    properties
        .get(key)
        .and_then(|prop| match prop {
            Property::Title { title } => {
                Some(title.iter().map(|t| t.value()).collect::<Vec<_>>().join(""))
            }
            Property::RichText { rich_text } => Some(
                rich_text
                    .iter()
                    .map(|t| t.value())
                    .collect::<Vec<_>>()
                    .join(""),
            ),
            _ => None,
        })
        .ok_or_else(|| SyncError::MissingProperty(key.to_string()))
}

fn date_value(properties: &HashMap<String, Property>, key: &str) -> Option<DateTime<Utc>> {
    properties.get(key).and_then(|prop| match prop {
        Property::Date { date } => date.as_ref().and_then(|d| parse_date(&d.start)),
        _ => None,
    })
}

fn number_value(properties: &HashMap<String, Property>, key: &str) -> Option<f64> {
    properties.get(key).and_then(|prop| match prop {
        Property::Number { number } => *number,
        _ => None,
    })
}

fn select_value(properties: &HashMap<String, Property>, key: &str) -> Option<String> {
    properties.get(key).and_then(|prop| match prop {
        Property::Select { select } => select.as_ref().map(|s| s.name.clone()),
        _ => None,
    })
}

fn url_value(properties: &HashMap<String, Property>, key: &str) -> Option<String> {
    properties.get(key).and_then(|prop| match prop {
        Property::Url { url } => url.clone(),
        _ => None,
    })
}

/// Notion date values are either full timestamps or bare dates.
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}
