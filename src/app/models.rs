use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::app::error::TodoError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    // Parse the value stored in the database / typed in the edit dialog
    pub fn parse(value: &str) -> Option<Priority> {
        match value {
            "low" | "l" => Some(Priority::Low),
            "medium" | "m" => Some(Priority::Medium),
            "high" | "h" => Some(Priority::High),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Priority::parse(text).ok_or_else(|| {
            FromSqlError::Other(format!("unknown priority {text:?}").into())
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateTodoInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl CreateTodoInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    // Trim the title and collapse an empty description to null
    pub fn validate(self) -> Result<CreateTodoInput, TodoError> {
        let title = validate_title(&self.title)?;
        Ok(CreateTodoInput {
            title,
            description: self.description.filter(|d| !d.is_empty()),
            ..self
        })
    }
}

// `None` leaves a field untouched. For the nullable fields `Some(None)` clears it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTodoInput {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl UpdateTodoInput {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn validate(self) -> Result<UpdateTodoInput, TodoError> {
        let title = match self.title {
            Some(ref title) => Some(validate_title(title)?),
            None => None,
        };
        Ok(UpdateTodoInput { title, ..self })
    }
}

// A key that is present maps to Some, even when its value is null
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validate_title(title: &str) -> Result<String, TodoError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TodoError::validation("Title is required"));
    }
    Ok(trimmed.to_string())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTodoInput {
    pub id: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTodoInput {
    pub id: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_input_defaults() {
        let input: CreateTodoInput = serde_json::from_value(json!({ "title": "Buy milk" })).unwrap();
        assert_eq!(input.priority, Priority::Medium);
        assert_eq!(input.description, None);
        assert_eq!(input.due_date, None);
    }

    #[test]
    fn create_input_rejects_blank_title() {
        let err = CreateTodoInput::new("   ").validate().unwrap_err();
        assert!(matches!(err, TodoError::Validation(_)));
    }

    #[test]
    fn create_input_trims_title_and_drops_empty_description() {
        let input = CreateTodoInput {
            title: "  Walk the dog ".to_string(),
            description: Some(String::new()),
            ..CreateTodoInput::default()
        }
        .validate()
        .unwrap();
        assert_eq!(input.title, "Walk the dog");
        assert_eq!(input.description, None);
    }

    #[test]
    fn unknown_priority_is_rejected() {
        let result = serde_json::from_value::<CreateTodoInput>(
            json!({ "title": "x", "priority": "urgent" }),
        );
        assert!(result.is_err());
    }

    #[test]
    fn update_input_tells_null_from_omitted() {
        let omitted: UpdateTodoInput = serde_json::from_value(json!({ "id": 1 })).unwrap();
        assert_eq!(omitted.description, None);
        assert_eq!(omitted.due_date, None);

        let nulled: UpdateTodoInput =
            serde_json::from_value(json!({ "id": 1, "description": null, "due_date": null }))
                .unwrap();
        assert_eq!(nulled.description, Some(None));
        assert_eq!(nulled.due_date, Some(None));

        let set: UpdateTodoInput =
            serde_json::from_value(json!({ "id": 1, "description": "notes" })).unwrap();
        assert_eq!(set.description, Some(Some("notes".to_string())));
    }

    #[test]
    fn update_input_serializes_only_present_fields() {
        let input = UpdateTodoInput {
            description: Some(None),
            completed: Some(true),
            ..UpdateTodoInput::new(7)
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(
            value,
            json!({ "id": 7, "description": null, "completed": true })
        );
    }

    #[test]
    fn update_input_rejects_blank_title() {
        let input = UpdateTodoInput {
            title: Some(String::new()),
            ..UpdateTodoInput::new(1)
        };
        assert!(input.validate().is_err());
    }
}
