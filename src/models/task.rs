use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum; the declaration order gives
/// `ORDER BY priority DESC` the high -> medium -> low listing order.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Low priority.
    Low,
    /// Medium priority. The default when none is supplied.
    Medium,
    /// High priority.
    High,
}

/// A task entity as stored in the database and returned by the API.
///
/// Tasks carry no owner reference: every authenticated user of the deployment
/// sees the same task list.
#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier (UUID v4).
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    /// Id of the calendar event this task was imported from or exported to.
    pub calendar_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn validate_title_not_blank(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::new("title_blank"));
    }
    Ok(())
}

/// Input structure for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    /// Must be non-blank and at most 200 characters after trimming.
    #[validate(length(min = 1, max = 200), custom = "validate_title_not_blank")]
    pub title: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// Defaults to `medium` when omitted. An out-of-range value such as
    /// `"urgent"` is rejected during deserialization.
    pub priority: Option<TaskPriority>,

    pub due_date: Option<DateTime<Utc>>,

    pub calendar_event_id: Option<String>,
}

/// Partial update for a task. Every field is optional; only fields present in
/// the request body are applied, the rest keep their stored values.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[validate(length(min = 1, max = 200), custom = "validate_title_not_blank")]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub priority: Option<TaskPriority>,

    pub due_date: Option<DateTime<Utc>>,

    pub completed: Option<bool>,

    pub calendar_event_id: Option<String>,
}

impl Task {
    /// Creates a new `Task` from `TaskInput`: trims the title, applies the
    /// `medium` priority default, assigns a fresh UUID, and stamps `created_at`.
    pub fn new(input: TaskInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: input.description,
            priority: input.priority.unwrap_or(TaskPriority::Medium),
            due_date: input.due_date,
            completed: false,
            calendar_event_id: input.calendar_event_id,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_task_creation_defaults() {
        let input = TaskInput {
            title: "  Write release notes  ".to_string(),
            description: None,
            priority: None,
            due_date: None,
            calendar_event_id: None,
        };

        let task = Task::new(input);
        assert_eq!(task.title, "Write release notes");
        assert_eq!(task.priority, TaskPriority::Medium);
        assert!(!task.completed);
        assert!(task.due_date.is_none());
        assert!(task.calendar_event_id.is_none());
    }

    #[test]
    fn test_task_input_validation() {
        let valid = TaskInput {
            title: "Valid Task".to_string(),
            description: Some("Some description".to_string()),
            priority: Some(TaskPriority::High),
            due_date: Some(Utc::now()),
            calendar_event_id: None,
        };
        assert!(valid.validate().is_ok());

        let blank_title = TaskInput {
            title: "   ".to_string(),
            description: None,
            priority: None,
            due_date: None,
            calendar_event_id: None,
        };
        assert!(blank_title.validate().is_err());

        let long_description = TaskInput {
            title: "Valid".to_string(),
            description: Some("d".repeat(1001)),
            priority: None,
            due_date: None,
            calendar_event_id: None,
        };
        assert!(long_description.validate().is_err());
    }

    #[test]
    fn test_unknown_priority_rejected_at_deserialization() {
        let result: Result<TaskInput, _> =
            serde_json::from_value(serde_json::json!({ "title": "x", "priority": "urgent" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_deserializes_partial_bodies() {
        let patch: TaskPatch = serde_json::from_value(serde_json::json!({ "completed": true }))
            .expect("partial body should deserialize");

        assert_eq!(patch.completed, Some(true));
        assert!(patch.title.is_none());
        assert!(patch.description.is_none());
        assert!(patch.priority.is_none());
        assert!(patch.due_date.is_none());
    }

    #[test]
    fn test_task_serializes_camel_case() {
        let task = Task::new(TaskInput {
            title: "Ship it".to_string(),
            description: None,
            priority: Some(TaskPriority::Low),
            due_date: None,
            calendar_event_id: Some("evt_123".to_string()),
        });

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["priority"], "low");
        assert_eq!(json["calendarEventId"], "evt_123");
        assert!(json.get("dueDate").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
