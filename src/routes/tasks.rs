use crate::{
    error::AppError,
    models::{Task, TaskInput, TaskPatch},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const TASK_COLUMNS: &str =
    "id, title, description, priority, due_date, completed, calendar_event_id, created_at";

/// Retrieves the task list.
///
/// Tasks are ordered by priority descending (high before medium before low),
/// then due date ascending with undated tasks first, then insertion order.
/// Tasks carry no owner, so every authenticated user sees the same list.
#[get("")]
pub async fn get_tasks(pool: web::Data<PgPool>) -> Result<impl Responder, AppError> {
    let tasks = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks \
         ORDER BY priority DESC, due_date ASC NULLS FIRST, created_at ASC",
        TASK_COLUMNS
    ))
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task.
///
/// Expects a JSON payload conforming to `TaskInput`: title required and
/// non-blank, priority one of low/medium/high (defaults to medium when
/// omitted), optional description, due date, and calendar event linkage.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = Task::new(task_data.into_inner());

    let result = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (id, title, description, priority, due_date, completed, \
         calendar_event_id, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(task.id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.priority)
    .bind(task.due_date)
    .bind(task.completed)
    .bind(&task.calendar_event_id)
    .bind(task.created_at)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(result))
}

/// Retrieves a single task by its ID.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE id = $1",
        TASK_COLUMNS
    ))
    .bind(task_id.into_inner())
    .fetch_optional(&**pool)
    .await?;

    match task {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Applies a partial update to a task.
///
/// Only the fields present in the body change; everything else keeps its
/// stored value. Concurrent updates resolve last-write-wins.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    patch: web::Json<TaskPatch>,
) -> Result<impl Responder, AppError> {
    patch.validate()?;
    let patch = patch.into_inner();

    let task = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET \
           title = COALESCE($1, title), \
           description = COALESCE($2, description), \
           priority = COALESCE($3, priority), \
           due_date = COALESCE($4, due_date), \
           completed = COALESCE($5, completed), \
           calendar_event_id = COALESCE($6, calendar_event_id) \
         WHERE id = $7 RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(patch.title.as_deref().map(str::trim))
    .bind(&patch.description)
    .bind(patch.priority)
    .bind(patch.due_date)
    .bind(patch.completed)
    .bind(&patch.calendar_event_id)
    .bind(task_id.into_inner())
    .fetch_optional(&**pool)
    .await?;

    match task {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Deletes a task by its ID.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(task_id.into_inner())
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use crate::models::{TaskInput, TaskPatch, TaskPriority};
    use validator::Validate;

    #[test]
    fn test_task_input_validation() {
        let invalid_input_empty_title = TaskInput {
            title: "".to_string(),
            description: Some("Test Description".to_string()),
            priority: Some(TaskPriority::High),
            due_date: None,
            calendar_event_id: None,
        };
        assert!(
            invalid_input_empty_title.validate().is_err(),
            "Validation should fail for empty title."
        );

        let long_title = "a".repeat(201);
        let invalid_input_long_title = TaskInput {
            title: long_title,
            description: None,
            priority: Some(TaskPriority::Medium),
            due_date: None,
            calendar_event_id: None,
        };
        assert!(
            invalid_input_long_title.validate().is_err(),
            "Validation should fail for overly long title."
        );

        let valid_input = TaskInput {
            title: "Valid Title".to_string(),
            description: Some("Test Description".to_string()),
            priority: None,
            due_date: None,
            calendar_event_id: None,
        };
        assert!(
            valid_input.validate().is_ok(),
            "Validation should pass for valid input."
        );
    }

    #[test]
    fn test_task_patch_validation() {
        let valid_patch = TaskPatch {
            completed: Some(true),
            ..Default::default()
        };
        assert!(valid_patch.validate().is_ok());

        let blank_title_patch = TaskPatch {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(
            blank_title_patch.validate().is_err(),
            "A provided title may not be blank."
        );
    }
}
