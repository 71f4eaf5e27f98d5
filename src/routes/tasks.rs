use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{Task, TaskInput, TaskQuery},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Retrieves the authenticated user's tasks.
///
/// Supports filtering by `status`, `priority`, `assigned_to`, and a `search`
/// term matched case-insensitively against title and description. Results
/// are ordered by creation date, newest first.
#[get("")]
#[allow(unused_assignments)]
pub async fn get_tasks(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskQuery>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    // Base query scoped to the authenticated owner; filter conditions are
    // appended dynamically with positional parameters.
    let mut sql = String::from(
        "SELECT id, title, description, priority, status, due_date, created_at, updated_at, user_id, assigned_to \
         FROM tasks WHERE user_id = $1",
    );
    let mut param_count = 2;

    let mut conditions: Vec<String> = Vec::new();

    if query_params.status.is_some() {
        conditions.push(format!("status = ${}", param_count));
        param_count += 1;
    }
    if query_params.priority.is_some() {
        conditions.push(format!("priority = ${}", param_count));
        param_count += 1;
    }
    if query_params.assigned_to.is_some() {
        conditions.push(format!("assigned_to = ${}", param_count));
        param_count += 1;
    }
    if query_params.search.is_some() {
        conditions.push(format!(
            "(title ILIKE ${} OR description ILIKE ${})",
            param_count,
            param_count + 1
        ));
        param_count += 2;
    }

    if !conditions.is_empty() {
        sql.push_str(" AND ");
        sql.push_str(&conditions.join(" AND "));
    }

    sql.push_str(" ORDER BY created_at DESC");

    let mut query_builder = sqlx::query_as::<_, Task>(&sql);

    query_builder = query_builder.bind(user.id());

    if let Some(status) = &query_params.status {
        query_builder = query_builder.bind(status);
    }
    if let Some(priority) = &query_params.priority {
        query_builder = query_builder.bind(priority);
    }
    if let Some(assigned_to) = query_params.assigned_to {
        query_builder = query_builder.bind(assigned_to);
    }
    if let Some(search) = &query_params.search {
        let search_pattern = format!("%{}%", search);
        query_builder = query_builder.bind(search_pattern.clone());
        query_builder = query_builder.bind(search_pattern);
    }

    let tasks = query_builder.fetch_all(&**pool).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task owned by the authenticated user.
///
/// The owner is always the identity behind the token; a client cannot create
/// tasks on another user's behalf.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<TaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    // Validate input
    task_data.validate()?;

    let task = Task::new(task_data.into_inner(), user.id());

    let result = sqlx::query_as::<_, Task>(
        "INSERT INTO tasks (id, title, description, priority, status, due_date, user_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id, title, description, priority, status, due_date, created_at, updated_at, user_id, assigned_to",
    )
    .bind(task.id)
    .bind(task.title)
    .bind(task.description)
    .bind(task.priority)
    .bind(task.status)
    .bind(task.due_date)
    .bind(task.user_id)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(result))
}

/// Retrieves a single task by id.
///
/// A task owned by someone else is reported as 404, not 403, so ids cannot
/// be probed for existence.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task_uuid = task_id.into_inner();

    let task = sqlx::query_as::<_, Task>(
        "SELECT id, title, description, priority, status, due_date, created_at, updated_at, user_id, assigned_to \
         FROM tasks WHERE id = $1",
    )
    .bind(task_uuid)
    .fetch_optional(&**pool)
    .await?;

    match task {
        Some(task) => {
            if task.user_id != user.id() {
                Err(AppError::NotFound("Task not found".into()))
            } else {
                Ok(HttpResponse::Ok().json(task))
            }
        }
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Updates a task owned by the authenticated user.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task_uuid = task_id.into_inner();

    // First, verify ownership
    let ownership_check = sqlx::query_as::<_, (i32,)>("SELECT user_id FROM tasks WHERE id = $1")
        .bind(task_uuid)
        .fetch_optional(&**pool)
        .await?;

    match ownership_check {
        Some((owner_user_id,)) => {
            if owner_user_id != user.id() {
                return Err(AppError::NotFound(
                    "Task not found or not owned by user".into(),
                ));
            }
        }
        None => return Err(AppError::NotFound("Task not found".into())),
    }

    let result = sqlx::query_as::<_, Task>(
        "UPDATE tasks
         SET title = $1, description = $2, priority = $3, status = $4, due_date = $5, updated_at = now()
         WHERE id = $6 AND user_id = $7
         RETURNING id, title, description, priority, status, due_date, created_at, updated_at, user_id, assigned_to",
    )
    .bind(&task_data.title)
    .bind(&task_data.description)
    .bind(&task_data.priority)
    .bind(&task_data.status)
    .bind(task_data.due_date)
    .bind(task_uuid)
    .bind(user.id())
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(result))
}

/// Deletes a task owned by the authenticated user.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task_uuid = task_id.into_inner();

    let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
        .bind(task_uuid)
        .bind(user.id())
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "Task not found or not owned by user".into(),
        ));
    }

    Ok(HttpResponse::NoContent().finish())
}
