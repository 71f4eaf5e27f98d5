use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{http::header, rt, test, web, App, HttpServer};
use serde_json::json;
use std::net::TcpListener;
use taskmanager::auth::AuthMiddleware;
use taskmanager::models::{Task, TaskPriority, TaskStatus};
use taskmanager::routes;
use taskmanager::routes::health;

mod common;

macro_rules! test_app {
    ($pool:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new(common::test_auth_settings()))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header()
                        .max_age(3600),
                )
                .wrap(Logger::default())
                .service(health::health)
                .service(
                    web::scope("/api")
                        .wrap(AuthMiddleware)
                        .configure(routes::config),
                ),
        )
        .await
    };
}

#[actix_rt::test]
async fn test_create_task_unauthorized() {
    let pool = match common::connect_test_pool().await {
        Some(pool) => pool,
        None => return,
    };

    // Find an available port
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener); // Drop the listener so the server can bind to it

    let server_pool = pool.clone();
    let server_handle = rt::spawn(async move {
        HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(server_pool.clone()))
                .app_data(web::Data::new(common::test_auth_settings()))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header()
                        .max_age(3600),
                )
                .wrap(Logger::default())
                .service(health::health)
                .service(
                    web::scope("/api")
                        .wrap(AuthMiddleware)
                        .configure(routes::config),
                )
        })
        .bind(("127.0.0.1", port))
        .unwrap_or_else(|_| panic!("Failed to bind to port {}", port))
        .run()
        .await
    });

    // Give the server a moment to start
    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    let client = reqwest::Client::new();
    let task_payload = json!({
        "title": "Unauthorized Task",
        "status": TaskStatus::Todo
    });

    let request_url = format!("http://127.0.0.1:{}/api/tasks", port);

    let resp = client
        .post(&request_url)
        .json(&task_payload)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(
        resp.status(),
        reqwest::StatusCode::UNAUTHORIZED,
        "Expected 401 Unauthorized for a request with no token"
    );

    server_handle.abort();
}

#[actix_rt::test]
async fn test_task_crud_flow() {
    let pool = match common::connect_test_pool().await {
        Some(pool) => pool,
        None => return,
    };

    let user_email = "crud_user@example.com";
    common::cleanup_user(&pool, user_email).await;

    let app = test_app!(pool);

    let test_user = common::register_user(&app, user_email, "crud_user", "PasswordCrud123!")
        .await
        .expect("Failed to register test user for CRUD flow");

    // 1. Create Task
    let req_create = test::TestRequest::post()
        .uri("/api/tasks")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", test_user.token)))
        .set_json(json!({
            "title": "CRUD Task 1 Original",
            "status": TaskStatus::Todo,
            "description": "Initial description",
            "priority": TaskPriority::Medium
        }))
        .to_request();
    let resp_create = test::call_service(&app, req_create).await;
    assert_eq!(resp_create.status(), actix_web::http::StatusCode::CREATED);
    let created_task: Task = test::read_body_json(resp_create).await;
    assert_eq!(created_task.title, "CRUD Task 1 Original");
    assert_eq!(created_task.status, TaskStatus::Todo);
    assert_eq!(
        created_task.description.as_deref(),
        Some("Initial description")
    );
    assert_eq!(created_task.priority, Some(TaskPriority::Medium));
    assert_eq!(created_task.user_id, test_user.id);
    let task_id_1 = created_task.id;

    // 2. Get Task by ID
    let req_get = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", task_id_1))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", test_user.token)))
        .to_request();
    let resp_get = test::call_service(&app, req_get).await;
    assert_eq!(resp_get.status(), actix_web::http::StatusCode::OK);
    let fetched_task: Task = test::read_body_json(resp_get).await;
    assert_eq!(fetched_task.id, task_id_1);
    assert_eq!(fetched_task.title, "CRUD Task 1 Original");

    // 3. Update Task
    let req_update = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", task_id_1))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", test_user.token)))
        .set_json(json!({
            "title": "CRUD Task 1 Updated",
            "status": TaskStatus::InProgress,
            "description": "Updated description",
            "priority": TaskPriority::High
        }))
        .to_request();
    let resp_update = test::call_service(&app, req_update).await;
    assert_eq!(resp_update.status(), actix_web::http::StatusCode::OK);
    let updated_task: Task = test::read_body_json(resp_update).await;
    assert_eq!(updated_task.id, task_id_1);
    assert_eq!(updated_task.title, "CRUD Task 1 Updated");
    assert_eq!(updated_task.status, TaskStatus::InProgress);
    assert_eq!(updated_task.priority, Some(TaskPriority::High));

    // 4. Create a second task, then list both
    let req_create2 = test::TestRequest::post()
        .uri("/api/tasks")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", test_user.token)))
        .set_json(json!({
            "title": "CRUD Task 2",
            "status": TaskStatus::Done,
            "priority": TaskPriority::Low
        }))
        .to_request();
    let resp_create2 = test::call_service(&app, req_create2).await;
    assert_eq!(resp_create2.status(), actix_web::http::StatusCode::CREATED);
    let created_task2: Task = test::read_body_json(resp_create2).await;
    let task_id_2 = created_task2.id;

    let req_get_all = test::TestRequest::get()
        .uri("/api/tasks")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", test_user.token)))
        .to_request();
    let resp_get_all = test::call_service(&app, req_get_all).await;
    assert_eq!(resp_get_all.status(), actix_web::http::StatusCode::OK);
    let tasks: Vec<Task> = test::read_body_json(resp_get_all).await;
    assert!(
        tasks.len() >= 2,
        "Expected at least 2 tasks for the user, found {}",
        tasks.len()
    );
    assert!(tasks
        .iter()
        .any(|t| t.id == task_id_1 && t.title == "CRUD Task 1 Updated"));
    assert!(tasks
        .iter()
        .any(|t| t.id == task_id_2 && t.title == "CRUD Task 2"));

    // 5. Filtered list: only the done task matches
    let req_filtered = test::TestRequest::get()
        .uri("/api/tasks?status=done")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", test_user.token)))
        .to_request();
    let resp_filtered = test::call_service(&app, req_filtered).await;
    assert_eq!(resp_filtered.status(), actix_web::http::StatusCode::OK);
    let filtered: Vec<Task> = test::read_body_json(resp_filtered).await;
    assert!(filtered.iter().all(|t| t.status == TaskStatus::Done));
    assert!(filtered.iter().any(|t| t.id == task_id_2));

    // 6. Delete both tasks
    let req_delete1 = test::TestRequest::delete()
        .uri(&format!("/api/tasks/{}", task_id_1))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", test_user.token)))
        .to_request();
    let resp_delete1 = test::call_service(&app, req_delete1).await;
    assert_eq!(
        resp_delete1.status(),
        actix_web::http::StatusCode::NO_CONTENT
    );

    // Verify Task 1 is gone
    let req_get_deleted1 = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", task_id_1))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", test_user.token)))
        .to_request();
    let resp_get_deleted1 = test::call_service(&app, req_get_deleted1).await;
    assert_eq!(
        resp_get_deleted1.status(),
        actix_web::http::StatusCode::NOT_FOUND
    );

    let req_delete2 = test::TestRequest::delete()
        .uri(&format!("/api/tasks/{}", task_id_2))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", test_user.token)))
        .to_request();
    let resp_delete2 = test::call_service(&app, req_delete2).await;
    assert_eq!(
        resp_delete2.status(),
        actix_web::http::StatusCode::NO_CONTENT
    );

    common::cleanup_user(&pool, user_email).await;
}

#[actix_rt::test]
async fn test_task_ownership_and_authorization() {
    let pool = match common::connect_test_pool().await {
        Some(pool) => pool,
        None => return,
    };

    let user_a_email = "owner_user_a@example.com";
    let user_b_email = "other_user_b@example.com";

    common::cleanup_user(&pool, user_a_email).await;
    common::cleanup_user(&pool, user_b_email).await;

    let app = test_app!(pool);

    let user_a = common::register_user(&app, user_a_email, "owner_user_a", "PasswordOwnerA123!")
        .await
        .expect("Failed to register User A");
    let user_b = common::register_user(&app, user_b_email, "other_user_b", "PasswordOtherB123!")
        .await
        .expect("Failed to register User B");

    // User A creates a task
    let req_create_task_a = test::TestRequest::post()
        .uri("/api/tasks")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user_a.token)))
        .set_json(json!({
            "title": "User A's Task",
            "status": TaskStatus::Todo,
            "priority": TaskPriority::High
        }))
        .to_request();
    let resp_create_task_a = test::call_service(&app, req_create_task_a).await;
    assert_eq!(
        resp_create_task_a.status(),
        actix_web::http::StatusCode::CREATED,
        "User A failed to create task"
    );
    let task_a: Task = test::read_body_json(resp_create_task_a).await;
    let task_a_id = task_a.id;

    // 1. User B lists tasks: should not see User A's task
    let req_list_tasks_b = test::TestRequest::get()
        .uri("/api/tasks")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user_b.token)))
        .to_request();
    let resp_list_tasks_b = test::call_service(&app, req_list_tasks_b).await;
    assert_eq!(resp_list_tasks_b.status(), actix_web::http::StatusCode::OK);
    let tasks_for_b: Vec<Task> = test::read_body_json(resp_list_tasks_b).await;
    assert!(
        !tasks_for_b.iter().any(|t| t.id == task_a_id),
        "User B should not see User A's task in their list"
    );

    // 2. User B tries to get User A's task by ID: should get 404
    let req_get = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", task_a_id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user_b.token)))
        .to_request();
    let resp_get = test::call_service(&app, req_get).await;
    assert_eq!(
        resp_get.status(),
        actix_web::http::StatusCode::NOT_FOUND,
        "User B should get 404 when trying to fetch User A's task by ID"
    );

    // 3. User B tries to update User A's task: should get 404
    let req_update = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", task_a_id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user_b.token)))
        .set_json(json!({
            "title": "Attempted Update by B",
            "status": TaskStatus::InProgress
        }))
        .to_request();
    let resp_update = test::call_service(&app, req_update).await;
    assert_eq!(
        resp_update.status(),
        actix_web::http::StatusCode::NOT_FOUND,
        "User B should get 404 when trying to update User A's task"
    );

    // 4. User B tries to delete User A's task: should get 404
    let req_delete = test::TestRequest::delete()
        .uri(&format!("/api/tasks/{}", task_a_id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user_b.token)))
        .to_request();
    let resp_delete = test::call_service(&app, req_delete).await;
    assert_eq!(
        resp_delete.status(),
        actix_web::http::StatusCode::NOT_FOUND,
        "User B should get 404 when trying to delete User A's task"
    );

    // Sanity check: User A can still fetch their own task
    let req_get_own = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", task_a_id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user_a.token)))
        .to_request();
    let resp_get_own = test::call_service(&app, req_get_own).await;
    assert_eq!(
        resp_get_own.status(),
        actix_web::http::StatusCode::OK,
        "User A should be able to fetch their own task"
    );

    common::cleanup_user(&pool, user_a_email).await;
    common::cleanup_user(&pool, user_b_email).await;
}
