pub mod auth;
pub mod calendar;
pub mod health;
pub mod tasks;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(
            web::scope("/auth")
                .service(auth::register)
                .service(auth::login)
                .service(auth::google_consent)
                .service(auth::google_callback)
                .service(auth::current_user),
        )
        .service(
            web::scope("/tasks")
                .service(tasks::get_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        )
        .service(
            web::scope("/calendar")
                .service(calendar::get_events)
                .service(calendar::create_event)
                .service(calendar::update_event)
                .service(calendar::delete_event)
                .service(calendar::sync_status)
                .service(calendar::toggle_sync),
        );
}
