#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::json;

use email_oasis::config::AppConfig;

pub const TOKEN: &str = "test-access-token";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Config whose token file lives in a fresh temp directory.
pub fn test_config(api_base: &str) -> AppConfig {
    let data_dir: PathBuf =
        std::env::temp_dir().join(format!("email_oasis_test_{}", uuid::Uuid::new_v4()));
    AppConfig {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        data_dir,
        gmail_api_base: api_base.to_string(),
        ..AppConfig::default()
    }
}

/// Headers served for each message id: (From, Subject, Date).
fn fixture(id: &str) -> Option<(&'static str, &'static str, &'static str)> {
    match id {
        "m1" => Some((
            "\"LinkedIn Job Alerts\" <jobs-noreply@linkedin.com>",
            "New jobs for you",
            "Thu, 4 Jan 2024 08:00:00 +0000",
        )),
        "m2" => Some(("Friend <pal@example.com>", "Lunch tomorrow?", "Thu, 4 Jan 2024 12:00:00 +0000")),
        "m3" => Some((
            "Amazon <store-news@amazon.com>",
            "Daily deals update",
            "Fri, 5 Jan 2024 07:00:00 +0000",
        )),
        "m4" => Some((
            "LinkedIn <jobs-noreply@linkedin.com>",
            "Weekly newsletter",
            "Sat, 6 Jan 2024 08:00:00 +0000",
        )),
        "m5" => Some(("Spotify <no-reply@spotify.com>", "Your music recap", "not a date")),
        _ => None,
    }
}

fn authorized(req: &HttpRequest) -> bool {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

async fn list_messages(req: HttpRequest, query: web::Query<HashMap<String, String>>) -> HttpResponse {
    if !authorized(&req) {
        return HttpResponse::Unauthorized().finish();
    }
    let q = query.get("q").cloned().unwrap_or_default();
    if q.contains("is:unread") {
        let count = match q.as_str() {
            "from:jobs-noreply@linkedin.com is:unread" => 3,
            "from:store-news@amazon.com is:unread" => 2,
            // Spotify's unread lookup fails.
            "from:no-reply@spotify.com is:unread" => {
                return HttpResponse::InternalServerError().finish()
            }
            _ => 0,
        };
        let messages: Vec<_> = (0..count).map(|i| json!({ "id": format!("u{}", i) })).collect();
        return HttpResponse::Ok().json(json!({ "messages": messages }));
    }
    let ids = ["m1", "m2", "m3", "m4", "missing", "m5"];
    let messages: Vec<_> = ids
        .iter()
        .map(|id| json!({ "id": id, "threadId": format!("t-{}", id) }))
        .collect();
    HttpResponse::Ok().json(json!({ "messages": messages, "resultSizeEstimate": ids.len() }))
}

async fn get_message(req: HttpRequest, path: web::Path<String>) -> HttpResponse {
    if !authorized(&req) {
        return HttpResponse::Unauthorized().finish();
    }
    let id = path.into_inner();
    match fixture(&id) {
        Some((from, subject, date)) => HttpResponse::Ok().json(json!({
            "id": id,
            "payload": {
                "headers": [
                    { "name": "From", "value": from },
                    { "name": "Subject", "value": subject },
                    { "name": "Date", "value": date },
                ]
            }
        })),
        None => HttpResponse::NotFound().finish(),
    }
}

/// Starts a stand-in for the Gmail REST API and returns its base URL.
/// Must be called from within an actix runtime.
pub fn spawn_fake_gmail() -> String {
    let server = HttpServer::new(|| {
        App::new()
            .route("/gmail/v1/users/me/messages", web::get().to(list_messages))
            .route("/gmail/v1/users/me/messages/{id}", web::get().to(get_message))
    })
    .workers(1)
    .disable_signals()
    .bind(("127.0.0.1", 0))
    .expect("bind fake gmail");
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{}/gmail/v1", addr)
}

/// A Gmail base URL whose socket accepts connections but never answers.
/// Keep the listener alive for as long as requests should hang.
pub fn spawn_silent_gmail() -> (std::net::TcpListener, String) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind silent gmail");
    let addr = listener.local_addr().expect("silent gmail address");
    (listener, format!("http://{}/gmail/v1", addr))
}
