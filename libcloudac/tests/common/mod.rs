#![allow(dead_code)]

use std::path::Path;

use libcloudac::{CourseRequest, Session, SiteConfig, Update};
use tokio::sync::mpsc::{channel, Receiver, Sender};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USERNAME: &str = "student@example.com";
pub const PASSWORD: &str = "hunter2";

pub const SIGNED_IN_HOME: &str =
    r#"<html><body><nav><span class="navbar-user">student</span></nav></body></html>"#;
pub const SIGNED_OUT_HOME: &str =
    r#"<html><body><nav><a href="/login/">Log in</a></nav></body></html>"#;

pub fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body.to_string())
}

pub async fn mount_page(server: &MockServer, at: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(html(body))
        .mount(server)
        .await;
}

pub async fn mount_media(server: &MockServer, at: &str, bytes: &[u8]) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "video/mp4")
                .set_body_bytes(bytes.to_vec()),
        )
        .mount(server)
        .await;
}

pub async fn mount_login(server: &MockServer, home: &str) {
    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    mount_page(server, "/", home).await;
}

pub fn config_for(server: &MockServer) -> SiteConfig {
    SiteConfig::for_base_url(&server.uri()).unwrap()
}

pub async fn signed_in_session(server: &MockServer) -> Session {
    mount_login(server, SIGNED_IN_HOME).await;
    let mut session = Session::new(config_for(server)).unwrap();
    session.authenticate(USERNAME, PASSWORD).await.unwrap();
    session
}

pub fn request(course_url: String, output_directory: &Path) -> CourseRequest {
    CourseRequest {
        course_url,
        output_directory: output_directory.to_path_buf(),
        resolution: "720p".to_string(),
    }
}

pub fn updates() -> (Sender<Update>, Receiver<Update>) {
    channel(256)
}

/// Drains everything sent so far and keeps only the error messages.
pub fn error_messages(rx: &mut Receiver<Update>) -> Vec<String> {
    let mut errors = Vec::new();
    while let Ok(update) = rx.try_recv() {
        if let Update::MessageUpdate(msg) = update {
            if msg.is_error {
                errors.push(msg.content);
            }
        }
    }
    errors
}

pub fn video_page(sources: &[(&str, String)]) -> String {
    let sources: String = sources
        .iter()
        .map(|(res, src)| format!(r#"<source type="video/mp4" data-res="{res}" src="{src}">"#))
        .collect();
    format!("<html><body><video>{sources}</video></body></html>")
}
