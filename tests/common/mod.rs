#![allow(dead_code)]

use std::env;
use std::io::{Cursor, Write};

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use quiz_backend::middleware::auth::Claims;
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use tower::ServiceExt;

pub const BOUNDARY: &str = "quizbackendtestboundary";

pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: JsonValue,
}

/// Builds the full router on a migrated database, or `None` when no
/// `DATABASE_URL` is configured.
pub async fn setup() -> Option<TestApp> {
    dotenvy::dotenv().ok();
    if env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping database test");
        return None;
    }
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("JWT_SECRET", "test_secret_key");
    env::set_var("PUBLIC_RPS", "1000");
    env::set_var("ADMIN_RPS", "1000");
    env::set_var("DEFAULT_CHUNK_SIZE", "20");

    quiz_backend::config::ensure_config().expect("init config");
    let pool = quiz_backend::database::pool::create_pool()
        .await
        .expect("pool");
    quiz_backend::database::pool::run_migrations(&pool)
        .await
        .expect("migrations");

    let state = quiz_backend::AppState::new(pool.clone());
    let router = quiz_backend::routes::app(state, 1000, 1000);
    Some(TestApp { router, pool })
}

pub fn token_with_role(role: Option<&str>) -> String {
    let exp = (chrono::Utc::now().timestamp() + 3600) as usize;
    let claims = Claims {
        sub: "integration-tests".into(),
        exp,
        role: role.map(str::to_string),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(quiz_backend::config::get_config().jwt_secret.as_bytes()),
    )
    .expect("token")
}

pub fn admin_token() -> String {
    token_with_role(Some("admin"))
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let resp = self.router.clone().oneshot(req).await.expect("response");
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = to_bytes(resp.into_body(), 4 * 1024 * 1024)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn admin_json(&self, method: &str, uri: &str, body: JsonValue) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", admin_token()))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    pub async fn get(&self, uri: &str, session_key: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(key) = session_key {
            builder = builder.header("x-session-key", key);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, session_key: Option<&str>, body: JsonValue) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = session_key {
            builder = builder.header("x-session-key", key);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn post_raw(&self, uri: &str, content_type: Option<&str>, body: &str) -> TestResponse {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn create_category(&self, name: &str) -> i64 {
        let resp = self
            .admin_json("POST", "/api/admin/categories", json!({ "name": name }))
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);
        resp.body["id"].as_i64().expect("category id")
    }

    /// Creates a question through the admin API and returns its id.
    pub async fn create_question(&self, category_id: i64, text: &str, answer: &str, group: i32) -> i64 {
        let resp = self
            .admin_json(
                "POST",
                &format!("/api/admin/categories/{}/questions", category_id),
                json!({
                    "question_text": text,
                    "choice_a": "alpha",
                    "choice_b": "beta",
                    "choice_c": "gamma",
                    "choice_d": "delta",
                    "correct_answer": answer,
                    "group_number": group,
                }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);
        resp.body["id"].as_i64().expect("question id")
    }

    pub async fn upload(
        &self,
        category_id: i64,
        filename: &str,
        data: &[u8],
        chunk_size: Option<&str>,
        token: Option<String>,
    ) -> TestResponse {
        let body = multipart_body(filename, data, chunk_size);
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/api/admin/categories/{}/import", category_id))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    pub async fn question_count(&self, category_id: i64) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE category_id = $1")
            .bind(category_id)
            .fetch_one(&self.pool)
            .await
            .expect("count")
    }
}

pub fn unique_name(prefix: &str) -> String {
    format!("{}-{}", prefix, quiz_backend::utils::token::generate_token(10))
}

pub fn multipart_body(filename: &str, data: &[u8], chunk_size: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(size) = chunk_size {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"chunk_size\"\r\n\r\n{}\r\n",
                BOUNDARY, size
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            BOUNDARY, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );
    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        zip.start_file("word/document.xml", zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf.into_inner()
}

pub fn xlsx_bytes(rows: &[&[&str]]) -> Vec<u8> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(r as u32, c as u16, *value).unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}
