use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::CONTENT_TYPE, request::Parts, HeaderMap, HeaderValue},
    Form, Json,
};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::convert::Infallible;

use crate::error::{Error, Result};

pub const SESSION_KEY_HEADER: &str = "x-session-key";

/// The browser's opaque session key, if the request carried one.
#[derive(Debug, Clone, Default)]
pub struct SessionKey(pub Option<String>);

impl SessionKey {
    /// Session endpoints answer NotFound when the key is missing.
    pub fn require(&self) -> Result<&str> {
        self.0
            .as_deref()
            .ok_or_else(|| Error::NotFound("Resource not found".to_string()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionKey
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        Ok(SessionKey(session_key_from_headers(&parts.headers)))
    }
}

pub fn session_key_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn session_key_header(key: &str) -> Result<(&'static str, HeaderValue)> {
    let value = HeaderValue::from_str(key)
        .map_err(|e| Error::Internal(format!("Session key is not a valid header value: {}", e)))?;
    Ok((SESSION_KEY_HEADER, value))
}

/// A request body sent either as JSON or as an urlencoded form. An empty
/// body yields `T::default()`; anything unreadable is a bad request.
#[derive(Debug, Clone, Default)]
pub struct FormOrJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for FormOrJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default + Send,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        if is_form(req.headers()) {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| Error::BadRequest(e.body_text()))?;
            return Ok(FormOrJson(value));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| Error::BadRequest(e.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(FormOrJson(T::default()));
        }
        // A missing content type is read as JSON.
        let Json(value) =
            Json::<T>::from_bytes(&bytes).map_err(|e| Error::BadRequest(e.body_text()))?;
        Ok(FormOrJson(value))
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_ascii_lowercase())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}
