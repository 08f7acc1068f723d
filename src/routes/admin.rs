use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use bytes::Bytes;
use validator::Validate;

use crate::{
    dto::admin_dto::{
        CreateCategoryPayload, CreatePracticeQuestionPayload, CreateQuestionPayload,
        PracticeQuestionAdminResponse, QuestionListQuery, QuestionListResponse,
        UpdatePracticeQuestionPayload,
    },
    error::{Error, Result},
    AppState,
};

#[axum::debug_handler]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let category = state
        .question_bank
        .create_category(payload.name.trim(), payload.description.as_deref().unwrap_or(""))
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[axum::debug_handler]
pub async fn get_category(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let category = state.question_bank.get_category(category_id).await?;
    let groups = state.question_bank.group_summary(category_id).await?;
    Ok(Json(serde_json::json!({
        "category": category,
        "groups": groups,
    })))
}

#[axum::debug_handler]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
) -> Result<impl IntoResponse> {
    if !state.question_bank.delete_category(category_id).await? {
        return Err(Error::NotFound(format!("Category {} not found", category_id)));
    }
    tracing::info!(category_id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn create_question(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
    Json(payload): Json<CreateQuestionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let question = payload.into_new_question()?;
    let created = state
        .question_bank
        .create_question(category_id, &question)
        .await?;
    tracing::info!(category_id, question_id = created.id, "Question created");
    Ok((StatusCode::CREATED, Json(created)))
}

#[axum::debug_handler]
pub async fn list_questions(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
    Query(query): Query<QuestionListQuery>,
) -> Result<impl IntoResponse> {
    state.question_bank.get_category(category_id).await?;
    let questions = state
        .question_bank
        .list_questions(category_id, query.group_number)
        .await?;
    Ok(Json(QuestionListResponse {
        category_id,
        group_number: query.group_number,
        questions,
    }))
}

/// Multipart upload with a `file` part and an optional `chunk_size` field.
#[axum::debug_handler]
pub async fn import_questions(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut file: Option<(String, Bytes)> = None;
    let mut chunk_size = crate::config::get_config().default_chunk_size;

    while let Some(field) = multipart.next_field().await.map_err(Error::Multipart)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(Error::Multipart)?;
                file = Some((filename, data));
            }
            "chunk_size" => {
                let raw = field.text().await.map_err(Error::Multipart)?;
                let raw = raw.trim();
                if !raw.is_empty() {
                    chunk_size = raw.parse::<usize>().map_err(|_| {
                        Error::BadRequest(format!("chunk_size must be a positive integer, got '{}'", raw))
                    })?;
                }
            }
            _ => {}
        }
    }

    let Some((filename, data)) = file else {
        return Err(Error::BadRequest("No file was uploaded".to_string()));
    };
    tracing::info!(category_id, %filename, bytes = data.len(), chunk_size, "Import requested");

    let report = state
        .import_service
        .import(category_id, &filename, data, chunk_size)
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

#[axum::debug_handler]
pub async fn create_practice_question(
    State(state): State<AppState>,
    Json(payload): Json<CreatePracticeQuestionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    if let Some(category_id) = payload.category_id {
        state.question_bank.get_category(category_id).await?;
    }
    let created = state
        .practice_service
        .create(&payload.question_text, &payload.correct_answer, payload.category_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(PracticeQuestionAdminResponse::from(created)),
    ))
}

#[axum::debug_handler]
pub async fn update_practice_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePracticeQuestionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    if let Some(Some(category_id)) = payload.category_id {
        state.question_bank.get_category(category_id).await?;
    }
    let updated = state
        .practice_service
        .update(
            id,
            payload.question_text.as_deref(),
            payload.correct_answer.as_deref(),
            payload.category_id,
        )
        .await?;
    Ok(Json(PracticeQuestionAdminResponse::from(updated)))
}
