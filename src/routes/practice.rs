use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};

use crate::{
    dto::practice_dto::{
        PracticeCheckPayload, PracticeCheckResponse, PracticeListQuery, PracticeListResponse,
    },
    error::Result,
    AppState,
};

#[axum::debug_handler]
pub async fn list_practice_questions(
    State(state): State<AppState>,
    Query(query): Query<PracticeListQuery>,
) -> Result<impl IntoResponse> {
    let questions = state.practice_service.list(query.category_id).await?;
    Ok(Json(PracticeListResponse {
        questions,
        category_id: query.category_id,
    }))
}

#[axum::debug_handler]
pub async fn get_practice_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let question = state.practice_service.get(id).await?;
    Ok(Json(question))
}

#[axum::debug_handler]
pub async fn check_practice_answer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<PracticeCheckPayload>,
) -> Result<impl IntoResponse> {
    let user_answer = payload.user_answer.trim().to_string();
    let (question, is_correct) = state.practice_service.check(id, &user_answer).await?;
    Ok(Json(PracticeCheckResponse {
        correct_answer: question.correct_answer.clone(),
        question,
        user_answer,
        is_correct,
    }))
}
