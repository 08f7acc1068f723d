use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect},
};

use crate::{
    dto::quiz_dto::{
        CategoryEntry, CategoryListResponse, GroupSummary, ResultsResponse, StartSessionPayload,
        StartSessionResponse, SubmitAnswersPayload,
    },
    error::Result,
    extractors::{session_key_header, FormOrJson, SessionKey},
    utils::token::generate_session_key,
    AppState,
};

/// Categories with the question count of each group.
#[axum::debug_handler]
pub async fn list_tests(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let categories = state.question_bank.list_categories().await?;
    let mut groups: BTreeMap<i64, Vec<GroupSummary>> = BTreeMap::new();
    for row in state.question_bank.all_group_counts().await? {
        groups.entry(row.category_id).or_default().push(GroupSummary {
            group_number: row.group_number,
            total: row.total,
        });
    }

    let categories = categories
        .into_iter()
        .map(|category| {
            let category_groups = groups.remove(&category.id).unwrap_or_default();
            CategoryEntry::new(category, category_groups)
        })
        .collect();
    Ok(Json(CategoryListResponse { categories }))
}

#[axum::debug_handler]
pub async fn start_session(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
    session_key: SessionKey,
    FormOrJson(payload): FormOrJson<StartSessionPayload>,
) -> Result<impl IntoResponse> {
    let key = session_key.0.unwrap_or_else(generate_session_key);
    let requested_group = payload.group_number.unwrap_or(1);

    let session = state
        .session_service
        .create_session(category_id, requested_group, &key)
        .await?;
    let header = session_key_header(&key)?;
    Ok((
        StatusCode::CREATED,
        [header],
        Json(StartSessionResponse::from(session)),
    ))
}

#[axum::debug_handler]
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    session_key: SessionKey,
) -> Result<impl IntoResponse> {
    let view = state
        .session_service
        .load_for_display(session_id, session_key.require()?)
        .await?;
    Ok(Json(view))
}

/// Applies an answer sheet, then sends the browser to its results.
#[axum::debug_handler]
pub async fn submit_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    session_key: SessionKey,
    Json(payload): Json<SubmitAnswersPayload>,
) -> Result<impl IntoResponse> {
    let key = session_key.require()?;
    state
        .session_service
        .submit_answers(session_id, key, &payload.into_answer_map())
        .await?;
    let header = session_key_header(key)?;
    Ok((
        [header],
        Redirect::to(&format!("/api/sessions/{}/results", session_id)),
    ))
}

#[axum::debug_handler]
pub async fn session_results(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    session_key: SessionKey,
) -> Result<impl IntoResponse> {
    let (session, report) = state
        .session_service
        .results(session_id, session_key.require()?)
        .await?;
    Ok(Json(ResultsResponse {
        group_number: session.group_number,
        session,
        report,
    }))
}
