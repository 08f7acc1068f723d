pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod importers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    import_service::ImportService, practice_service::PracticeService,
    question_bank_service::QuestionBankService, session_service::SessionService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub question_bank: QuestionBankService,
    pub session_service: SessionService,
    pub import_service: ImportService,
    pub practice_service: PracticeService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        Self {
            question_bank: QuestionBankService::new(pool.clone()),
            session_service: SessionService::new(pool.clone()),
            import_service: ImportService::new(pool.clone()),
            practice_service: PracticeService::new(pool.clone()),
            pool,
        }
    }
}
