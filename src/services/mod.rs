pub mod import_service;
pub mod practice_service;
pub mod question_bank_service;
pub mod scoring_service;
pub mod session_service;
