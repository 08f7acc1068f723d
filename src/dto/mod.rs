pub mod admin_dto;
pub mod practice_dto;
pub mod quiz_dto;
