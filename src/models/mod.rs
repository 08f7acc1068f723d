pub mod category;
pub mod practice_question;
pub mod question;
pub mod test_session;
