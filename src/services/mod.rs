pub mod answer_service;
pub mod background_jobs;
pub mod question_service;
pub mod reputation_service;
pub mod user_service;
pub mod vote_service;
