pub mod analytics;
pub mod chat_api;
pub mod invites;
pub mod note_generator;
pub mod prompt;
pub mod rate_limit;
pub mod response_times;
pub mod user_stats;
