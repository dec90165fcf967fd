pub mod refresh_tokens;
pub mod trips;
pub mod users;
