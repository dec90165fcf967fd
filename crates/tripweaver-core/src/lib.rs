//! Domain logic for tripweaver.
//!
//! - [`auth`]: password hashing and JWT session tokens.
//! - [`itinerary`]: the trip-day schema and validation of generated output.
//! - [`llm`]: the chat-completion client seam and its OpenAI implementation.
//! - [`generate`]: prompt assembly and the validate-and-retry generation loop.
//! - [`users`] and [`trips`]: services used by the HTTP layer.

pub mod auth;
pub mod generate;
pub mod itinerary;
pub mod llm;
pub mod trips;
pub mod users;
