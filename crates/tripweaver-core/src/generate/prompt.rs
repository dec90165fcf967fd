//! Prompt assembly for itinerary generation.
//!
//! The conversation is a system instruction, one worked example
//! (a user request and the assistant's answer), then the real request.

use serde_json::json;

use crate::itinerary::ItineraryRequest;
use crate::llm::ChatMessage;

pub const SYSTEM_PREPROMPT_ENV: &str = "SYSTEM_PREPROMPT";
pub const USER_PREPROMPT_ENV: &str = "USER_PREPROMPT";
pub const ASSISTANT_PREPROMPT_ENV: &str = "ASSISTANT_PREPROMPT";

const DEFAULT_SYSTEM: &str = "You are a travel planning system that generates JSON trip itineraries. \
Respond with a JSON object of the form {\"data\": [TripDay, ...]} containing exactly numberOfDays \
TripDay objects. Each TripDay has at least 3 events. Events must be located in the requested \
country and cities. Do not include IDs. \
TripDay: {\"events\": [Event, ...]}. \
Event: {\"title\": string (at least 3 characters), \"description\": string (at least 5 characters), \
\"address\": string (at least 5 characters), \"country\": string (at least 2 characters), \
\"city\": string (at least 2 characters), \"tickets\": string (not empty)}. \
The user sends requests as JSON: {\"numberOfDays\": <integer>, \"country\": \"<string>\", \
\"cities\": [\"<string>\", ...]}.";

const DEFAULT_USER_EXAMPLE: &str = r#"{"numberOfDays": 2, "country": "United States of America", "cities": ["New York", "Los Angeles"]}"#;

const DEFAULT_ASSISTANT_EXAMPLE: &str = r#"{"data": [{"events": [{"title": "City Tour", "description": "A walking tour of the historic district.", "address": "123 Main St, Historic Center", "country": "United States of America", "city": "New York", "tickets": "Available"}, {"title": "Food Tasting", "description": "Sampling local dishes at well-known restaurants.", "address": "456 Food St, Culinary Corner", "country": "United States of America", "city": "New York", "tickets": "Available"}, {"title": "Park Visit", "description": "An afternoon in the central park.", "address": "789 Park Ave, Green Zone", "country": "United States of America", "city": "New York", "tickets": "Free"}]}, {"events": [{"title": "Museum Visit", "description": "The city's largest art museum.", "address": "456 Museum Rd, Art District", "country": "United States of America", "city": "Los Angeles", "tickets": "Sold Out"}, {"title": "Concert", "description": "Live music at the downtown arena.", "address": "123 Concert Blvd, Music Area", "country": "United States of America", "city": "Los Angeles", "tickets": "Available"}, {"title": "Night Market", "description": "Street food and stalls after dark.", "address": "789 Market St, Downtown", "country": "United States of America", "city": "Los Angeles", "tickets": "Available"}]}]}"#;

/// The fixed messages sent ahead of every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preprompts {
    pub system: String,
    pub user_example: String,
    pub assistant_example: String,
}

impl Default for Preprompts {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM.to_string(),
            user_example: DEFAULT_USER_EXAMPLE.to_string(),
            assistant_example: DEFAULT_ASSISTANT_EXAMPLE.to_string(),
        }
    }
}

impl Preprompts {
    /// Defaults, with each part overridable by its environment variable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            system: var(SYSTEM_PREPROMPT_ENV).unwrap_or(defaults.system),
            user_example: var(USER_PREPROMPT_ENV).unwrap_or(defaults.user_example),
            assistant_example: var(ASSISTANT_PREPROMPT_ENV).unwrap_or(defaults.assistant_example),
        }
    }
}

/// The JSON document sent as the final user message.
pub fn request_message(request: &ItineraryRequest) -> String {
    json!({
        "numberOfDays": request.number_of_days,
        "country": request.country,
        "cities": [request.city],
    })
    .to_string()
}

pub fn build_messages(preprompts: &Preprompts, request: &ItineraryRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(&preprompts.system),
        ChatMessage::user(&preprompts.user_example),
        ChatMessage::assistant(&preprompts.assistant_example),
        ChatMessage::user(request_message(request)),
    ]
}
