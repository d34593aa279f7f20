//! # Suggestions Feature
//!
//! AI recipe ideas aimed at under-filled dish categories.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: true (requires OPENAI_API_KEY)

pub mod advisor;

pub use advisor::{
    build_prompt, parse_suggestions, OpenAiGateway, RecipeAdvisor, SuggestionContext, SuggestionGateway,
    SuggestionRequest, SuggestionResponse,
};
