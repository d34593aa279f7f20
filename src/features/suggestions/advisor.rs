//! # Recipe Advisor
//!
//! Asks a language model for recipes that fit a guest's skill and dietary
//! restrictions while steering them toward the categories the event still
//! needs. Best effort: nothing else depends on it.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Balance context ignores requested dishes
//! - 1.0.0: Initial suggestions

use crate::core::{CookingSkill, DishCategory, EventConfig, PotluckError, PotluckResult, RecipeSuggestion};
use crate::features::balance::{calculate_balance, most_needed_category, needed_categories, CategoryBalance};
use crate::features::dishes::DishBoard;
use crate::features::event::EventSettings;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{debug, info};
use openai::chat::{ChatCompletion, ChatCompletionMessage, ChatCompletionMessageRole};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You are a friendly cooking assistant helping coordinate a potluck dinner. \
                             Reply with JSON only.";

#[async_trait]
pub trait SuggestionGateway: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Raw completion text for a system prompt and a user prompt
    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String>;
}

/// OpenAI chat completions. The key is read from the environment by the client.
pub struct OpenAiGateway {
    model: String,
    configured: bool,
    timeout: Duration,
}

impl OpenAiGateway {
    pub fn new(model: &str, api_key: Option<&str>, timeout: Duration) -> Self {
        Self {
            model: model.to_string(),
            configured: api_key.is_some(),
            timeout,
        }
    }
}

#[async_trait]
impl SuggestionGateway for OpenAiGateway {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String> {
        let messages = vec![
            ChatCompletionMessage {
                role: ChatCompletionMessageRole::System,
                content: Some(system_prompt.to_string()),
                name: None,
                function_call: None,
                tool_call_id: None,
                tool_calls: None,
            },
            ChatCompletionMessage {
                role: ChatCompletionMessageRole::User,
                content: Some(prompt.to_string()),
                name: None,
                function_call: None,
                tool_call_id: None,
                tool_calls: None,
            },
        ];

        debug!("Requesting recipe suggestions from {}", self.model);
        let completion = tokio::time::timeout(self.timeout, ChatCompletion::builder(&self.model, messages).create())
            .await
            .map_err(|_| anyhow!("OpenAI request timed out after {:?}", self.timeout))?
            .map_err(|e| anyhow!("OpenAI API error: {}", e))?;

        completion
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| anyhow!("No response from OpenAI"))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionRequest {
    pub cooking_skill: Option<CookingSkill>,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionContext {
    pub most_needed_category: DishCategory,
    pub needed_categories: Vec<DishCategory>,
    pub current_balance: Vec<CategoryBalance>,
}

impl SuggestionContext {
    pub fn from_balance(balance: Vec<CategoryBalance>) -> Self {
        Self {
            most_needed_category: most_needed_category(&balance),
            needed_categories: needed_categories(&balance),
            current_balance: balance,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionResponse {
    pub suggestions: Vec<RecipeSuggestion>,
    pub context: SuggestionContext,
}

pub fn build_prompt(
    skill: CookingSkill,
    restrictions: &[String],
    context: &SuggestionContext,
    event: &EventConfig,
) -> String {
    let restrictions_clause = if restrictions.is_empty() {
        String::new()
    } else {
        format!(" and these dietary restrictions: {}", restrictions.join(", "))
    };

    let balance_lines: Vec<String> = context
        .current_balance
        .iter()
        .map(|b| format!("- {}: {}/{}", b.category, b.current, b.target))
        .collect();

    let needed = if context.needed_categories.is_empty() {
        "All categories are covered".to_string()
    } else {
        context
            .needed_categories
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        r#"You are helping coordinate a potluck dinner. A guest with {skill} cooking skills{restrictions_clause} needs recipe suggestions.

Current dish balance:
{balance}

Categories that need more dishes: {needed}

Please suggest 3 recipes that:
1. Match the guest's cooking skill level
2. Accommodate their dietary restrictions (if any)
3. Prioritize the category "{most_needed}" but also include other needed categories
4. Are suitable for serving {guests} people

Return your response as a JSON array of recipe suggestions with this EXACT format:
[
  {{
    "category": "appetizer|main|side|dessert|beverage",
    "recipe_name": "Recipe Name",
    "difficulty": "beginner|intermediate|advanced",
    "serves": number,
    "reasoning": "Why this recipe is a good fit",
    "ingredients_summary": "Brief overview of main ingredients",
    "ingredients": ["ingredient 1", "ingredient 2"],
    "instructions": ["step 1", "step 2"]
  }}
]"#,
        balance = balance_lines.join("\n"),
        most_needed = context.most_needed_category,
        guests = event.target_guest_count,
    )
}

/// Pull the JSON array out of a model reply that may wrap it in prose or fences
pub fn parse_suggestions(reply: &str) -> Result<Vec<RecipeSuggestion>> {
    let pattern = Regex::new(r"\[[\s\S]*\]")?;
    let found = pattern
        .find(reply)
        .ok_or_else(|| anyhow!("Could not parse recipe suggestions from API response"))?;

    serde_json::from_str(found.as_str())
        .map_err(|e| anyhow!("Recipe suggestions were not in the expected format: {}", e))
}

#[derive(Clone)]
pub struct RecipeAdvisor {
    gateway: Arc<dyn SuggestionGateway>,
    dishes: DishBoard,
    event: EventSettings,
}

impl RecipeAdvisor {
    pub fn new(gateway: Arc<dyn SuggestionGateway>, dishes: DishBoard, event: EventSettings) -> Self {
        Self { gateway, dishes, event }
    }

    pub fn is_enabled(&self) -> bool {
        self.gateway.is_configured()
    }

    pub async fn suggest(&self, request: SuggestionRequest) -> PotluckResult<SuggestionResponse> {
        if !self.gateway.is_configured() {
            return Err(PotluckError::configuration("OpenAI API key not configured"));
        }

        let skill = request
            .cooking_skill
            .ok_or_else(|| PotluckError::validation("Missing required field: cooking_skill"))?;

        let (dishes, event) = tokio::try_join!(self.dishes.list(), self.event.get())?;
        let context = SuggestionContext::from_balance(calculate_balance(&dishes, &event.category_targets));

        let prompt = build_prompt(skill, &request.dietary_restrictions, &context, &event);
        let reply = self.gateway.complete(SYSTEM_PROMPT, &prompt).await?;
        let suggestions = parse_suggestions(&reply)?;

        info!(
            "Generated {} recipe suggestions for a {} cook (most needed: {})",
            suggestions.len(),
            skill,
            context.most_needed_category
        );

        Ok(SuggestionResponse { suggestions, context })
    }
}
