//! Recipe generation
//!
//! Asks an OpenAI-compatible chat completions endpoint for recipes and turns
//! the JSON it answers with into [`RecipeCreate`] values.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{Ingredients, RecipeCreate};
use crate::pricing::parse_amount;

const SYSTEM_PROMPT: &str = "You are a helpful chef assistant. Answer with JSON only.";

/// Source of new recipes
#[async_trait]
pub trait RecipeGenerator: Send + Sync {
    /// One recipe for the given dish name
    async fn generate(&self, name: &str) -> AppResult<RecipeCreate>;

    /// Up to `count` recipes related to a free-text query
    async fn suggest(&self, query: &str, count: usize) -> AppResult<Vec<RecipeCreate>>;
}

pub struct OpenAiGenerator {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Generator from config, or None when no API key is set
    pub fn from_config(config: &Config) -> AppResult<Option<Self>> {
        config
            .openai_api_key
            .as_ref()
            .map(|key| {
                Self::new(
                    config.openai_api_url.clone(),
                    key.clone(),
                    config.openai_model.clone(),
                    config.http_timeout,
                )
            })
            .transpose()
    }

    /// Send one chat turn and return the assistant's message content
    async fn complete(&self, prompt: String) -> AppResult<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::NetworkFailure(format!(
                "Recipe generator returned {}",
                response.status()
            )));
        }

        let completion: ChatCompletion = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AppError::NetworkFailure("Recipe generator sent no choices".to_string()))
    }
}

#[async_trait]
impl RecipeGenerator for OpenAiGenerator {
    async fn generate(&self, name: &str) -> AppResult<RecipeCreate> {
        let prompt = format!(
            "Generate a recipe for {name}. Return the response in this exact JSON format: \
             {{\"ingredients\": {{\"ingredient1\": amount, \"ingredient2\": amount}}, \
             \"instructions\": \"step by step instructions\"}}"
        );
        let content = self.complete(prompt).await?;
        debug!(name, "Generated recipe");
        parse_generated_recipe(name, &content)
    }

    async fn suggest(&self, query: &str, count: usize) -> AppResult<Vec<RecipeCreate>> {
        let prompt = format!(
            "Find recipes related to: {query}. Return exactly {count} recipes in this JSON format: \
             {{\"recipes\": [{{\"name\": \"Recipe Name\", \"ingredients\": {{\"ingredient1\": \"amount1\"}}, \
             \"instructions\": \"step by step instructions\"}}]}}"
        );
        let content = self.complete(prompt).await?;
        let mut recipes = parse_suggestions(&content)?;
        recipes.truncate(count);
        Ok(recipes)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Recipe as the model writes it; amounts are loosely typed
#[derive(Debug, Deserialize)]
struct GeneratedRecipe {
    name: Option<String>,
    #[serde(default)]
    ingredients: Map<String, Value>,
    #[serde(default)]
    instructions: Value,
}

#[derive(Debug, Deserialize)]
struct GeneratedSuggestions {
    recipes: Vec<GeneratedRecipe>,
}

/// Parse a single generated recipe; `name` is used when the reply has none
pub fn parse_generated_recipe(name: &str, content: &str) -> AppResult<RecipeCreate> {
    let generated: GeneratedRecipe = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| AppError::NetworkFailure(format!("Recipe generator sent invalid JSON: {}", e)))?;
    Ok(into_recipe(generated, Some(name)))
}

/// Parse a `{"recipes": [...]}` reply; entries without a name are skipped
pub fn parse_suggestions(content: &str) -> AppResult<Vec<RecipeCreate>> {
    let suggestions: GeneratedSuggestions = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| AppError::NetworkFailure(format!("Recipe generator sent invalid JSON: {}", e)))?;

    Ok(suggestions
        .recipes
        .into_iter()
        .filter(|recipe| recipe.name.as_deref().is_some_and(|n| !n.trim().is_empty()))
        .map(|recipe| into_recipe(recipe, None))
        .collect())
}

fn into_recipe(generated: GeneratedRecipe, fallback_name: Option<&str>) -> RecipeCreate {
    let name = fallback_name
        .map(str::to_string)
        .or(generated.name)
        .unwrap_or_default();

    let mut ingredients = Ingredients::new();
    for (ingredient, amount) in generated.ingredients {
        match parse_amount(&amount) {
            Some(quantity) => {
                *ingredients.entry(ingredient).or_insert(0.0) += quantity;
            }
            None => warn!(recipe = %name, %ingredient, %amount, "Dropping ingredient without a usable amount"),
        }
    }

    RecipeCreate {
        name,
        ingredients,
        instructions: instructions_text(generated.instructions),
    }
}

/// Instructions arrive either as one string or as a list of steps
fn instructions_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Array(steps) => steps
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Models sometimes wrap JSON in a ```json fence
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}
