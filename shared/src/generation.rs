use std::time::Duration;

use anyhow::Context;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::Difficulty;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

const SYSTEM_PROMPT: &str =
    "You are a creative challenge generator. Always respond with valid JSON only.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedChallenge {
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub stars: u32,
}

struct Template {
    title: &'static str,
    description: &'static str,
    difficulty: Difficulty,
    stars: u32,
}

// Served whenever no backend is configured or the backend call fails. The
// star values are kept as shipped, even where they stray from the
// difficulty mapping.
const TEMPLATES: [Template; 8] = [
    Template {
        title: "Read a book for 30 minutes daily",
        description: "Dedicate 30 minutes each day to reading. Choose any book you like and track your progress.",
        difficulty: Difficulty::Easy,
        stars: 3,
    },
    Template {
        title: "Learn a new skill online",
        description: "Take an online course or watch tutorials to learn something new. Complete at least one module per day.",
        difficulty: Difficulty::Medium,
        stars: 5,
    },
    Template {
        title: "30-day fitness challenge",
        description: "Exercise for at least 45 minutes daily. Mix cardio, strength training, and flexibility exercises.",
        difficulty: Difficulty::Hard,
        stars: 8,
    },
    Template {
        title: "Digital detox weekend",
        description: "Spend an entire weekend without using social media or unnecessary digital devices.",
        difficulty: Difficulty::Medium,
        stars: 5,
    },
    Template {
        title: "Cook a new recipe every day",
        description: "Challenge yourself to cook a different recipe each day. Try cuisines you've never attempted before.",
        difficulty: Difficulty::Hard,
        stars: 7,
    },
    Template {
        title: "Meditation and mindfulness",
        description: "Practice meditation for 15 minutes every morning. Focus on breathing and mindfulness techniques.",
        difficulty: Difficulty::Easy,
        stars: 3,
    },
    Template {
        title: "No sugar challenge",
        description: "Avoid all added sugars and sugary foods for 7 days. Read labels carefully and choose natural alternatives.",
        difficulty: Difficulty::Medium,
        stars: 5,
    },
    Template {
        title: "Morning routine mastery",
        description: "Wake up at the same time every day and complete a 1-hour morning routine including exercise, planning, and self-care.",
        difficulty: Difficulty::Hard,
        stars: 8,
    },
];

impl From<&Template> for GeneratedChallenge {
    fn from(template: &Template) -> Self {
        Self {
            title: template.title.to_string(),
            description: template.description.to_string(),
            difficulty: template.difficulty,
            stars: template.stars,
        }
    }
}

/// Picks a template uniformly at random, restricted to the requested
/// difficulty when at least one template matches it.
pub fn fallback_challenge(difficulty: Option<Difficulty>) -> GeneratedChallenge {
    let mut rng = rand::thread_rng();
    let pick = match difficulty {
        Some(wanted) => {
            let matching: Vec<&Template> = TEMPLATES
                .iter()
                .filter(|template| template.difficulty == wanted)
                .collect();
            match matching.choose(&mut rng) {
                Some(template) => *template,
                None => TEMPLATES.choose(&mut rng).unwrap_or(&TEMPLATES[0]),
            }
        }
        None => TEMPLATES.choose(&mut rng).unwrap_or(&TEMPLATES[0]),
    };
    pick.into()
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct RawChallenge {
    title: String,
    description: String,
    #[serde(default)]
    difficulty: Option<Difficulty>,
}

/// Client for an OpenAI-compatible chat-completions backend. One instance is
/// built at startup and handed to the request-handling context; when no
/// credential is configured, no client exists and callers fall back to the
/// template catalog.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GenerationClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    pub async fn generate(
        &self,
        difficulty: Option<Difficulty>,
        category: Option<&str>,
    ) -> anyhow::Result<GeneratedChallenge> {
        let requested = difficulty.unwrap_or(Difficulty::Medium);
        let category = category.unwrap_or("general");

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_prompt(requested, category) },
            ],
            "temperature": 0.8,
            "max_tokens": 200,
        });

        let completion: ChatCompletion = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("generation backend unreachable")?
            .error_for_status()
            .context("generation backend returned an error status")?
            .json()
            .await
            .context("failed to decode completion response")?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("completion contained no choices")?;

        let raw: RawChallenge = serde_json::from_str(strip_code_fence(&content))
            .context("failed to parse generated challenge JSON")?;

        let difficulty = raw.difficulty.unwrap_or(requested);
        Ok(GeneratedChallenge {
            title: raw.title,
            description: raw.description,
            difficulty,
            stars: difficulty.stars(),
        })
    }
}

fn build_prompt(difficulty: Difficulty, category: &str) -> String {
    format!(
        r#"Generate a creative and engaging personal challenge.

Requirements:
- Difficulty level: {difficulty}
- Category: {category}
- The challenge should be specific, measurable, and achievable
- Make it inspiring and motivating
- Return ONLY a JSON object with these exact fields: title, description, difficulty, stars

Example format:
{{
    "title": "30-Day Fitness Challenge",
    "description": "Exercise for at least 45 minutes daily. Mix cardio, strength training, and flexibility exercises.",
    "difficulty": "hard",
    "stars": 8
}}

Generate the challenge now:"#
    )
}

/// Strips a Markdown code fence the backend may have wrapped the JSON in.
fn strip_code_fence(content: &str) -> &str {
    let content = content.trim();
    let content = content
        .strip_prefix("```json")
        .or_else(|| content.strip_prefix("```"))
        .unwrap_or(content);
    content.strip_suffix("```").unwrap_or(content).trim()
}
