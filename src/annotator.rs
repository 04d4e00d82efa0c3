//! Sentiment / category / priority annotation for incoming complaints.
//!
//! The analysis itself is an external collaborator behind the [`Annotator`]
//! trait: production wires an OpenAI-compatible endpoint, deployments
//! without a key get the deterministic keyword heuristic, and tests inject
//! whatever they need. Annotation failures never fail a submission; the
//! caller falls back to [`AiAnalysis::fallback`].

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::profanity;

pub const SENTIMENT_POSITIVE: &str = "Positive";
pub const SENTIMENT_NEGATIVE: &str = "Negative";
pub const SENTIMENT_ANGRY: &str = "Angry";
pub const SENTIMENT_URGENT: &str = "Urgent";

pub const CATEGORY_HOSTEL: &str = "Hostel";
pub const CATEGORY_EXAM_CELL: &str = "Exam Cell";
pub const CATEGORY_TRANSPORT: &str = "Transport";
pub const CATEGORY_STAFF_BEHAVIOR: &str = "Staff Behavior";
pub const CATEGORY_ACADEMIC: &str = "Academic Issues";

pub const PRIORITY_HIGH: &str = "High";
pub const PRIORITY_MEDIUM: &str = "Medium";
pub const PRIORITY_LOW: &str = "Low";

pub const SEVERITY_NONE: &str = "None";
pub const SEVERITY_MILD: &str = "Mild";
pub const SEVERITY_MODERATE: &str = "Moderate";
pub const SEVERITY_SEVERE: &str = "Severe";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub sentiment: String,
    pub category: String,
    pub priority: String,
    pub foul_language_detected: bool,
    pub foul_language_severity: String,
}

impl AiAnalysis {
    /// Defaults applied when the annotator is unreachable or returns junk.
    pub fn fallback() -> Self {
        Self {
            sentiment: SENTIMENT_NEGATIVE.to_string(),
            category: CATEGORY_ACADEMIC.to_string(),
            priority: PRIORITY_MEDIUM.to_string(),
            foul_language_detected: false,
            foul_language_severity: SEVERITY_NONE.to_string(),
        }
    }
}

#[async_trait]
pub trait Annotator: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<AiAnalysis>;
}

/// OpenAI-compatible chat-completions client. The model is instructed to
/// reply with a bare JSON object matching [`AiAnalysis`].
pub struct HttpAnnotator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HttpAnnotator {
    pub fn new(endpoint: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
        }
    }
}

const SYSTEM_PROMPT: &str = "You are an AI assistant that analyzes student complaints. \
Respond ONLY with a JSON object (no markdown, no explanation) with these exact keys: \
sentiment (one of [Positive, Negative, Angry, Urgent]), \
category (one of [Hostel, Exam Cell, Transport, Staff Behavior, Academic Issues]), \
priority (one of [High, Medium, Low]), \
foul_language_detected (boolean), \
foul_language_severity (one of [None, Mild, Moderate, Severe]). \
Consider urgency, emotional tone, and severity when assigning priority.";

#[async_trait]
impl Annotator for HttpAnnotator {
    async fn analyze(&self, text: &str) -> Result<AiAnalysis> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": format!("Analyze this complaint: {text}")},
            ],
            "max_tokens": 500,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("annotator request failed")?
            .error_for_status()
            .context("annotator returned an error status")?;

        let payload: serde_json::Value = response
            .json()
            .await
            .context("annotator response was not JSON")?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow!("annotator response missing message content"))?;

        let analysis: AiAnalysis = serde_json::from_str(content.trim())
            .context("annotator content was not a valid analysis object")?;
        Ok(analysis)
    }
}

/// Deterministic keyword-based annotator used when no endpoint is
/// configured. Good enough to keep dashboards populated in development.
pub struct HeuristicAnnotator;

impl HeuristicAnnotator {
    fn category_of(text: &str) -> &'static str {
        const RULES: &[(&str, &[&str])] = &[
            (CATEGORY_HOSTEL, &["hostel", "warden", "mess", "room"]),
            (CATEGORY_EXAM_CELL, &["exam", "marks", "revaluation", "hall ticket"]),
            (CATEGORY_TRANSPORT, &["bus", "transport", "route", "driver"]),
            (
                CATEGORY_STAFF_BEHAVIOR,
                &["rude", "shouted", "insulted", "behavior", "behaviour"],
            ),
        ];

        for (category, keywords) in RULES {
            if keywords.iter().any(|kw| text.contains(kw)) {
                return category;
            }
        }
        CATEGORY_ACADEMIC
    }

    fn sentiment_of(text: &str) -> &'static str {
        const URGENT: &[&str] = &["urgent", "immediately", "emergency", "asap", "danger"];
        const ANGRY: &[&str] = &["furious", "outrageous", "fed up", "disgusted", "angry"];
        const POSITIVE: &[&str] = &["thank", "appreciate", "great", "good job"];

        if URGENT.iter().any(|kw| text.contains(kw)) {
            SENTIMENT_URGENT
        } else if ANGRY.iter().any(|kw| text.contains(kw)) {
            SENTIMENT_ANGRY
        } else if POSITIVE.iter().any(|kw| text.contains(kw)) {
            SENTIMENT_POSITIVE
        } else {
            SENTIMENT_NEGATIVE
        }
    }
}

#[async_trait]
impl Annotator for HeuristicAnnotator {
    async fn analyze(&self, text: &str) -> Result<AiAnalysis> {
        let lowered = text.to_lowercase();
        let sentiment = Self::sentiment_of(&lowered);
        let foul = profanity::contains_profanity(text);

        let priority = match sentiment {
            SENTIMENT_URGENT => PRIORITY_HIGH,
            SENTIMENT_ANGRY => PRIORITY_HIGH,
            SENTIMENT_POSITIVE => PRIORITY_LOW,
            _ => PRIORITY_MEDIUM,
        };

        Ok(AiAnalysis {
            sentiment: sentiment.to_string(),
            category: Self::category_of(&lowered).to_string(),
            priority: priority.to_string(),
            foul_language_detected: foul,
            foul_language_severity: if foul { SEVERITY_MODERATE } else { SEVERITY_NONE }.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn heuristic_tags_hostel_complaints() {
        let analysis = HeuristicAnnotator
            .analyze("The hostel mess serves stale food")
            .await
            .unwrap();
        assert_eq!(analysis.category, CATEGORY_HOSTEL);
        assert_eq!(analysis.sentiment, SENTIMENT_NEGATIVE);
        assert_eq!(analysis.priority, PRIORITY_MEDIUM);
    }

    #[tokio::test]
    async fn urgent_wording_raises_priority() {
        let analysis = HeuristicAnnotator
            .analyze("Bus brakes are failing, please fix immediately, this is an emergency")
            .await
            .unwrap();
        assert_eq!(analysis.category, CATEGORY_TRANSPORT);
        assert_eq!(analysis.sentiment, SENTIMENT_URGENT);
        assert_eq!(analysis.priority, PRIORITY_HIGH);
    }

    #[tokio::test]
    async fn unmatched_text_falls_back_to_academic() {
        let analysis = HeuristicAnnotator.analyze("Library hours").await.unwrap();
        assert_eq!(analysis.category, CATEGORY_ACADEMIC);
    }

    #[test]
    fn fallback_defaults_are_negative_medium_academic() {
        let fallback = AiAnalysis::fallback();
        assert_eq!(fallback.sentiment, SENTIMENT_NEGATIVE);
        assert_eq!(fallback.category, CATEGORY_ACADEMIC);
        assert_eq!(fallback.priority, PRIORITY_MEDIUM);
        assert!(!fallback.foul_language_detected);
    }
}
