//! AI coaching for a single day.
//!
//! [`AdviceClient`] turns a day's goal, mood and journal into one prompt for a
//! hosted generative-text model and always hands back displayable text: the
//! generated reply, or a fixed fallback when no credential is configured, the
//! call fails, or the model answers with nothing.

use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::model::{DAY_COUNT, DayEntry, Mood};

pub const NOT_CONFIGURED_MESSAGE: &str =
    "No API key is configured. Set GEMINI_API_KEY to enable AI coaching.";
pub const EMPTY_RESPONSE_MESSAGE: &str = "Please try again in a moment.";
pub const FAILURE_MESSAGE: &str =
    "AI advice is not available right now. Please try again in a moment.";

pub const DEFAULT_GOAL: &str = "To take better care of myself";
pub const EMPTY_JOURNAL: &str = "(No entry yet)";

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_LANGUAGE: &str = "English";

#[derive(Error, Debug)]
pub enum AdviceError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Unexpected response: {0}")]
    Decode(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdviceRequest {
    pub goal: String,
    pub mood: Mood,
    pub day_number: u32,
    pub journal: String,
}

impl AdviceRequest {
    /// Request for a day as currently edited; a day without a mood is asked
    /// about as neutral.
    pub fn for_entry(goal: &str, entry: &DayEntry) -> Self {
        Self {
            goal: goal.to_string(),
            mood: entry.mood.unwrap_or(Mood::Neutral),
            day_number: entry.day_number,
            journal: entry.content.clone(),
        }
    }
}

pub fn build_prompt(request: &AdviceRequest, language: &str) -> String {
    let goal = if request.goal.trim().is_empty() {
        DEFAULT_GOAL
    } else {
        request.goal.as_str()
    };
    let journal = if request.journal.trim().is_empty() {
        EMPTY_JOURNAL
    } else {
        request.journal.as_str()
    };

    format!(
        "You are a warm, supportive self-care coach.\n\
         The user is on day {day} of their {DAY_COUNT}-day self-care journey.\n\
         \n\
         Their main goal is: \"{goal}\".\n\
         Their current mood is: \"{mood}\".\n\
         They wrote this in their journal: \"{journal}\".\n\
         \n\
         Please provide a short, encouraging message (max 2-3 sentences) and ONE simple, \
         actionable self-care tip relevant to their mood and goal today.\n\
         Reply in {language}, in a warm and polite tone.",
        day = request.day_number,
        mood = request.mood,
    )
}

/// One round trip to a text generation service. `Ok(None)` means the service
/// answered without any text.
pub trait GenerativeBackend: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<Option<String>, AdviceError>;
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Gemini `generateContent` over HTTPS.
pub struct GeminiBackend {
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(endpoint: &str, model: &str, api_key: String) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        }
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl GenerativeBackend for GeminiBackend {
    fn generate(&self, prompt: &str) -> Result<Option<String>, AdviceError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = ureq::post(&self.url())
            .set("x-goog-api-key", &self.api_key)
            .send_json(body)
            .map_err(|e| match e {
                ureq::Error::Status(status, response) => AdviceError::Api {
                    status,
                    body: response.into_string().unwrap_or_default(),
                },
                ureq::Error::Transport(t) => AdviceError::Network(t.to_string()),
            })?;

        let parsed: GenerateContentResponse = response
            .into_json()
            .map_err(|e| AdviceError::Decode(e.to_string()))?;
        Ok(extract_text(parsed))
    }
}

#[derive(Clone, Debug)]
pub struct AdviceConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub language: String,
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AdviceClient {
    backend: Option<Arc<dyn GenerativeBackend>>,
    language: String,
}

impl AdviceClient {
    pub fn new(config: AdviceConfig) -> Self {
        let backend = config
            .api_key
            .filter(|key| !key.trim().is_empty())
            .map(|key| {
                Arc::new(GeminiBackend::new(&config.endpoint, &config.model, key))
                    as Arc<dyn GenerativeBackend>
            });
        Self::with_backend(backend, config.language)
    }

    pub fn with_backend(backend: Option<Arc<dyn GenerativeBackend>>, language: String) -> Self {
        Self { backend, language }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    /// Exactly one request per call; never retried or cached.
    pub fn get_advice(&self, request: &AdviceRequest) -> String {
        let Some(backend) = &self.backend else {
            debug!("advice requested without credentials");
            return NOT_CONFIGURED_MESSAGE.to_string();
        };

        let prompt = build_prompt(request, &self.language);
        match backend.generate(&prompt) {
            Ok(Some(text)) => text,
            Ok(None) => {
                warn!(day = request.day_number, "advice service returned no text");
                EMPTY_RESPONSE_MESSAGE.to_string()
            }
            Err(e) => {
                error!(day = request.day_number, error = %e, "advice request failed");
                FAILURE_MESSAGE.to_string()
            }
        }
    }

    /// Runs the blocking HTTP call off the async executor.
    pub async fn get_advice_async(&self, request: AdviceRequest) -> String {
        let client = self.clone();
        tokio::task::spawn_blocking(move || client.get_advice(&request))
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "advice task failed");
                FAILURE_MESSAGE.to_string()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeBackend {
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
        reply: fn() -> Result<Option<String>, AdviceError>,
    }

    impl FakeBackend {
        fn new(reply: fn() -> Result<Option<String>, AdviceError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
                reply,
            })
        }
    }

    impl GenerativeBackend for FakeBackend {
        fn generate(&self, prompt: &str) -> Result<Option<String>, AdviceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            (self.reply)()
        }
    }

    fn client_for(fake: &Arc<FakeBackend>, language: &str) -> AdviceClient {
        let backend: Arc<dyn GenerativeBackend> = fake.clone();
        AdviceClient::with_backend(Some(backend), language.to_string())
    }

    fn request(goal: &str, journal: &str) -> AdviceRequest {
        AdviceRequest {
            goal: goal.to_string(),
            mood: Mood::Tired,
            day_number: 12,
            journal: journal.to_string(),
        }
    }

    #[test]
    fn without_credentials_returns_not_configured() {
        let client = AdviceClient::new(AdviceConfig::default());
        assert!(!client.is_configured());
        for mood in Mood::ALL {
            let mut req = request("", "");
            req.mood = mood;
            assert_eq!(client.get_advice(&req), NOT_CONFIGURED_MESSAGE);
        }
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let client = AdviceClient::new(AdviceConfig {
            api_key: Some("   ".into()),
            ..AdviceConfig::default()
        });
        assert!(!client.is_configured());
    }

    #[test]
    fn successful_reply_is_returned_after_one_call() {
        let fake = FakeBackend::new(|| Ok(Some("You are doing great.".into())));
        let client = client_for(&fake, DEFAULT_LANGUAGE);
        assert_eq!(client.get_advice(&request("Sleep early", "")), "You are doing great.");
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failures_and_empty_replies_fall_back() {
        let failing = FakeBackend::new(|| Err(AdviceError::Network("offline".into())));
        let client = client_for(&failing, DEFAULT_LANGUAGE);
        assert_eq!(client.get_advice(&request("g", "j")), FAILURE_MESSAGE);
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);

        let empty = FakeBackend::new(|| Ok(None));
        let client = client_for(&empty, DEFAULT_LANGUAGE);
        assert_eq!(client.get_advice(&request("g", "j")), EMPTY_RESPONSE_MESSAGE);
    }

    #[test]
    fn prompt_embeds_inputs_and_defaults() {
        let fake = FakeBackend::new(|| Ok(Some("ok".into())));
        let client = client_for(&fake, "Korean");
        client.get_advice(&request("", "  "));

        let prompts = fake.prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(prompt.contains("day 12 of their 100-day"));
        assert!(prompt.contains(DEFAULT_GOAL));
        assert!(prompt.contains(EMPTY_JOURNAL));
        assert!(prompt.contains("\"tired\""));
        assert!(prompt.contains("Reply in Korean"));
    }

    #[test]
    fn request_for_entry_defaults_mood_to_neutral() {
        let mut entry = DayEntry::empty(4);
        entry.content = "long day".into();
        let req = AdviceRequest::for_entry("Stretch", &entry);
        assert_eq!(req.mood, Mood::Neutral);
        assert_eq!(req.day_number, 4);
        assert_eq!(req.journal, "long day");

        entry.mood = Some(Mood::Happy);
        assert_eq!(AdviceRequest::for_entry("", &entry).mood, Mood::Happy);
    }

    #[test]
    fn reply_text_is_joined_from_first_candidate() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"there."}]}},{"content":{"parts":[{"text":"ignored"}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(extract_text(parsed), Some("Hello there.".to_string()));

        let blank: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#).unwrap();
        assert_eq!(extract_text(blank), None);

        let none: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(extract_text(none), None);
    }

    #[test]
    fn gemini_url_trims_trailing_slash() {
        let backend = GeminiBackend::new("https://example.test/v1beta/", "m-1", "k".into());
        assert_eq!(
            backend.url(),
            "https://example.test/v1beta/models/m-1:generateContent"
        );
    }

    #[tokio::test]
    async fn async_path_matches_sync_result() {
        let fake = FakeBackend::new(|| Ok(Some("async ok".into())));
        let client = client_for(&fake, DEFAULT_LANGUAGE);
        assert_eq!(client.get_advice_async(request("g", "j")).await, "async ok");
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);

        let unconfigured = AdviceClient::new(AdviceConfig::default());
        assert_eq!(
            unconfigured.get_advice_async(request("g", "j")).await,
            NOT_CONFIGURED_MESSAGE
        );
    }
}
