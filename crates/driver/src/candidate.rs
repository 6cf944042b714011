//! The repair candidate source: given source text with the buggy line
//! marked, produce a replacement line.
//!
//! The HTTP implementation speaks the OpenAI-compatible chat-completions
//! protocol, so it works against both hosted APIs and local servers
//! (LM Studio, llama.cpp) -- the endpoint, model, and key come from the
//! environment. The model's free-text answer is reduced to a single line by
//! [`extract_expression`].

use std::env;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Environment variables configuring the HTTP candidate source.
pub const ENDPOINT_ENV: &str = "VERILOC_LLM_ENDPOINT";
pub const MODEL_ENV: &str = "VERILOC_LLM_MODEL";
pub const API_KEY_ENV: &str = "VERILOC_LLM_API_KEY";

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";

const SYSTEM_PROMPT: &str = "You are a software expert specializing in formal methods \
using the Dafny programming language. You receive the following program where a verifier \
error message indicates an issue. The error is due to a buggy line, which is marked with \
the comment \"//buggy line\". Your task is to correct the buggy line to ensure the program \
verifies successfully.\n Do not include explanations.\n Return only fixed line.\n \
Here is the code: \n";

/// Errors from the candidate source.
#[derive(Debug)]
pub enum CandidateError {
    /// No endpoint/key configuration available.
    NotConfigured,
    /// Transport-level failure.
    Http(String),
    /// The response did not contain a usable completion.
    MalformedResponse(String),
}

impl fmt::Display for CandidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateError::NotConfigured => write!(
                f,
                "candidate source not configured: set {ENDPOINT_ENV} or {API_KEY_ENV}"
            ),
            CandidateError::Http(msg) => write!(f, "candidate request failed: {msg}"),
            CandidateError::MalformedResponse(msg) => {
                write!(f, "malformed candidate response: {msg}")
            }
        }
    }
}

impl std::error::Error for CandidateError {}

/// A source of repair candidates.
pub trait CandidateSource {
    /// `marked_source` is the full program text with the suspicious line
    /// annotated by the buggy-line marker; the response is free text.
    fn propose_fix(&self, marked_source: &str) -> Result<String, CandidateError>;
}

/// Extract the replacement line from a model response.
///
/// Quoting conventions are tried in order -- triple-quote, fenced code
/// block, single backtick, double quote -- and the first non-empty capture
/// wins. Responses with no recognizable quoting come back verbatim.
pub fn extract_expression(response: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"(?s)'''(.*?)'''|```(.*?)```|`(.*?)`|"(.*?)""#).expect("extraction regex")
    });
    if let Some(caps) = re.captures(response) {
        for group in caps.iter().skip(1).flatten() {
            if !group.as_str().is_empty() {
                return group.as_str().to_string();
            }
        }
    }
    response.to_string()
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat-completions client.
pub struct HttpCandidateSource {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpCandidateSource {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, CandidateError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| CandidateError::Http(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }

    /// Configure from the environment. A custom endpoint (local server)
    /// needs no key; the default hosted endpoint does.
    pub fn from_env() -> Result<Self, CandidateError> {
        let endpoint = env::var(ENDPOINT_ENV).unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let model = env::var(MODEL_ENV).unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let api_key = env::var(API_KEY_ENV)
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .ok();
        if api_key.is_none() && endpoint == DEFAULT_ENDPOINT {
            return Err(CandidateError::NotConfigured);
        }
        Self::new(endpoint, model, api_key)
    }
}

impl CandidateSource for HttpCandidateSource {
    fn propose_fix(&self, marked_source: &str) -> Result<String, CandidateError> {
        let user_content = format!("{marked_source}\nfixed line: \n");
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_content,
                },
            ],
            temperature: 0.7,
            max_tokens: 30,
        };

        let url = format!("{}/chat/completions", self.endpoint);
        tracing::debug!(%url, model = %self.model, "requesting repair candidate");

        let mut req = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let response = req
            .send()
            .map_err(|e| CandidateError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(CandidateError::Http(format!(
                "status {}",
                response.status()
            )));
        }
        let parsed: ChatResponse = response
            .json()
            .map_err(|e| CandidateError::MalformedResponse(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CandidateError::MalformedResponse("no choices".to_string()))
    }
}

/// Scripted candidate source for tests: returns canned responses in order,
/// repeating the last one.
#[derive(Debug, Default)]
pub struct StaticCandidateSource {
    responses: Vec<String>,
    cursor: std::sync::Mutex<usize>,
}

impl StaticCandidateSource {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses,
            cursor: std::sync::Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.cursor.lock().unwrap()
    }
}

impl CandidateSource for StaticCandidateSource {
    fn propose_fix(&self, _marked_source: &str) -> Result<String, CandidateError> {
        let mut cursor = self.cursor.lock().unwrap();
        let idx = (*cursor).min(self.responses.len().saturating_sub(1));
        *cursor += 1;
        self.responses
            .get(idx)
            .cloned()
            .ok_or(CandidateError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_backtick_quoted_line() {
        assert_eq!(extract_expression("`a - b`"), "a - b");
        assert_eq!(
            extract_expression("the fix is `x := a - b;` as shown"),
            "x := a - b;"
        );
    }

    #[test]
    fn extracts_fenced_block_before_single_backtick() {
        let resp = "```\nx := a - b;\n```";
        assert_eq!(extract_expression(resp), "\nx := a - b;\n");
    }

    #[test]
    fn extracts_triple_quote() {
        assert_eq!(extract_expression("'''x := 1;'''"), "x := 1;");
    }

    #[test]
    fn extracts_double_quote() {
        assert_eq!(extract_expression("\"x := 1;\""), "x := 1;");
    }

    #[test]
    fn falls_back_to_raw_response() {
        assert_eq!(extract_expression("x := a - b;"), "x := a - b;");
    }

    #[test]
    fn static_source_plays_in_order() {
        let source = StaticCandidateSource::new(vec!["one".into(), "two".into()]);
        assert_eq!(source.propose_fix("").unwrap(), "one");
        assert_eq!(source.propose_fix("").unwrap(), "two");
        assert_eq!(source.propose_fix("").unwrap(), "two");
        assert_eq!(source.calls(), 3);
    }
}
