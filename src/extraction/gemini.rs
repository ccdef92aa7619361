use std::sync::OnceLock;
use std::time::Duration;

use base64::Engine;
use serde::{Deserialize, Serialize};

use super::parser::parse_extraction_response;
use super::prompt::EXTRACTION_PROMPT;
use super::{BiomarkerExtractor, ExtractionError};
use crate::analysis::BiomarkerValue;
use crate::config::GeminiSettings;

/// Preferred Gemini models, most recent first.
const GEMINI_MODELS: &[&str] = &[
    "gemini-2.5-flash",
    "gemini-2.0-flash",
    "gemini-1.5-flash-8b",
    "gemini-1.5-flash",
];

/// Used when the model listing is unavailable.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Gemini REST client for PDF extraction.
///
/// Holds only settings. The blocking HTTP client is created per call so
/// it is built and dropped on the blocking thread that runs `extract`.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    timeout_secs: u64,
    configured_model: Option<String>,
    selected_model: OnceLock<String>,
}

impl GeminiClient {
    pub fn new(settings: &GeminiSettings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout_secs: settings.timeout_secs,
            configured_model: settings.model.clone(),
            selected_model: OnceLock::new(),
        }
    }

    fn http_client(&self) -> Result<reqwest::blocking::Client, ExtractionError> {
        reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| ExtractionError::HttpClient(e.to_string()))
    }

    /// Model used for extraction: the configured one, else the first
    /// preferred model the API lists, else the first listed model that
    /// supports `generateContent`, else [`DEFAULT_GEMINI_MODEL`].
    /// Resolved once per client.
    pub fn model(&self, client: &reqwest::blocking::Client) -> &str {
        self.selected_model.get_or_init(|| {
            if let Some(model) = &self.configured_model {
                return model.clone();
            }
            match self.list_models(client) {
                Ok(available) => {
                    let chosen = select_model(&available);
                    tracing::info!(model = %chosen, "Selected Gemini model");
                    chosen
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Cannot list Gemini models, using default");
                    DEFAULT_GEMINI_MODEL.to_string()
                }
            }
        })
    }

    fn list_models(
        &self,
        client: &reqwest::blocking::Client,
    ) -> Result<Vec<GeminiModel>, ExtractionError> {
        let url = format!("{}/v1beta/models", self.base_url);
        let response = client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractionError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GeminiModelList = response
            .json()
            .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))?;
        Ok(parsed.models)
    }

    fn generate(
        &self,
        client: &reqwest::blocking::Client,
        model: &str,
        pdf: &[u8],
    ) -> Result<String, ExtractionError> {
        let url = format!("{}/v1beta/models/{model}:generateContent", self.base_url);
        let encoded = base64::engine::general_purpose::STANDARD.encode(pdf);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: EXTRACTION_PROMPT,
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "application/pdf",
                            data: &encoded,
                        },
                    },
                ],
            }],
        };

        let response = client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractionError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))?;

        parsed.text().ok_or_else(|| {
            ExtractionError::MalformedResponse("response contains no text candidate".into())
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> ExtractionError {
        if e.is_connect() {
            ExtractionError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            ExtractionError::HttpClient(format!("Request timed out after {}s", self.timeout_secs))
        } else {
            ExtractionError::HttpClient(e.to_string())
        }
    }
}

impl BiomarkerExtractor for GeminiClient {
    fn extract(&self, pdf: &[u8]) -> Result<Vec<(String, BiomarkerValue)>, ExtractionError> {
        let client = self.http_client()?;
        let model = self.model(&client).to_string();
        tracing::debug!(model = %model, size = pdf.len(), "Sending PDF to Gemini");

        let text = self.generate(&client, &model, pdf)?;
        let readings = parse_extraction_response(&text)?;
        tracing::info!(count = readings.len(), "Extracted biomarkers from PDF");
        Ok(readings)
    }
}

fn select_model(available: &[GeminiModel]) -> String {
    let names: Vec<&str> = available.iter().map(|m| m.short_name()).collect();
    for preferred in GEMINI_MODELS {
        if names.contains(preferred) {
            return preferred.to_string();
        }
    }
    available
        .iter()
        .find(|m| m.supports_generate_content())
        .map(|m| m.short_name().to_string())
        .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string())
}

/// Request body for `models/{model}:generateContent`
#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

/// Response body from `generateContent`
#[derive(Deserialize)]
struct GenerateResponse {
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
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Response body from `models`
#[derive(Deserialize)]
struct GeminiModelList {
    #[serde(default)]
    models: Vec<GeminiModel>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModel {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

impl GeminiModel {
    /// `models/gemini-2.0-flash` -> `gemini-2.0-flash`
    fn short_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == "generateContent")
    }
}

/// Mock extractor for testing. Returns a fixed model answer run through
/// the real response parser, or a fixed error.
pub struct MockExtractor {
    response: Result<String, fn() -> ExtractionError>,
}

impl MockExtractor {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
        }
    }

    pub fn failing(error: fn() -> ExtractionError) -> Self {
        Self {
            response: Err(error),
        }
    }
}

impl BiomarkerExtractor for MockExtractor {
    fn extract(&self, _pdf: &[u8]) -> Result<Vec<(String, BiomarkerValue)>, ExtractionError> {
        match &self.response {
            Ok(text) => parse_extraction_response(text),
            Err(make_error) => Err(make_error()),
        }
    }
}
