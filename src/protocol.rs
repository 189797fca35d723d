//! Wire types for the chatbot backend.
//!
//! The backend answers every `POST {"text": ...}` with a JSON object tagged by
//! `type`. Anything that does not fit one of the known shapes is kept as
//! [`ApiResponse::Unrecognized`] rather than treated as a transport failure.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body of a query submission.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest<'a> {
    pub text: &'a str,
}

/// A remediation hint attached to a failed code analysis.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawSuggestion")]
pub struct Suggestion {
    pub id: Option<String>,
    pub title: String,
    pub explanation: String,
    pub fix_example: Option<String>,
    pub detail: Option<String>,
}

// A `null` title or explanation reads as empty rather than rejecting the
// whole analysis.
#[derive(Deserialize)]
struct RawSuggestion {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    fix_example: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

impl From<RawSuggestion> for Suggestion {
    fn from(raw: RawSuggestion) -> Self {
        Self {
            id: raw.id,
            title: raw.title.unwrap_or_default(),
            explanation: raw.explanation.unwrap_or_default(),
            fix_example: raw.fix_example,
            detail: raw.detail,
        }
    }
}

/// Compile/run outcome for submitted code.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawAnalysisResult")]
pub struct AnalysisResult {
    pub success: bool,
    pub compile_output: Option<String>,
    pub runtime_output: Option<String>,
    pub suggestions: Vec<Suggestion>,
}

// The live backend ships the suggestion list as `errors`.
#[derive(Deserialize)]
struct RawAnalysisResult {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    compile_output: Option<String>,
    #[serde(default)]
    runtime_output: Option<String>,
    #[serde(default)]
    suggestions: Option<Vec<Suggestion>>,
    #[serde(default)]
    errors: Option<Vec<Suggestion>>,
}

impl From<RawAnalysisResult> for AnalysisResult {
    fn from(raw: RawAnalysisResult) -> Self {
        Self {
            success: raw.success,
            compile_output: raw.compile_output,
            runtime_output: raw.runtime_output,
            suggestions: raw.suggestions.or(raw.errors).unwrap_or_default(),
        }
    }
}

/// A decoded backend response.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Qa {
        answer: String,
        confidence: Option<f64>,
    },
    NoAnswer {
        answer: String,
    },
    CodeAnalysis {
        result: AnalysisResult,
    },
    /// Valid JSON whose `type` is missing, unknown, or whose payload does not
    /// match the tag.
    Unrecognized {
        tag: Option<String>,
    },
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum TaggedResponse {
    #[serde(rename = "QA")]
    Qa {
        answer: String,
        #[serde(default)]
        confidence: Option<f64>,
    },
    #[serde(rename = "NO_ANSWER")]
    NoAnswer { answer: String },
    #[serde(rename = "CODE_ANALYSIS")]
    CodeAnalysis { result: AnalysisResult },
}

impl ApiResponse {
    pub fn from_value(value: Value) -> Self {
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_owned);

        match serde_json::from_value::<TaggedResponse>(value) {
            Ok(TaggedResponse::Qa { answer, confidence }) => ApiResponse::Qa { answer, confidence },
            Ok(TaggedResponse::NoAnswer { answer }) => ApiResponse::NoAnswer { answer },
            Ok(TaggedResponse::CodeAnalysis { result }) => ApiResponse::CodeAnalysis { result },
            Err(_) => ApiResponse::Unrecognized { tag },
        }
    }

    /// The wire tag, for logging.
    pub fn tag(&self) -> &str {
        match self {
            ApiResponse::Qa { .. } => "QA",
            ApiResponse::NoAnswer { .. } => "NO_ANSWER",
            ApiResponse::CodeAnalysis { .. } => "CODE_ANALYSIS",
            ApiResponse::Unrecognized { tag } => tag.as_deref().unwrap_or("<missing>"),
        }
    }
}

impl<'de> Deserialize<'de> for ApiResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(ApiResponse::from_value(value))
    }
}

/// Reply from the backend's health route.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}
