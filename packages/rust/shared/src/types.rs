//! Core domain types for ContentAgent pipelines.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DecodeDiagnostics, StageError};

// ---------------------------------------------------------------------------
// Shape description
// ---------------------------------------------------------------------------

/// Whether a task expects a JSON object or a JSON array back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayloadKind {
    Object,
    /// A list of objects, optionally with an exact element count.
    List { exact_len: Option<usize> },
}

impl PayloadKind {
    /// Opening and closing delimiters that bound this payload in raw text.
    pub fn delimiters(&self) -> (char, char) {
        match self {
            Self::Object => ('{', '}'),
            Self::List { .. } => ('[', ']'),
        }
    }
}

/// A required field, with the nested fields the prompt asks for beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FieldSpec>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn nested(name: impl Into<String>, children: &[&str]) -> Self {
        Self {
            name: name.into(),
            children: children.iter().map(|c| Self::new(*c)).collect(),
        }
    }
}

/// Ordered list of required top-level fields a task expects in its result.
///
/// For list payloads the fields apply to every element. Nested children are
/// documentation for the prompt; only top-level presence is ever checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeDescription {
    pub kind: PayloadKind,
    pub fields: Vec<FieldSpec>,
}

impl ShapeDescription {
    /// An object with the given required top-level fields.
    pub fn object(fields: Vec<FieldSpec>) -> Self {
        Self {
            kind: PayloadKind::Object,
            fields,
        }
    }

    /// A list whose elements carry the given required fields.
    pub fn list(exact_len: Option<usize>, fields: Vec<FieldSpec>) -> Self {
        Self {
            kind: PayloadKind::List { exact_len },
            fields,
        }
    }

    /// Required top-level field names, in declared order.
    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// One-paragraph summary of the required keys for the prompt.
    fn describe(&self) -> String {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|f| {
                if f.children.is_empty() {
                    f.name.clone()
                } else {
                    let children: Vec<&str> = f.children.iter().map(|c| c.name.as_str()).collect();
                    format!("{} ({})", f.name, children.join(", "))
                }
            })
            .collect();

        match self.kind {
            PayloadKind::Object => format!("Required top-level keys: {}.", fields.join(", ")),
            PayloadKind::List { exact_len } => {
                let count = exact_len
                    .map(|n| format!("Return exactly {n} elements. "))
                    .unwrap_or_default();
                format!("{count}Every element must contain: {}.", fields.join(", "))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PromptSpec
// ---------------------------------------------------------------------------

/// Caller-supplied input embedded in a prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptInput {
    None,
    /// Free text, embedded verbatim.
    Text(String),
    /// A prior structured result, embedded as pretty JSON under a label.
    Structured { label: String, value: Value },
}

/// Everything needed to render one generation prompt.
///
/// Built once per call through the `with_*` constructors and never mutated.
#[derive(Debug, Clone)]
pub struct PromptSpec {
    task: String,
    instruction: String,
    inputs: Vec<PromptInput>,
    template: String,
    rules: Vec<String>,
    shape: ShapeDescription,
}

impl PromptSpec {
    pub fn new(task: impl Into<String>, instruction: impl Into<String>, shape: ShapeDescription) -> Self {
        Self {
            task: task.into(),
            instruction: instruction.into(),
            inputs: Vec::new(),
            template: String::new(),
            rules: Vec::new(),
            shape,
        }
    }

    pub fn with_input(mut self, input: PromptInput) -> Self {
        if input != PromptInput::None {
            self.inputs.push(input);
        }
        self
    }

    /// Literal JSON skeleton shown to the model.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_rules(mut self, rules: &[&str]) -> Self {
        self.rules.extend(rules.iter().map(|r| (*r).to_string()));
        self
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn shape(&self) -> &ShapeDescription {
        &self.shape
    }

    pub fn inputs(&self) -> &[PromptInput] {
        &self.inputs
    }

    /// Render the full prompt text sent to the backend.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(self.instruction.trim());
        out.push_str("\n\n");

        for input in &self.inputs {
            match input {
                PromptInput::None => {}
                PromptInput::Text(text) => {
                    out.push_str(text.trim());
                    out.push_str("\n\n");
                }
                PromptInput::Structured { label, value } => {
                    let pretty =
                        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                    out.push_str(&format!("{label}:\n{pretty}\n\n"));
                }
            }
        }

        let noun = match self.shape.kind {
            PayloadKind::Object => "a JSON object",
            PayloadKind::List { .. } => "a JSON array",
        };
        if self.template.is_empty() {
            out.push_str(&format!("Return your answer as {noun}.\n"));
        } else {
            out.push_str(&format!(
                "Return your answer as {noun} with this exact structure:\n{}\n",
                self.template.trim()
            ));
        }
        out.push_str(&self.shape.describe());
        out.push('\n');

        if !self.rules.is_empty() {
            out.push_str("\nRules:\n");
            for (i, rule) in self.rules.iter().enumerate() {
                out.push_str(&format!("{}. {rule}\n", i + 1));
            }
        }

        out
    }
}

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

/// Pipeline stages, in execution order.
///
/// A successful invocation passes through Build, Send, Normalize, Decode,
/// Validate and Persist. `Load` covers reading an earlier stage's artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Build,
    Send,
    Normalize,
    Decode,
    Validate,
    Persist,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Build => "build",
            Self::Send => "send",
            Self::Normalize => "normalize",
            Self::Decode => "decode",
            Self::Validate => "validate",
            Self::Persist => "persist",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Metadata for a persisted JSON artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub path: PathBuf,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Outcome status carried by every [`Envelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Uniform result wrapper returned by every task invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope {
    Success {
        payload: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        artifact: Option<ArtifactRecord>,
        timestamp: DateTime<Utc>,
    },
    Error {
        error: String,
        kind: String,
        stage: Stage,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        diagnostics: Option<DecodeDiagnostics>,
        timestamp: DateTime<Utc>,
    },
}

impl Envelope {
    pub fn success(payload: Value, artifact: Option<ArtifactRecord>) -> Self {
        Self::Success {
            payload,
            artifact,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(err: &StageError) -> Self {
        Self::Error {
            error: err.source.to_string(),
            kind: err.source.kind().to_string(),
            stage: err.stage,
            diagnostics: err.source.diagnostics().cloned(),
            timestamp: Utc::now(),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Success { .. } => Status::Success,
            Self::Error { .. } => Status::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == Status::Success
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Success { payload, .. } => Some(payload),
            Self::Error { .. } => None,
        }
    }

    pub fn artifact(&self) -> Option<&ArtifactRecord> {
        match self {
            Self::Success { artifact, .. } => artifact.as_ref(),
            Self::Error { .. } => None,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Success { timestamp, .. } | Self::Error { timestamp, .. } => *timestamp,
        }
    }
}
