//! Section: one planned unit of the document.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which writing wave a section belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wave {
    /// Main-body chapters, written from the source notes.
    Body,
    /// Prologue/epilogue sections, written from the aggregated body.
    Framing,
}

impl fmt::Display for Wave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wave::Body => write!(f, "body"),
            Wave::Framing => write!(f, "framing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub content: String,
    pub main_body: bool,
}

impl Section {
    pub fn new(name: impl Into<String>, description: impl Into<String>, main_body: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            content: String::new(),
            main_body,
        }
    }

    pub fn wave(&self) -> Wave {
        if self.main_body {
            Wave::Body
        } else {
            Wave::Framing
        }
    }

    pub fn is_written(&self) -> bool {
        !self.content.is_empty()
    }

    /// Fill the section with generated text.
    ///
    /// Content moves from empty to final exactly once; blank text is a generation failure.
    pub fn fill(mut self, content: String) -> Result<Self, ApiError> {
        if self.is_written() {
            return Err(ApiError::SectionAlreadyWritten(self.name));
        }
        if content.trim().is_empty() {
            return Err(ApiError::GenerationFailed {
                section: self.name,
                message: "model returned empty text".to_string(),
            });
        }
        self.content = content;
        Ok(self)
    }
}
