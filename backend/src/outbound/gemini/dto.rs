//! Wire shapes for the `generateContent` request and response.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerateRequestDto<'a> {
    pub(super) system_instruction: ContentDto<'a>,
    pub(super) contents: [ContentDto<'a>; 1],
}

#[derive(Debug, Serialize)]
pub(super) struct ContentDto<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) role: Option<&'static str>,
    pub(super) parts: [PartDto<'a>; 1],
}

#[derive(Debug, Serialize)]
pub(super) struct PartDto<'a> {
    pub(super) text: &'a str,
}

impl<'a> GenerateRequestDto<'a> {
    pub(super) fn new(system: &'a str, prompt: &'a str) -> Self {
        Self {
            system_instruction: ContentDto {
                role: None,
                parts: [PartDto { text: system }],
            },
            contents: [ContentDto {
                role: Some("user"),
                parts: [PartDto { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GenerateResponseDto {
    #[serde(default)]
    candidates: Vec<CandidateDto>,
}

#[derive(Debug, Deserialize)]
struct CandidateDto {
    content: Option<CandidateContentDto>,
}

#[derive(Debug, Deserialize)]
struct CandidateContentDto {
    #[serde(default)]
    parts: Vec<CandidatePartDto>,
}

#[derive(Debug, Deserialize)]
struct CandidatePartDto {
    text: Option<String>,
}

impl GenerateResponseDto {
    /// Concatenated text of the first candidate, if it has any.
    pub(super) fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text = content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect::<String>();
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }
}

/// Error envelope returned with non-success statuses.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelopeDto {
    pub(super) error: ErrorBodyDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBodyDto {
    #[serde(default)]
    pub(super) message: String,
}
