use serde::Deserialize;

/// A render request as received from the web boundary.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub schema_type: String,
    #[serde(default)]
    pub enforce_schema: bool,
    #[serde(default)]
    pub structured_result: Option<StructuredResult>,
    /// Model output as plain text; used when `structured_result` is absent.
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub shots: Vec<Shot>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredResult {
    #[serde(default)]
    pub template_id: String,
    pub data: serde_json::Value,
}

/// A captured still plus its metadata.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shot {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub timecode: String,
    pub data_url: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tutorial {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub prerequisites: Vec<String>,
    pub steps: Vec<TutorialStep>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TutorialStep {
    pub number: Option<u32>,
    pub title: String,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub screenshot_ids: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeetingSummary {
    pub title: Option<String>,
    pub date: Option<String>,
    pub duration: Option<String>,
    pub summary: Option<String>,
    pub attendees: Vec<Attendee>,
    pub key_topics: Vec<KeyTopic>,
    pub decisions: Vec<Decision>,
    pub action_items: Vec<ActionItem>,
    pub follow_ups: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attendee {
    pub name: String,
    pub role: Option<String>,
    pub department: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyTopic {
    pub order: Option<f64>,
    pub topic: String,
    pub speaker: Option<String>,
    pub timecode: Option<String>,
    pub details: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Decision {
    pub description: String,
    pub status: Option<String>,
    pub owners: Vec<String>,
    pub timecode: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionItem {
    pub task: String,
    pub owner: String,
    pub due_date: Option<String>,
    pub timecode: Option<String>,
}

/// What the model output was recognised as.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentVariant {
    Tutorial(Tutorial),
    MeetingSummary(MeetingSummary),
    Unclassified {
        /// Display label for the requested schema, used as the document title.
        label: String,
        /// Enforcement was requested, so the mismatch is called out in the document.
        notice: bool,
        raw_text: String,
    },
}

/// Text size classes for body text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextSize {
    Body,
    Small,
}

/// Heading levels: steps and topics are subtitles, section names are headings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeadingLevel {
    Subtitle,
    Section,
}

/// One drawable unit of document content.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentNode {
    Title(String),
    Heading {
        text: String,
        level: HeadingLevel,
    },
    Paragraph {
        text: String,
        size: TextSize,
        bold: bool,
    },
    /// Present parts only, joined with " · " and set small.
    MetaLine(Vec<String>),
    ShotReference(String),
}

impl ContentNode {
    pub fn body(text: impl Into<String>) -> Self {
        ContentNode::Paragraph {
            text: text.into(),
            size: TextSize::Body,
            bold: false,
        }
    }

    pub fn small(text: impl Into<String>) -> Self {
        ContentNode::Paragraph {
            text: text.into(),
            size: TextSize::Small,
            bold: false,
        }
    }

    pub fn section(text: impl Into<String>) -> Self {
        ContentNode::Heading {
            text: text.into(),
            level: HeadingLevel::Section,
        }
    }

    pub fn subtitle(text: impl Into<String>) -> Self {
        ContentNode::Heading {
            text: text.into(),
            level: HeadingLevel::Subtitle,
        }
    }
}

pub const META_SEPARATOR: &str = " · ";

/// Join the parts that are present with the meta separator.
pub fn join_meta(parts: &[Option<String>]) -> String {
    parts
        .iter()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(META_SEPARATOR)
}
