use serde_json::{Map, Value};

use crate::model::{
    ActionItem, Attendee, ContentNode, ContentVariant, Decision, KeyTopic, MeetingSummary,
    RenderRequest, Tutorial, TutorialStep, join_meta,
};

pub const TUTORIAL: &str = "tutorial";
pub const MEETING_SUMMARY: &str = "meetingSummary";

pub const FALLBACK_NOTICE: &str = "Structured output could not be parsed — showing raw response.";

/// Title shown when the content has none of its own.
pub fn schema_label(schema_type: &str) -> &'static str {
    match schema_type {
        TUTORIAL => "Tutorial",
        MEETING_SUMMARY => "Meeting Summary",
        _ => "Generated Document",
    }
}

fn is_known_schema(id: &str) -> bool {
    id == TUTORIAL || id == MEETING_SUMMARY
}

/// Classify whatever the model produced for this request.
pub fn classify_request(req: &RenderRequest) -> ContentVariant {
    match &req.structured_result {
        Some(sr) => {
            // Custom schema types take their shape hint from a known template id.
            let schema =
                if is_known_schema(&req.schema_type) || !is_known_schema(&sr.template_id) {
                    &req.schema_type
                } else {
                    &sr.template_id
                };
            classify_value(schema, req.enforce_schema, &sr.data, None)
        }
        None => classify_text(
            &req.schema_type,
            req.enforce_schema,
            req.raw_text.as_deref().unwrap_or(""),
        ),
    }
}

/// Best-effort JSON extraction from raw model text, then shape classification.
pub fn classify_text(schema_type: &str, enforce: bool, text: &str) -> ContentVariant {
    match extract_json(text) {
        Some(value) => classify_value(schema_type, enforce, &value, Some(text)),
        None => {
            log::debug!("Raw text is not JSON, using fallback layout");
            unclassified(schema_type, enforce, text.to_string())
        }
    }
}

/// Classify a structured value by shape. The requested schema's variant is
/// tried first so an object carrying both shapes follows the request.
pub fn classify_value(
    schema_type: &str,
    enforce: bool,
    value: &Value,
    raw_text: Option<&str>,
) -> ContentVariant {
    let fallback_text = || {
        raw_text
            .map(str::to_string)
            .unwrap_or_else(|| serde_json::to_string_pretty(value).unwrap_or_default())
    };
    let Some(obj) = value.as_object() else {
        return unclassified(schema_type, enforce, fallback_text());
    };

    let tutorial = || is_tutorial(obj).then(|| ContentVariant::Tutorial(map_tutorial(obj)));
    let meeting =
        || is_meeting(obj).then(|| ContentVariant::MeetingSummary(map_meeting(obj)));
    let found = if schema_type == MEETING_SUMMARY {
        meeting().or_else(tutorial)
    } else {
        tutorial().or_else(meeting)
    };

    match found {
        Some(variant) => {
            log::debug!(
                "Classified {schema_type} output as {}",
                match variant {
                    ContentVariant::Tutorial(_) => "tutorial",
                    _ => "meeting summary",
                }
            );
            variant
        }
        None => {
            log::debug!("Output for {schema_type} matches no known shape");
            unclassified(schema_type, enforce, fallback_text())
        }
    }
}

fn unclassified(schema_type: &str, enforce: bool, raw_text: String) -> ContentVariant {
    ContentVariant::Unclassified {
        label: schema_label(schema_type).to_string(),
        notice: enforce,
        raw_text,
    }
}

fn is_tutorial(obj: &Map<String, Value>) -> bool {
    obj.get("steps").is_some_and(Value::is_array)
}

fn is_meeting(obj: &Map<String, Value>) -> bool {
    obj.get("keyTopics").is_some_and(Value::is_array)
        || obj.get("attendees").is_some_and(Value::is_array)
}

/// Parse the whole text, else a fenced code block, else the outermost `{...}` span.
fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(v) = serde_json::from_str(trimmed) {
        return Some(v);
    }
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after[body_start..];
        if let Some(end) = body.find("```")
            && let Ok(v) = serde_json::from_str(body[..end].trim())
        {
            return Some(v);
        }
    }
    let open = trimmed.find('{')?;
    let close = trimmed.rfind('}')?;
    if close <= open {
        return None;
    }
    serde_json::from_str(&trimmed[open..=close]).ok()
}

/// First non-empty string (or number) among the given keys.
fn text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| scalar_text(obj.get(*k)?))
}

fn scalar_text(v: &Value) -> Option<String> {
    let s = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

fn number(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| match obj.get(*k)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Strings from an array (or a lone string), skipping anything else.
fn string_list(obj: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .find_map(|k| obj.get(*k))
        .map(|v| match v {
            Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
            other => scalar_text(other).into_iter().collect(),
        })
        .unwrap_or_default()
}

fn objects<'a>(obj: &'a Map<String, Value>, key: &str) -> impl Iterator<Item = &'a Value> {
    obj.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn map_tutorial(obj: &Map<String, Value>) -> Tutorial {
    let steps = objects(obj, "steps")
        .filter_map(|v| match v {
            Value::Object(step) => Some(TutorialStep {
                number: number(step, &["stepNumber", "number", "step"])
                    .filter(|n| *n >= 0.0)
                    .map(|n| n as u32),
                title: text(step, &["stepTitle", "title", "name"]).unwrap_or_default(),
                description: text(step, &["description", "instructions", "details"]),
                start_time: text(step, &["startTime", "timecodeStart", "start"]),
                end_time: text(step, &["endTime", "timecodeEnd", "end"]),
                screenshot_ids: string_list(step, &["screenshotIds", "shotIds", "screenshots"]),
            }),
            other => scalar_text(other).map(|title| TutorialStep {
                title,
                ..TutorialStep::default()
            }),
        })
        .collect();

    Tutorial {
        title: text(obj, &["title"]),
        summary: text(obj, &["summary", "overview"]),
        prerequisites: string_list(obj, &["prerequisites"]),
        steps,
    }
}

fn map_meeting(obj: &Map<String, Value>) -> MeetingSummary {
    let attendees = objects(obj, "attendees")
        .filter_map(|v| match v {
            Value::Object(a) => Some(Attendee {
                name: text(a, &["name"])?,
                role: text(a, &["role", "title"]),
                department: text(a, &["department", "team"]),
            }),
            other => scalar_text(other).map(|name| Attendee {
                name,
                ..Attendee::default()
            }),
        })
        .collect();

    let key_topics = objects(obj, "keyTopics")
        .filter_map(|v| match v {
            Value::Object(t) => Some(KeyTopic {
                order: number(t, &["order"]),
                topic: text(t, &["topic", "title", "name"])?,
                speaker: text(t, &["speaker", "presenter"]),
                timecode: text(t, &["timecode", "timestamp"]),
                details: text(t, &["details", "summary", "description"]),
            }),
            other => scalar_text(other).map(|topic| KeyTopic {
                topic,
                ..KeyTopic::default()
            }),
        })
        .collect();

    let decisions = objects(obj, "decisions")
        .filter_map(|v| match v {
            Value::Object(d) => Some(Decision {
                description: text(d, &["description", "decision"])?,
                status: text(d, &["status"]),
                owners: string_list(d, &["owners", "owner"]),
                timecode: text(d, &["timecode", "timestamp"]),
            }),
            other => scalar_text(other).map(|description| Decision {
                description,
                ..Decision::default()
            }),
        })
        .collect();

    let action_items = objects(obj, "actionItems")
        .filter_map(|v| {
            let a = v.as_object()?;
            Some(ActionItem {
                task: text(a, &["task", "description"])?,
                owner: text(a, &["owner", "assignee"])?,
                due_date: text(a, &["dueDate", "due"]),
                timecode: text(a, &["timecode", "timestamp"]),
            })
        })
        .collect();

    MeetingSummary {
        title: text(obj, &["title", "meetingTitle"]),
        date: text(obj, &["date", "meetingDate"]),
        duration: text(obj, &["duration"]),
        summary: text(obj, &["summary", "executiveSummary"]),
        attendees,
        key_topics,
        decisions,
        action_items,
        follow_ups: string_list(obj, &["followUps", "followUpQuestions"]),
    }
}

/// `"<n>. <text>"` for numbered list items.
pub fn numbered(index: usize, text: &str) -> String {
    format!("{}. {}", index + 1, text)
}

impl ContentVariant {
    /// Document title, before filename sanitization.
    pub fn title(&self) -> &str {
        match self {
            ContentVariant::Tutorial(t) => t.title.as_deref().unwrap_or(schema_label(TUTORIAL)),
            ContentVariant::MeetingSummary(m) => {
                m.title.as_deref().unwrap_or(schema_label(MEETING_SUMMARY))
            }
            ContentVariant::Unclassified { label, .. } => label,
        }
    }

    /// Flatten the variant into the drawing order of its content.
    pub fn to_nodes(&self) -> Vec<ContentNode> {
        match self {
            ContentVariant::Tutorial(t) => tutorial_nodes(t),
            ContentVariant::MeetingSummary(m) => meeting_nodes(m),
            ContentVariant::Unclassified {
                label,
                notice,
                raw_text,
            } => {
                let mut nodes = vec![ContentNode::Title(label.clone())];
                if *notice {
                    nodes.push(ContentNode::body(FALLBACK_NOTICE));
                }
                nodes.push(ContentNode::body(raw_text.clone()));
                nodes
            }
        }
    }
}

fn tutorial_nodes(t: &Tutorial) -> Vec<ContentNode> {
    let mut nodes = vec![ContentNode::Title(
        t.title.clone().unwrap_or_else(|| schema_label(TUTORIAL).into()),
    )];
    if let Some(summary) = &t.summary {
        nodes.push(ContentNode::body(summary.clone()));
    }
    if !t.prerequisites.is_empty() {
        nodes.push(ContentNode::section("Prerequisites"));
        for (i, p) in t.prerequisites.iter().enumerate() {
            nodes.push(ContentNode::body(numbered(i, p)));
        }
    }
    for (i, step) in t.steps.iter().enumerate() {
        let n = step.number.unwrap_or(i as u32 + 1);
        nodes.push(ContentNode::subtitle(format!("Step {n}: {}", step.title)));
        if let Some(desc) = &step.description {
            nodes.push(ContentNode::body(desc.clone()));
        }
        let times: Vec<String> = [
            step.start_time.as_ref().map(|s| format!("Start: {s}")),
            step.end_time.as_ref().map(|s| format!("End: {s}")),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !times.is_empty() {
            nodes.push(ContentNode::MetaLine(times));
        }
        for id in &step.screenshot_ids {
            nodes.push(ContentNode::ShotReference(id.clone()));
        }
    }
    nodes
}

fn meeting_nodes(m: &MeetingSummary) -> Vec<ContentNode> {
    let mut nodes = vec![ContentNode::Title(
        m.title.clone().unwrap_or_else(|| schema_label(MEETING_SUMMARY).into()),
    )];
    let meta: Vec<String> = [
        m.date.as_ref().map(|d| format!("Date: {d}")),
        m.duration.as_ref().map(|d| format!("Duration: {d}")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !meta.is_empty() {
        nodes.push(ContentNode::MetaLine(meta));
    }
    if let Some(summary) = &m.summary {
        nodes.push(ContentNode::body(summary.clone()));
    }

    if !m.attendees.is_empty() {
        nodes.push(ContentNode::section("Attendees"));
        for a in &m.attendees {
            nodes.push(ContentNode::body(join_meta(&[
                Some(a.name.clone()),
                a.role.clone(),
                a.department.clone(),
            ])));
        }
    }

    if !m.key_topics.is_empty() {
        nodes.push(ContentNode::section("Key Topics"));
        let mut topics: Vec<&KeyTopic> = m.key_topics.iter().collect();
        // Vec::sort_by is stable: topics without an order keep their array position.
        topics.sort_by(|a, b| a.order.unwrap_or(0.0).total_cmp(&b.order.unwrap_or(0.0)));
        for (i, topic) in topics.into_iter().enumerate() {
            nodes.push(ContentNode::subtitle(numbered(i, &topic.topic)));
            let meta: Vec<String> = [
                topic.speaker.as_ref().map(|s| format!("Speaker: {s}")),
                topic.timecode.as_ref().map(|t| format!("Timecode: {t}")),
            ]
            .into_iter()
            .flatten()
            .collect();
            if !meta.is_empty() {
                nodes.push(ContentNode::MetaLine(meta));
            }
            if let Some(details) = &topic.details {
                nodes.push(ContentNode::body(details.clone()));
            }
        }
    }

    if !m.decisions.is_empty() {
        nodes.push(ContentNode::section("Decisions"));
        for (i, d) in m.decisions.iter().enumerate() {
            let mut lines = vec![numbered(i, &d.description)];
            lines.extend(d.status.as_ref().map(|s| format!("Status: {s}")));
            if !d.owners.is_empty() {
                lines.push(format!("Owners: {}", d.owners.join(", ")));
            }
            lines.extend(d.timecode.as_ref().map(|t| format!("Timecode: {t}")));
            nodes.push(ContentNode::body(lines.join("\n")));
        }
    }

    if !m.action_items.is_empty() {
        nodes.push(ContentNode::section("Action Items"));
        for (i, a) in m.action_items.iter().enumerate() {
            let mut lines = vec![numbered(i, &format!("{} (Owner: {})", a.task, a.owner))];
            lines.extend(a.due_date.as_ref().map(|d| format!("Due: {d}")));
            lines.extend(a.timecode.as_ref().map(|t| format!("Timecode: {t}")));
            nodes.push(ContentNode::body(lines.join("\n")));
        }
    }

    if !m.follow_ups.is_empty() {
        nodes.push(ContentNode::section("Follow Ups"));
        for (i, f) in m.follow_ups.iter().enumerate() {
            nodes.push(ContentNode::body(numbered(i, f)));
        }
    }

    nodes
}
