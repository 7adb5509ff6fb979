//! Video and bubble data as delivered by the content pipeline
//!
//! Loading is lenient per bubble: a malformed bubble is logged and skipped,
//! the rest of the video still loads.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Number of answer options a drag bubble carries
pub const OPTION_COUNT: usize = 2;

/// A timestamped two-option question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bubble {
    pub id: String,
    /// Offset into the video (ms) at which the bubble becomes due
    pub trigger_offset_ms: u64,
    /// Tiebreak between bubbles sharing a trigger offset
    #[serde(default)]
    pub order: Option<i64>,
    pub prompt: String,
    pub options: [String; OPTION_COUNT],
    /// Index into `options` (0 or 1)
    pub correct_answer_index: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl Bubble {
    /// Index of the option with the given text, if any
    pub fn option_index_of(&self, text: &str) -> Option<usize> {
        self.options.iter().position(|o| o == text)
    }

    /// Whether `option_index` is the correct answer
    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.correct_answer_index
    }

    /// Presentation order key: trigger offset, then explicit order (unordered last)
    fn sort_key(&self) -> (u64, bool, i64) {
        (
            self.trigger_offset_ms,
            self.order.is_none(),
            self.order.unwrap_or(0),
        )
    }

    /// Parse a single bubble from untrusted JSON
    pub fn from_value(value: &Value) -> Result<Self> {
        let id = match value.get("id") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(malformed("<unknown>", "missing id")),
        };

        let trigger_offset_ms = match value.get("triggerOffsetMs") {
            Some(Value::Number(n)) => match (n.as_u64(), n.as_f64()) {
                (Some(ms), _) => ms,
                (None, Some(ms)) if ms.is_finite() && ms >= 0.0 => ms.round() as u64,
                _ => return Err(malformed(&id, "triggerOffsetMs must be a non-negative number")),
            },
            _ => return Err(malformed(&id, "triggerOffsetMs must be a non-negative number")),
        };

        let order = match value.get("order") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => n.as_i64(),
            Some(_) => return Err(malformed(&id, "order must be a number")),
        };

        let prompt = match value.get("prompt") {
            Some(Value::String(s)) => s.clone(),
            _ => return Err(malformed(&id, "missing prompt")),
        };

        let options: Vec<String> = match value.get("options") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_owned))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| malformed(&id, "options must be strings"))?,
            _ => return Err(malformed(&id, "missing options")),
        };
        let options: [String; OPTION_COUNT] = options.try_into().map_err(|v: Vec<String>| {
            malformed(&id, &format!("expected {OPTION_COUNT} options, got {}", v.len()))
        })?;

        let correct_answer_index = match value.get("correctAnswerIndex").and_then(Value::as_u64) {
            Some(i) if (i as usize) < OPTION_COUNT => i as usize,
            _ => return Err(malformed(&id, "correctAnswerIndex must be 0 or 1")),
        };

        let explanation = value
            .get("explanation")
            .and_then(Value::as_str)
            .map(str::to_owned);

        Ok(Self {
            id,
            trigger_offset_ms,
            order,
            prompt,
            options,
            correct_answer_index,
            explanation,
        })
    }
}

fn malformed(id: &str, reason: &str) -> Error {
    Error::MalformedBubble {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

/// An immutable video with its ordered bubbles
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub duration_ms: u64,
    bubbles: Vec<Bubble>,
}

impl Video {
    /// Build a video, ordering bubbles and dropping duplicate ids
    pub fn new(id: impl Into<String>, duration_ms: u64, bubbles: Vec<Bubble>) -> Self {
        let mut seen = HashSet::new();
        let mut bubbles: Vec<Bubble> = bubbles
            .into_iter()
            .filter(|b| {
                let fresh = seen.insert(b.id.clone());
                if !fresh {
                    log::warn!("Dropping duplicate bubble id {}", b.id);
                }
                fresh
            })
            .collect();
        // Stable: full ties keep their authored order
        bubbles.sort_by_key(Bubble::sort_key);

        Self {
            id: id.into(),
            duration_ms,
            bubbles,
        }
    }

    /// Bubbles in presentation order
    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    /// Parse a video, skipping malformed bubbles
    pub fn from_value(value: &Value) -> Result<Self> {
        let id = match value.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(Error::InvalidVideo("missing id".into())),
        };
        let duration_ms = value
            .get("durationMs")
            .and_then(Value::as_f64)
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|d| d.round() as u64)
            .ok_or_else(|| Error::InvalidVideo(format!("video {id}: missing durationMs")))?;

        let raw_bubbles = match value.get("bubbles") {
            Some(Value::Array(items)) => items.as_slice(),
            None | Some(Value::Null) => &[],
            Some(_) => {
                return Err(Error::InvalidVideo(format!(
                    "video {id}: bubbles must be an array"
                )));
            }
        };

        let bubbles = raw_bubbles
            .iter()
            .filter_map(|raw| match Bubble::from_value(raw) {
                Ok(bubble) => Some(bubble),
                Err(e) => {
                    log::warn!("Skipping bubble in video {}: {}", id, e);
                    None
                }
            })
            .collect();

        Ok(Self::new(id, duration_ms, bubbles))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Host playback clock as observed by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackClock {
    pub current_time_ms: u64,
    pub previous_time_ms: u64,
    pub is_playing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bubble(id: &str, at: u64, order: Option<i64>) -> Bubble {
        Bubble {
            id: id.into(),
            trigger_offset_ms: at,
            order,
            prompt: "Q".into(),
            options: ["True".into(), "False".into()],
            correct_answer_index: 0,
            explanation: None,
        }
    }

    #[test]
    fn test_video_orders_by_offset_then_order() {
        let video = Video::new(
            "v",
            10_000,
            vec![
                bubble("c", 5000, None),
                bubble("b", 5000, Some(2)),
                bubble("a", 5000, Some(1)),
                bubble("z", 1000, None),
            ],
        );
        let ids: Vec<_> = video.bubbles().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["z", "a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_ids_dropped() {
        let video = Video::new("v", 1, vec![bubble("a", 10, None), bubble("a", 20, None)]);
        assert_eq!(video.bubbles().len(), 1);
        assert_eq!(video.bubbles()[0].trigger_offset_ms, 10);
    }

    #[test]
    fn test_malformed_bubbles_skipped() {
        let json = json!({
            "id": "vid",
            "durationMs": 30000,
            "bubbles": [
                {"id": "ok", "triggerOffsetMs": 5000, "prompt": "Sky is blue",
                 "options": ["True", "False"], "correctAnswerIndex": 0},
                {"id": "short", "triggerOffsetMs": 6000, "prompt": "?",
                 "options": ["Only"], "correctAnswerIndex": 0},
                {"id": "nan", "triggerOffsetMs": "soon", "prompt": "?",
                 "options": ["a", "b"], "correctAnswerIndex": 1},
                {"id": "idx", "triggerOffsetMs": 7000, "prompt": "?",
                 "options": ["a", "b"], "correctAnswerIndex": 2}
            ]
        });
        let video = Video::from_value(&json).unwrap();
        assert_eq!(video.bubbles().len(), 1);
        assert_eq!(video.bubbles()[0].id, "ok");
    }

    #[test]
    fn test_missing_duration_is_invalid() {
        let err = Video::from_json(r#"{"id": "v", "bubbles": []}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidVideo(_)));
    }

    #[test]
    fn test_option_lookup() {
        let b = bubble("a", 0, None);
        assert_eq!(b.option_index_of("False"), Some(1));
        assert_eq!(b.option_index_of("Maybe"), None);
        assert!(b.is_correct(0));
        assert!(!b.is_correct(1));
    }
}
