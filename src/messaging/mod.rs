//! Tagged messages exchanged between the popup, the background worker and
//! the page contexts. Every payload is JSON with a `type` tag.

pub mod router;

pub use router::{decode, ContextHandle, Envelope, TabRegistry, UNKNOWN_MESSAGE_TYPE};

use crate::looper::SyncState;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message family one context knows how to handle.
pub trait Request: DeserializeOwned {
    /// Every `type` tag in the family.
    const TAGS: &'static [&'static str];
}

/// Requests served by the content script of a player tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentRequest {
    GetCurrentTime,
    GetStatus,
    ToggleLoop {
        enabled: bool,
    },
    #[serde(rename_all = "camelCase")]
    SetLoopPoints {
        point_a: Option<f64>,
        point_b: Option<f64>,
    },
    ClearLoopPoints,
    JumpToTime {
        time: f64,
    },
    InitState {
        state: SyncState,
    },
}

impl Request for ContentRequest {
    const TAGS: &'static [&'static str] = &[
        "GET_CURRENT_TIME",
        "GET_STATUS",
        "TOGGLE_LOOP",
        "SET_LOOP_POINTS",
        "CLEAR_LOOP_POINTS",
        "JUMP_TO_TIME",
        "INIT_STATE",
    ];
}

/// Storage requests served by the background worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackgroundRequest {
    GetStorage {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
    SetStorage {
        key: String,
        #[serde(default)]
        data: Value,
    },
    ClearStorage {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
}

impl Request for BackgroundRequest {
    const TAGS: &'static [&'static str] = &["GET_STORAGE", "SET_STORAGE", "CLEAR_STORAGE"];
}

/// The generic `{success, data|error}` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Outcome {
    pub fn ok() -> Self {
        Self::done(true)
    }

    pub fn done(success: bool) -> Self {
        Self {
            success,
            data: None,
            error: None,
        }
    }

    pub fn with_data(data: Option<Value>) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Reply to `GET_CURRENT_TIME`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeReply {
    pub time: f64,
}
