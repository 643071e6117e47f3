// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

/// Raw payload of a record before field parsing.
///
/// Codecs emit `Text` for anything that decodes as UTF-8; everything else
/// passes through the pipeline untouched as `Bytes`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MessageValue {
    Text(String),
    Bytes(Vec<u8>),
}

impl MessageValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageValue::Text(text) => Some(text),
            MessageValue::Bytes(_) => None,
        }
    }
}

/// Structured unit flowing to the output sink.
///
/// A freshly decoded record carries only `message` (and whatever `host` a
/// codec chose to set). Field parsing replaces `message` with the derived
/// `name`, `value`, `kind` and `tags` fields and fills in `host` from the
/// sender address when absent; `message` is always `None` once parsing
/// completes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<(String, String)>>,
}

impl Record {
    #[must_use]
    pub fn from_text(message: impl Into<String>) -> Self {
        Record {
            message: Some(MessageValue::Text(message.into())),
            ..Record::default()
        }
    }

    #[must_use]
    pub fn from_bytes(payload: &[u8]) -> Self {
        Record {
            message: Some(MessageValue::Bytes(payload.to_vec())),
            ..Record::default()
        }
    }
}
