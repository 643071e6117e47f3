// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delimited message field parser.
//!
//! Messages follow a small pipe-separated grammar:
//!
//! ```text
//! message := nameValue ["|" type ["|" tagList]]
//! nameValue := name ":" value
//! tagList := tag ("," tag)*
//! ```
//!
//! `"cpu:0.95|gauge|#env:prod"` parses into name `cpu`, value `0.95`, kind
//! `gauge` and tags `[("env", "prod")]`. Anything past the third segment is
//! ignored. A record whose message is not text passes through unmodified.

use std::net::SocketAddr;

use crate::record::{MessageValue, Record};

/// Replaces a record's raw `message` with the derived fields and assigns
/// `host` from the sender when the record does not already carry one.
///
/// Degenerate inputs are not errors: a missing `:` yields an empty value, a
/// missing type segment yields no `kind`, and an empty message yields an
/// empty name.
pub fn apply_fields(record: &mut Record, sender: &SocketAddr) {
    let message = match record.message.take() {
        Some(MessageValue::Text(text)) => text,
        other => {
            record.message = other;
            return;
        }
    };

    let mut segments = message.split('|');
    let mut name_value = segments.next().unwrap_or("").split(':');
    record.name = Some(name_value.next().unwrap_or("").to_string());
    record.value = Some(name_value.next().unwrap_or("").to_string());
    record.kind = segments.next().map(str::to_string);
    record.tags = segments.next().map(parse_tags);

    if record.host.is_none() {
        record.host = Some(sender.ip().to_string());
    }
}

fn parse_tags(section: &str) -> Vec<(String, String)> {
    section
        .split(',')
        .filter(|tag| !tag.is_empty())
        .map(|tag| {
            let mut parts = tag.splitn(2, ':');
            let key = parts
                .next()
                .unwrap_or("")
                .trim_start_matches('#')
                .to_string();
            let value = parts.next().unwrap_or("").to_string();
            (key, value)
        })
        .collect()
}
