// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::net::AddrParseError;
use thiserror::Error;

/// Rejected configuration. All variants are caught before any socket is
/// opened.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("host '{host}' is not an IPv4 or IPv6 literal: {source}")]
    InvalidHost {
        host: String,
        source: AddrParseError,
    },
    #[error("workers must be greater than zero")]
    ZeroWorkers,
    #[error("queue_size must be greater than zero")]
    ZeroQueueSize,
    #[error("buffer_size must be greater than zero")]
    ZeroBufferSize,
}

/// Failure raised by a codec while decoding a datagram. Any such error
/// terminates the worker that hit it.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}
