// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::net::IpAddr;

use serde::Deserialize;

use crate::errors::ConfigError;

/// Configuration for the UDP intake pipeline.
///
/// `port` is the only required option; everything else carries the defaults
/// below. The bind host must be an IP literal, not a hostname.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct IntakeConfig {
    /// Address the listener binds to (e.g., "0.0.0.0" or "::")
    #[serde(default = "default_host")]
    pub host: String,
    /// Port the listener binds to. Ports below 1024 may require elevated
    /// privileges.
    pub port: u16,
    /// Maximum packet size read from the network, in bytes
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Requested kernel socket receive buffer size (SO_RCVBUF), in bytes.
    /// When unset the operating system default is used; when the OS does not
    /// honor the exact request a warning is logged and the effective size is
    /// kept.
    #[serde(default)]
    pub receive_buffer_bytes: Option<usize>,
    /// Number of decode workers draining the intake queue
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Number of unprocessed datagrams held in memory before the listener
    /// blocks on the queue
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_buffer_size() -> usize {
    65536
}

fn default_workers() -> usize {
    2
}

fn default_queue_size() -> usize {
    2000
}

impl IntakeConfig {
    /// Configuration for `port` with every other option at its default.
    #[must_use]
    pub fn new(port: u16) -> Self {
        IntakeConfig {
            host: default_host(),
            port,
            buffer_size: default_buffer_size(),
            receive_buffer_bytes: None,
            workers: default_workers(),
            queue_size: default_queue_size(),
        }
    }

    /// The bind host as a parsed IP literal.
    pub fn bind_ip(&self) -> Result<IpAddr, ConfigError> {
        self.host.parse().map_err(|source| ConfigError::InvalidHost {
            host: self.host.clone(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_ip()?;
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.queue_size == 0 {
            return Err(ConfigError::ZeroQueueSize);
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::ZeroBufferSize);
        }
        Ok(())
    }
}
