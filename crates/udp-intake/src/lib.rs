// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! UDP datagram intake pipeline.
//!
//! A single listening socket feeds a bounded queue drained by a fixed pool of
//! decode workers. Each worker owns a private codec instance, turns datagrams
//! into structured [`record::Record`]s through the delimited message parser,
//! and forwards them to an [`sink::OutputSink`]. The bounded queue is the only
//! backpressure mechanism: when the workers fall behind, the listener blocks
//! on the queue and the kernel socket buffer absorbs (or drops) the overflow.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod codec;
pub mod config;
pub mod errors;
mod listener;
pub mod metrics;
pub mod parser;
pub mod record;
pub mod server;
pub mod sink;
