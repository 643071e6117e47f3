// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Pluggable datagram codecs.
//!
//! A codec turns one raw datagram into zero or more [`Record`]s. Codecs are
//! not assumed safe for concurrent use; every worker owns a private clone and
//! calls `flush` after each `decode` to drain any buffered partial state.

use crate::errors::DecodeError;
use crate::record::Record;

pub trait Codec: Send + Sync {
    /// Decodes one datagram payload, invoking `out` once per yielded record.
    fn decode(&mut self, payload: &[u8], out: &mut dyn FnMut(Record)) -> Result<(), DecodeError>;

    /// Drains any partial state buffered across `decode` calls.
    fn flush(&mut self, out: &mut dyn FnMut(Record)) -> Result<(), DecodeError>;

    /// A fresh, independent instance for a worker to own.
    fn clone_codec(&self) -> Box<dyn Codec>;
}

/// Default codec: one record per datagram.
///
/// Valid UTF-8 payloads become text messages; anything else is forwarded as
/// raw bytes and skips field parsing downstream.
#[derive(Clone, Debug, Default)]
pub struct PlainCodec;

impl Codec for PlainCodec {
    fn decode(&mut self, payload: &[u8], out: &mut dyn FnMut(Record)) -> Result<(), DecodeError> {
        match std::str::from_utf8(payload) {
            Ok(text) => out(Record::from_text(text)),
            Err(_) => out(Record::from_bytes(payload)),
        }
        Ok(())
    }

    fn flush(&mut self, _out: &mut dyn FnMut(Record)) -> Result<(), DecodeError> {
        Ok(())
    }

    fn clone_codec(&self) -> Box<dyn Codec> {
        Box::new(self.clone())
    }
}

/// Newline-splitting codec: one record per line, one datagram may carry many.
///
/// A trailing line without `\n` is buffered until the next `decode` or
/// `flush`. Rejects payloads that are not UTF-8.
#[derive(Clone, Debug, Default)]
pub struct LinesCodec {
    partial: String,
}

impl Codec for LinesCodec {
    fn decode(&mut self, payload: &[u8], out: &mut dyn FnMut(Record)) -> Result<(), DecodeError> {
        let text = std::str::from_utf8(payload)?;
        self.partial.push_str(text);
        while let Some(end) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=end).collect();
            let line = line.trim_end_matches(['\n', '\r']);
            if !line.is_empty() {
                out(Record::from_text(line));
            }
        }
        Ok(())
    }

    fn flush(&mut self, out: &mut dyn FnMut(Record)) -> Result<(), DecodeError> {
        if !self.partial.is_empty() {
            out(Record::from_text(std::mem::take(&mut self.partial)));
        }
        Ok(())
    }

    fn clone_codec(&self) -> Box<dyn Codec> {
        Box::new(self.clone())
    }
}
