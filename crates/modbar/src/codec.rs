// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The i3bar JSON streaming protocol codec (§4.I, §6): the header line, the
//! never-closing array of segment-array updates written to stdout, and the
//! never-closing array of click events read from stdin.

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::HostError;
use crate::event::{ClickFrame, RawClickEvent};
use crate::segment::{MinWidth, Segment};

/// The single line written before the update stream begins (§6).
#[derive(Debug, Clone, Default)]
pub struct Header {
    pub stop_signal: Option<i32>,
    pub cont_signal: Option<i32>,
}

#[derive(Serialize)]
struct WireHeader {
    version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_signal: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cont_signal: Option<i32>,
    click_events: bool,
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireMinWidth {
    Pixels(i64),
    Text(String),
}

#[derive(Serialize)]
struct WireSegment {
    full_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    short_text: Option<String>,
    markup: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    border: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_width: Option<WireMinWidth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    align: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    urgent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    separator: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    separator_block_width: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

/// `name` is assigned by the host at emission time (§3, §6); it is never
/// derived from the segment itself, unlike every other wire field.
fn to_wire(seg: &Segment, name: Option<String>) -> WireSegment {
    WireSegment {
        full_text: seg.text_value().to_owned(),
        short_text: seg.short_text().0.map(str::to_owned),
        markup: if seg.is_markup() { "pango" } else { "none" },
        color: seg.color().0.to_hex(),
        background: seg.background().0.to_hex(),
        border: seg.border().0.to_hex(),
        min_width: seg.min_width().0.map(|w| match w {
            MinWidth::Pixels(px) => WireMinWidth::Pixels(*px),
            MinWidth::Placeholder(s) => WireMinWidth::Text(s.clone()),
        }),
        align: seg.wire_align(),
        urgent: seg.urgent().1.then_some(seg.urgent().0),
        separator: seg.separator().1.then_some(seg.separator().0),
        separator_block_width: seg.padding().1.then_some(seg.padding().0),
        instance: seg.identifier().0.map(str::to_owned),
        name,
    }
}

/// Writes the i3bar header and subsequent updates to an async sink (§4.I,
/// §6). Every update is a JSON array followed by a literal `,\n`, since the
/// outer array is never closed (§6, S1).
pub struct Encoder<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Encoder { writer }
    }

    pub async fn write_header(&mut self, header: &Header) -> Result<(), HostError> {
        let wire = WireHeader {
            version: 1,
            stop_signal: header.stop_signal,
            cont_signal: header.cont_signal,
            click_events: true,
        };
        let line = serde_json::to_string(&wire).map_err(|e| HostError::Protocol(e.to_string()))?;
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n[\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Write one emission: each segment paired with the host-assigned name
    /// (if any) that the click table keys on for that segment (§4.H `print`).
    pub async fn write_update(&mut self, segments: &[(Segment, Option<String>)]) -> Result<(), HostError> {
        let wire: Vec<WireSegment> = segments.iter().map(|(seg, name)| to_wire(seg, name.clone())).collect();
        let line = serde_json::to_string(&wire).map_err(|e| HostError::Protocol(e.to_string()))?;
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b",\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// Reads click events from stdin's never-closing JSON array (§6). Tolerates
/// the leading `[` line and stray commas the way i3bar's own writers emit
/// them, and skips any line that doesn't parse rather than failing the
/// whole stream.
pub struct ClickDecoder<R> {
    lines: tokio::io::Lines<BufReader<R>>,
    seen_open_bracket: bool,
}

impl<R: tokio::io::AsyncRead + Unpin> ClickDecoder<R> {
    pub fn new(reader: R) -> Self {
        ClickDecoder { lines: BufReader::new(reader).lines(), seen_open_bracket: false }
    }

    pub async fn next_event(&mut self) -> Result<Option<ClickFrame>, HostError> {
        loop {
            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !self.seen_open_bracket && trimmed == "[" {
                self.seen_open_bracket = true;
                continue;
            }
            self.seen_open_bracket = true;
            let trimmed = trimmed.trim_start_matches(',').trim_end_matches(',').trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawClickEvent>(trimmed) {
                Ok(raw) => return Ok(Some(raw.to_click_frame())),
                Err(_) => continue,
            }
        }
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
