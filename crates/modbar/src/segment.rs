// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The segment model (§4.A): the atomic display unit, plus the `Output` /
//! `Group` / `TimedOutput` contracts built on top of it.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::event::ClickEvent;
use crate::timing::Instant;

bitflags! {
    /// Tracks which optional attributes have been explicitly set, distinct
    /// from "unset" even when the explicit value equals the type's default
    /// (e.g. `urgent(false)` is set; never calling `set_urgent` is not).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SetBits: u32 {
        const SHORT_TEXT = 1 << 0;
        const COLOR      = 1 << 1;
        const BACKGROUND = 1 << 2;
        const BORDER     = 1 << 3;
        const MIN_WIDTH  = 1 << 4;
        const ALIGN      = 1 << 5;
        const URGENT     = 1 << 6;
        const SEPARATOR  = 1 << 7;
        const PADDING    = 1 << 8;
        const IDENTIFIER = 1 << 9;
        const ERROR      = 1 << 10;
    }
}

/// A 24- or 32-bit color, or the "unset" sentinel that clears the attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Clears the attribute so the host applies its own default.
    Unset,
    /// 24-bit `0xRRGGBB`.
    Rgb(u32),
    /// 32-bit `0xRRGGBBAA`.
    Rgba(u32),
}

impl Color {
    pub fn is_unset(self) -> bool {
        matches!(self, Color::Unset)
    }

    pub fn to_hex(self) -> Option<String> {
        match self {
            Color::Unset => None,
            Color::Rgb(v) => Some(format!("#{:06x}", v & 0x00ff_ffff)),
            Color::Rgba(v) => Some(format!("#{:08x}", v)),
        }
    }
}

/// Either a pixel count or an opaque placeholder string used to size a
/// segment by measuring some representative text (e.g. `"100%"` for a
/// battery module, so the block doesn't jitter in width).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinWidth {
    Pixels(i64),
    Placeholder(String),
}

/// Text alignment within a segment's allotted width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Start,
    Center,
    End,
}

impl Align {
    fn wire_str(self) -> &'static str {
        match self {
            Align::Start => "left",
            Align::Center => "center",
            Align::End => "right",
        }
    }
}

/// A non-null error value attached to a segment makes it an "error segment".
pub type SegmentError = String;

/// `Fn(ClickEvent)` click handler, shared so a `Segment::clone()` can keep
/// pointing at the same handler without re-allocating it.
pub type ClickHandler = Arc<dyn Fn(ClickEvent) + Send + Sync>;

const DEFAULT_SEPARATOR: bool = true;
const DEFAULT_PADDING: i64 = 9;

/// The atomic display unit (§3, §4.A). All setters mutate in place and
/// return `&mut Self` for chaining; `clone()` produces an independent deep
/// copy (the click handler is reference-counted, so cloning is cheap and
/// both copies still invoke the same handler).
#[derive(Clone)]
pub struct Segment {
    text: String,
    is_markup: bool,
    short_text: Option<String>,
    color: Option<Color>,
    background: Option<Color>,
    border: Option<Color>,
    min_width: Option<MinWidth>,
    align: Option<Align>,
    urgent: Option<bool>,
    separator: Option<bool>,
    padding: Option<i64>,
    identifier: Option<String>,
    error: Option<SegmentError>,
    click: Option<ClickHandler>,
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("text", &self.text)
            .field("is_markup", &self.is_markup)
            .field("short_text", &self.short_text)
            .field("color", &self.color)
            .field("background", &self.background)
            .field("border", &self.border)
            .field("min_width", &self.min_width)
            .field("align", &self.align)
            .field("urgent", &self.urgent)
            .field("separator", &self.separator)
            .field("padding", &self.padding)
            .field("identifier", &self.identifier)
            .field("error", &self.error)
            .field("has_click", &self.click.is_some())
            .finish()
    }
}

impl Segment {
    fn blank(text: String, is_markup: bool) -> Self {
        Self {
            text,
            is_markup,
            short_text: None,
            color: None,
            background: None,
            border: None,
            min_width: None,
            align: None,
            urgent: None,
            separator: None,
            padding: None,
            identifier: None,
            error: None,
            click: None,
        }
    }

    /// Construct a plain-text segment.
    pub fn text(text: impl Into<String>) -> Self {
        Self::blank(text.into(), false)
    }

    /// Construct a Pango-markup segment.
    pub fn markup(text: impl Into<String>) -> Self {
        Self::blank(text.into(), true)
    }

    pub fn text_value(&self) -> &str {
        &self.text
    }

    pub fn is_markup(&self) -> bool {
        self.is_markup
    }

    pub fn set_short_text(&mut self, s: impl Into<String>) -> &mut Self {
        self.short_text = Some(s.into());
        self
    }

    pub fn short_text(&self) -> (Option<&str>, bool) {
        (self.short_text.as_deref(), self.short_text.is_some())
    }

    pub fn set_color(&mut self, c: Color) -> &mut Self {
        self.color = if c.is_unset() { None } else { Some(c) };
        self
    }

    pub fn color(&self) -> (Color, bool) {
        (self.color.unwrap_or(Color::Unset), self.color.is_some())
    }

    pub fn set_background(&mut self, c: Color) -> &mut Self {
        self.background = if c.is_unset() { None } else { Some(c) };
        self
    }

    pub fn background(&self) -> (Color, bool) {
        (self.background.unwrap_or(Color::Unset), self.background.is_some())
    }

    pub fn set_border(&mut self, c: Color) -> &mut Self {
        self.border = if c.is_unset() { None } else { Some(c) };
        self
    }

    pub fn border(&self) -> (Color, bool) {
        (self.border.unwrap_or(Color::Unset), self.border.is_some())
    }

    pub fn set_min_width(&mut self, w: MinWidth) -> &mut Self {
        self.min_width = Some(w);
        self
    }

    pub fn min_width(&self) -> (Option<&MinWidth>, bool) {
        (self.min_width.as_ref(), self.min_width.is_some())
    }

    pub fn set_align(&mut self, a: Align) -> &mut Self {
        self.align = Some(a);
        self
    }

    pub fn align(&self) -> (Align, bool) {
        (self.align.unwrap_or(Align::Start), self.align.is_some())
    }

    pub fn set_urgent(&mut self, b: bool) -> &mut Self {
        self.urgent = Some(b);
        self
    }

    pub fn urgent(&self) -> (bool, bool) {
        (self.urgent.unwrap_or(false), self.urgent.is_some())
    }

    pub fn set_separator(&mut self, b: bool) -> &mut Self {
        self.separator = Some(b);
        self
    }

    pub fn separator(&self) -> (bool, bool) {
        (self.separator.unwrap_or(DEFAULT_SEPARATOR), self.separator.is_some())
    }

    /// Padding in pixels after the block (wire field `separator_block_width`).
    pub fn set_padding(&mut self, px: i64) -> &mut Self {
        self.padding = Some(px);
        self
    }

    pub fn padding(&self) -> (i64, bool) {
        (self.padding.unwrap_or(DEFAULT_PADDING), self.padding.is_some())
    }

    /// Opaque identifier (wire field `instance`).
    pub fn set_identifier(&mut self, s: impl Into<String>) -> &mut Self {
        self.identifier = Some(s.into());
        self
    }

    pub fn identifier(&self) -> (Option<&str>, bool) {
        (self.identifier.as_deref(), self.identifier.is_some())
    }

    /// Attach or clear the segment's error value. A non-null error makes
    /// this an "error segment" (§3).
    pub fn set_error(&mut self, err: Option<SegmentError>) -> &mut Self {
        self.error = err;
        self
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Attach a click handler.
    pub fn on_click<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(ClickEvent) + Send + Sync + 'static,
    {
        self.click = Some(Arc::new(handler));
        self
    }

    /// Invoke the attached click handler, if any; a no-op otherwise.
    pub fn click(&self, event: ClickEvent) {
        if let Some(handler) = &self.click {
            handler(event);
        }
    }

    pub fn has_click(&self) -> bool {
        self.click.is_some()
    }

    /// Clone of the attached handler, if any — used by the core module
    /// wrapper to compose a decorated handler on top of the original one.
    pub fn click_handler(&self) -> Option<ClickHandler> {
        self.click.clone()
    }

    /// The set-bits mask for every optional attribute (§3 invariant 1).
    pub fn set_bits(&self) -> SetBits {
        let mut bits = SetBits::empty();
        bits.set(SetBits::SHORT_TEXT, self.short_text.is_some());
        bits.set(SetBits::COLOR, self.color.is_some());
        bits.set(SetBits::BACKGROUND, self.background.is_some());
        bits.set(SetBits::BORDER, self.border.is_some());
        bits.set(SetBits::MIN_WIDTH, self.min_width.is_some());
        bits.set(SetBits::ALIGN, self.align.is_some());
        bits.set(SetBits::URGENT, self.urgent.is_some());
        bits.set(SetBits::SEPARATOR, self.separator.is_some());
        bits.set(SetBits::PADDING, self.padding.is_some());
        bits.set(SetBits::IDENTIFIER, self.identifier.is_some());
        bits.set(SetBits::ERROR, self.error.is_some());
        bits
    }

    pub(crate) fn wire_align(&self) -> Option<&'static str> {
        self.align.map(Align::wire_str)
    }
}

/// Anything that produces an ordered list of segments (§3).
pub trait Output: Send {
    fn segments(&self) -> Vec<Segment>;

    /// Returns `Some` if this output is also a [`TimedOutput`]. Types that
    /// implement `TimedOutput` should override this to return `Some(self)`;
    /// it is the compile-time alternative to runtime downcasting (§9).
    fn as_timed(&self) -> Option<&dyn TimedOutput> {
        None
    }
}

impl Output for Segment {
    fn segments(&self) -> Vec<Segment> {
        vec![self.clone()]
    }
}

/// An `Output` that additionally advertises when it next wants to be
/// re-rendered (§3). A zero instant means "static, no further refresh".
pub trait TimedOutput: Output {
    fn next_refresh(&self) -> Instant;
}

/// An ordered sequence of segments with group-wide operations (§3).
#[derive(Clone, Default)]
pub struct Group {
    segments: Vec<Segment>,
}

impl Group {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn members(&self) -> &[Segment] {
        &self.segments
    }

    pub fn members_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }

    /// Set `color` on every member.
    pub fn set_color_all(&mut self, c: Color) -> &mut Self {
        for seg in &mut self.segments {
            seg.set_color(c);
        }
        self
    }

    /// Distribute `total_px` evenly across members as `MinWidth::Pixels`,
    /// with any remainder going to the earliest members (§8 testable
    /// property 9): for N members and remainder R, the first R members get
    /// `total_px / N + 1` and the rest get `total_px / N`.
    pub fn distribute_min_width(&mut self, total_px: i64) -> &mut Self {
        let n = self.segments.len() as i64;
        if n == 0 {
            return self;
        }
        let base = total_px / n;
        let remainder = total_px % n;
        for (i, seg) in self.segments.iter_mut().enumerate() {
            let extra = if (i as i64) < remainder { 1 } else { 0 };
            seg.set_min_width(MinWidth::Pixels(base + extra));
        }
        self
    }

    /// Turn off the separator on every member except the last, so the group
    /// renders as one visually contiguous block with a trailing separator.
    pub fn set_inner_separators_off(&mut self) -> &mut Self {
        let last = self.segments.len().saturating_sub(1);
        for (i, seg) in self.segments.iter_mut().enumerate() {
            if i != last {
                seg.set_separator(false);
            }
        }
        self
    }
}

impl Output for Group {
    fn segments(&self) -> Vec<Segment> {
        self.segments.clone()
    }
}

#[cfg(test)]
#[path = "segment_tests.rs"]
mod tests;
