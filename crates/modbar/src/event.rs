// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Click events delivered from the host window manager on stdin, and the
//! button-number conventions the core and its consumers agree on.

use serde::Deserialize;

/// Left mouse button.
pub const BUTTON_LEFT: i32 = 1;
/// Middle mouse button.
pub const BUTTON_MIDDLE: i32 = 2;
/// Right mouse button.
pub const BUTTON_RIGHT: i32 = 3;
/// Scroll wheel up.
pub const BUTTON_SCROLL_UP: i32 = 4;
/// Scroll wheel down.
pub const BUTTON_SCROLL_DOWN: i32 = 5;
/// Back side button.
pub const BUTTON_SIDE_BACK: i32 = 8;
/// Forward side button.
pub const BUTTON_SIDE_FORWARD: i32 = 9;

/// Returns true if `button` is left, middle, or right — the three buttons
/// that qualify for module restart (§4.F) and refresh wiring.
pub fn is_primary_button(button: i32) -> bool {
    matches!(button, BUTTON_LEFT | BUTTON_MIDDLE | BUTTON_RIGHT)
}

/// A click event as handed to handlers, mapped from the wire shape (§6):
/// `x`/`y` are relative to the block, `screen_x`/`screen_y` are absolute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickEvent {
    pub button: i32,
    pub x: i64,
    pub y: i64,
    pub screen_x: i64,
    pub screen_y: i64,
    pub width: i64,
    pub height: i64,
}

/// Raw wire-format event object (§6), decoded as-is from stdin by the codec.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawClickEvent {
    pub name: Option<String>,
    #[serde(default)]
    pub button: i32,
    #[serde(default)]
    pub relative_x: i64,
    #[serde(default)]
    pub relative_y: i64,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub height: i64,
    #[serde(default)]
    pub x: i64,
    #[serde(default)]
    pub y: i64,
}

impl RawClickEvent {
    /// Map wire fields into the internal [`ClickEvent`] shape (§6).
    pub fn to_click_event(&self) -> ClickEvent {
        ClickEvent {
            button: self.button,
            x: self.relative_x,
            y: self.relative_y,
            screen_x: self.x,
            screen_y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    /// The full decoded frame: the host-assigned `name` used for click
    /// routing, plus the mapped [`ClickEvent`] a handler actually sees.
    pub fn to_click_frame(&self) -> ClickFrame {
        ClickFrame { name: self.name.clone(), event: self.to_click_event() }
    }
}

/// A decoded incoming click (§4.I): the opaque `name` the host assigned at
/// the emission that produced the clicked segment, plus the event itself.
/// `name` is used only for dispatch — handlers never see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickFrame {
    pub name: Option<String>,
    pub event: ClickEvent,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
