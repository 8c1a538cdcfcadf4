// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

use tokio::io::AsyncWriteExt;

use super::*;
use crate::segment::{Align, Color, MinWidth};

#[tokio::test]
async fn header_advertises_click_events_and_opens_the_array() {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    enc.write_header(&Header { stop_signal: Some(10), cont_signal: Some(12) }).await.unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.starts_with(r#"{"version":1,"stop_signal":10,"cont_signal":12,"click_events":true}"#));
    assert!(text.ends_with("\n[\n"));
}

#[tokio::test]
async fn every_update_line_ends_with_a_trailing_comma() {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    enc.write_update(&[(Segment::text("a"), None)]).await.unwrap();
    enc.write_update(&[(Segment::text("b"), None)]).await.unwrap();
    let text = String::from_utf8(buf).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().ends_with(','));
    assert!(lines.next().unwrap().ends_with(','));
}

#[tokio::test]
async fn segment_fields_map_to_the_wire_shape() {
    let mut seg = Segment::markup("hi");
    seg.set_short_text("h");
    seg.set_color(Color::Rgb(0x112233));
    seg.set_min_width(MinWidth::Pixels(42));
    seg.set_align(Align::Center);
    seg.set_urgent(true);
    seg.set_identifier("load/0");

    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    enc.write_update(&[(seg, Some("m/0".to_owned()))]).await.unwrap();
    let text = String::from_utf8(buf).unwrap();

    assert!(text.contains(r#""full_text":"hi""#));
    assert!(text.contains(r#""short_text":"h""#));
    assert!(text.contains(r#""markup":"pango""#));
    assert!(text.contains(r#""color":"#112233""#));
    assert!(text.contains(r#""min_width":42"#));
    assert!(text.contains(r#""align":"center""#));
    assert!(text.contains(r#""urgent":true"#));
    assert!(text.contains(r#""instance":"load/0""#));
    assert!(text.contains(r#""name":"m/0""#));
}

#[tokio::test]
async fn untouched_attributes_are_omitted_from_the_wire_object() {
    let seg = Segment::text("hello");
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    enc.write_update(&[(seg, Some("m/0".to_owned()))]).await.unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text, r#"[{"full_text":"hello","markup":"none","name":"m/0"}]"#.to_owned() + "\n");
}

#[tokio::test]
async fn placeholder_min_width_serializes_as_a_string() {
    let mut seg = Segment::text("hi");
    seg.set_min_width(MinWidth::Placeholder("100%".to_owned()));
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    enc.write_update(&[(seg, None)]).await.unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains(r#""min_width":"100%""#));
}

#[tokio::test]
async fn click_decoder_skips_the_opening_bracket_and_stray_commas() {
    let (mut client, server) = tokio::io::duplex(4096);
    client.write_all(b"[\n").await.unwrap();
    client.write_all(br#"{"name":"m/0","button":1,"relative_x":3,"relative_y":4,"width":1,"height":1,"x":10,"y":20},"#).await.unwrap();
    client.write_all(b"\n").await.unwrap();
    client.shutdown().await.unwrap();

    let mut decoder = ClickDecoder::new(server);
    let frame = decoder.next_event().await.unwrap().expect("an event");
    assert_eq!(frame.name.as_deref(), Some("m/0"));
    assert_eq!(frame.event.button, 1);
    assert_eq!(frame.event.x, 3);
    assert_eq!(frame.event.screen_x, 10);

    assert!(decoder.next_event().await.unwrap().is_none());
}

#[tokio::test]
async fn click_decoder_tolerates_a_malformed_line() {
    let (mut client, server) = tokio::io::duplex(4096);
    client.write_all(b"[\n").await.unwrap();
    client.write_all(b"not json,\n").await.unwrap();
    client.write_all(br#"{"name":"m/0","button":2},"#).await.unwrap();
    client.write_all(b"\n").await.unwrap();
    client.shutdown().await.unwrap();

    let mut decoder = ClickDecoder::new(server);
    let frame = decoder.next_event().await.unwrap().expect("an event");
    assert_eq!(frame.event.button, 2);
}
