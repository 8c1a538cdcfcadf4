// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;
use crate::event::ClickEvent;
use yare::parameterized;

#[parameterized(
    start = { Align::Start, "left" },
    center = { Align::Center, "center" },
    end = { Align::End, "right" },
)]
fn align_wire_str_matches_the_protocol_keyword(align: Align, expected: &str) {
    assert_eq!(align.wire_str(), expected);
}

#[test]
fn unset_attributes_report_defaults_and_false() {
    let seg = Segment::text("hi");
    assert_eq!(seg.urgent(), (false, false));
    assert_eq!(seg.separator(), (true, false));
    assert_eq!(seg.padding(), (9, false));
    assert_eq!(seg.align(), (Align::Start, false));
    assert_eq!(seg.color(), (Color::Unset, false));
    assert!(seg.set_bits().is_empty());
}

#[test]
fn explicit_zero_is_distinguishable_from_unset() {
    let mut seg = Segment::text("hi");
    seg.set_urgent(false);
    assert_eq!(seg.urgent(), (false, true));
    assert!(seg.set_bits().contains(SetBits::URGENT));
}

#[test]
fn set_bits_grow_monotonically_across_a_mutation_chain() {
    let mut seg = Segment::text("hi");
    seg.set_urgent(true);
    let after_one = seg.set_bits();
    seg.set_color(Color::Rgb(0xff0000));
    let after_two = seg.set_bits();
    assert!(after_two.contains(after_one));
    assert!(after_two.contains(SetBits::COLOR));
}

#[test]
fn clone_is_independent() {
    let mut seg = Segment::text("a");
    let clone = seg.clone();
    seg.set_urgent(true);
    assert_eq!(clone.urgent(), (false, false));
    assert_eq!(seg.urgent(), (true, true));
}

#[test]
fn setting_color_unset_clears_it() {
    let mut seg = Segment::text("hi");
    seg.set_color(Color::Rgb(0x00ff00));
    assert!(seg.set_bits().contains(SetBits::COLOR));
    seg.set_color(Color::Unset);
    assert!(!seg.set_bits().contains(SetBits::COLOR));
    assert_eq!(seg.color(), (Color::Unset, false));
}

#[test]
fn color_hex_formatting() {
    assert_eq!(Color::Rgb(0x1a2b3c).to_hex().as_deref(), Some("#1a2b3c"));
    assert_eq!(Color::Rgba(0x1a2b3cff).to_hex().as_deref(), Some("#1a2b3cff"));
    assert_eq!(Color::Unset.to_hex(), None);
}

#[test]
fn on_click_invokes_handler_exactly_once() {
    let count = Arc::new(AtomicUsize::new(0));
    let mut seg = Segment::text("hi");
    assert!(!seg.has_click());
    let count2 = Arc::clone(&count);
    seg.on_click(move |_ev| {
        count2.fetch_add(1, Ordering::SeqCst);
    });
    assert!(seg.has_click());
    seg.click(ClickEvent::default());
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn click_without_handler_is_noop() {
    let seg = Segment::text("hi");
    seg.click(ClickEvent::default()); // must not panic
}

#[test]
fn error_segment_detection() {
    let mut seg = Segment::text("Error");
    assert!(!seg.is_error());
    seg.set_error(Some("boom".to_owned()));
    assert!(seg.is_error());
    assert_eq!(seg.error(), Some("boom"));
}

#[test]
fn segment_yields_single_element_output() {
    let seg = Segment::text("hi");
    let out = seg.segments();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].text_value(), "hi");
}

#[test]
#[allow(clippy::panic)]
fn group_distribute_min_width_sums_exactly_with_bounded_spread() {
    let group_of = |n: usize| Group::new((0..n).map(|i| Segment::text(i.to_string())).collect());

    let mut g = group_of(3);
    g.distribute_min_width(7);
    let widths: Vec<i64> = g
        .members()
        .iter()
        .map(|s| match s.min_width().0 {
            Some(MinWidth::Pixels(p)) => *p,
            _ => panic!("expected pixel min width"),
        })
        .collect();
    assert_eq!(widths.iter().sum::<i64>(), 7);
    assert_eq!(widths, vec![3, 2, 2]);
    let max = *widths.iter().max().unwrap();
    let min = *widths.iter().min().unwrap();
    assert!(max - min <= 1);
}

#[test]
fn group_set_color_all_applies_to_every_member() {
    let mut g = Group::new(vec![Segment::text("a"), Segment::text("b")]);
    g.set_color_all(Color::Rgb(0x112233));
    for seg in g.members() {
        assert_eq!(seg.color(), (Color::Rgb(0x112233), true));
    }
}

#[test]
fn group_inner_separators_off_keeps_trailing_default() {
    let mut g = Group::new(vec![Segment::text("a"), Segment::text("b"), Segment::text("c")]);
    g.set_inner_separators_off();
    assert_eq!(g.members()[0].separator(), (false, true));
    assert_eq!(g.members()[1].separator(), (false, true));
    assert_eq!(g.members()[2].separator(), (true, false));
}

mod distribute_min_width_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// For any member count and any total, the distributed widths sum
        /// exactly to the total and no two members differ by more than one
        /// pixel (§8 testable property 9).
        #[test]
        #[allow(clippy::panic)]
        fn sums_exactly_and_stays_within_one_pixel(n in 1usize..32, total in 0i64..10_000) {
            let mut g = Group::new((0..n).map(|i| Segment::text(i.to_string())).collect());
            g.distribute_min_width(total);

            let widths: Vec<i64> = g
                .members()
                .iter()
                .map(|s| match s.min_width().0 {
                    Some(MinWidth::Pixels(p)) => p,
                    other => panic!("expected pixel min width, got {other:?}"),
                })
                .collect();

            prop_assert_eq!(widths.iter().sum::<i64>(), total);
            let max = *widths.iter().max().unwrap();
            let min = *widths.iter().min().unwrap();
            prop_assert!(max - min <= 1);
        }
    }
}
