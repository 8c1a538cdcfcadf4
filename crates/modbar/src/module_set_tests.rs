// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use super::*;
use crate::module::ModuleEmit;

struct StaticModule {
    name: &'static str,
    text: &'static str,
}

impl Module for StaticModule {
    fn name(&self) -> &str {
        self.name
    }

    fn run(self: Arc<Self>, emit: ModuleEmit) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> {
        Box::pin(async move {
            emit.emit(Segment::text(self.text));
            std::future::pending::<()>().await;
            Ok(())
        })
    }
}

#[tokio::test]
async fn add_returns_stable_indices_in_registration_order() {
    let mut set = ModuleSet::new(Timing::new_for_test());
    let a = set.add(Arc::new(StaticModule { name: "a", text: "A" }));
    let b = set.add(Arc::new(StaticModule { name: "b", text: "B" }));
    assert_eq!(a, 0);
    assert_eq!(b, 1);
    assert_eq!(set.len(), 2);
    assert_eq!(set.name(0), Some("a"));
    assert_eq!(set.name(1), Some("b"));
}

#[tokio::test]
async fn update_stream_wakes_when_any_module_changes() {
    let mut set = ModuleSet::new(Timing::new_for_test());
    set.add(Arc::new(StaticModule { name: "a", text: "A" }));

    tokio::time::timeout(Duration::from_millis(200), set.update_stream()).await.unwrap();
}

#[tokio::test]
async fn last_outputs_reflects_every_registered_module() {
    let mut set = ModuleSet::new(Timing::new_for_test());
    set.add(Arc::new(StaticModule { name: "a", text: "A" }));
    set.add(Arc::new(StaticModule { name: "b", text: "B" }));

    // Wait for both initial emissions to land.
    loop {
        let outputs = set.last_outputs();
        if outputs.iter().all(|o| !o.is_empty()) {
            assert_eq!(outputs[0][0].text_value(), "A");
            assert_eq!(outputs[1][0].text_value(), "B");
            break;
        }
        tokio::time::timeout(Duration::from_millis(200), set.update_stream()).await.unwrap();
    }
}

#[tokio::test]
async fn last_output_for_an_out_of_range_index_is_empty() {
    let set = ModuleSet::new(Timing::new_for_test());
    assert_eq!(set.last_output(7), Vec::new());
}
