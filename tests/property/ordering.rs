//! Completion order never leaks into the compiled document.

use proptest::prelude::*;
use std::collections::HashMap;
use std::time::Duration;
use taleweaver::error::ApiError;
use taleweaver::story::{
    aggregate_body, compile_document, scatter_gather, Section, StoryPlan, Wave,
};

fn plan_from_flags(flags: &[bool]) -> StoryPlan {
    let sections = flags
        .iter()
        .enumerate()
        .map(|(i, main_body)| Section::new(format!("Section {}", i), format!("brief {}", i), *main_body))
        .collect();
    StoryPlan::new(sections).unwrap()
}

fn written(section: &Section) -> Section {
    section
        .clone()
        .fill(format!("content of {}", section.name))
        .unwrap()
}

fn expected_document(plan: &StoryPlan) -> String {
    plan.sections()
        .iter()
        .map(|s| format!("content of {}", s.name))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Any completion order compiles to plan order.
#[test]
fn test_compile_follows_plan_order_for_any_completion_order() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let strategy = prop::collection::vec(any::<bool>(), 1..10).prop_flat_map(|flags| {
        let order: Vec<usize> = (0..flags.len()).collect();
        (Just(flags), Just(order).prop_shuffle())
    });

    runner
        .run(&strategy, |(flags, order)| {
            let plan = plan_from_flags(&flags);
            let mut completed = HashMap::new();
            for index in order {
                let section = &plan.sections()[index];
                completed.insert(section.name.clone(), written(section));
            }

            let document = compile_document(&plan, &completed).unwrap();
            prop_assert_eq!(document, expected_document(&plan));
            Ok(())
        })
        .unwrap();
}

/// Body and framing waves partition the plan, each in plan order.
#[test]
fn test_waves_partition_the_plan() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&prop::collection::vec(any::<bool>(), 1..12), |flags| {
            let plan = plan_from_flags(&flags);
            let body = plan.wave(Wave::Body);
            let framing = plan.wave(Wave::Framing);

            prop_assert_eq!(body.len() + framing.len(), plan.len());
            prop_assert!(body.iter().all(|s| s.main_body));
            prop_assert!(framing.iter().all(|s| !s.main_body));

            let body_names: Vec<&str> = plan
                .sections()
                .iter()
                .filter(|s| s.main_body)
                .map(|s| s.name.as_str())
                .collect();
            let wave_names: Vec<&str> = body.iter().map(|s| s.name.as_str()).collect();
            prop_assert_eq!(wave_names, body_names);
            Ok(())
        })
        .unwrap();
}

/// Aggregation depends only on the plan and content, not on insertion order.
#[test]
fn test_aggregate_is_insertion_order_independent() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let strategy = prop::collection::vec(any::<bool>(), 1..8).prop_flat_map(|flags| {
        let order: Vec<usize> = (0..flags.len()).collect();
        (Just(flags), Just(order).prop_shuffle())
    });

    runner
        .run(&strategy, |(flags, order)| {
            let plan = plan_from_flags(&flags);
            let forward: HashMap<_, _> = plan
                .sections()
                .iter()
                .map(|s| (s.name.clone(), written(s)))
                .collect();
            let mut shuffled = HashMap::new();
            for index in order {
                let section = &plan.sections()[index];
                shuffled.insert(section.name.clone(), written(section));
            }

            prop_assert_eq!(aggregate_body(&plan, &forward), aggregate_body(&plan, &shuffled));
            Ok(())
        })
        .unwrap();
}

/// Random task latencies through the barrier still compile in plan order.
#[test]
fn test_scatter_gather_with_random_latency_compiles_in_plan_order() {
    let mut runner = proptest::test_runner::TestRunner::new(proptest::test_runner::Config {
        cases: 32,
        ..proptest::test_runner::Config::default()
    });
    let strategy = prop::collection::vec((any::<bool>(), 0u64..5), 1..8);

    runner
        .run(&strategy, |cases| {
            let flags: Vec<bool> = cases.iter().map(|(flag, _)| *flag).collect();
            let plan = plan_from_flags(&flags);
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();

            let completed = runtime.block_on(async {
                let tasks: Vec<_> = plan
                    .sections()
                    .iter()
                    .zip(cases.iter())
                    .map(|(section, (_, millis))| {
                        let section = section.clone();
                        let millis = *millis;
                        let key = section.name.clone();
                        let task = async move {
                            tokio::time::sleep(Duration::from_millis(millis)).await;
                            Ok::<_, ApiError>(written(&section))
                        };
                        (key, task)
                    })
                    .collect();
                scatter_gather(tasks, None).await
            });

            let completed = completed.unwrap();
            prop_assert_eq!(completed.len(), plan.len());
            prop_assert_eq!(compile_document(&plan, &completed).unwrap(), expected_document(&plan));
            Ok(())
        })
        .unwrap();
}
