mod common;

use assert_matches::assert_matches;
use serde_json::json;
use webrobot_core::error::CoreError;
use webrobot_core::event_codes::EVENT_CODE_START_TASK;
use webrobot_core::scheduling::{TaskStatus, QUEUE_PRIORITY_MAX};
use webrobot_core::types::Scope;
use webrobot_db::models::task::SubmitTask;
use webrobot_dispatch::{DispatchConfig, DispatchError, DispatchStatus, Dispatcher, TaskStore};

use common::{harness, scope};

fn request(endpoints: &[&str], parallel: bool) -> SubmitTask {
    SubmitTask {
        test_suite: Some("smoke".into()),
        endpoint_list: Some(endpoints.iter().map(|e| e.to_string()).collect()),
        priority: Some(5),
        parallelization: Some(parallel),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Parallel fan-out
// ---------------------------------------------------------------------------

#[tokio::test]
async fn idle_queue_and_missing_queue() {
    let h = harness();
    h.add_suite("smoke", scope()).await;
    h.add_queue("e1", 5).await;

    let outcome = h
        .dispatcher
        .submit(scope(), 7, request(&["e1", "e2"], true))
        .await
        .unwrap();

    assert_eq!(outcome.succeeded.len(), 1);
    assert_eq!(outcome.failed.len(), 1);
    let id1 = outcome.succeeded[0];
    let id2 = outcome.failed[0];
    assert_ne!(id1, id2);
    assert_eq!(outcome.running, vec![id1]);
    assert_eq!(outcome.status(), DispatchStatus::SchedulingFailed);
    assert_matches!(outcome.error(), Some(CoreError::SchedulingFailed(_)));
}

#[tokio::test]
async fn parallel_creates_one_task_per_endpoint_and_drops_template() {
    let h = harness();
    h.add_suite("smoke", scope()).await;
    h.add_queue("e1", 5).await;
    h.add_queue("e3", 5).await;

    let outcome = h
        .dispatcher
        .submit(scope(), 7, request(&["e1", "e2", "e3"], true))
        .await
        .unwrap();

    let tasks = h.store.tasks().await;
    assert_eq!(tasks.len(), 3);
    let mut ids: Vec<_> = tasks.iter().map(|t| t.id).collect();
    let mut reported: Vec<_> = outcome
        .succeeded
        .iter()
        .chain(outcome.failed.iter())
        .copied()
        .collect();
    ids.sort_unstable();
    reported.sort_unstable();
    assert_eq!(ids, reported);

    for task in &tasks {
        assert_eq!(task.status(), Some(TaskStatus::Waiting));
        assert_eq!(task.endpoint_list, vec!["e1", "e2", "e3"]);
        assert_eq!(task.tester_id, 7);
    }
}

#[tokio::test]
async fn start_events_carry_address_and_task_id() {
    let h = harness();
    h.add_suite("smoke", scope()).await;
    h.add_queue("e1", 5).await;
    h.add_queue("e2", 5).await;

    let outcome = h
        .dispatcher
        .submit(scope(), 7, request(&["e1", "e2"], true))
        .await
        .unwrap();
    assert_eq!(outcome.status(), DispatchStatus::Scheduled);

    let events = h.publisher.events().await;
    assert_eq!(events.len(), 2);
    let expected = [("e1", outcome.succeeded[0]), ("e2", outcome.succeeded[1])];
    for (event, (endpoint, id)) in events.iter().zip(expected) {
        assert_eq!(event.code, EVENT_CODE_START_TASK);
        assert_eq!(event.scope(), scope());
        assert_eq!(
            event.message,
            json!({"address": endpoint, "task_id": id.to_string()})
        );
    }
}

#[tokio::test]
async fn busy_queue_is_not_reported_running() {
    let h = harness();
    h.add_suite("smoke", scope()).await;
    let busy = h.add_queue("e1", 5).await;
    h.store.set_running(busy.id, Some(500)).await;
    h.add_queue("e2", 5).await;

    let outcome = h
        .dispatcher
        .submit(scope(), 7, request(&["e1", "e2"], true))
        .await
        .unwrap();

    assert_eq!(outcome.succeeded.len(), 2);
    assert_eq!(outcome.running, vec![outcome.succeeded[1]]);
}

#[tokio::test]
async fn failed_push_is_not_running() {
    let h = harness();
    h.add_suite("smoke", scope()).await;
    let broken = h.add_queue("e1", 5).await;
    h.store.fail_pushes_to(broken.id).await;

    let outcome = h
        .dispatcher
        .submit(scope(), 7, request(&["e1"], true))
        .await
        .unwrap();

    assert!(outcome.succeeded.is_empty());
    assert!(outcome.running.is_empty());
    assert_eq!(outcome.failed.len(), 1);
    assert!(h.publisher.events().await.is_empty());
}

#[tokio::test]
async fn pushed_ids_land_in_queues_exactly_once() {
    let h = harness();
    h.add_suite("smoke", scope()).await;
    let q1 = h.add_queue("e1", 5).await;
    let q2 = h.add_queue("e2", 5).await;

    let outcome = h
        .dispatcher
        .submit(scope(), 7, request(&["e1", "e2"], true))
        .await
        .unwrap();

    let first = h.store.queue(q1.id).await.unwrap();
    let second = h.store.queue(q2.id).await.unwrap();
    assert_eq!(first.tasks, vec![outcome.succeeded[0]]);
    assert_eq!(second.tasks, vec![outcome.succeeded[1]]);
}

// ---------------------------------------------------------------------------
// Non-parallel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_parallel_pushes_same_task_everywhere() {
    let h = harness();
    h.add_suite("smoke", scope()).await;
    let q1 = h.add_queue("e1", 5).await;
    let q2 = h.add_queue("e2", 5).await;

    let outcome = h
        .dispatcher
        .submit(scope(), 7, request(&["e1", "e2"], false))
        .await
        .unwrap();

    let tasks = h.store.tasks().await;
    assert_eq!(tasks.len(), 1);
    let id = tasks[0].id;
    assert_eq!(outcome.succeeded, vec![id, id]);
    assert_eq!(h.store.queue(q1.id).await.unwrap().tasks, vec![id]);
    assert_eq!(h.store.queue(q2.id).await.unwrap().tasks, vec![id]);
}

#[tokio::test]
async fn default_priority_is_used_when_absent() {
    let h = harness();
    h.add_suite("smoke", scope()).await;
    let queue = h.add_queue("e1", 5).await;

    let mut req = request(&["e1"], false);
    req.priority = None;
    let outcome = h.dispatcher.submit(scope(), 7, req).await.unwrap();

    assert_eq!(h.store.queue(queue.id).await.unwrap().tasks, outcome.succeeded);
}

#[tokio::test]
async fn configured_default_priority_picks_the_queue() {
    let h = harness();
    h.add_suite("smoke", scope()).await;
    let mid = h.add_queue("e1", 5).await;
    let low = h.add_queue("e1", 3).await;

    let config = DispatchConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://localhost/webrobot".to_string()),
        "TASK_PRIORITY_DEFAULT" => Some("3".to_string()),
        _ => None,
    })
    .unwrap();
    let dispatcher =
        Dispatcher::from_config(h.store.clone(), h.publisher.clone(), &config).unwrap();

    let mut req = request(&["e1"], false);
    req.priority = None;
    let outcome = dispatcher.submit(scope(), 7, req).await.unwrap();

    let task = h.store.find_task(outcome.succeeded[0]).await.unwrap().unwrap();
    assert_eq!(task.priority, 3);
    assert_eq!(h.store.queue(low.id).await.unwrap().tasks, outcome.succeeded);
    assert!(h.store.queue(mid.id).await.unwrap().tasks.is_empty());
}

#[test]
fn out_of_range_default_priority_is_a_config_error() {
    let h = harness();
    let result = Dispatcher::new(h.store.clone(), h.publisher.clone()).with_default_priority(0);
    assert_matches!(result.err(), Some(CoreError::InvalidArgument(_)));
}

#[tokio::test]
async fn variables_and_test_cases_are_stored() {
    let h = harness();
    h.add_suite("smoke", scope()).await;
    h.add_queue("e1", 5).await;

    let mut req = request(&["e1"], false);
    req.variables = Some(json!({"HOST": "10.0.0.1"}));
    req.test_cases = Some(json!(["login"]));
    let outcome = h.dispatcher.submit(scope(), 7, req).await.unwrap();

    let task = h.store.find_task(outcome.succeeded[0]).await.unwrap().unwrap();
    assert_eq!(task.variables, json!({"HOST": "10.0.0.1"}));
    assert_eq!(task.test_cases, vec!["login"]);
}

// ---------------------------------------------------------------------------
// Fatal publish failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn publish_failure_aborts_remaining_endpoints() {
    let h = harness();
    h.add_suite("smoke", scope()).await;
    let q1 = h.add_queue("e1", 5).await;
    let q2 = h.add_queue("e2", 5).await;
    let q3 = h.add_queue("e3", 5).await;
    h.publisher.fail_from(1).await;

    let result = h
        .dispatcher
        .submit(scope(), 7, request(&["e1", "e2", "e3"], true))
        .await;

    assert_matches!(result, Err(DispatchError::Core(CoreError::Delivery(_))));
    assert_eq!(h.publisher.events().await.len(), 1);
    assert_eq!(h.store.queue(q1.id).await.unwrap().tasks.len(), 1);
    // Already pushed entries stay; nothing after the failure is touched.
    assert_eq!(h.store.queue(q2.id).await.unwrap().tasks.len(), 1);
    assert!(h.store.queue(q3.id).await.unwrap().tasks.is_empty());
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn priority_out_of_range_writes_nothing() {
    let h = harness();
    h.add_suite("smoke", scope()).await;
    h.add_queue("e1", 5).await;

    let mut req = request(&["e1"], true);
    req.priority = Some(QUEUE_PRIORITY_MAX + 1);
    let result = h.dispatcher.submit(scope(), 7, req).await;

    assert_matches!(result, Err(DispatchError::Core(CoreError::OutOfRange(_))));
    assert!(h.store.tasks().await.is_empty());
    assert!(h.publisher.events().await.is_empty());
}

#[tokio::test]
async fn empty_endpoint_list_is_invalid() {
    let h = harness();
    h.add_suite("smoke", scope()).await;

    let result = h.dispatcher.submit(scope(), 7, request(&[], false)).await;
    assert_matches!(result, Err(DispatchError::Core(CoreError::InvalidArgument(_))));

    let mut req = request(&[], false);
    req.endpoint_list = None;
    let result = h.dispatcher.submit(scope(), 7, req).await;
    assert_matches!(result, Err(DispatchError::Core(CoreError::InvalidArgument(_))));
    assert!(h.store.tasks().await.is_empty());
}

#[tokio::test]
async fn malformed_variables_are_invalid() {
    let h = harness();
    h.add_suite("smoke", scope()).await;

    let mut req = request(&["e1"], false);
    req.variables = Some(json!(["not", "a", "map"]));
    let result = h.dispatcher.submit(scope(), 7, req).await;
    assert_matches!(result, Err(DispatchError::Core(CoreError::InvalidArgument(_))));
}

#[tokio::test]
async fn unsafe_upload_dir_is_invalid() {
    let h = harness();
    h.add_suite("smoke", scope()).await;

    let mut req = request(&["e1"], false);
    req.upload_dir = Some("../../etc".into());
    let result = h.dispatcher.submit(scope(), 7, req).await;
    assert_matches!(result, Err(DispatchError::Core(CoreError::InvalidArgument(_))));
}

#[tokio::test]
async fn unknown_suite_is_not_found() {
    let h = harness();
    let result = h.dispatcher.submit(scope(), 7, request(&["e1"], false)).await;
    assert_matches!(result, Err(DispatchError::Core(CoreError::NotFound { .. })));
}

#[tokio::test]
async fn duplicate_suites_conflict_for_organization_scope() {
    let h = harness();
    h.add_suite("smoke", Scope::new(1, Some(10))).await;
    h.add_suite("smoke", Scope::new(1, Some(11))).await;

    let result = h
        .dispatcher
        .submit(Scope::new(1, None), 7, request(&["e1"], false))
        .await;
    assert_matches!(result, Err(DispatchError::Core(CoreError::Conflict(_))));

    // A team scope narrows the lookup to one definition.
    h.add_queue("e1", 5).await;
    let outcome = h
        .dispatcher
        .submit(scope(), 7, request(&["e1"], false))
        .await
        .unwrap();
    assert_eq!(outcome.status(), DispatchStatus::Scheduled);
}

#[tokio::test]
async fn rejected_initial_save_is_storage_validation() {
    let h = harness();
    h.add_suite("smoke", scope()).await;
    h.store.reject_saves(true).await;

    let result = h.dispatcher.submit(scope(), 7, request(&["e1"], false)).await;
    assert_matches!(
        result,
        Err(DispatchError::Core(CoreError::StorageValidation(_)))
    );
}
