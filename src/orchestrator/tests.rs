//! Orchestrator Module Tests
//!
//! ## Test Scopes
//! - **Combiners**: reference rules, order independence, empty and malformed inputs.
//! - **Failure policy**: failed targets fail the job unless the rule tolerates gaps.
//! - **Dispatcher**: local validation and queue rejections, one task per call.
//! - **Aggregator**: waiting for terminal runs, bounded waits.
//! - **End to end**: `Orchestrator::run` against node executors on an in-memory queue.

#[cfg(test)]
mod tests {
    use crate::algorithms::register_defaults;
    use crate::collaboration::types::{Collaboration, NodeId, OrganizationId, SessionId};
    use crate::config::{DatabaseCatalog, ProxyConfig};
    use crate::error::{DispatchError, FederationError};
    use crate::executor::executor::TaskExecutor;
    use crate::executor::registry::JobRegistry;
    use crate::orchestrator::aggregator::combine_reports;
    use crate::orchestrator::{
        Aggregator, AverageCombiner, CollectCombiner, Combine, Dispatcher, FederatedJob, GapTolerant,
        Orchestrator, SumCombiner, TargetResult,
    };
    use crate::queue::error::QueueError;
    use crate::queue::store::InMemoryTaskQueue;
    use crate::queue::types::{NewTask, PartialResult, RunOutcome, RunReport, RunStatus, TaskInput};
    use crate::queue::TaskQueue;
    use serde_json::{Value, json};
    use std::collections::BTreeSet;
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    fn partial(entries: Value) -> PartialResult {
        match entries {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    fn target(id: u64, entries: Value) -> TargetResult {
        TargetResult {
            target: OrganizationId(id),
            result: partial(entries),
        }
    }

    fn done(id: u64, entries: Value) -> RunReport {
        RunReport {
            target: OrganizationId(id),
            status: RunStatus::Completed,
            result: Some(partial(entries)),
        }
    }

    fn failed(id: u64, error: &str) -> RunReport {
        RunReport {
            target: OrganizationId(id),
            status: RunStatus::Failed {
                error: error.to_string(),
            },
            result: None,
        }
    }

    fn targets(ids: &[u64]) -> BTreeSet<OrganizationId> {
        ids.iter().copied().map(OrganizationId).collect()
    }

    fn setup(organizations: &[u64], sessions: &[&str]) -> (Arc<InMemoryTaskQueue>, Arc<JobRegistry>) {
        let collaboration = Collaboration::new(
            organizations.iter().copied().map(OrganizationId),
            sessions.iter().map(|s| SessionId(s.to_string())),
        );
        let registry = JobRegistry::new();
        register_defaults(&registry).unwrap();
        (Arc::new(InMemoryTaskQueue::new(collaboration)), registry)
    }

    fn new_task(input: TaskInput, ids: &[u64]) -> NewTask {
        NewTask {
            name: "test".to_string(),
            description: String::new(),
            targets: targets(ids),
            input,
            preprocessing: Vec::new(),
            database: None,
            session: None,
        }
    }

    // ============================================================
    // COMBINERS
    // ============================================================

    #[test]
    fn test_average_combiner_two_partitions() {
        let partials = vec![target(1, json!({"len": 3, "data": 6})), target(2, json!({"len": 2, "data": 9}))];

        let result = AverageCombiner::default().combine(&partials).unwrap();

        assert_eq!(result["average"], json!(3.0));
    }

    #[test]
    fn test_combiners_ignore_arrival_order() {
        let mut partials = vec![
            target(1, json!({"len": 3, "data": 6, "sum": 6, "echo": "a"})),
            target(2, json!({"len": 2, "data": 9.5, "sum": 9, "echo": "b"})),
            target(3, json!({"len": 4, "data": 1, "sum": 1, "echo": {"c": 1}})),
        ];
        let rules: Vec<Box<dyn Combine>> = vec![
            Box::new(AverageCombiner::default()),
            Box::new(SumCombiner::new("sum")),
            Box::new(CollectCombiner::new("echo")),
        ];
        let expected: Vec<_> = rules.iter().map(|rule| rule.combine(&partials).unwrap()).collect();

        for rotation in 1..partials.len() {
            partials.rotate_left(1);
            let mut reversed = partials.clone();
            reversed.reverse();
            for (rule, expected) in rules.iter().zip(&expected) {
                assert_eq!(&rule.combine(&partials).unwrap(), expected, "rotation {}", rotation);
                assert_eq!(&rule.combine(&reversed).unwrap(), expected, "rotation {} reversed", rotation);
            }
        }
    }

    #[test]
    fn test_average_of_large_integers_is_exact_in_any_order() {
        // 2^53 + 1 is not representable as f64, so float accumulation would depend on order
        let big = 1i64 << 53;
        let mut partials = vec![
            target(1, json!({"len": 1, "data": big})),
            target(2, json!({"len": 1, "data": 1})),
            target(3, json!({"len": 1, "data": 1})),
        ];
        let expected = json!((big as i128 + 2) as f64 / 3.0);

        for _ in 0..partials.len() {
            partials.rotate_left(1);
            let mut reversed = partials.clone();
            reversed.reverse();
            for order in [&partials, &reversed] {
                let result = AverageCombiner::default().combine(order).unwrap();
                assert_eq!(result["average"], expected);
            }
        }
    }

    #[test]
    fn test_average_of_fractional_sums_ignores_arrival_order() {
        let mut partials = vec![
            target(1, json!({"len": 1, "data": 1e16})),
            target(2, json!({"len": 1, "data": 1.0})),
            target(3, json!({"len": 1, "data": 1.0})),
        ];
        let expected = AverageCombiner::default().combine(&partials).unwrap();

        for _ in 0..partials.len() {
            partials.rotate_left(1);
            let mut reversed = partials.clone();
            reversed.reverse();
            assert_eq!(AverageCombiner::default().combine(&partials).unwrap(), expected);
            assert_eq!(AverageCombiner::default().combine(&reversed).unwrap(), expected);
        }
    }

    #[test]
    fn test_sum_combiner() {
        let partials = vec![target(1, json!({"sum": 7})), target(2, json!({"sum": -2}))];

        let result = SumCombiner::new("sum").combine(&partials).unwrap();

        assert_eq!(result["sum"], json!(5));
    }

    #[test]
    fn test_collect_combiner_keys_by_target() {
        let partials = vec![target(2, json!({"echo": [1, 2]})), target(1, json!({"echo": "x"}))];

        let result = CollectCombiner::new("echo").combine(&partials).unwrap();

        assert_eq!(result["echo"], json!({"1": "x", "2": [1, 2]}));
    }

    #[test]
    fn test_average_of_empty_partitions_is_explicit_error() {
        let partials = vec![target(1, json!({"len": 0, "data": 0})), target(2, json!({"len": 0, "data": 0}))];

        let result = AverageCombiner::default().combine(&partials);

        assert!(matches!(result, Err(FederationError::EmptyAggregate)));
    }

    #[test]
    fn test_malformed_partial_names_target() {
        let partials = vec![target(1, json!({"len": 1, "data": 1})), target(4, json!({"len": -1, "data": 1}))];

        let result = AverageCombiner::default().combine(&partials);

        match result {
            Err(FederationError::MalformedPartial { target, .. }) => assert_eq!(target, OrganizationId(4)),
            other => panic!("expected malformed partial, got {:?}", other),
        }
    }

    // ============================================================
    // FAILURE POLICY
    // ============================================================

    #[test]
    fn test_failed_target_fails_whole_job() {
        // ARRANGE: A and C done, B errored
        let reports = vec![
            done(1, json!({"len": 1, "data": 1})),
            failed(2, "column 'Age' not found in dataset"),
            done(3, json!({"len": 1, "data": 3})),
        ];

        // ACT
        let result = combine_reports(reports, &AverageCombiner::default());

        // ASSERT: PartialFailure({B}), not an average over {A, C}
        let err = result.unwrap_err();
        assert_eq!(err.failed_targets(), vec![OrganizationId(2)]);
        assert!(err.to_string().contains("Age"));
    }

    #[test]
    fn test_gap_tolerant_rule_reports_exclusions() {
        let reports = vec![
            done(1, json!({"len": 1, "data": 1})),
            failed(2, "boom"),
            done(3, json!({"len": 1, "data": 3})),
        ];

        let combined = combine_reports(reports, &GapTolerant(AverageCombiner::default())).unwrap();

        assert_eq!(combined.result["average"], json!(2.0));
        assert_eq!(combined.contributors, targets(&[1, 3]));
        assert_eq!(combined.excluded.get(&OrganizationId(2)).map(String::as_str), Some("boom"));
        assert!(!combined.is_complete());
    }

    #[test]
    fn test_complete_result_has_no_exclusions() {
        let reports = vec![done(1, json!({"sum": 1})), done(2, json!({"sum": 2}))];

        let combined = combine_reports(reports, &SumCombiner::new("sum")).unwrap();

        assert!(combined.is_complete());
        assert_eq!(combined.contributors, targets(&[1, 2]));
    }

    #[test]
    fn test_completed_without_result_is_malformed() {
        let reports = vec![RunReport {
            target: OrganizationId(1),
            status: RunStatus::Completed,
            result: None,
        }];

        let result = combine_reports(reports, &SumCombiner::new("sum"));

        assert!(matches!(result, Err(FederationError::MalformedPartial { .. })));
    }

    #[test]
    fn test_gap_tolerant_rule_excludes_completed_without_result() {
        let reports = vec![
            done(1, json!({"len": 2, "data": 8})),
            RunReport {
                target: OrganizationId(2),
                status: RunStatus::Completed,
                result: None,
            },
        ];

        let combined = combine_reports(reports, &GapTolerant(AverageCombiner::default())).unwrap();

        assert_eq!(combined.result["average"], json!(4.0));
        assert_eq!(combined.contributors, targets(&[1]));
        assert_eq!(
            combined.excluded.get(&OrganizationId(2)).map(String::as_str),
            Some("completed without a result")
        );
    }

    // ============================================================
    // DISPATCHER
    // ============================================================

    #[tokio::test]
    async fn test_dispatch_creates_exactly_one_task_for_given_targets() {
        let (queue, registry) = setup(&[1, 2, 3], &[]);
        let dispatcher = Dispatcher::new(queue.clone(), registry);

        let handle = dispatcher
            .dispatch_method("sum", vec![json!("Age")], Default::default(), targets(&[1, 3]), None)
            .await
            .unwrap();

        assert_eq!(queue.task_count(), 1);
        let task = queue.get_task(&handle.task_id).unwrap();
        assert_eq!(task.targets, targets(&[1, 3]));
        let reports = queue.poll(&handle.task_id).await.unwrap();
        let addressed: BTreeSet<_> = reports.iter().map(|report| report.target).collect();
        assert_eq!(addressed, targets(&[1, 3]));
    }

    #[tokio::test]
    async fn test_dispatch_validates_locally() {
        let (queue, registry) = setup(&[1], &[]);
        let dispatcher = Dispatcher::new(queue.clone(), registry);

        let empty = dispatcher.dispatch(new_task(TaskInput::new("sum").arg("Age"), &[])).await;
        let unknown = dispatcher.dispatch(new_task(TaskInput::new("median").arg("Age"), &[1])).await;
        let extraction = dispatcher
            .dispatch(new_task(TaskInput::new("read_csv").arg("file:///x.csv"), &[1]))
            .await;
        let bad_args = dispatcher.dispatch(new_task(TaskInput::new("sum"), &[1])).await;
        let mut bad_step = new_task(TaskInput::new("sum").arg("Age"), &[1]);
        bad_step.preprocessing.push(TaskInput::new("count").arg("Age"));
        let bad_step = dispatcher.dispatch(bad_step).await;

        assert!(matches!(empty, Err(DispatchError::EmptyTargets)));
        assert!(matches!(unknown, Err(DispatchError::UnknownMethod(_))));
        assert!(matches!(extraction, Err(DispatchError::NotDispatchable { .. })));
        assert!(matches!(bad_args, Err(DispatchError::InvalidArguments { .. })));
        assert!(matches!(bad_step, Err(DispatchError::NotDispatchable { .. })));
        assert_eq!(queue.task_count(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_surfaces_queue_rejection() {
        let (queue, registry) = setup(&[1], &["study"]);
        let dispatcher = Dispatcher::new(queue.clone(), registry);

        let unknown_target = dispatcher.dispatch(new_task(TaskInput::new("sum").arg("Age"), &[1, 9])).await;
        let mut unknown_session = new_task(TaskInput::new("sum").arg("Age"), &[1]);
        unknown_session.session = Some(SessionId("other".to_string()));
        let unknown_session = dispatcher.dispatch(unknown_session).await;

        assert!(matches!(
            unknown_target,
            Err(DispatchError::Rejected(QueueError::UnknownTarget(OrganizationId(9))))
        ));
        assert!(matches!(
            unknown_session,
            Err(DispatchError::Rejected(QueueError::UnknownSession(_)))
        ));
        assert_eq!(queue.task_count(), 0);
    }

    // ============================================================
    // AGGREGATOR
    // ============================================================

    #[tokio::test]
    async fn test_aggregator_waits_for_every_target() {
        // ARRANGE
        let (queue, registry) = setup(&[1, 2], &[]);
        let dispatcher = Dispatcher::new(queue.clone(), registry);
        let handle = dispatcher
            .dispatch(new_task(TaskInput::new("sum").arg("Age"), &[1, 2]))
            .await
            .unwrap();
        let aggregator = Aggregator::new(queue.clone()).with_poll_interval(Duration::from_millis(20));

        // ACT: complete runs by hand, the second one after a delay
        let worker = NodeId::new();
        let first = queue.claim_run(OrganizationId(1), &worker).await.unwrap().unwrap();
        let mut result = PartialResult::new();
        result.insert("sum".to_string(), json!(4));
        queue
            .complete_run(&first.run_id, &worker, RunOutcome::Completed { result: result.clone() })
            .await
            .unwrap();

        let late_queue = queue.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let second = late_queue.claim_run(OrganizationId(2), &worker).await.unwrap().unwrap();
            late_queue
                .complete_run(&second.run_id, &worker, RunOutcome::Completed { result })
                .await
                .unwrap();
        });

        let combined = aggregator.await_and_combine(&handle, &SumCombiner::new("sum")).await.unwrap();

        // ASSERT
        assert_eq!(combined.result["sum"], json!(8));
        assert_eq!(combined.contributors, targets(&[1, 2]));
    }

    #[tokio::test]
    async fn test_bounded_wait_times_out_explicitly() {
        let (queue, registry) = setup(&[1], &[]);
        let handle = Dispatcher::new(queue.clone(), registry)
            .dispatch(new_task(TaskInput::new("echo").arg(1), &[1]))
            .await
            .unwrap();
        let aggregator = Aggregator::new(queue.clone())
            .with_poll_interval(Duration::from_millis(10))
            .with_max_wait(Some(Duration::from_millis(100)));

        let result = aggregator.wait_for_results(&handle).await;

        match result {
            Err(FederationError::WaitTimedOut { task_id, waited }) => {
                assert_eq!(task_id, handle.task_id);
                assert!(waited >= Duration::from_millis(100));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_abandoned_wait_leaves_runs_in_place() {
        let (queue, registry) = setup(&[1], &[]);
        let handle = Dispatcher::new(queue.clone(), registry)
            .dispatch(new_task(TaskInput::new("echo").arg(1), &[1]))
            .await
            .unwrap();
        let aggregator = Aggregator::new(queue.clone()).with_poll_interval(Duration::from_millis(10));

        let abandoned =
            tokio::time::timeout(Duration::from_millis(50), aggregator.wait_for_results(&handle)).await;

        assert!(abandoned.is_err());
        let reports = queue.poll(&handle.task_id).await.unwrap();
        assert_eq!(reports[0].status, RunStatus::Pending);
    }

    // ============================================================
    // END TO END
    // ============================================================

    fn start_node(
        queue: &Arc<InMemoryTaskQueue>,
        registry: &Arc<JobRegistry>,
        organization: u64,
        file: &tempfile::NamedTempFile,
    ) -> Arc<TaskExecutor> {
        TaskExecutor::new(
            queue.clone(),
            registry.clone(),
            OrganizationId(organization),
            DatabaseCatalog::new().with("default", file.path().display().to_string()),
            ProxyConfig::default(),
            1,
        )
    }

    fn csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    fn orchestrator(queue: &Arc<InMemoryTaskQueue>, registry: &Arc<JobRegistry>) -> Orchestrator {
        Orchestrator::new(queue.clone(), registry.clone()).with_aggregator(
            Aggregator::new(queue.clone())
                .with_poll_interval(Duration::from_millis(20))
                .with_max_wait(Some(Duration::from_secs(20))),
        )
    }

    #[tokio::test]
    async fn test_federated_average_end_to_end() {
        // ARRANGE: partitions [1, 2, 3] and [4, 5]
        let (queue, registry) = setup(&[1, 2], &[]);
        let first = csv("Age\n1\n2\n3\n");
        let second = csv("Age\n4\n5\n");
        start_node(&queue, &registry, 1, &first).start().await;
        start_node(&queue, &registry, 2, &second).start().await;

        // ACT: no explicit targets, discovered from the queue
        let combined = orchestrator(&queue, &registry)
            .run(
                FederatedJob::new(TaskInput::new("federated_avg").arg("Age")),
                &AverageCombiner::default(),
            )
            .await
            .unwrap();

        // ASSERT
        assert_eq!(combined.result["average"], json!(3.0));
        assert_eq!(combined.contributors, targets(&[1, 2]));
    }

    #[tokio::test]
    async fn test_end_to_end_partial_failure_names_failed_target() {
        // ARRANGE: organization 2 has no Age column
        let (queue, registry) = setup(&[1, 2, 3], &[]);
        let files = [csv("Age\n1\n"), csv("Weight\n1\n"), csv("Age\n3\n")];
        for (index, file) in files.iter().enumerate() {
            start_node(&queue, &registry, index as u64 + 1, file).start().await;
        }

        // ACT
        let result = orchestrator(&queue, &registry)
            .run(
                FederatedJob::new(TaskInput::new("federated_avg").arg("Age")).targets(Some(targets(&[1, 2, 3]))),
                &AverageCombiner::default(),
            )
            .await;

        // ASSERT
        match result {
            Err(FederationError::PartialFailure { failed }) => {
                assert_eq!(failed.keys().copied().collect::<Vec<_>>(), vec![OrganizationId(2)]);
                assert!(failed[&OrganizationId(2)].contains("Age"));
            }
            other => panic!("expected partial failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_echo_round_trip_end_to_end() {
        let (queue, registry) = setup(&[1, 2], &[]);
        let files = [csv("a\n1\n"), csv("a\n2\n")];
        for (index, file) in files.iter().enumerate() {
            start_node(&queue, &registry, index as u64 + 1, file).start().await;
        }
        let payload = json!({"nested": [1, "two", {"three": 3.0}]});

        let combined = orchestrator(&queue, &registry)
            .run(
                FederatedJob::new(TaskInput::new("echo").kwarg("input", payload.clone())),
                &CollectCombiner::new("echo"),
            )
            .await
            .unwrap();

        assert_eq!(combined.result["echo"]["1"], payload);
        assert_eq!(combined.result["echo"]["2"], payload);
    }
}
