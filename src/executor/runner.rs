//! Test run orchestration
//!
//! Drives a suite from start to end and supports cancelling the outstanding
//! run. Each runner owns a generation counter: starting a run or cancelling
//! one advances it, and an in-flight run that sees a newer generation at one
//! of its checkpoints stops without reporting anything further. Test outcomes
//! that settle after a newer run has started are dropped, since that run has
//! already rebuilt the store under the same ids.

use std::cell::Cell;
use std::rc::{Rc, Weak};
use tracing::{debug, info};

use super::ExecutionStrategy;
use crate::config::RunnerConfig;
use crate::models::{Assertions, Collection, RunResults, Status};
use crate::relay::{Relay, StoreRelay};
use crate::store::{shared_store, SharedStore};
use crate::utils::{now_ms, Timer};

/// Default per-test timeout when a collection sets none
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Lifecycle of the most recent run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    NotStarted,
    Running,
    Completed,
    Cancelled,
}

struct RunnerState {
    store: SharedStore,
    relay: Rc<dyn Relay>,
    generation: Cell<u64>,
    latest_run: Cell<u64>,
    state: Cell<RunState>,
    default_timeout_ms: Cell<u64>,
}

impl RunnerState {
    fn advance_generation(&self) -> u64 {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        next
    }

    fn is_stale(&self, stub: u64) -> bool {
        stub < self.generation.get()
    }

    fn is_superseded(&self, stub: u64) -> bool {
        stub < self.latest_run.get()
    }

    fn cancel(&self) {
        if self.state.get() != RunState::Running {
            debug!("Cancel requested with no outstanding run");
            return;
        }

        self.relay.cancel_run(now_ms());
        let generation = self.advance_generation();
        self.state.set(RunState::Cancelled);
        info!("Test run cancelled (generation {})", generation);
    }
}

/// Runs suites against a results store
///
/// Cloning yields another handle to the same runner, so a test body can
/// inspect or cancel the run it belongs to.
#[derive(Clone)]
pub struct TestRunner {
    inner: Rc<RunnerState>,
}

impl TestRunner {
    /// Create a runner with its own store and store relay
    pub fn new() -> Self {
        let store = shared_store();
        let relay = Rc::new(StoreRelay::new(store.clone()));
        Self::with_relay(store, relay)
    }

    /// Create a runner reporting through `relay`, which must feed `store`
    pub fn with_relay(store: SharedStore, relay: Rc<dyn Relay>) -> Self {
        Self {
            inner: Rc::new(RunnerState {
                store,
                relay,
                generation: Cell::new(0),
                latest_run: Cell::new(0),
                state: Cell::new(RunState::NotStarted),
                default_timeout_ms: Cell::new(DEFAULT_TIMEOUT_MS),
            }),
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new().with_default_timeout(config.default_timeout_ms)
    }

    /// Set the timeout used by collections without their own
    pub fn with_default_timeout(self, timeout_ms: u64) -> Self {
        self.inner.default_timeout_ms.set(timeout_ms);
        self
    }

    pub fn default_timeout(&self) -> u64 {
        self.inner.default_timeout_ms.get()
    }

    pub fn state(&self) -> RunState {
        self.inner.state.get()
    }

    pub fn generation(&self) -> u64 {
        self.inner.generation.get()
    }

    pub fn store(&self) -> &SharedStore {
        &self.inner.store
    }

    /// Current results, valid at any time including mid-run
    pub fn snapshot(&self) -> RunResults {
        self.inner.store.borrow().snapshot()
    }

    /// Handle that cancels without keeping the runner alive
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Cancel the outstanding run, if any
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Run every collection in order
    ///
    /// Returns `None` when the run was cancelled or superseded by a newer run
    /// before it could finish.
    pub async fn run(&self, suite: &[Collection]) -> Option<RunResults> {
        let inner = &self.inner;
        let timer = Timer::start("test run");
        let start_time = now_ms();
        let stub = inner.advance_generation();
        inner.latest_run.set(stub);
        inner.state.set(RunState::Running);

        info!(
            "Starting test run {} ({} collections, {} tests)",
            stub,
            suite.len(),
            suite.iter().map(Collection::len).sum::<usize>()
        );
        inner.relay.start_run(suite, start_time);

        let mut first_test_result_id = 0;
        for (collection_result_id, collection) in suite.iter().enumerate() {
            if inner.is_stale(stub) {
                debug!(
                    "Run {} stale before collection '{}', stopping",
                    stub, collection.title
                );
                return None;
            }

            let strategy = ExecutionStrategy::for_collection(collection);
            let timeout_interval = collection
                .timeout_interval
                .unwrap_or_else(|| inner.default_timeout_ms.get());

            debug!(
                "Collection '{}' ({:?}, {} tests, timeout {}ms)",
                collection.title,
                strategy,
                collection.len(),
                timeout_interval
            );
            inner
                .relay
                .start_collection(collection_result_id, now_ms());

            let tests_relay = RunRelay { state: inner, stub };
            strategy
                .execute(
                    &tests_relay,
                    &collection.tests,
                    first_test_result_id,
                    timeout_interval,
                )
                .await;

            if inner.is_stale(stub) {
                debug!(
                    "Run {} stale after collection '{}', stopping",
                    stub, collection.title
                );
                return None;
            }

            inner.relay.end_collection(collection_result_id, now_ms());
            first_test_result_id += collection.len();
        }

        if inner.is_stale(stub) {
            debug!("Run {} stale before completion", stub);
            return None;
        }

        inner.relay.end_run(now_ms());
        inner.state.set(RunState::Completed);

        let results = self.snapshot();
        info!(
            "Test run {} {} in {}ms - Pass: {}/{} ({:.1}%)",
            stub,
            results.result.status,
            timer.stop().as_millis(),
            results.count(Status::Passed),
            results.total(),
            results.pass_rate()
        );

        Some(results)
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Relay handed to the strategies for one run
///
/// Test events are forwarded only while no newer run has started. A cancelled
/// run still records its in-flight tests against its own store.
struct RunRelay<'a> {
    state: &'a RunnerState,
    stub: u64,
}

impl RunRelay<'_> {
    fn is_current(&self, test_result_id: usize) -> bool {
        if self.state.is_superseded(self.stub) {
            debug!(
                "Dropping test {} event from superseded run {}",
                test_result_id, self.stub
            );
            return false;
        }
        true
    }
}

impl Relay for RunRelay<'_> {
    fn start_run(&self, suite: &[Collection], start_time: u64) {
        self.state.relay.start_run(suite, start_time);
    }

    fn start_collection(&self, collection_result_id: usize, start_time: u64) {
        self.state
            .relay
            .start_collection(collection_result_id, start_time);
    }

    fn start_test(&self, test_result_id: usize, start_time: u64) {
        if self.is_current(test_result_id) {
            self.state.relay.start_test(test_result_id, start_time);
        }
    }

    fn end_test(&self, test_result_id: usize, end_time: u64, assertions: Assertions) {
        if self.is_current(test_result_id) {
            self.state
                .relay
                .end_test(test_result_id, end_time, assertions);
        }
    }

    fn end_collection(&self, collection_result_id: usize, end_time: u64) {
        self.state.relay.end_collection(collection_result_id, end_time);
    }

    fn end_run(&self, end_time: u64) {
        self.state.relay.end_run(end_time);
    }

    fn cancel_run(&self, end_time: u64) {
        self.state.relay.cancel_run(end_time);
    }
}

/// Weak handle for cancelling a runner's outstanding run
#[derive(Clone)]
pub struct CancelHandle {
    inner: Weak<RunnerState>,
}

impl CancelHandle {
    /// Cancel the outstanding run; a no-op once the runner is gone
    pub fn cancel(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::timeout_assertion;
    use crate::models::{Assertions, Test};
    use crate::relay::testing::RecordingRelay;
    use crate::store::StoreEvent;
    use std::time::Duration;

    fn passing(name: &str) -> Test {
        Test::sync(name, |_| Vec::new())
    }

    fn failing(name: &str, message: &'static str) -> Test {
        Test::sync(name, move |_| vec![message.to_string()])
    }

    fn delayed(name: &str, ms: u64) -> Test {
        Test::new(name, move |_| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Vec::new()
        })
    }

    fn recording_runner() -> (TestRunner, Rc<RecordingRelay>) {
        let store = shared_store();
        let relay = Rc::new(RecordingRelay::new(store.clone()));
        (TestRunner::with_relay(store, relay.clone()), relay)
    }

    #[test]
    fn test_runner_creation() {
        let runner = TestRunner::new().with_default_timeout(250);
        assert_eq!(runner.default_timeout(), 250);
        assert_eq!(runner.state(), RunState::NotStarted);
        assert_eq!(runner.generation(), 0);
    }

    #[test]
    fn test_from_config() {
        let config = RunnerConfig {
            default_timeout_ms: 42,
            ..RunnerConfig::default()
        };
        assert_eq!(TestRunner::from_config(&config).default_timeout(), 42);
    }

    #[test]
    fn test_snapshot_before_run() {
        let snapshot = TestRunner::new().snapshot();
        assert_eq!(snapshot.result.status, Status::Pending);
        assert!(snapshot.collection_results.is_empty());
        assert!(snapshot.test_results.is_empty());
    }

    #[test]
    fn test_cancel_without_run_is_noop() {
        let (runner, relay) = recording_runner();
        runner.cancel();

        assert!(relay.events().is_empty());
        assert_eq!(runner.generation(), 0);
        assert_eq!(runner.state(), RunState::NotStarted);
    }

    #[tokio::test]
    async fn test_sequential_collection_passes() {
        let runner = TestRunner::new();
        let suite = vec![Collection::new("ordered").with_tests(vec![passing("a"), passing("b")])];

        let results = runner.run(&suite).await.expect("run completes");

        assert_eq!(results.result.status, Status::Passed);
        assert_eq!(results.collection_results[0].status, Status::Passed);
        assert!(results
            .test_results
            .iter()
            .all(|r| r.status == Status::Passed));
        assert_eq!(runner.state(), RunState::Completed);
    }

    #[tokio::test]
    async fn test_concurrent_failure_propagates() {
        let runner = TestRunner::new();
        let suite = vec![Collection::new("overlapping")
            .with_tests(vec![passing("a"), failing("b", "x failed")])
            .concurrent(true)];

        let results = runner.run(&suite).await.expect("run completes");

        assert_eq!(results.test_results[0].status, Status::Passed);
        assert_eq!(results.test_results[1].status, Status::Failed);
        assert_eq!(
            results.test_results[1].assertions,
            vec!["x failed".to_string()]
        );
        assert_eq!(results.collection_results[0].status, Status::Failed);
        assert_eq!(results.result.status, Status::Failed);
    }

    #[tokio::test]
    async fn test_failure_is_scoped_to_its_collection() {
        let runner = TestRunner::new();
        let suite = vec![
            Collection::new("good").with_test(passing("a")),
            Collection::new("bad").with_test(failing("b", "nope")),
            Collection::new("also good")
                .with_tests(vec![passing("c"), passing("d")])
                .concurrent(true),
        ];

        let results = runner.run(&suite).await.expect("run completes");
        let statuses: Vec<Status> = results
            .collection_results
            .iter()
            .map(|c| c.status)
            .collect();

        assert_eq!(statuses, vec![Status::Passed, Status::Failed, Status::Passed]);
        assert_eq!(results.result.status, Status::Failed);
        assert_eq!(results.collection_results[2].indices, 2..4);
    }

    #[tokio::test]
    async fn test_identity_stable_under_both_strategies() {
        for concurrent in [false, true] {
            let runner = TestRunner::new();
            let suite = vec![
                Collection::new("first").with_tests(vec![delayed("slow", 30), delayed("fast", 1)]),
                Collection::new("second")
                    .with_tests(vec![delayed("slower", 20), delayed("instant", 0)])
                    .concurrent(concurrent),
            ];

            let results = runner.run(&suite).await.expect("run completes");
            let names: Vec<&str> = results
                .test_results
                .iter()
                .map(|r| r.name.as_str())
                .collect();

            assert_eq!(names, vec!["slow", "fast", "slower", "instant"]);
            for (position, result) in results.test_results.iter().enumerate() {
                assert_eq!(result.test_result_id, position);
                assert_eq!(result.test_id, position);
            }
            for (position, collection) in results.collection_results.iter().enumerate() {
                assert_eq!(collection.collection_result_id, position);
            }
        }
    }

    #[tokio::test]
    async fn test_timing_is_aggregated() {
        let runner = TestRunner::new();
        let suite = vec![Collection::new("timed").with_tests(vec![delayed("a", 15), delayed("b", 15)])];

        let results = runner.run(&suite).await.expect("run completes");
        let collection = &results.collection_results[0];

        let sum: u64 = results.test_results.iter().map(|r| r.duration_ms()).sum();
        assert_eq!(collection.test_time, sum);
        assert_eq!(results.result.test_time, collection.test_time);
        assert!(collection.test_time >= 30);
        assert!(results.result.end_time >= results.result.start_time);
    }

    #[tokio::test]
    async fn test_timeout_in_concurrent_collection() {
        let runner = TestRunner::new();
        let suite = vec![Collection::new("timeouts")
            .with_tests(vec![
                Test::new("never settles", |_| std::future::pending::<Assertions>()),
                passing("sibling passes"),
                failing("sibling fails", "x failed"),
            ])
            .concurrent(true)
            .with_timeout(10)];

        let results = runner.run(&suite).await.expect("run completes");

        assert_eq!(results.test_results[0].status, Status::Failed);
        assert_eq!(
            results.test_results[0].assertions,
            vec![timeout_assertion(10)]
        );
        assert_eq!(results.test_results[1].status, Status::Passed);
        assert_eq!(results.test_results[2].status, Status::Failed);
        assert_eq!(
            results.test_results[2].assertions,
            vec!["x failed".to_string()]
        );
    }

    #[tokio::test]
    async fn test_default_timeout_applies() {
        let runner = TestRunner::new().with_default_timeout(10);
        let suite = vec![Collection::new("defaults").with_test(delayed("slow", 500))];

        let results = runner.run(&suite).await.expect("run completes");

        assert_eq!(
            results.test_results[0].assertions,
            vec![timeout_assertion(10)]
        );
        assert_eq!(results.collection_results[0].timeout_interval, None);
    }

    #[tokio::test]
    async fn test_cancel_between_collections() {
        let (runner, relay) = recording_runner();
        let handle = runner.cancel_handle();
        relay.on_event(move |event| {
            if let StoreEvent::EndCollection {
                collection_result_id: 0,
                ..
            } = event
            {
                handle.cancel();
            }
        });

        let suite = vec![
            Collection::new("first").with_test(passing("a")),
            Collection::new("second").with_tests(vec![passing("b"), passing("c")]),
        ];

        assert!(runner.run(&suite).await.is_none());

        let snapshot = runner.snapshot();
        assert_eq!(snapshot.result.status, Status::Cancelled);
        assert_eq!(snapshot.collection_results[0].status, Status::Passed);
        assert_eq!(snapshot.collection_results[1].status, Status::Pending);
        assert_eq!(snapshot.test_results[1].status, Status::Pending);
        assert_eq!(snapshot.test_results[2].status, Status::Pending);
        assert_eq!(runner.state(), RunState::Cancelled);

        assert_eq!(
            relay.kinds(),
            vec![
                "initialize",
                "start_run",
                "start_collection",
                "start_test",
                "end_test",
                "end_collection",
                "cancel_run",
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_mid_collection_skips_end_collection() {
        let runner = TestRunner::new();
        let handle = runner.cancel_handle();
        let suite = vec![
            Collection::new("cancels itself").with_tests(vec![
                Test::sync("cancel", move |_| {
                    handle.cancel();
                    Vec::new()
                }),
                passing("still runs"),
            ]),
            Collection::new("never starts").with_test(passing("skipped")),
        ];

        assert!(runner.run(&suite).await.is_none());

        let snapshot = runner.snapshot();
        assert_eq!(snapshot.result.status, Status::Cancelled);
        // Tests already launched in the collection still report.
        assert_eq!(snapshot.test_results[1].status, Status::Passed);
        assert_eq!(snapshot.collection_results[0].status, Status::Unsubmitted);
        assert_eq!(snapshot.collection_results[1].status, Status::Pending);
    }

    #[tokio::test]
    async fn test_snapshot_mid_run() {
        let runner = TestRunner::new();
        let observer = runner.clone();
        let seen = Rc::new(Cell::new(None));
        let seen_in_body = seen.clone();

        let suite = vec![
            Collection::new("first").with_test(passing("a")),
            Collection::new("second").with_tests(vec![
                Test::sync("observes", move |_| {
                    let snapshot = observer.snapshot();
                    seen_in_body.set(Some((
                        snapshot.result.status,
                        snapshot.collection_results[0].status,
                        snapshot.collection_results[1].status,
                        snapshot.test_results[2].status,
                    )));
                    Vec::new()
                }),
                passing("later"),
            ]),
        ];

        runner.run(&suite).await.expect("run completes");

        assert_eq!(
            seen.get(),
            Some((
                Status::Unsubmitted,
                Status::Passed,
                Status::Unsubmitted,
                Status::Pending,
            ))
        );
    }

    #[tokio::test]
    async fn test_new_run_supersedes_outstanding_run() {
        let runner = TestRunner::new();
        let first = vec![
            Collection::new("slow").with_test(delayed("waits", 50)),
            Collection::new("after").with_test(passing("never")),
        ];
        let second = vec![Collection::new("quick").with_test(passing("fast"))];

        let restarter = runner.clone();
        let (old, new) = tokio::join!(runner.run(&first), async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            restarter.run(&second).await
        });

        assert!(old.is_none());
        let new = new.expect("newer run completes");
        assert_eq!(new.result.status, Status::Passed);
        assert_eq!(new.collection_results.len(), 1);
        assert_eq!(runner.generation(), 2);
        assert_eq!(runner.state(), RunState::Completed);
    }

    #[tokio::test]
    async fn test_superseded_run_cannot_overwrite_newer_results() {
        let runner = TestRunner::new();
        let first = vec![Collection::new("slow")
            .with_test(Test::new("late failure", |_| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                vec!["stale failure".to_string()]
            }))
            .concurrent(true)];
        let second = vec![Collection::new("quick").with_test(passing("fast pass"))];

        let restarter = runner.clone();
        let (old, new) = tokio::join!(runner.run(&first), async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            restarter.run(&second).await
        });

        assert!(old.is_none());
        assert_eq!(new.expect("newer run completes").result.status, Status::Passed);

        let snapshot = runner.snapshot();
        assert_eq!(snapshot.result.status, Status::Passed);
        assert_eq!(snapshot.collection_results[0].status, Status::Passed);
        assert_eq!(snapshot.test_results.len(), 1);
        assert_eq!(snapshot.test_results[0].name, "fast pass");
        assert_eq!(snapshot.test_results[0].status, Status::Passed);
        assert!(snapshot.test_results[0].assertions.is_empty());
    }

    #[tokio::test]
    async fn test_runners_do_not_share_generations() {
        let first = TestRunner::new();
        let second = TestRunner::new();
        let suite = vec![Collection::new("c").with_test(passing("a"))];

        first.run(&suite).await.expect("run completes");
        second.cancel();

        assert_eq!(first.generation(), 1);
        assert_eq!(second.generation(), 0);
        assert!(second.run(&suite).await.is_some());
    }

    #[tokio::test]
    async fn test_cancel_after_completion_is_noop() {
        let runner = TestRunner::new();
        let suite = vec![Collection::new("c").with_test(passing("a"))];
        runner.run(&suite).await.expect("run completes");

        runner.cancel();

        assert_eq!(runner.snapshot().result.status, Status::Passed);
        assert_eq!(runner.generation(), 1);
    }

    #[tokio::test]
    async fn test_empty_suite() {
        let runner = TestRunner::new();
        let results = runner.run(&[]).await.expect("run completes");
        assert_eq!(results.result.status, Status::Passed);
        assert_eq!(results.result.test_time, 0);
    }

    #[test]
    fn test_cancel_handle_outlives_runner() {
        let handle = TestRunner::new().cancel_handle();
        handle.cancel();
    }
}
