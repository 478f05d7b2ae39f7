//! Suite definition models
//!
//! A run is an ordered list of collections, each holding ordered tests.

use futures::future::{FutureExt, LocalBoxFuture};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// Assertion failure messages produced by a test body. Empty means pass.
pub type Assertions = Vec<String>;

/// Parameters handed to a test body on every invocation
pub type TestParams = serde_json::Value;

type TestBody = Rc<dyn Fn(TestParams) -> LocalBoxFuture<'static, Assertions>>;

/// A single unit of behavior verification
#[derive(Clone)]
pub struct Test {
    pub name: String,
    pub params: TestParams,
    body: TestBody,
}

impl Test {
    /// Create a test from an asynchronous body
    pub fn new<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(TestParams) -> Fut + 'static,
        Fut: Future<Output = Assertions> + 'static,
    {
        Self {
            name: name.into(),
            params: TestParams::Null,
            body: Rc::new(move |params| body(params).boxed_local()),
        }
    }

    /// Create a test from a synchronous body
    ///
    /// The body only runs once the returned future is first polled, so it
    /// executes inside the same timeout race and panic guard as async bodies.
    pub fn sync<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(TestParams) -> Assertions + 'static,
    {
        let body = Rc::new(body);
        Self::new(name, move |params| {
            let body = Rc::clone(&body);
            async move { body(params) }
        })
    }

    pub fn with_params(mut self, params: TestParams) -> Self {
        self.params = params;
        self
    }

    /// Start the body with this test's parameters
    pub fn invoke(&self) -> LocalBoxFuture<'static, Assertions> {
        (self.body)(self.params.clone())
    }
}

impl fmt::Debug for Test {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Test")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// An ordered group of tests sharing an execution strategy and timeout
#[derive(Clone, Debug)]
pub struct Collection {
    pub title: String,
    pub tests: Vec<Test>,
    /// Start every test before awaiting any of them
    pub concurrent_execution: bool,
    /// Per-test timeout in milliseconds; the runner default applies when unset
    pub timeout_interval: Option<u64>,
}

impl Collection {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tests: Vec::new(),
            concurrent_execution: false,
            timeout_interval: None,
        }
    }

    pub fn with_test(mut self, test: Test) -> Self {
        self.tests.push(test);
        self
    }

    pub fn with_tests(mut self, tests: impl IntoIterator<Item = Test>) -> Self {
        self.tests.extend(tests);
        self
    }

    pub fn concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent_execution = concurrent;
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_interval = Some(timeout_ms);
        self
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}
