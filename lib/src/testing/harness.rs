// Test harness types: TestCase, TestSuiteDesc, TestSuiteResult.
// Suites are declared with define_test_suite! next to the code they cover.

use super::TestResult;
use crate::klog_info;

/// One named test case.
#[derive(Clone, Copy)]
pub struct TestCase {
    pub name: &'static str,
    pub run: fn() -> TestResult,
}

/// A named, ordered list of test cases.
#[derive(Clone, Copy)]
pub struct TestSuiteDesc {
    pub name: &'static str,
    pub cases: &'static [TestCase],
}

/// Result of executing a single test suite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TestSuiteResult {
    pub name: &'static str,
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl TestSuiteResult {
    /// Create a new result with just the suite name set.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            total: 0,
            passed: 0,
            failed: 0,
            skipped: 0,
        }
    }

    fn record(&mut self, result: TestResult) {
        self.total = self.total.saturating_add(1);
        match result {
            TestResult::Pass => self.passed = self.passed.saturating_add(1),
            TestResult::Fail => self.failed = self.failed.saturating_add(1),
            TestResult::Skipped => self.skipped = self.skipped.saturating_add(1),
        }
    }

    /// Check if no test in this suite failed.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

impl TestSuiteDesc {
    /// Run every case in declaration order.
    pub fn run(&self) -> TestSuiteResult {
        let mut result = TestSuiteResult::new(self.name);
        for case in self.cases {
            result.record(run_single_test(case.name, case.run));
        }
        klog_info!(
            "SUITE {}: {}/{} passed, {} skipped",
            self.name,
            result.passed,
            result.total,
            result.skipped
        );
        result
    }
}

pub fn run_single_test(name: &str, test_fn: fn() -> TestResult) -> TestResult {
    let result = test_fn();
    match result {
        TestResult::Pass => {}
        TestResult::Fail => klog_info!("TEST {} ... FAILED", name),
        TestResult::Skipped => klog_info!("TEST {} ... skipped", name),
    }
    result
}

/// Run `test_fn` and panic if it fails. Bridges suites into `#[test]`
/// functions.
///
/// With the `std` feature the panic message carries the last klog line the
/// case emitted, which is the failing assertion's location and values.
pub fn expect_pass(name: &str, test_fn: fn() -> TestResult) {
    install_test_backend();
    capture::reset_last_line();
    if test_fn().is_failure() {
        fail_case(name);
    }
}

#[cfg(feature = "std")]
fn fail_case(name: &str) -> ! {
    panic!("test {} failed: {}", name, capture::last_line());
}

#[cfg(not(feature = "std"))]
fn fail_case(name: &str) -> ! {
    panic!("test {} failed (see klog output for the failing assertion)", name);
}

/// Send klog output to stderr. Installed once per process; a no-op without
/// the `std` feature, where the embedding host owns the backend.
pub fn install_test_backend() {
    capture::install();
}

#[cfg(feature = "std")]
mod capture {
    use core::cell::RefCell;
    use core::fmt::{self, Write};
    use std::string::String;
    use std::sync::Once;

    use crate::klog::klog_register_backend;

    std::thread_local! {
        static LAST_LINE: RefCell<String> = const { RefCell::new(String::new()) };
    }

    fn stderr_backend(args: fmt::Arguments<'_>) {
        std::eprintln!("{}", args);
        LAST_LINE.with(|line| {
            let mut line = line.borrow_mut();
            line.clear();
            let _ = line.write_fmt(args);
        });
    }

    pub fn install() {
        static INSTALL: Once = Once::new();
        INSTALL.call_once(|| klog_register_backend(stderr_backend));
    }

    pub fn reset_last_line() {
        LAST_LINE.with(|line| line.borrow_mut().clear());
    }

    pub fn last_line() -> String {
        LAST_LINE.with(|line| line.borrow().clone())
    }
}

#[cfg(not(feature = "std"))]
mod capture {
    pub fn install() {}

    pub fn reset_last_line() {}
}
