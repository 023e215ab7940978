pub mod harness;

mod assertions;
pub use harness::{
    TestCase, TestSuiteDesc, TestSuiteResult, expect_pass, install_test_backend, run_single_test,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestResult {
    Pass,
    Fail,
    Skipped,
}

impl TestResult {
    #[inline]
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Fail)
    }
}

#[macro_export]
macro_rules! pass {
    () => {
        $crate::testing::TestResult::Pass
    };
}

#[macro_export]
macro_rules! fail {
    () => {
        $crate::testing::TestResult::Fail
    };
    ($msg:expr) => {{
        $crate::klog_info!("TEST FAIL: {}", $msg);
        $crate::testing::TestResult::Fail
    }};
    ($fmt:expr, $($arg:tt)*) => {{
        $crate::klog_info!(concat!("TEST FAIL: ", $fmt), $($arg)*);
        $crate::testing::TestResult::Fail
    }};
}

/// Register a list of `fn() -> TestResult` cases as a named suite.
///
/// Emits a `<SUITE>_SUITE` descriptor that runs every case in order, and,
/// when the enclosing crate is built for `cargo test`, one `#[test]` per case
/// plus a `<suite>_suite_passes` test that runs the whole suite back to back.
#[macro_export]
macro_rules! define_test_suite {
    ($suite_name:ident, [$($test_fn:ident),* $(,)?]) => {
        $crate::paste::paste! {
            pub static [<$suite_name:upper _SUITE>]: $crate::testing::TestSuiteDesc =
                $crate::testing::TestSuiteDesc {
                    name: stringify!($suite_name),
                    cases: &[
                        $(
                            $crate::testing::TestCase {
                                name: stringify!($test_fn),
                                run: $test_fn,
                            },
                        )*
                    ],
                };

            $(
                #[cfg(test)]
                #[test]
                fn [<$test_fn _passes>]() {
                    $crate::testing::expect_pass(stringify!($test_fn), $test_fn);
                }
            )*

            #[cfg(test)]
            #[test]
            fn [<$suite_name _suite_passes>]() {
                $crate::testing::install_test_backend();
                let result = [<$suite_name:upper _SUITE>].run();
                assert!(
                    result.all_passed(),
                    "suite {} failed: {}/{} passed",
                    result.name,
                    result.passed,
                    result.total
                );
            }
        }
    };
}
