//! Type-safe assertion macros returning TestResult on failure.
//!
//! Each failure is logged with its source location before the test returns,
//! so a failing suite names the exact line even when run outside a debugger.

#[macro_export]
macro_rules! assert_eq_test {
    ($left:expr, $right:expr) => {{
        let left = $left;
        let right = $right;
        if left != right {
            $crate::klog_info!(
                "ASSERT_EQ {}:{}: expected {:?}, got {:?}",
                file!(),
                line!(),
                right,
                left
            );
            return $crate::testing::TestResult::Fail;
        }
    }};
    ($left:expr, $right:expr, $msg:expr) => {{
        let left = $left;
        let right = $right;
        if left != right {
            $crate::klog_info!(
                "ASSERT_EQ {}:{}: {} - expected {:?}, got {:?}",
                file!(),
                line!(),
                $msg,
                right,
                left
            );
            return $crate::testing::TestResult::Fail;
        }
    }};
}

#[macro_export]
macro_rules! assert_test {
    ($cond:expr) => {{
        if !$cond {
            $crate::klog_info!("ASSERT {}:{}: condition failed", file!(), line!());
            return $crate::testing::TestResult::Fail;
        }
    }};
    ($cond:expr, $msg:expr) => {{
        if !$cond {
            $crate::klog_info!("ASSERT {}:{}: {}", file!(), line!(), $msg);
            return $crate::testing::TestResult::Fail;
        }
    }};
}

/// Unwrap an `Ok`, failing the test on `Err`.
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {{
        match $result {
            Ok(v) => v,
            Err(e) => {
                $crate::klog_info!("ASSERT_OK {}:{}: got Err({:?})", file!(), line!(), e);
                return $crate::testing::TestResult::Fail;
            }
        }
    }};
    ($result:expr, $msg:expr) => {{
        match $result {
            Ok(v) => v,
            Err(e) => {
                $crate::klog_info!(
                    "ASSERT_OK {}:{}: {} - got Err({:?})",
                    file!(),
                    line!(),
                    $msg,
                    e
                );
                return $crate::testing::TestResult::Fail;
            }
        }
    }};
}

/// Require a specific `Err` value.
#[macro_export]
macro_rules! assert_err {
    ($result:expr, $err:expr) => {{
        match $result {
            Err(e) if e == $err => {}
            other => {
                $crate::klog_info!(
                    "ASSERT_ERR {}:{}: expected Err({:?}), got {:?}",
                    file!(),
                    line!(),
                    $err,
                    other
                );
                return $crate::testing::TestResult::Fail;
            }
        }
    }};
    ($result:expr, $err:expr, $msg:expr) => {{
        match $result {
            Err(e) if e == $err => {}
            other => {
                $crate::klog_info!(
                    "ASSERT_ERR {}:{}: {} - expected Err({:?}), got {:?}",
                    file!(),
                    line!(),
                    $msg,
                    $err,
                    other
                );
                return $crate::testing::TestResult::Fail;
            }
        }
    }};
}
