//! Integration tests for the native/execution bridge.


pub mod executor_tests;
pub mod session_tests;
