//! Contract test entry point for async_runtime

mod contract_test;
