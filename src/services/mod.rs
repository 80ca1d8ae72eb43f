// Services module for packaging and measurement logic
pub mod dependency_resolver;
pub mod jitter;
pub mod kernel;
pub mod smoke_test_runner;
pub mod source_exporter;
pub mod source_preparer;
