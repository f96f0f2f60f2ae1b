//! End-to-end tests for the ap-diskio-* crates.
