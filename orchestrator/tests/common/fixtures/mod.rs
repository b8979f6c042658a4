//! Reusable test utilities:
//! - An in-memory container runtime that records every call
//! - Node configs rooted in a temporary directory

// Not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod fake_runtime;
pub mod test_data;

pub use fake_runtime::{FakeRuntime, RuntimeCall};
pub use test_data::*;
