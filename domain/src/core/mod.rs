//! Core domain primitives: the task value object.

pub mod task;
