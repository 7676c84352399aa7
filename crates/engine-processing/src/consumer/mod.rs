pub mod accumulator;
pub mod committer;
