pub mod density;
pub mod engine;
pub mod features;
pub mod merge;
pub mod statistics;
pub mod tuning;
pub mod windows;
#[cfg(test)]
mod tests;
