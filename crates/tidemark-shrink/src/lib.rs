//! Importance scoring, candidate selection and shrink execution

mod executor;
mod scoring;
mod selector;
mod summarize;

#[cfg(test)]
mod testing;

pub use executor::execute;
pub use scoring::{age_days, importance_score};
pub use selector::{analyze, target_count, AnalyzeOptions};
pub use summarize::{build_summary, first_sentences, SUMMARY_TYPE};
