// THEORY:
// Everything about a candidate asset that is not a heuristic: where it came from
// (`candidate`), how it is fetched (`fetch`), decoded and re-encoded (`imaging`), and
// the record an evaluator leaves behind (`analysis`).

pub mod analysis;
pub mod candidate;
pub mod fetch;
pub mod imaging;

pub use analysis::{AnalysisResult, Criterion, Dimensions, Verdict};
pub use candidate::{Candidate, SourceTag};
pub use fetch::{AssetFetcher, HttpFetcher, MemoryFetcher};
