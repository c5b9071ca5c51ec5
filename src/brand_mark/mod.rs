// THEORY:
// The brand-mark pipeline: gather favicon / manifest icons / logo, score each one
// (`evaluator`), pick a winner under the favicon preference policy (`selector`), and
// hand back the winner as a square image (`normalize`). No admissible candidate means
// the caller renders initials.

pub mod evaluator;
pub mod normalize;
pub mod selector;

pub use selector::{SelectionResult, initials, select_brand_mark};
