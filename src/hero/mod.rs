// THEORY:
// The hero-image pipeline: gate and score (`evaluator`), tell photos from slides and
// screenshots (`classifier`), and turn the winner into a renderable result (`prepare`).
// A photo is always preferred; a text-heavy image is used only when no photo passes,
// and a gradient when nothing does.

pub mod classifier;
pub mod evaluator;
pub mod prepare;

pub use classifier::ContentType;
pub use evaluator::{HeroEvaluation, HeroPick, select_hero};
pub use prepare::{HeroImageResult, Orientation, hero_or_gradient};
