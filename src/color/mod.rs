// THEORY:
// The color model and the color-scheme quality gate. `rgb` is the value type;
// `scheme` holds the gate's inputs and outputs; `checks` are the ten rules; `repair`
// is one pure repair pass; `palette` proposes schemes and fallbacks; `gate` runs the
// bounded validate-and-fix loop.

pub mod checks;
pub mod gate;
pub mod palette;
pub mod repair;
pub mod rgb;
pub mod scheme;

pub use gate::validate_and_fix;
pub use palette::{default_palette, propose_scheme};
pub use rgb::Rgb;
pub use scheme::{AccentSource, CheckName, ColorContext, ColorScheme, PageColor, QualityGateReport};
