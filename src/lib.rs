// THEORY:
// This file is the main entry point for the `asset_gate` library crate. The public
// face of the engine is `pipeline::AssetPipeline`: hand it the assets scraped from a
// page and it returns one brand mark, one hero image and one validated color scheme.
//
// The three selection pipelines (`brand_mark`, `hero`, `color`) are also public so they
// can be driven on their own. They share the pixel primitives in `core_modules`, the
// candidate model and I/O seam in `assets`, and the thresholds in `config`.

pub mod assets;
pub mod brand_mark;
pub mod color;
pub mod config;
pub mod core_modules;
pub mod error;
pub mod hero;
pub mod pipeline;

pub use config::EngineConfig;
pub use error::{AssetError, ConfigError};
pub use pipeline::{AssetPipeline, AssetReport, PageAssets};
