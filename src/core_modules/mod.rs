// THEORY:
// `core_modules` holds the pixel analysis primitives shared by every pipeline. They are
// layered the same way throughout: `pixel` (one pixel), `chunk` (a block of pixels),
// `raster` (a decoded image), then the whole-image analyzers `activity_grid`, `region`
// and `statistics`. Nothing in here knows what a brand mark or a hero image is.

pub mod activity_grid;
pub mod chunk;
pub mod pixel;
pub mod raster;
pub mod region;
pub mod statistics;

pub use pixel::Pixel;
pub use raster::Raster;
