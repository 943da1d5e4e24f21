pub mod backdrop;
pub mod camera;
pub mod clock;
pub mod combinators;
pub mod composer;
pub mod controller;
pub mod creature;
pub mod domain;
pub mod error;
pub mod field;
pub mod frame;
pub mod interp;
pub mod march;
pub mod noise;
pub mod palette;
pub mod plugin;
pub mod presets;
pub mod primitives;
pub mod registry;
pub mod render;
pub mod shading;
pub mod terrain;
pub mod types;
pub mod uniforms;
pub mod utils;
pub mod variant;

pub use backdrop::Backdrop;
pub use plugin::{BackdropController, BackdropPlugin, BackdropSet};
