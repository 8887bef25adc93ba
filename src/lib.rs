mod camera_boom;
mod character_controller;
mod input_plugin;
mod settings;

pub use camera_boom::*;
pub use character_controller::*;
pub use input_plugin::*;
pub use settings::*;
