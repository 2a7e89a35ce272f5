pub mod installer;
pub mod metadata;
pub mod step;

pub use installer::PluginInstaller;
