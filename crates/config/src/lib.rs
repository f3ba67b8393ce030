pub mod settings;

pub use settings::{PlacementSettings, Settings};
