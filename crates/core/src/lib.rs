pub mod color;
pub mod config;
pub mod error;
pub mod export;
pub mod hierarchy;
pub mod interaction;
pub mod loader;
pub mod logging;
pub mod model;
pub mod scene;
pub mod search;
pub mod treemap;
pub mod view;

pub use error::{Error, Result};
pub use model::*;
pub use view::ViewController;
