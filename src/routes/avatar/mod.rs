mod handler;
mod model;

pub use handler::{avatar, profile};
pub use model::RenderParams;
