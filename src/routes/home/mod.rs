mod handler;

pub use handler::{LatestUser, health, latest_users};
