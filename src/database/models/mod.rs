pub mod user;

pub use user::{ProfileBackground, UserRecord};
