mod handler;

pub use handler::{SearchForm, SearchTarget, search};
