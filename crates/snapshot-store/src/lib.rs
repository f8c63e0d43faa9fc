mod models;
mod merge;
mod store;

pub use models::*;
pub use merge::*;
pub use store::*;
