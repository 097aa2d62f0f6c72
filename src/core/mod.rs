pub mod error;
pub mod events;

pub use error::CoreError;
