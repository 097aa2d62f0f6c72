pub mod lots;
pub mod price;

pub use lots::Lots;
pub use price::Price;
