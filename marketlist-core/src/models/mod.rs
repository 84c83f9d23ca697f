mod product;
mod unit;

pub use product::{Product, ProductError, ProductFields, ProductId, MAX_PRICE};
pub use unit::Unit;
