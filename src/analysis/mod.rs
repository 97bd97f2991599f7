pub mod concurrency;
pub mod modification;
pub mod preconditions;

pub use preconditions::check;
