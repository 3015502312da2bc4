pub mod collection;
pub mod material;
pub mod session;
