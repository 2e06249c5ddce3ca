pub mod destination;
pub mod factory;
pub mod source;
