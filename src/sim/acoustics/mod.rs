pub mod direct;
pub mod intensity;
pub mod receiver;
pub mod source;
