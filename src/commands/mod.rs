pub mod get;
pub mod restart;
pub mod submit;
