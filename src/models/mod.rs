pub mod artifact;
pub mod chat;
pub mod config;
pub mod request;

pub use artifact::*;
pub use chat::*;
pub use config::*;
pub use request::*;
