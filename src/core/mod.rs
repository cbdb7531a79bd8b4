pub mod config;
pub mod file_store;
pub mod generator;
pub mod inserter;
pub mod layout;
pub mod parser;
pub mod prompts;
pub mod provider;
pub mod source;

pub use config::*;
pub use file_store::*;
pub use generator::*;
pub use inserter::*;
pub use layout::*;
pub use parser::*;
pub use prompts::*;
pub use provider::*;
pub use source::*;
