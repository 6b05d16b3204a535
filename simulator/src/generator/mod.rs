pub mod engine;
pub mod input;
pub mod profile;
pub mod template;
