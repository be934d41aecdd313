pub mod error;
pub mod model;
pub mod openai;
pub mod redis;
pub mod tool_api;
