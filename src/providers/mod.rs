pub mod azure;
mod chat_completions;
pub mod http_errors;
pub mod openai;
