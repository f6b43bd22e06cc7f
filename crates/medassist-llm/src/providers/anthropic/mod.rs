mod adapter;
mod types;


pub use adapter::AnthropicAdapter;
pub use types::{AnthropicConfig, API_VERSION, DEFAULT_BASE_URL, DEFAULT_MODEL};
