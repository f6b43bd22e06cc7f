mod adapter;
mod types;

#[cfg(test)]
mod tests;

pub use adapter::OpenAiCompatibleAdapter;
pub use types::{
    OpenAiCompatibleConfig, GROQ_BASE_URL, GROQ_DEFAULT_MODEL, OPENAI_BASE_URL,
    OPENAI_DEFAULT_MODEL,
};
