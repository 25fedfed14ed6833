//! Model clients

mod base;
mod openai;
mod stream;

pub use base::HttpClientBase;
pub use openai::OpenAIClient;
pub use stream::{StreamAccumulator, StreamProgress};
