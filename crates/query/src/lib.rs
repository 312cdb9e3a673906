pub mod aggregator;
pub mod assistant;
pub mod config;
pub mod context;
pub mod error;
pub mod fallback;
pub mod generator;
pub mod llm;
pub mod prompt;
pub mod ranker;
pub mod retry;
pub mod session;

pub use aggregator::{SelectionResult, select};
pub use assistant::{
    Assistant, AssistantResponse, NO_INFORMATION_MESSAGE, Retrieval, RetrievalTrace, SourceRef,
};
pub use config::{AssistantConfig, GeneratorConfig, RetrievalConfig, TOP_K_LIMIT};
pub use context::ContextAssembler;
pub use error::QueryError;
pub use fallback::FallbackGenerator;
pub use generator::{AnswerSource, GeneratedAnswer, Generator, GeneratorAdapter, LlmGenerator};
pub use llm::{LlmError, QueryLLM};
pub use ranker::{Ranker, ScoredChunk};
pub use retry::RetryPolicy;
pub use session::{CurrentContext, SessionMemory};
