//! # semantic-kernel-demo
//!
//! Prompt templates as callable "semantic functions" over a hosted
//! text-completion API.
//!
//! ## Overview
//!
//! A [`Kernel`] owns one or more completion services and a registry of
//! semantic functions. Each function is a [`PromptTemplate`] with completion
//! settings. Invoking a function renders its template against
//! [`ContextVariables`], sends the prompt to a [`TextCompletion`] backend and
//! returns the generated text. Functions can be chained with [`Kernel::run`],
//! each output becoming the next input.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use semantic_kernel_demo::{Kernel, KernelConfig};
//!
//! #[tokio::main]
//! async fn main() -> semantic_kernel_demo::Result<()> {
//!     let mut config = KernelConfig::new();
//!     config.add_openai_text_completion_service("text-davinci-003", "your-api-key")?;
//!     let mut kernel = Kernel::builder().with_config(config).build()?;
//!
//!     let summarize =
//!         kernel.create_semantic_function("{{$input}}\n\nOne line TLDR with the fewest words.")?;
//!     println!("{}", kernel.invoke(&summarize, "Energy cannot be created or destroyed.").await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`kernel`] | Kernel, builder, function registry and pipelines |
//! | [`function`] | Semantic function definition and registration options |
//! | [`template`] | Prompt template parsing and rendering |
//! | [`context`] | Variables passed between functions |
//! | [`completion`] | `TextCompletion` trait and the OpenAI backend |
//! | [`config`] | Completion service configuration |
//! | [`transport`] | Shared HTTP transport |
//! | [`demo`] | The demo binary's flow, writing to any `Write` |

pub mod completion;
pub mod config;
pub mod context;
pub mod demo;
pub mod function;
pub mod kernel;
pub mod template;
pub mod transport;

// Re-export main types for convenience
pub use completion::{CompleteRequestSettings, OpenAiTextCompletion, TextCompletion};
pub use config::{KernelConfig, OpenAiSettings};
pub use context::ContextVariables;
pub use function::{FunctionOptions, SemanticFunction};
pub use kernel::{Kernel, KernelBuilder};
pub use template::PromptTemplate;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
