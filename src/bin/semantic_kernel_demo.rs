//! Semantic function demo: summarize two fixed texts, then chain
//! translate-to-math into a TLDR.
//!
//! Usage:
//!   OPENAI_API_KEY=sk-... semantic-kernel-demo
//!
//! Environment:
//!   OPENAI_API_KEY                  API key (default: empty, which the service rejects)
//!   OPENAI_ORG_ID                   Optional organization id
//!   OPENAI_BASE_URL                 API base URL (default https://api.openai.com)
//!   SK_MODEL_ID                     Completion model (default text-davinci-003)
//!   SK_HTTP_TIMEOUT_SECS            Per-request timeout in seconds (default 120)
//!   SK_HTTP_POOL_MAX_IDLE_PER_HOST  Idle connections kept per host (default 8)
//!   SK_PROXY_URL                    HTTP(S) proxy for all requests (default none)
//!   RUST_LOG                        Log filter for stderr output (default warn)
//!
//! Malformed SK_HTTP_* or SK_PROXY_URL values abort with a configuration error.

use semantic_kernel_demo::demo::run_demo;
use semantic_kernel_demo::{Kernel, KernelConfig, OpenAiSettings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries only results.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = OpenAiSettings::from_env();
    if settings.api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY is not set; requests will be unauthenticated");
    }
    let mut config = KernelConfig::new();
    config.add_openai_settings(settings.model_id.clone(), settings)?;
    let mut kernel = Kernel::builder().with_config(config).build()?;

    run_demo(&mut kernel, &mut std::io::stdout().lock()).await?;

    Ok(())
}
