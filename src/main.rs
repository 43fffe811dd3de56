//! Binary entry point: runs the HTTP sidecar by default, or a one-shot
//! `tokenize <text>` subcommand for scripting/CI use.

use std::process::ExitCode;
use std::sync::Arc;

use thai_tokenizer_sidecar::api::{router, AppState};
use thai_tokenizer_sidecar::config::AppConfig;
use thai_tokenizer_sidecar::core::batch::BatchConfig;
use thai_tokenizer_sidecar::core::logging;
use thai_tokenizer_sidecar::core::search_client::{SearchClient, SearchClientConfig};
use thai_tokenizer_sidecar::core::segmenter::Segmenter;

fn usage() -> &'static str {
    "usage: thai-tokenizer-sidecar [serve | tokenize <text>]"
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = AppConfig::load();
    let _log_guard = logging::init(&logging::default_log_dir());

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None | Some("serve") => run_server(config).await,
        Some("tokenize") => match args.next() {
            Some(text) => run_tokenize(&config, &text),
            None => {
                eprintln!("{}", usage());
                ExitCode::from(2)
            }
        },
        Some(other) => {
            eprintln!("unknown subcommand {other:?}");
            eprintln!("{}", usage());
            ExitCode::from(2)
        }
    }
}

fn build_segmenter(config: &AppConfig) -> Result<Segmenter, String> {
    Segmenter::new(
        &config.tokenizer.default_engine,
        config.tokenizer.use_compounds,
        config.tokenizer.compound_dictionary_path.as_deref(),
    )
    .map_err(|e| e.to_string())
}

fn run_tokenize(config: &AppConfig, text: &str) -> ExitCode {
    let segmenter = match build_segmenter(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to initialize segmenter: {e}");
            return ExitCode::from(1);
        }
    };

    let result = segmenter.segment_compound(text);
    for token in &result.tokens {
        println!("{}", token.surface);
    }
    ExitCode::SUCCESS
}

async fn run_server(config: AppConfig) -> ExitCode {
    tracing::info!(
        version = thai_tokenizer_sidecar::VERSION,
        "thai-tokenizer-sidecar starting"
    );

    let segmenter = match build_segmenter(&config) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize segmenter");
            eprintln!("failed to initialize segmenter: {e}");
            return ExitCode::from(1);
        }
    };

    let search_client = match SearchClient::new(SearchClientConfig {
        base_url: config.search_engine.base_url.clone(),
        api_key: config.search_engine.api_key.clone(),
        timeout_secs: config.search_engine.timeout_secs,
    }) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize search engine client");
            eprintln!("failed to initialize search engine client: {e}");
            return ExitCode::from(1);
        }
    };

    let batch_config = BatchConfig {
        max_concurrent: config.batch.max_concurrent,
        batch_size: config.batch.batch_size,
        retry: thai_tokenizer_sidecar::core::batch::RetryConfig {
            max_attempts: config.batch.retry_max_attempts,
            initial_delay_ms: config.batch.retry_initial_delay_ms,
            multiplier: config.batch.retry_multiplier,
        },
    };

    let state = Arc::new(AppState {
        segmenter,
        search_client,
        batch_config,
    });

    let addr = format!("{}:{}", config.http.bind_address, config.http.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "failed to bind HTTP listener");
            eprintln!("failed to bind {addr}: {e}");
            return ExitCode::from(1);
        }
    };

    tracing::info!(address = %addr, "listening");
    if let Err(e) = axum::serve(listener, router(state)).await {
        tracing::error!(error = %e, "server exited with error");
        eprintln!("server error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}
