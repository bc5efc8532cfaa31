mod rest;

use anyhow::Context;
use clap::Parser;
use judge_store::{FsStorage, MemoryStore};
use processor::{fake::FakeEngine, DispatchSettings, ExecutionEngine, Orchestrator};
use std::{path::PathBuf, sync::Arc, time::Duration};

/// Online judge server
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Port that judge should listen
    #[arg(long, env = "JUDGE_PORT", default_value_t = 1789)]
    port: u16,
    /// Base URL of the execution engine
    #[arg(long, env = "JUDGE_ENGINE_URL", default_value = "http://localhost:2358")]
    engine_url: String,
    /// Value of the X-Auth-Token header sent to the engine
    #[arg(long, env = "JUDGE_ENGINE_AUTH_TOKEN", default_value = "")]
    engine_auth_token: String,
    /// Value of the X-Auth-User header sent to the engine
    #[arg(long, env = "JUDGE_ENGINE_AUTH_USER", default_value = "")]
    engine_auth_user: String,
    /// CPU time limit per test case, in seconds
    #[arg(long, env = "JUDGE_CPU_TIME_LIMIT", default_value_t = 5.0)]
    cpu_time_limit: f64,
    /// Memory limit per test case, in kilobytes
    #[arg(long, env = "JUDGE_MEMORY_LIMIT", default_value_t = 262_144)]
    memory_limit: u64,
    /// Output file size limit, in kilobytes
    #[arg(long, env = "JUDGE_MAX_FILE_SIZE", default_value_t = 1024)]
    max_file_size: u64,
    /// Status checks per test case before giving up
    #[arg(long, env = "JUDGE_MAX_RETRIES", default_value_t = 10)]
    max_retries: u32,
    /// Delay between status checks, in milliseconds
    #[arg(long, env = "JUDGE_RETRY_DELAY_MS", default_value_t = 1000)]
    retry_delay_ms: u64,
    /// Timeout of a single request to the engine, in milliseconds
    #[arg(long, env = "JUDGE_REQUEST_TIMEOUT_MS", default_value_t = 10_000)]
    request_timeout_ms: u64,
    /// Test cases of one submission executed at the same time
    #[arg(long, env = "JUDGE_MAX_CONCURRENT_EXECUTIONS", default_value_t = 5)]
    max_concurrent_executions: usize,
    /// How long to wait for all test cases of a submission, in seconds.
    /// Includes time queued behind other test cases of the same submission:
    /// with slow engine runs, raise it for problems with many test cases.
    #[arg(long, env = "JUDGE_GRACE_PERIOD_SECS", default_value_t = 30)]
    grace_period_secs: u64,
    /// Directory containing users.yaml, problem manifests and test data buckets
    #[arg(long, env = "JUDGE_DATA_DIR")]
    data_dir: PathBuf,
    /// Bucket holding test case inputs and outputs
    #[arg(long, env = "JUDGE_TESTCASE_BUCKET", default_value = "testcases")]
    testcase_bucket: String,
    /// Judge with a built-in engine that echoes its input instead of
    /// contacting the execution engine
    #[arg(long, env = "JUDGE_FAKE_ENGINE")]
    fake_engine: bool,
}

fn create_engine(args: &Args) -> anyhow::Result<Arc<dyn ExecutionEngine>> {
    if args.fake_engine {
        tracing::warn!("using fake execution engine");
        return Ok(Arc::new(FakeEngine::new()));
    }
    let config = engine_client::EngineConfig {
        auth_token: args.engine_auth_token.clone(),
        auth_user: args.engine_auth_user.clone(),
        cpu_time_limit: args.cpu_time_limit,
        memory_limit: args.memory_limit,
        max_file_size: args.max_file_size,
        max_retries: args.max_retries,
        retry_delay_ms: args.retry_delay_ms,
        request_timeout_ms: args.request_timeout_ms,
        ..engine_client::EngineConfig::default()
    }
    .with_url(&args.engine_url);
    let client = engine_client::Client::new(config).context("failed to create engine client")?;
    Ok(Arc::new(client))
}

async fn create_clients(args: &Args) -> anyhow::Result<processor::Clients> {
    let store = Arc::new(MemoryStore::new());
    judge_store::load_catalog(&args.data_dir, &store)
        .await
        .with_context(|| format!("failed to load catalog from {}", args.data_dir.display()))?;
    let storage = Arc::new(FsStorage::new(&args.data_dir));
    let engine = create_engine(args)?;
    Ok(processor::Clients::with_store(engine, store, storage))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();
    let clients = create_clients(&args)
        .await
        .context("failed to initialize dependency clients")?;
    let settings = processor::Settings {
        dispatch: DispatchSettings {
            max_concurrent_executions: args.max_concurrent_executions,
            grace_period: Duration::from_secs(args.grace_period_secs),
            testcase_bucket: args.testcase_bucket.clone(),
        },
    };
    let worst_case = Duration::from_millis(
        args.retry_delay_ms
            .saturating_mul(u64::from(args.max_retries.saturating_sub(1)))
            .saturating_add(args.request_timeout_ms.saturating_mul(2)),
    );
    tracing::info!(
        capacity = settings.dispatch.test_cases_within_grace(worst_case),
        per_test_case = ?worst_case,
        "test cases guaranteed to finish within the grace period"
    );
    let orchestrator = Orchestrator::new(clients, settings);
    if !orchestrator.engine_available().await {
        tracing::warn!("execution engine is not reachable yet, submissions will fail until it is");
    }
    tracing::info!("Running REST API");
    let cfg = rest::RestConfig { port: args.port };
    rest::serve(cfg, orchestrator).await?;
    Ok(())
}
