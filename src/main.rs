use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use graceful_jobs::api::{self, ApiState};
use graceful_jobs::config::{JobsConfig, ServerConfig, WorkConfig};
use graceful_jobs::scheduler::Coordinator;
use graceful_jobs::shutdown;
use graceful_jobs::worker::EchoAction;

#[derive(Parser, Debug)]
#[command(name = "graceful-jobs")]
#[command(version)]
#[command(about = "An asynchronous job server with cancellation and deadlines")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "GRACEFUL_JOBS_ADDR", default_value = "0.0.0.0:8080")]
    addr: SocketAddr,

    /// Require this value in the `Token` header on /jobs routes
    #[arg(long, env = "GRACEFUL_JOBS_TOKEN")]
    token: Option<String>,

    /// Execution deadline of every job, in milliseconds
    #[arg(long, env = "GRACEFUL_JOBS_DEADLINE_MS", default_value = "4000")]
    deadline_ms: u64,

    /// Jobs allowed in flight before submissions are rejected
    #[arg(long, env = "GRACEFUL_JOBS_MAX_IN_FLIGHT", default_value = "10000")]
    max_in_flight: usize,

    /// Execution slots kept for reuse once their jobs finish
    #[arg(long, env = "GRACEFUL_JOBS_MAX_IDLE_SLOTS", default_value = "1024")]
    max_idle_slots: usize,

    /// Longest accepted job message, in bytes
    #[arg(long, env = "GRACEFUL_JOBS_MAX_MESSAGE_LEN", default_value = "65536")]
    max_message_len: usize,

    /// Upper bound of the simulated work per job, in milliseconds
    #[arg(long, env = "GRACEFUL_JOBS_MAX_DELAY_MS", default_value = "3000")]
    max_delay_ms: u64,

    /// Seconds open requests may take to finish after a shutdown signal
    #[arg(long, env = "GRACEFUL_JOBS_SHUTDOWN_GRACE_SECS", default_value = "60")]
    shutdown_grace_secs: u64,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let jobs = JobsConfig {
            max_message_len: self.max_message_len,
            ..JobsConfig::default()
        }
        .with_deadline(Duration::from_millis(self.deadline_ms))
        .with_max_in_flight(self.max_in_flight)
        .with_max_idle_slots(self.max_idle_slots);

        let mut config = ServerConfig::new(self.addr).with_jobs(jobs);
        config.auth_token = self.token;
        config.shutdown_grace = Duration::from_secs(self.shutdown_grace_secs);
        config.work = WorkConfig {
            max_delay: Duration::from_millis(self.max_delay_ms),
        };
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config();
    if config.auth_token.is_none() {
        tracing::warn!("No token configured, /jobs routes are open to any client");
    }

    run_server(config).await
}

async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown_token = CancellationToken::new();
    let _signals = shutdown::cancel_on_signal(shutdown_token.clone())?;

    let action = Arc::new(EchoAction::from_config(&config.work));
    let coordinator = Arc::new(Coordinator::new(config.jobs.clone(), action));
    let state = ApiState::new(coordinator.clone()).with_auth_token(config.auth_token.clone());

    let listener = TcpListener::bind(config.listen_addr).await?;
    let mut server = tokio::spawn(api::serve(listener, state, shutdown_token.clone()));

    let outcome = tokio::select! {
        result = &mut server => result,
        _ = shutdown_token.cancelled() => {
            let drained = tokio::time::timeout(config.shutdown_grace, &mut server).await;
            match drained {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        grace_secs = config.shutdown_grace.as_secs(),
                        "Open requests did not finish in time, forcing shutdown"
                    );
                    server.abort();
                    Ok(Ok(()))
                }
            }
        }
    };

    let cancelled = coordinator.drain();
    tracing::info!(cancelled_jobs = cancelled, "Server shut down");

    outcome??;
    Ok(())
}
