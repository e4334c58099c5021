use std::net::SocketAddr;
use std::time::Duration;

/// Limits applied to job execution.
#[derive(Debug, Clone)]
pub struct JobsConfig {
    /// Fixed execution deadline of every job, measured from submission
    pub deadline: Duration,
    /// Jobs allowed in flight at once; submissions beyond this are rejected
    pub max_in_flight: usize,
    /// Execution slots kept around for reuse
    pub max_idle_slots: usize,
    /// Longest accepted message, in bytes
    pub max_message_len: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(4),
            max_in_flight: 10_000,
            max_idle_slots: 1_024,
            max_message_len: 64 * 1024,
        }
    }
}

impl JobsConfig {
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    pub fn with_max_idle_slots(mut self, max_idle_slots: usize) -> Self {
        self.max_idle_slots = max_idle_slots;
        self
    }
}

/// Configuration of the bundled echo action.
#[derive(Debug, Clone)]
pub struct WorkConfig {
    /// Upper bound of the simulated processing time
    pub max_delay: Duration,
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            max_delay: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Value required in the `Token` header on `/jobs` routes, if set
    pub auth_token: Option<String>,
    /// How long in-flight requests may take to finish after a shutdown signal
    pub shutdown_grace: Duration,
    pub jobs: JobsConfig,
    pub work: WorkConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // SAFETY: This is a hardcoded valid address that will always parse
            listen_addr: "0.0.0.0:8080"
                .parse()
                .expect("default listen address is valid"),
            auth_token: None,
            shutdown_grace: Duration::from_secs(60),
            jobs: JobsConfig::default(),
            work: WorkConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            ..Default::default()
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_jobs(mut self, jobs: JobsConfig) -> Self {
        self.jobs = jobs;
        self
    }
}
