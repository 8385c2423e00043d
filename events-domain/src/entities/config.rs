// Runtime configuration handed to use cases and adapters.
// Built once by the infrastructure config loader; never mutated afterwards.

use crate::value_objects::TeamRole;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub rpc_timeout_ms: u64,
    pub event_write_roles: Vec<TeamRole>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub storage_backend: StorageBackend,
    pub database_url: String,
    pub database_max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub team_service_url: String,
    pub user_service_url: String,
    pub rpc_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub webhook_url: Option<String>,
    pub topic: String,
    pub signing_secret: Option<String>,
    pub timeout_ms: u64,
}
