#![deny(warnings)]

mod ai;
mod auth;
mod charts;
mod config;
mod data;
mod errors;
mod executor;
mod generation;
mod limiter;
mod logging;
mod persistence;
mod web;

use crate::ai::AiClient;
use crate::executor::TaskExecutor;
use crate::generation::GenService;
use crate::limiter::RateLimiter;
use crate::persistence::chart_record::PgChartStore;
use humantime::parse_duration;
use std::sync::Arc;
use std::time::Duration;

type Result<T> = anyhow::Result<T>;

fn env_u32(name: &str, default: u32) -> u32 {
    config::get(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    config::get(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_duration(name: &str, default: Duration) -> Duration {
    config::get(name)
        .ok()
        .and_then(|s| parse_duration(&s).ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() {
    use logging::*;

    let log = DEFAULT.new(o!("function" => "main"));
    info!(log, "Starting up");
    debug!(log, "log level check");
    trace!(log, "log level check");
    error!(log, "log level check");
    warn!(log, "log level check");
    crit!(log, "log level check");

    let limiter = RateLimiter::new(
        env_u32("RATE_LIMIT_CAPACITY", 20),
        env_duration("RATE_LIMIT_WINDOW", Duration::from_secs(60)),
    );
    let executor = TaskExecutor::new(env_usize("GEN_WORKERS", 4), env_usize("GEN_BACKLOG", 64));

    let model = match AiClient::new_default() {
        Ok(client) => client,
        Err(err) => {
            crit!(log, "failed to build AI client"; "error" => %err);
            return;
        }
    };

    let service = Arc::new(GenService::new(PgChartStore, model, limiter, executor));
    web::run(service).await
}
