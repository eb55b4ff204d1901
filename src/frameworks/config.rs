use crate::frameworks::transport::TransportSettings;
use crate::use_cases::{Authority, BombIdPolicy, DEFAULT_MAX_CASCADE, KeyMap, PipelineSettings};
use std::fmt::Display;
use std::str::FromStr;
use std::{env, time::Duration};

// Runtime settings read from the environment (a `.env` file is loaded first).

pub const ACTION_CHANNEL_CAPACITY: usize = 1024;
pub const OUTBOUND_CHANNEL_CAPACITY: usize = 256;
// Used when RUST_LOG is unset; socket internals stay quiet.
pub const DEFAULT_LOG_FILTER: &str = "info,tungstenite=warn,tokio_tungstenite=warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

/// `LOG_FORMAT=json` switches to structured output.
pub fn log_format() -> LogFormat {
    match env::var("LOG_FORMAT") {
        Ok(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
        _ => LogFormat::Compact,
    }
}

// Reads `name`, falling back to `default` when unset or unparsable.
fn parsed<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(value) => value.parse().unwrap_or_else(|e| {
            tracing::warn!(setting = name, error = %e, "invalid setting; using default");
            default
        }),
        Err(_) => default,
    }
}

pub fn server_url() -> Option<String> {
    env::var("ARENA_SERVER_URL")
        .ok()
        .filter(|url| !url.trim().is_empty())
}

/// Remote when a server is configured, local otherwise.
pub fn authority() -> Authority {
    let default = if server_url().is_some() {
        Authority::Remote
    } else {
        Authority::Local
    };
    parsed("ARENA_AUTHORITY", default)
}

pub fn player_id() -> String {
    env::var("ARENA_PLAYER_ID").unwrap_or_else(|_| "p1".to_string())
}

pub fn player_name() -> String {
    env::var("ARENA_PLAYER_NAME").unwrap_or_else(|_| "Pilot".to_string())
}

pub fn bomb_policy() -> BombIdPolicy {
    parsed("ARENA_BOMB_POLICY", BombIdPolicy::default())
}

pub fn move_step() -> f32 {
    parsed("ARENA_MOVE_STEP", 1.0)
}

pub fn max_cascade() -> usize {
    parsed("ARENA_MAX_CASCADE", DEFAULT_MAX_CASCADE)
}

pub fn keymap() -> KeyMap {
    let Ok(bindings) = env::var("ARENA_KEYMAP") else {
        return KeyMap::default();
    };
    KeyMap::parse(&bindings).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "invalid ARENA_KEYMAP; using default bindings");
        KeyMap::default()
    })
}

pub fn reconnect_delay() -> Duration {
    Duration::from_millis(parsed("ARENA_RECONNECT_DELAY_MS", 1000))
}

// 0 turns the reload rule off.
pub fn reload_time() -> Duration {
    Duration::from_millis(parsed("ARENA_RELOAD_MS", 0))
}

// 0 turns latency pings off.
pub fn ping_interval() -> Option<Duration> {
    match parsed("ARENA_PING_INTERVAL_MS", 5000) {
        0 => None,
        ms => Some(Duration::from_millis(ms)),
    }
}

pub fn transport_settings() -> TransportSettings {
    TransportSettings {
        reconnect_delay: reconnect_delay(),
        ping_interval: ping_interval(),
    }
}

pub fn pipeline_settings() -> PipelineSettings {
    PipelineSettings {
        authority: authority(),
        bomb_policy: bomb_policy(),
        move_step: move_step(),
        keymap: keymap(),
        reload_time: reload_time(),
    }
}
