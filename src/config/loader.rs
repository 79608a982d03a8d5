//! Configuration loading and environment parsing.

use super::Config;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Load configuration with the following precedence (highest first):
/// 1) `PORT` / `PUBSUB_URL` environment variables (the documented knobs)
/// 2) File pointed at by the `TRIVION_CONFIG_PATH` env var
/// 3) `config.json` in the current working directory
/// 4) Defaults compiled into the binary
///
/// Any errors while reading or parsing are printed to stderr and the next
/// source in the chain is used.
#[must_use]
pub fn load() -> Config {
    use std::env;
    use std::path::PathBuf;

    let defaults = Config::default();
    let mut merged =
        serde_json::to_value(&defaults).unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

    // Explicit path via env var, else config.json in CWD.
    if let Ok(path) = env::var("TRIVION_CONFIG_PATH") {
        merge_file_source(&mut merged, &PathBuf::from(path));
    } else {
        let cwd_config = Path::new("config.json");
        if cwd_config.exists() {
            merge_file_source(&mut merged, cwd_config);
        }
    }

    let mut config: Config = match serde_json::from_value(merged) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration, falling back to defaults: {e}");
            Config::default()
        }
    };

    // Documented environment overrides.
    if let Ok(port) = env::var("PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => config.port = port,
            Err(_) => eprintln!("Ignoring non-numeric PORT value '{port}'"),
        }
    }
    if let Ok(pubsub_url) = env::var("PUBSUB_URL") {
        let trimmed = pubsub_url.trim();
        if !trimmed.is_empty() {
            config.pubsub_url = Some(trimmed.to_string());
        }
    }

    config
}

fn merge_file_source(merged: &mut Value, path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => {
            if let Some(value) = parse_json_document(&content, &path.display().to_string()) {
                merge_values(merged, value);
            }
        }
        Err(e) => eprintln!("Failed to read config file {}: {e}", path.display()),
    }
}

fn parse_json_document(content: &str, source: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(content) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => {
            eprintln!("Config source {source} is not a JSON object, ignoring");
            None
        }
        Err(e) => {
            eprintln!("Failed to parse config source {source}: {e}");
            None
        }
    }
}

/// Deep-merge `incoming` into `base`; objects merge recursively, every other
/// value replaces.
fn merge_values(base: &mut Value, incoming: Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(incoming_map)) => {
            for (key, value) in incoming_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base_slot, incoming) => *base_slot = incoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_replaces_scalars_and_merges_objects() {
        let mut base = json!({"port": 8000, "server": {"heartbeat_interval_secs": 15}});
        merge_values(
            &mut base,
            json!({"port": 9000, "server": {"reconnect_window_secs": 5}}),
        );
        assert_eq!(base["port"], 9000);
        assert_eq!(base["server"]["heartbeat_interval_secs"], 15);
        assert_eq!(base["server"]["reconnect_window_secs"], 5);
    }

    #[test]
    fn non_object_documents_are_ignored() {
        assert!(parse_json_document("[1, 2]", "test").is_none());
        assert!(parse_json_document("not json", "test").is_none());
        assert!(parse_json_document("{\"port\": 1234}", "test").is_some());
    }
}
