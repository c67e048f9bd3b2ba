//! `app.properties` loading
//!
//! A Java-style properties file: one `key=value` (or `key: value`) per line,
//! `#` and `!` start comments. A missing file means "discover the modem with
//! default line settings".

use actor_protocol::ActorError;
use core_types::{FlowControl, SerialConfig};
use std::collections::HashMap;
use std::path::Path;

pub const CONFIG_FILE: &str = "app.properties";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppConfig {
    /// Fixed modem device; `None` runs discovery
    pub com_port: Option<String>,
    pub serial: SerialConfig,
}

impl AppConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ActorError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ActorError::Config(format!(
                "Cannot read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    pub fn parse(text: &str) -> Result<Self, ActorError> {
        let properties = parse_properties(text);
        let mut config = Self::default();

        if let Some(port) = properties.get("com_port").filter(|p| !p.is_empty()) {
            config.com_port = Some(port.clone());
        }

        if let Some(baud) = properties.get("baud_rate") {
            config.serial.baud_rate = baud
                .parse()
                .map_err(|_| ActorError::Config(format!("Invalid baud_rate: {}", baud)))?;
        }

        if let Some(flow) = properties.get("flow_control") {
            config.serial.flow_control = match flow.to_ascii_lowercase().as_str() {
                "none" => FlowControl::None,
                "hardware" | "rtscts" => FlowControl::Hardware,
                "software" | "xonxoff" => FlowControl::Software,
                other => {
                    return Err(ActorError::Config(format!(
                        "Invalid flow_control: {} (expected none, hardware or software)",
                        other
                    )))
                }
            };
        }

        Ok(config)
    }
}

fn parse_properties(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .filter_map(|line| {
            let split = line.find(['=', ':'])?;
            let (key, value) = line.split_at(split);
            Some((key.trim().to_string(), value[1..].trim().to_string()))
        })
        .collect()
}
