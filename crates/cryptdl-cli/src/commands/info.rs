//! Info and dump commands - read-only views of a device header

use super::Session;
use anyhow::{Context, Result};
use cryptdl::LogLevel;

/// Summary printed by `cryptdl info`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Summary {
    pub device: String,
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    pub uuid: Option<String>,
    pub volume_key_size: usize,
}

impl Summary {
    fn render(&self) -> String {
        format!(
            "Device:          {}\nType:            {}\nUUID:            {}\nVolume key size: {} bits",
            self.device,
            self.device_type.as_deref().unwrap_or("-"),
            self.uuid.as_deref().unwrap_or("-"),
            self.volume_key_size * 8
        )
    }
}

pub fn run(session: &Session, path: &str, json: bool) -> Result<()> {
    let device = session.load(path)?;
    let summary = Summary {
        device: device.device_name().unwrap_or_else(|| path.to_string()),
        device_type: device.type_name(),
        uuid: device.uuid(),
        volume_key_size: device.volume_key_size(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary.render());
    }
    Ok(())
}

pub fn dump(session: &Session, path: &str, json: bool) -> Result<()> {
    let mut device = session.load(path)?;

    if json {
        let metadata = device.dump_json(0).context("Failed to dump header metadata")?;
        println!("{}", metadata);
        return Ok(());
    }

    // The header text arrives through the log callback.
    device.set_log_hook(|level: LogLevel, message: &str| match level {
        LogLevel::Normal => println!("{}", message),
        LogLevel::Error => eprintln!("{}", message),
        _ => tracing::debug!(target: "libcryptsetup", "{}", message),
    });
    device.dump().context("Failed to dump header")?;
    Ok(())
}
