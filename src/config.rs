use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::{Capabilities, Device, DeviceType, DisplayMode, OpenAiGlobals, Theme, UserAgent};
use crate::util::parse_bool_str;

const SCENARIO_ENV: &str = "WIDGET_SIM_SCENARIO";
const DEVICE_ENV: &str = "WIDGET_SIM_DEVICE";
const ATTACH_HOST_ENV: &str = "WIDGET_SIM_ATTACH_HOST";
const LOCALE_ENV: &str = "WIDGET_SIM_LOCALE";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub scenario_path: PathBuf,
    pub device: DeviceType,
    pub attach_host: bool,
    pub locale: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let scenario_path = std::env::var(SCENARIO_ENV)
            .map(PathBuf::from)
            .with_context(|| format!("{SCENARIO_ENV} not set"))?;

        let device = match std::env::var(DEVICE_ENV) {
            Ok(raw) => match DeviceType::parse(&raw) {
                Some(device) => device,
                None => bail!(
                    "Invalid {DEVICE_ENV} '{raw}': expected mobile, tablet, desktop or unknown"
                ),
            },
            Err(_) => DeviceType::Desktop,
        };

        let attach_host = match std::env::var(ATTACH_HOST_ENV) {
            Ok(raw) => match parse_bool_str(&raw) {
                Some(flag) => flag,
                None => bail!("Invalid {ATTACH_HOST_ENV} '{raw}': expected a boolean flag"),
            },
            Err(_) => true,
        };

        let locale = std::env::var(LOCALE_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "en-US".to_string());

        Ok(Self {
            scenario_path,
            device,
            attach_host,
            locale,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.scenario_path.is_file() {
            bail!(
                "Scenario file '{}' does not exist or is not a file",
                self.scenario_path.display()
            );
        }

        if self.locale.contains(char::is_whitespace) {
            bail!("Invalid locale '{}': must not contain whitespace", self.locale);
        }

        Ok(())
    }

    /// Globals the simulated host starts with before the scenario runs.
    pub fn initial_globals(&self) -> OpenAiGlobals {
        let touch = matches!(self.device, DeviceType::Mobile | DeviceType::Tablet);
        OpenAiGlobals {
            theme: Some(Theme::Light),
            user_agent: Some(UserAgent {
                device: Device {
                    device_type: self.device,
                },
                capabilities: Capabilities {
                    hover: !touch,
                    touch,
                },
            }),
            locale: Some(self.locale.clone()),
            display_mode: Some(DisplayMode::Inline),
            ..OpenAiGlobals::default()
        }
    }
}
