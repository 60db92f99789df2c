//! Command line and environment options.

use clap::Parser;
use obs_remote::ConnectOptions;
use std::time::Duration;

/// Push a random GIF into a browser source.
///
/// Every option can also be set through the environment (a `.env` file in the
/// working directory or any parent is loaded first).
#[derive(Debug, Clone, Parser)]
#[command(name = "gif-drop", version)]
pub struct Options {
    /// Host running obs-websocket.
    #[arg(long, env = "OBS_ADDRESS", default_value = "localhost")]
    pub obs_address: String,

    /// obs-websocket port.
    #[arg(long, env = "OBS_PORT", default_value_t = obs_remote::DEFAULT_PORT)]
    pub obs_port: u16,

    /// obs-websocket password (empty for none).
    #[arg(long, env = "OBS_PASSWORD", default_value = "", hide_env_values = true)]
    pub obs_password: String,

    /// Giphy API key.
    #[arg(long, env = "GIPHY_KEY", hide_env_values = true)]
    pub giphy_key: String,

    /// Tag to pick a random GIF for.
    #[arg(long, env = "GIPHY_TAG", default_value = "celebration")]
    pub tag: String,

    /// Name of the browser source input to update.
    #[arg(long = "source", env = "SOURCE_NAME", default_value = "CelebrationGIF")]
    pub source_name: String,

    /// Seconds to stay connected after updating.
    #[arg(long, default_value_t = 4.0)]
    pub hold_secs: f64,
}

impl Options {
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions::new(&self.obs_address, self.obs_port).with_password(&self.obs_password)
    }

    pub fn hold(&self) -> Duration {
        Duration::try_from_secs_f64(self.hold_secs).unwrap_or_default()
    }
}
