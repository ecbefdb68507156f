//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the current configuration to stdout, literal secrets masked.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    println!("# config.toml ({})", path.display());
    println!("{}", render(config)?);
    Ok(())
}

fn render(config: &ClientConfig) -> ClientResult<String> {
    toml::to_string_pretty(&config.redacted())
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))
}

/// Validate the configuration without touching the network.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    config.deployment.tz().map_err(ClientError::Config)?;
    config.deployment.region().map_err(ClientError::Config)?;

    let google = config
        .google()
        .and_then(|g| g.to_provider_config())
        .map_err(ClientError::Config)?;
    google.validate()?;
    println!("Google settings are valid (redirect: {}).", google.redirect_url()?);

    match config.twilio {
        Some(ref twilio) => {
            twilio.resolve().map_err(ClientError::Config)?;
            println!("Twilio settings are valid.");
        }
        None => println!("No [twilio] section; `send` will not work."),
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> ClientResult<()> {
    println!("config: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_masks_literal_secrets() {
        let config: ClientConfig = toml::from_str(
            r#"
[google]
client_id = "id.apps.googleusercontent.com"
client_secret = "GOCSPX-literal"

[twilio]
account_sid = "AC123"
auth_token = "env::TWILIO_AUTH_TOKEN"
"#,
        )
        .unwrap();

        let out = render(&config).unwrap();
        assert!(!out.contains("GOCSPX-literal"));
        assert!(out.contains("client_secret = \"<redacted>\""));
        assert!(out.contains("auth_token = \"env::TWILIO_AUTH_TOKEN\""));
        assert!(out.contains("id.apps.googleusercontent.com"));
        assert_eq!(config.google.unwrap().client_secret.as_deref(), Some("GOCSPX-literal"));
    }
}
