//! Env command handler

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::EnvArgs;
use console::style;
use std::fmt::Write as _;
use waymark::RunContext;

/// Execute the env command
pub fn execute_env(config: &CliConfig, args: &EnvArgs) -> CliResult<()> {
    let run = config.resolve()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(run.config())?);
    } else {
        print!("{}", render_environment(&run));
    }
    Ok(())
}

/// Human-readable summary of a resolved environment
#[must_use]
pub fn render_environment(run: &RunContext) -> String {
    let config = run.config();
    let mut out = String::new();
    let _ = writeln!(out, "Environment: {}", style(run.environment()).bold());
    let _ = writeln!(out, "  Config dir:       {}", run.config_dir().display());
    let _ = writeln!(
        out,
        "  Base URL:         {}",
        config.base_url.as_deref().unwrap_or("(none)")
    );
    let _ = writeln!(out, "  Command timeout:  {}ms", config.default_command_timeout);
    let _ = writeln!(out, "  Response timeout: {}ms", config.response_timeout);
    let _ = writeln!(out, "  Request timeout:  {}ms", config.request_timeout);
    let _ = writeln!(
        out,
        "  Viewport:         {}x{}",
        config.viewport_width, config.viewport_height
    );
    let _ = writeln!(out, "  Fixtures:         {}", run.fixtures().root().display());
    if !config.feature_flags.is_empty() {
        let flags: Vec<String> = config
            .feature_flags
            .iter()
            .map(|(name, on)| format!("{name}={}", if *on { "on" } else { "off" }))
            .collect();
        let _ = writeln!(out, "  Feature flags:    {}", flags.join(", "));
    }
    if !config.credentials.is_empty() {
        let names: Vec<&str> = config.credentials.keys().map(String::as_str).collect();
        let _ = writeln!(out, "  Credentials:      {} (values hidden)", names.join(", "));
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use waymark::EnvironmentConfig;

    #[test]
    fn test_render_environment() {
        console::set_colors_enabled(false);
        let mut config = EnvironmentConfig::new()
            .with_base_url("https://automationintesting.online")
            .with_flag("contactForm", true);
        config
            .credentials
            .insert("adminPassword".to_string(), "hunter2".to_string());
        let run = RunContext::new("production", config).with_config_dir("config");

        let out = render_environment(&run);
        assert!(out.contains("Environment: production"));
        assert!(out.contains("https://automationintesting.online"));
        assert!(out.contains("Response timeout: 90000ms"));
        assert!(out.contains("contactForm=on"));
        assert!(out.contains("adminPassword"));
        assert!(!out.contains("hunter2"));
    }
}
