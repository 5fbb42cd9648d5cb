//! `commands` and `config` handlers

use colored::Colorize;
use universal_connector::{ConvertCommand, ServerConfig};

use super::args::ConfigFormat;

/// Print the editor commands and the server command each one runs
pub(crate) fn list_commands() {
    println!(
        "{:24} {:24} {}",
        "Command".bold(),
        "Editor name".bold(),
        "Title".bold()
    );
    println!("{}", "─".repeat(68));
    for command in ConvertCommand::ALL {
        println!(
            "{:24} {:24} {}",
            command.id().cyan(),
            command.editor_name(),
            command.title()
        );
    }
}

/// Serialize the configuration in the requested format
pub(crate) fn render_config(
    config: &ServerConfig,
    format: ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut rendered = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml_ng::to_string(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
    };
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
    Ok(rendered)
}
