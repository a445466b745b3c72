//! Command-line arguments for the `sessiongate` binary.
//!
//! Flags override values from the config file and the environment.

use std::path::PathBuf;

use sessiongate_core::{settings_loader, GateError, Settings};

/// Builds the `sessiongate` command definition.
pub fn command() -> clap::Command {
    clap::Command::new("sessiongate")
        .about("Session-based login gate with CSRF protection")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            clap::Arg::new("config")
                .long("config")
                .short('c')
                .value_parser(clap::value_parser!(PathBuf))
                .help("Path to a TOML settings file"),
        )
        .arg(
            clap::Arg::new("host")
                .long("host")
                .help("Host to bind to"),
        )
        .arg(
            clap::Arg::new("port")
                .long("port")
                .value_parser(clap::value_parser!(u16))
                .help("Port to bind to"),
        )
}

/// Resolves settings from parsed arguments.
///
/// Loads the config file (if given) merged over defaults, applies
/// `SESSIONGATE_*` environment overrides, then the `--host`/`--port` flags.
pub fn settings_from_matches(matches: &clap::ArgMatches) -> Result<Settings, GateError> {
    let mut settings = match matches.get_one::<PathBuf>("config") {
        Some(path) => settings_loader::from_toml_file_with_env(path)?,
        None => settings_loader::from_env(),
    };
    apply_flags(matches, &mut settings);
    Ok(settings)
}

fn apply_flags(matches: &clap::ArgMatches, settings: &mut Settings) {
    if let Some(host) = matches.get_one::<String>("host") {
        settings.host.clone_from(host);
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        settings.port = *port;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_settings() {
        let matches = command()
            .try_get_matches_from(["sessiongate", "--host", "0.0.0.0", "--port", "8080"])
            .unwrap();
        let mut settings = Settings::default();
        apply_flags(&matches, &mut settings);
        assert_eq!(settings.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_no_flags_keeps_settings() {
        let matches = command().try_get_matches_from(["sessiongate"]).unwrap();
        let mut settings = Settings::default();
        apply_flags(&matches, &mut settings);
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 3000);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(command()
            .try_get_matches_from(["sessiongate", "--port", "not-a-port"])
            .is_err());
        assert!(command()
            .try_get_matches_from(["sessiongate", "--port", "70000"])
            .is_err());
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let matches = command()
            .try_get_matches_from(["sessiongate", "--config", "/nonexistent/sessiongate.toml"])
            .unwrap();
        assert!(settings_from_matches(&matches).is_err());
    }

    #[test]
    fn test_command_is_well_formed() {
        command().debug_assert();
    }
}
