use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{debug, error};
use std::path::{Path, PathBuf};
use std::process;

use calcutta_session::auth::user_interface::{
    handle_login_command, handle_logout_command, handle_profile_command, handle_signup_command,
    handle_whoami_command, show_emblems,
};
use calcutta_session::config::AppConfig;
use calcutta_session::storage::open_configured_store;
use calcutta_session::utils::logging::initialize_logging;
use calcutta_session::{SessionManager, SessionStore};

fn build_cli() -> Command {
    Command::new("calcutta")
        .about("Account and session manager for Calcutta auction leagues")
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Directory holding the account and session store"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Path to config.json (defaults to <data-dir>/config.json)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log debug output to stderr"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("signup")
                .about("Create an account and log in")
                .arg(Arg::new("name").long("name").required(true).help("Display name"))
                .arg(Arg::new("email").long("email").required(true).help("Login email"))
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("Password (prompted for when omitted)"),
                ),
        )
        .subcommand(
            Command::new("login")
                .about("Log in to an existing account")
                .arg(Arg::new("email").long("email").required(true).help("Login email"))
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("Password (prompted for when omitted)"),
                ),
        )
        .subcommand(Command::new("logout").about("Log out of the current session"))
        .subcommand(Command::new("whoami").about("Show the logged-in user"))
        .subcommand(
            Command::new("profile")
                .about("Update the logged-in user's profile")
                .arg(Arg::new("name").long("name").help("New display name"))
                .arg(Arg::new("email").long("email").help("New login email"))
                .arg(Arg::new("phone").long("phone").help("Phone number"))
                .arg(
                    Arg::new("emblem")
                        .long("emblem")
                        .help("One of: shield, crown, trophy, star, flag, target, medal, anchor"),
                ),
        )
        .subcommand(Command::new("emblems").about("List the available emblems"))
        .subcommand(
            Command::new("init")
                .about("Write the current settings to the config file")
                .arg(
                    Arg::new("force")
                        .long("force")
                        .action(ArgAction::SetTrue)
                        .help("Overwrite an existing config file"),
                ),
        )
}

/// Config file < environment < command-line flags
fn resolve_config(matches: &ArgMatches) -> Result<(AppConfig, PathBuf), Box<dyn std::error::Error>> {
    let mut data_dir = matches.get_one::<PathBuf>("data-dir").cloned();
    if data_dir.is_none() {
        data_dir = std::env::var(calcutta_session::config::settings::ENV_DATA_DIR)
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
    }
    let data_dir = data_dir.unwrap_or_else(|| PathBuf::from(calcutta_session::DEFAULT_DATA_DIR));

    let config_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| AppConfig::config_path(&data_dir));

    let mut config = AppConfig::load(&config_path)?;
    config.apply_env_overrides();
    if let Some(dir) = matches.get_one::<PathBuf>("data-dir") {
        config.data_dir = dir.clone();
    }
    if matches.get_flag("verbose") {
        config.log_level = "debug".to_string();
    }
    Ok((config, config_path))
}

fn handle_init_command(
    matches: &ArgMatches,
    config: &AppConfig,
    config_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if config_path.exists() && !matches.get_flag("force") {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )
        .into());
    }
    config.save(config_path)?;
    println!("Wrote {}", config_path.display());
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let (config, config_path) = resolve_config(matches)?;
    if let Err(e) = initialize_logging(&config.log_level, config.log_file.as_deref()) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }
    debug!("Using data directory {}", config.data_dir.display());

    // Neither of these needs the store
    match matches.subcommand() {
        Some(("emblems", _)) => {
            show_emblems();
            return Ok(());
        }
        Some(("init", sub_matches)) => {
            return handle_init_command(sub_matches, &config, &config_path);
        }
        _ => {}
    }

    let passphrase = AppConfig::store_passphrase();
    let store = open_configured_store(&config, passphrase.as_deref())?;
    let mut session = SessionStore::with_policy(store, config.session.clone());
    session.initialize()?;

    match matches.subcommand() {
        Some(("signup", sub_matches)) => handle_signup_command(sub_matches, &mut session),
        Some(("login", sub_matches)) => handle_login_command(sub_matches, &mut session),
        Some(("logout", _)) => handle_logout_command(&mut session),
        Some(("whoami", _)) => handle_whoami_command(&session),
        Some(("profile", sub_matches)) => handle_profile_command(sub_matches, &mut session),
        _ => unreachable!("subcommand_required is set"),
    }
}

fn main() {
    let matches = build_cli().get_matches();

    if let Err(e) = run(&matches) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_profile_arguments_parse() {
        let matches = build_cli()
            .try_get_matches_from(["calcutta", "--data-dir", "/tmp/x", "profile", "--emblem", "star"])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("data-dir"),
            Some(&PathBuf::from("/tmp/x"))
        );
        let (name, sub_matches) = matches.subcommand().unwrap();
        assert_eq!(name, "profile");
        assert_eq!(sub_matches.get_one::<String>("emblem").map(String::as_str), Some("star"));
    }

    #[test]
    fn test_init_writes_config_once() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        let data_arg = data_dir.to_str().unwrap();

        let matches = build_cli()
            .try_get_matches_from(["calcutta", "--data-dir", data_arg, "init"])
            .unwrap();
        run(&matches).unwrap();

        let config_path = AppConfig::config_path(&data_dir);
        let written = AppConfig::load(&config_path).unwrap();
        assert_eq!(written.data_dir, data_dir);

        // A second init refuses to clobber the file unless forced
        assert!(run(&matches).is_err());
        let forced = build_cli()
            .try_get_matches_from(["calcutta", "--data-dir", data_arg, "init", "--force"])
            .unwrap();
        run(&forced).unwrap();
    }

    #[test]
    fn test_signup_requires_email() {
        assert!(build_cli()
            .try_get_matches_from(["calcutta", "signup", "--name", "A"])
            .is_err());
    }
}
