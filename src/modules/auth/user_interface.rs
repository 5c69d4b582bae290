// src/modules/auth/user_interface.rs
use clap::ArgMatches;
use std::error::Error;

use super::errors::SessionError;
use super::model::{Account, Emblem, ProfileUpdate, Session};
use super::password::read_password;
use super::session::SessionManager;
use crate::modules::utils::time::format_timestamp;

type CommandResult = Result<(), Box<dyn Error>>;

/// Print the public fields of a session
pub fn print_session(session: &Session) {
    println!("\nUser Profile");
    println!("------------");
    println!("Name: {}", session.name);
    println!("Email: {}", session.email);
    if !session.phone.is_empty() {
        println!("Phone: {}", session.phone);
    }
    if let Some(emblem) = session.emblem {
        println!("Emblem: {}", emblem);
    }
}

/// Membership dates for an account; zero timestamps are unknown and skipped
fn activity_lines(account: &Account) -> Vec<String> {
    let mut lines = Vec::new();
    if account.created_at > 0 {
        lines.push(format!("Member since: {}", format_timestamp(account.created_at)));
    }
    if account.last_login > 0 {
        lines.push(format!("Last login: {}", format_timestamp(account.last_login)));
    }
    lines
}

/// Take the password from `--password` or prompt for it without echo
fn password_from(matches: &ArgMatches, prompt: &str) -> Result<String, Box<dyn Error>> {
    match matches.get_one::<String>("password") {
        Some(password) => Ok(password.clone()),
        None => {
            println!("{}", prompt);
            Ok(read_password()?)
        }
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    matches.get_one::<String>(name).map(String::as_str).unwrap_or("")
}

pub fn handle_signup_command(matches: &ArgMatches, manager: &mut impl SessionManager) -> CommandResult {
    let name = required(matches, "name");
    let email = required(matches, "email");
    let password = password_from(matches, "Choose a password:")?;

    let session = manager.signup(name, email, &password)?;
    println!("Account created. Welcome, {}!", session.name);
    Ok(())
}

pub fn handle_login_command(matches: &ArgMatches, manager: &mut impl SessionManager) -> CommandResult {
    let email = required(matches, "email");
    let password = password_from(matches, "Enter password:")?;

    let session = manager.login(email, &password)?;
    println!("Welcome back, {}!", session.name);
    Ok(())
}

pub fn handle_logout_command(manager: &mut impl SessionManager) -> CommandResult {
    let was_logged_in = manager.current_user().is_some();
    manager.logout()?;
    if was_logged_in {
        println!("Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

pub fn handle_whoami_command(manager: &impl SessionManager) -> CommandResult {
    match manager.current_user() {
        Some(session) => {
            print_session(session);
            if let Some(account) = manager.current_account()? {
                for line in activity_lines(&account) {
                    println!("{}", line);
                }
            }
        }
        None => println!("Not logged in."),
    }
    Ok(())
}

/// Update the profile; name and email default to the current values
pub fn handle_profile_command(matches: &ArgMatches, manager: &mut impl SessionManager) -> CommandResult {
    let update = build_profile_update(matches, manager.current_user())?;

    match manager.update_profile(update)? {
        Some(session) => {
            println!("Profile updated.");
            print_session(&session);
        }
        None => println!("Not logged in. Nothing was changed."),
    }
    Ok(())
}

fn build_profile_update(
    matches: &ArgMatches,
    current: Option<&Session>,
) -> Result<ProfileUpdate, SessionError> {
    let pick = |arg: &str, fallback: Option<&String>| -> String {
        matches
            .get_one::<String>(arg)
            .or(fallback)
            .cloned()
            .unwrap_or_default()
    };

    let update = ProfileUpdate::new(
        pick("name", current.map(|s| &s.name)),
        pick("email", current.map(|s| &s.email)),
        pick("phone", current.map(|s| &s.phone)),
    );

    match matches.get_one::<String>("emblem") {
        Some(tag) => update.with_emblem_tag(tag),
        None => Ok(update),
    }
}

pub fn show_emblems() {
    println!("Available emblems:");
    for emblem in Emblem::ALL {
        println!("  {}", emblem);
    }
}
