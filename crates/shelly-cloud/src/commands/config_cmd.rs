//! Config subcommand handlers.

use dialoguer::{Input, Select};
use secrecy::SecretString;

use shelly_cloud_core::WritePolicy;
use shelly_cloud_core::config::DEFAULT_AUTH_URL;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output::Output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_password(prompt: &str) -> Result<SecretString, CliError> {
    let password = rpassword::prompt_password(prompt).map_err(prompt_err)?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(password))
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let mut cfg = config::load_config_or_default();
            for profile in cfg.profiles.values_mut() {
                if profile.password.is_some() {
                    profile.password = Some("****".into());
                }
            }
            Output::new(global).single(
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|_| format!("{c:#?}")),
                |c| c.active_profile_name().to_owned(),
            )
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.active_profile_name();
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: shelly-cloud config init");
            } else {
                for name in cfg.profiles.keys() {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    name,
                    available: config::available_profiles(&cfg),
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    name: profile_name,
                    available: config::available_profiles(&cfg),
                });
            }

            let password = prompt_password(&format!("Password for '{profile_name}': "))?;
            config::store_password(&profile_name, &password)?;
            eprintln!("✓ Password for '{profile_name}' stored in system keyring");
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("Shelly Cloud configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    // 2. Account
    let username: String = Input::new()
        .with_prompt("Shelly Cloud e-mail")
        .interact_text()
        .map_err(prompt_err)?;
    if username.trim().is_empty() {
        return Err(CliError::Validation {
            field: "username".into(),
            reason: "e-mail cannot be empty".into(),
        });
    }
    let password = prompt_password("Password: ")?;

    // 3. Where the password lives
    let store_choices = &[
        "Store password in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let store_selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let plaintext = if store_selection == 0 {
        config::store_password(&profile_name, &password)?;
        eprintln!("   ✓ Password stored in system keyring");
        None
    } else {
        use secrecy::ExposeSecret;
        Some(password.expose_secret().to_owned())
    };

    // 4. Cache behaviour for failed relay commands
    let policy_choices = &[
        "Always show the requested state (default)",
        "Only after the cloud accepts the command",
    ];
    let policy_selection = Select::new()
        .with_prompt("When a switch command fails")
        .items(policy_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    let write_policy = if policy_selection == 0 {
        WritePolicy::Always
    } else {
        WritePolicy::OnSuccess
    };

    // 5. Merge into the existing config
    let mut cfg: Config = config::load_config_or_default();
    cfg.profiles.insert(
        profile_name.clone(),
        Profile {
            username: Some(username.trim().to_owned()),
            password: plaintext,
            write_policy,
            ..Profile::default()
        },
    );
    cfg.default_profile = Some(profile_name.clone());
    config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("  Auth server: {DEFAULT_AUTH_URL}");
    eprintln!("\n  Test it: shelly-cloud devices");
    Ok(())
}
