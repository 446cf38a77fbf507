use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cbikeai_auth::{
    config::Config,
    error::{AppError, Result},
    handlers::{
        auth::{FormResponse, LoginController, SignupController, SocialLoginController},
        profile::ProfileController,
        reset::ResetController,
    },
    models::session::{ExternalProfile, IdentityProvider},
    services::reset::ResetStep,
    state::AppState,
    validation::{
        forms::{LoginForm, NewPasswordForm, RecoveryRequestForm, SignupForm, VerificationForm},
        phone::format_phone,
        strength::score_password,
    },
};

#[derive(Parser)]
#[command(name = "cbikeai")]
#[command(about = "CBikeAI account tools over a local store", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Store file (overrides CBIKEAI_STORE_PATH)
    #[arg(long, global = true)]
    store: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and log it in
    Signup {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Password confirmation (defaults to the password)
        #[arg(long)]
        confirm: Option<String>,
        /// Accept the Terms of Service and Privacy Policy
        #[arg(long)]
        accept_terms: bool,
    },
    /// Log in with email and password
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Keep the email for the next login
        #[arg(short, long)]
        remember: bool,
    },
    /// Log in through an identity provider
    Social {
        /// google, facebook or apple
        provider: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        name: String,
        #[arg(long)]
        picture: Option<String>,
    },
    /// End the current session
    Logout,
    /// Show the logged-in profile
    Whoami,
    /// Recover a password with a verification code
    Reset {
        #[arg(short, long)]
        email: String,
    },
    /// Score a password
    Strength { password: String },
    /// Format a phone number
    Phone { input: String },
    /// Show or set profile preferences (key=value)
    Prefs { set: Vec<String> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(store) = cli.store {
        config.store_path = store;
    }
    tracing::debug!("✅ Configuration loaded");

    run(cli.command, &config).await
}

async fn run(command: Commands, config: &Config) -> anyhow::Result<()> {
    let state = || AppState::new(config);

    match command {
        Commands::Strength { password } => {
            let strength = score_password(&password);
            println!(
                "{}/5 {} [{}%{}]",
                strength.score(),
                strength.label(),
                strength.bar_width_percent(),
                if strength.is_acceptable() { "" } else { ", too weak for signup" }
            );
            Ok(())
        }
        Commands::Phone { input } => {
            println!("{}", format_phone(&input));
            Ok(())
        }
        Commands::Signup {
            name,
            email,
            password,
            confirm,
            accept_terms,
        } => {
            let form = SignupForm {
                name,
                email,
                confirm_password: confirm.unwrap_or_else(|| password.clone()),
                password,
                accept_terms,
            };
            report(SignupController::new(state()?).submit(form).await)
        }
        Commands::Login {
            email,
            password,
            remember,
        } => {
            let form = LoginForm {
                email,
                password,
                remember_me: remember,
            };
            report(LoginController::new(state()?).submit(form).await)
        }
        Commands::Social {
            provider,
            email,
            name,
            picture,
        } => {
            let provider = match provider.to_lowercase().as_str() {
                "google" => IdentityProvider::Google,
                "facebook" => IdentityProvider::Facebook,
                "apple" => IdentityProvider::Apple,
                other => anyhow::bail!("Unknown provider: {}", other),
            };
            let profile = ExternalProfile {
                provider,
                email,
                name,
                picture,
            };
            report(SocialLoginController::new(state()?).complete(profile).await)
        }
        Commands::Logout => report(ProfileController::new(state()?).logout()),
        Commands::Whoami => {
            let view = ProfileController::new(state()?)
                .view()
                .map_err(|e| anyhow::anyhow!(e.into_response().message))?;
            println!("{}", sonic_rs::to_string_pretty(&view)?);
            Ok(())
        }
        Commands::Reset { email } => reset(state()?, email).await,
        Commands::Prefs { set } => {
            let profile = ProfileController::new(state()?);
            let view = if set.is_empty() {
                profile.view()
            } else {
                parse_preferences(&set).and_then(|prefs| profile.save_preferences(prefs))
            }
            .map_err(|e| anyhow::anyhow!(e.into_response().message))?;

            for (key, value) in &view.preferences {
                println!("{}: {}", key, value);
            }
            Ok(())
        }
    }
}

async fn reset(state: AppState, email: String) -> anyhow::Result<()> {
    let controller = ResetController::new(state);

    report(controller.request_code(RecoveryRequestForm { email }).await)?;

    loop {
        let code = prompt("Verification code (or \"resend\")")?;
        let outcome = if code == "resend" {
            controller.resend().await
        } else {
            controller.verify_code(VerificationForm { code }).await
        };

        match outcome {
            Ok(response) => println!("{}", response.message),
            Err(e) => eprintln!("{}", e.into_response().message),
        }

        if controller.step()? == ResetStep::SetNewPassword {
            break;
        }
    }

    loop {
        let form = NewPasswordForm {
            password: prompt("New password")?,
            confirm_password: prompt("Confirm password")?,
        };
        match controller.set_new_password(form).await {
            Ok(response) => {
                println!("{}", response.message);
                return Ok(());
            }
            Err(e) => eprintln!("{}", e.into_response().message),
        }
    }
}

fn parse_preferences(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(AppError::validation(
                "preferences",
                format!("Expected key=value, got \"{}\"", pair),
            )),
        })
        .collect()
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    if read == 0 {
        anyhow::bail!("Input closed");
    }
    Ok(line.trim().to_string())
}

fn report(result: Result<FormResponse>) -> anyhow::Result<()> {
    match result {
        Ok(response) => {
            println!("{}", response.message);
            Ok(())
        }
        Err(e) => anyhow::bail!(e.into_response().message),
    }
}
