//! # HailNet CLI
//!
//! Command line front end for the hail net estimator.
//!
//! ```text
//! hailnet basic --area 12 --net-type premium --installation hybrid --pdf
//! hailnet login < password.txt
//! hailnet advanced fuzzy --area 50 --net-type T90 --margin 40 --package luxury
//! hailnet advanced precise --rows 30 --row-length 250 --row-spacing 3.5 --json
//! hailnet status
//! ```
//!
//! Flags that are not given keep the value stored from the previous run, and
//! every run stores the parameters it used.

mod logging;

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use hailnet_core::auth::{format_remaining, AuthGate, AuthState, LoginOutcome};
use hailnet_core::catalog::{AccessoryPackage, AdvancedNetType, BasicNetType, InstallationType, PriceMarginTier};
use hailnet_core::config::AppConfig;
use hailnet_core::parameters::{AdvancedMode, AdvancedParameters, BasicParameters, Estimator, ParameterSet};
use hailnet_core::pdf::export_quotation;
use hailnet_core::quotation::Quotation;
use hailnet_core::store::{StateStore, AUTH_STATE_KEY};
use hailnet_core::CalcError;

#[derive(Parser, Debug)]
#[command(name = "hailnet", version, about = "Hail-protection netting material and cost estimator")]
struct Cli {
    /// Config file (default: <config dir>/hailnet/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory for stored parameters and auth state
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Advanced (USD) calculator; requires login
    Advanced {
        #[command(subcommand)]
        mode: AdvancedCommand,
    },
    /// Basic (CNY) calculator
    Basic(BasicArgs),
    /// Restore a calculator's default parameters
    Reset {
        #[arg(value_enum)]
        calculator: Calculator,
    },
    /// Log in to the advanced calculator (password read from stdin)
    Login,
    /// End the current session
    Logout,
    /// Show session and lockout state
    Status,
}

#[derive(Subcommand, Debug)]
enum AdvancedCommand {
    /// Estimate from a preset farm area
    Fuzzy {
        /// Farm area in hectares, snapped to 5/10/20/50/100
        #[arg(long)]
        area: Option<f64>,
        #[command(flatten)]
        common: AdvancedArgs,
    },
    /// Calculate from row geometry
    Precise {
        #[arg(long)]
        rows: Option<u32>,
        /// Row length in meters
        #[arg(long)]
        row_length: Option<f64>,
        /// Row spacing in meters
        #[arg(long)]
        row_spacing: Option<f64>,
        #[command(flatten)]
        common: AdvancedArgs,
    },
}

#[derive(Args, Debug)]
struct AdvancedArgs {
    /// T60, T90 (T90+) or L50
    #[arg(long, value_parser = AdvancedNetType::from_str_flexible)]
    net_type: Option<AdvancedNetType>,
    /// Markup tier: 30, 40 or 50
    #[arg(long, value_parser = PriceMarginTier::from_str_flexible)]
    margin: Option<PriceMarginTier>,
    /// economy or luxury
    #[arg(long, value_parser = AccessoryPackage::from_str_flexible)]
    package: Option<AccessoryPackage>,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct BasicArgs {
    /// Farm area in hectares
    #[arg(long)]
    area: Option<f64>,
    /// standard, reinforced or premium
    #[arg(long, value_parser = BasicNetType::from_str_flexible)]
    net_type: Option<BasicNetType>,
    /// manual, mechanical or hybrid
    #[arg(long, value_parser = InstallationType::from_str_flexible)]
    installation: Option<InstallationType>,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Customer name shown on the quotation
    #[arg(long)]
    customer: Option<String>,
    /// Print the result as JSON instead of the breakdown
    #[arg(long)]
    json: bool,
    /// Export a PDF quotation (to DIR, or the configured export directory)
    #[arg(long, value_name = "DIR", num_args = 0..=1)]
    pdf: Option<Option<PathBuf>>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Calculator {
    Advanced,
    Basic,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(cli.config.as_deref()).context("Failed to load configuration")?;
    logging::init(&config.logging.filter);

    let data_dir = cli.data_dir.clone().unwrap_or_else(|| config.data_dir());
    let store = StateStore::open(&data_dir).with_context(|| format!("Failed to open {}", data_dir.display()))?;

    let now = Utc::now();
    match cli.command {
        Command::Advanced { mode } => run_advanced(&config, &store, mode, now),
        Command::Basic(args) => run_basic(&config, &store, args, now),
        Command::Reset { calculator } => run_reset(&store, calculator),
        Command::Login => {
            let password = read_password()?;
            run_login(&config, &store, &password, Utc::now())
        }
        Command::Logout => run_logout(&config, &store),
        Command::Status => run_status(&config, &store, now),
    }
}

/// Run `change` on the password gate with the stored auth state loaded and
/// written back under the store lock.
fn with_gate<R>(config: &AppConfig, store: &StateStore, change: impl FnOnce(&mut AuthGate) -> R) -> Result<R> {
    let policy = config.auth_policy()?;
    store
        .update(AUTH_STATE_KEY, |state: &mut AuthState| {
            let mut gate = AuthGate::new(policy, std::mem::take(state));
            let output = change(&mut gate);
            *state = gate.into_state();
            output
        })
        .context("Failed to update auth state")
}

fn run_advanced(config: &AppConfig, store: &StateStore, command: AdvancedCommand, now: DateTime<Utc>) -> Result<()> {
    // validation logs an expired session out, so the state is written back
    let valid = with_gate(config, store, |gate| gate.validate_session(now))?;
    if !valid {
        return Err(CalcError::SessionExpired).context("Run `hailnet login` first");
    }

    let mut estimator = Estimator::<AdvancedParameters>::load(store);
    let output = match command {
        AdvancedCommand::Fuzzy { area, common } => {
            estimator.update(|p| {
                p.mode = AdvancedMode::Fuzzy;
                if let Some(area) = area {
                    p.set_farm_area(area);
                }
                apply_advanced(p, &common);
            });
            common.output
        }
        AdvancedCommand::Precise {
            rows,
            row_length,
            row_spacing,
            common,
        } => {
            estimator.update(|p| {
                p.mode = AdvancedMode::Precise;
                if let Some(rows) = rows {
                    p.row_count = rows;
                }
                if let Some(length) = row_length {
                    p.row_length_m = length;
                }
                if let Some(spacing) = row_spacing {
                    p.row_spacing_m = spacing;
                }
                apply_advanced(p, &common);
            });
            common.output
        }
    };

    estimator.params().to_input().validate()?;
    estimator.save(store).context("Failed to save parameters")?;

    let quote = Quotation::advanced(estimator.params(), estimator.result(), now);
    report(config, &estimator, &quote, &output)
}

fn apply_advanced(params: &mut AdvancedParameters, args: &AdvancedArgs) {
    if let Some(net_type) = args.net_type {
        params.net_type = net_type;
    }
    if let Some(margin) = args.margin {
        params.price_margin = margin;
    }
    if let Some(package) = args.package {
        params.accessory_package = package;
    }
    if let Some(customer) = &args.output.customer {
        params.customer_name = customer.clone();
    }
}

fn run_basic(config: &AppConfig, store: &StateStore, args: BasicArgs, now: DateTime<Utc>) -> Result<()> {
    let mut estimator = Estimator::<BasicParameters>::load(store);
    estimator.update(|p| {
        if let Some(area) = args.area {
            p.farm_area_ha = area;
        }
        if let Some(net_type) = args.net_type {
            p.net_type = net_type;
        }
        if let Some(installation) = args.installation {
            p.installation = installation;
        }
        if let Some(customer) = &args.output.customer {
            p.customer_name = customer.clone();
        }
    });

    estimator.params().to_input().validate()?;
    estimator.save(store).context("Failed to save parameters")?;

    let quote = Quotation::basic(estimator.params(), estimator.result(), now);
    report(config, &estimator, &quote, &args.output)
}

/// Print the result and export the PDF if asked. Export problems are
/// reported but do not fail the command.
fn report<P: ParameterSet>(
    config: &AppConfig,
    estimator: &Estimator<P>,
    quote: &Quotation,
    output: &OutputArgs,
) -> Result<()> {
    if output.json {
        println!("{}", serde_json::to_string_pretty(estimator.result())?);
    } else {
        print!("{}", quote);
    }

    if let Some(dir) = &output.pdf {
        let dir = dir.clone().unwrap_or_else(|| config.export_dir());
        export(quote, &dir);
    }
    Ok(())
}

fn export(quote: &Quotation, dir: &Path) {
    match export_quotation(quote, dir) {
        Ok(path) => eprintln!("PDF quotation written to {}", path.display()),
        Err(e) => {
            warn!(error = %e, "quotation export failed");
            eprintln!("warning: PDF export failed: {}", e);
        }
    }
}

fn run_reset(store: &StateStore, calculator: Calculator) -> Result<()> {
    match calculator {
        Calculator::Advanced => {
            let mut estimator = Estimator::<AdvancedParameters>::load(store);
            estimator.reset();
            estimator.save(store)?;
        }
        Calculator::Basic => {
            let mut estimator = Estimator::<BasicParameters>::load(store);
            estimator.reset();
            estimator.save(store)?;
        }
    }
    println!("Calculator reset to defaults");
    Ok(())
}

fn read_password() -> Result<String> {
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn run_login(config: &AppConfig, store: &StateStore, password: &str, now: DateTime<Utc>) -> Result<()> {
    let initial_password = config.auth.initial_password.as_deref();
    let (outcome, session) = with_gate(config, store, |gate| {
        if !gate.state().is_initialized() {
            if let Some(initial) = initial_password {
                gate.initialize(initial);
            }
        }
        let outcome = gate.login(password, now);
        (outcome, gate.session_remaining(now))
    })?;

    match outcome {
        LoginOutcome::Success => {
            info!("advanced calculator unlocked");
            println!("Logged in. Session remaining: {}", format_remaining(session));
        }
        LoginOutcome::Rejected { attempts_remaining } => {
            println!("Wrong password, {} attempt(s) remaining", attempts_remaining);
        }
        LoginOutcome::LockedOut { remaining_minutes } => {
            println!("Too many failed attempts, locked for {} minute(s)", remaining_minutes);
        }
        LoginOutcome::Locked { remaining_minutes } => {
            println!("Locked, try again in {} minute(s)", remaining_minutes);
        }
        LoginOutcome::NotInitialized => {
            bail!("No password configured; set auth.initial_password in the config file");
        }
    }

    outcome.into_result().context("Login failed")
}

fn run_logout(config: &AppConfig, store: &StateStore) -> Result<()> {
    with_gate(config, store, |gate| gate.logout())?;
    println!("Logged out");
    Ok(())
}

fn run_status(config: &AppConfig, store: &StateStore, now: DateTime<Utc>) -> Result<()> {
    let gate = with_gate(config, store, |gate| {
        gate.validate_session(now);
        gate.clone()
    })?;

    match gate.session_remaining(now) {
        Some(remaining) => println!("Session: active, {} remaining", format_remaining(Some(remaining))),
        None => println!("Session: not logged in"),
    }

    if gate.is_locked(now) {
        let minutes = (gate.remaining_lock_time(now).num_seconds() + 59) / 60;
        println!("Lockout: {} minute(s) remaining", minutes);
    } else {
        println!("Attempts remaining: {}", gate.attempts_remaining());
    }
    Ok(())
}
