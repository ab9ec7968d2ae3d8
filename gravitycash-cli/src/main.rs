mod config;
mod runner;

use clap::Parser;
use log::*;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use gravitycash_api::domain::{ContactlessMode, WithdrawalMethod};
use gravitycash_api::types::SigninEmail;
use gravitycash_auth::require_auth;
use gravitycash_client::client::GravityClient;
use gravitycash_records::history::{HistoryFilter, TransactionHistory, TransactionStatus, TransactionType};
use gravitycash_records::locations::{LocationDirectory, LocationFilter, LocationType};
use gravitycash_withdraw::controller::WithdrawalController;

use config::AppConfig;
use runner::*;

#[derive(Parser, Debug, Clone)]
#[clap(about, version, author)]
pub struct Args {
    /// Path to the TOML configuration file
    #[clap(long, short, default_value = "gravitycash.toml", env = "GRAVITYCASH_CONFIG")]
    pub config: PathBuf,
    /// Base URL of the withdrawal service. Withdrawals are simulated when it is not set
    #[clap(long, env = "GRAVITYCASH_BACKEND_URL")]
    pub backend_url: Option<String>,
    #[clap(long, env = "GRAVITYCASH_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Where the logged in user is kept between runs
    #[clap(
        long,
        default_value = ".gravitycash/session.json",
        env = "GRAVITYCASH_SESSION_FILE"
    )]
    pub session_file: PathBuf,
    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Parser, Debug, Clone)]
pub enum SubCommand {
    /// Sign in, any non empty credentials open the demo account
    Login {
        #[clap(long)]
        email: String,
        #[clap(long, env = "GRAVITYCASH_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Show the balance of the logged in account
    Balance,
    /// Submit a withdrawal and wait for its confirmation
    Withdraw(WithdrawArgs),
    /// List past transactions of the logged in account, newest first
    History(HistoryArgs),
    /// Find places to withdraw cash
    Locations(LocationsArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct HistoryArgs {
    /// Part of the description
    #[clap(long, default_value = "")]
    pub search: String,
    /// withdrawal, deposit or transfer
    #[clap(long = "type")]
    pub kind: Option<TransactionType>,
    /// Completed, Pending or Failed
    #[clap(long)]
    pub status: Option<TransactionStatus>,
}

impl From<HistoryArgs> for HistoryFilter {
    fn from(args: HistoryArgs) -> Self {
        HistoryFilter {
            search: args.search,
            kind: args.kind,
            status: args.status,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct LocationsArgs {
    /// Part of the name or the address
    #[clap(long, default_value = "")]
    pub search: String,
    /// atm, bank or partner
    #[clap(long = "type")]
    pub kind: Option<LocationType>,
    /// Flip the favourite mark of the location with this id before listing
    #[clap(long)]
    pub toggle_favorite: Option<u32>,
    /// Only list favourite locations
    #[clap(long)]
    pub favorites: bool,
}

impl From<&LocationsArgs> for LocationFilter {
    fn from(args: &LocationsArgs) -> Self {
        LocationFilter {
            search: args.search.clone(),
            kind: args.kind,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct WithdrawArgs {
    /// card, iban, nfc or instant
    #[clap(long, default_value = "card")]
    pub method: String,
    #[clap(long)]
    pub amount: String,
    #[clap(long)]
    pub card_number: Option<String>,
    #[clap(long)]
    pub expiry_date: Option<String>,
    #[clap(long, env = "GRAVITYCASH_CVV", hide_env_values = true)]
    pub cvv: Option<String>,
    #[clap(long)]
    pub account_name: Option<String>,
    #[clap(long)]
    pub iban: Option<String>,
    #[clap(long)]
    pub bank_name: Option<String>,
    #[clap(long)]
    pub reference: Option<String>,
    /// Contactless mode, pay or recharge
    #[clap(long, default_value = "pay")]
    pub mode: ContactlessMode,
}

impl From<WithdrawArgs> for WithdrawalRequest {
    fn from(args: WithdrawArgs) -> Self {
        let optional = [
            ("cardNumber", args.card_number),
            ("expiryDate", args.expiry_date),
            ("cvv", args.cvv),
            ("accountName", args.account_name),
            ("iban", args.iban),
            ("bankName", args.bank_name),
            ("reference", args.reference),
        ];
        let mut fields = vec![("amount".to_owned(), args.amount)];
        fields.extend(
            optional
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name.to_owned(), v))),
        );
        WithdrawalRequest {
            method: Some(args.method),
            fields,
            mode: args.mode,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    env_logger::init();
    let config = AppConfig::load(&args.config)?;
    let session = make_session(&config, &args.session_file);
    session.restore().await?;

    match args.subcmd.clone() {
        SubCommand::Login { email, password } => {
            let user = session.login(SigninEmail { email, password }).await?;
            println!("Logged in as {} <{}>", user.name, user.email);
        }
        SubCommand::Logout => {
            session.logout().await?;
            println!("Logged out");
        }
        SubCommand::Balance => match session.current_user().await {
            Some(user) => println!(
                "{} ({}): {}",
                user.name,
                user.account_number,
                user.currency.format(user.balance)
            ),
            None => println!("Not logged in"),
        },
        SubCommand::Withdraw(withdraw_args) => {
            let user = require_auth(&session, |user| async move { Ok(user) }).await?;
            info!("Withdrawing on behalf of user {}", user.id);

            let client = args
                .backend_url
                .as_deref()
                .map(|url| GravityClient::new(url, args.api_key.as_deref()));
            let backend = make_backend(client.as_ref(), &config);
            let initiator = make_initiator(client.as_ref(), &config);
            let controller = WithdrawalController::new(
                Arc::new(session.clone()),
                backend,
                config.controller.clone(),
                WithdrawalMethod::default(),
            );
            let interrupt = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl-C: {e}");
                    futures::future::pending::<()>().await;
                }
            };
            let confirmation = run_withdrawal(
                &controller,
                withdraw_args.into(),
                initiator.as_ref(),
                interrupt,
            )
            .await?;
            println!("{} ({})", confirmation.headline(), confirmation.method.title());
            println!("{}", confirmation.message());
            if let Some(receipt) = &confirmation.receipt {
                println!("Receipt: {}", serde_json::to_string(&receipt.details)?);
            }
        }
        SubCommand::History(history_args) => match session.current_user().await {
            Some(user) => {
                let history = TransactionHistory::demo();
                let found = history.filter(&history_args.into());
                if found.is_empty() {
                    println!("No transactions found matching your criteria");
                }
                for transaction in found {
                    println!(
                        "{}  {:<30} {:>12}  {:<9} {}",
                        transaction.date,
                        transaction.description,
                        transaction.formatted_amount(user.currency),
                        transaction.status.title(),
                        transaction.kind.to_alpha()
                    );
                }
            }
            None => println!("Not logged in"),
        },
        SubCommand::Locations(locations_args) => {
            let mut directory = LocationDirectory::demo();
            if let Some(id) = locations_args.toggle_favorite {
                directory.toggle_favorite(id)?;
            }
            let found = directory.search(&LocationFilter::from(&locations_args));
            let found: Vec<_> = found
                .into_iter()
                .filter(|l| !locations_args.favorites || l.is_favorite)
                .collect();
            if found.is_empty() {
                println!("No locations found matching your criteria");
            }
            for location in found {
                let star = if location.is_favorite { "*" } else { " " };
                println!(
                    "{}{:>2} {} ({}), {} km away, rated {}",
                    star, location.id, location.name, location.kind, location.distance, location.rating
                );
                println!("     {}", location.address);
                println!("     {}", location.services.join(", "));
            }
        }
    }
    Ok(())
}
