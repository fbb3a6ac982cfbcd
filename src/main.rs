use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use piwallet::ledger::format_stroops;
use piwallet::{
    LedgerClient, MnemonicLength, Network, PaymentDetail, SecretPayload, Vault, Wallet, WalletError,
};

#[derive(Parser)]
#[command(name = "piwallet")]
#[command(about = "Non-custodial Pi wallet: keys, vault, and ledger operations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new wallet and store it under a PIN
    Generate {
        /// Recovery phrase length
        #[arg(long, default_value_t = 24)]
        words: usize,
    },
    /// Import a wallet from an existing recovery phrase
    Import,
    /// Show the wallet address
    Address,
    /// Show the account balance
    Balance,
    /// Send a native-asset payment
    Send {
        /// Destination account (G...)
        destination: String,
        /// Amount in whole units, e.g. 1.2500000
        amount: String,
        /// Optional text memo (max 28 bytes)
        #[arg(long)]
        memo: Option<String>,
    },
    /// Fund and create a not-yet-activated account
    Activate {
        /// Destination account (G...)
        destination: String,
    },
    /// Show payment history
    History {
        #[arg(long, default_value_t = 10)]
        limit: u32,
        /// Continue from a previous page's cursor
        #[arg(long)]
        cursor: Option<String>,
    },
    /// Show or set the network preference
    Network {
        /// mainnet or testnet
        network: Option<Network>,
    },
    /// Clear the unlocked session
    Lock,
    /// Delete the stored wallet. Irreversible without the recovery phrase
    Wipe {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "piwallet=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let vault = Vault::open()?;

    match cli.command {
        Commands::Generate { words } => {
            let length = match words {
                12 => MnemonicLength::Words12,
                24 => MnemonicLength::Words24,
                _ => bail!("--words must be 12 or 24"),
            };
            if vault.has_wallet() {
                bail!("a wallet is already stored; run `piwallet wipe` first");
            }
            let wallet = Wallet::generate(length)?;
            let pin = prompt_new_pin()?;
            store_wallet(&vault, &wallet, &pin)?;
            println!("Address: {}", wallet.address());
            println!();
            println!("Recovery phrase (write it down, it is shown only once):");
            println!("  {}", wallet.mnemonic());
        }
        Commands::Import => {
            if vault.has_wallet() {
                bail!("a wallet is already stored; run `piwallet wipe` first");
            }
            println!("Enter recovery phrase:");
            let mut phrase = String::new();
            std::io::stdin()
                .read_line(&mut phrase)
                .context("failed to read recovery phrase")?;
            let wallet = Wallet::from_mnemonic(phrase.trim())?;
            let pin = prompt_new_pin()?;
            store_wallet(&vault, &wallet, &pin)?;
            println!("Imported wallet {}", wallet.address());
        }
        Commands::Address => {
            let wallet = unlock(&vault)?;
            println!("{}", wallet.address());
        }
        Commands::Balance => {
            let wallet = unlock(&vault)?;
            let client = LedgerClient::new(vault.network_preference());
            match client.load_account(wallet.address()).await {
                Ok(account) => {
                    println!(
                        "Balance:   {}",
                        format_stroops(account.balance.unwrap_or(0))
                    );
                    println!("Spendable: {}", format_stroops(account.spendable_balance()));
                }
                Err(WalletError::AccountNotActivated(_)) => {
                    println!("Account is not activated yet; it has no balance.");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Send {
            destination,
            amount,
            memo,
        } => {
            let wallet = unlock(&vault)?;
            let client = LedgerClient::new(vault.network_preference());
            let hash = client
                .send_payment(wallet.keypair(), &destination, &amount, memo.as_deref())
                .await?;
            println!("Confirmed: {hash}");
        }
        Commands::Activate { destination } => {
            let wallet = unlock(&vault)?;
            let client = LedgerClient::new(vault.network_preference());
            let hash = client
                .activate_account(wallet.keypair(), &destination)
                .await?;
            println!("Activated {destination}");
            println!("Confirmed: {hash}");
        }
        Commands::History { limit, cursor } => {
            let wallet = unlock(&vault)?;
            let client = LedgerClient::new(vault.network_preference());
            let page = client
                .payments(wallet.address(), limit, cursor.as_deref())
                .await?;
            for record in &page.records {
                print_record(record, wallet.address());
            }
            match page.next_cursor {
                Some(cursor) => println!("Next page: --cursor {cursor}"),
                None => println!("End of history."),
            }
        }
        Commands::Network { network } => match network {
            Some(network) => {
                vault.set_network_preference(network)?;
                info!(%network, "network preference updated");
                println!("Network set to {network}");
            }
            None => println!("{}", vault.network_preference()),
        },
        Commands::Lock => {
            vault.clear_session()?;
            println!("Session cleared.");
        }
        Commands::Wipe { yes } => {
            if !vault.has_wallet() {
                println!("No wallet stored.");
                return Ok(());
            }
            if !yes {
                bail!("refusing to delete the wallet without --yes");
            }
            vault.clear_session()?;
            vault.clear_wallet()?;
            println!("Wallet deleted.");
        }
    }

    Ok(())
}

fn prompt_new_pin() -> anyhow::Result<String> {
    let pin = rpassword::prompt_password_stdout("Choose a PIN: ")?;
    let confirm = rpassword::prompt_password_stdout("Confirm PIN: ")?;
    if pin != confirm {
        bail!("PINs do not match");
    }
    if pin.is_empty() {
        bail!("PIN must not be empty");
    }
    Ok(pin)
}

fn store_wallet(vault: &Vault, wallet: &Wallet, pin: &str) -> anyhow::Result<()> {
    let payload = SecretPayload {
        mnemonic: wallet.mnemonic().to_string(),
        public_key: wallet.address().to_string(),
        secret_key: wallet.keypair().secret(),
    };
    vault.store(&payload, pin)?;
    vault.create_session()?;
    Ok(())
}

/// Prompt for the PIN, decrypt the vault, and re-derive the keypair.
fn unlock(vault: &Vault) -> anyhow::Result<Wallet> {
    if !vault.has_wallet() {
        bail!("no wallet stored; run `piwallet generate` or `piwallet import`");
    }
    let pin = rpassword::prompt_password_stdout("PIN: ")?;
    let payload = vault.load(&pin)?;
    let wallet = Wallet::from_mnemonic(&payload.mnemonic)?;
    vault.create_session()?;
    Ok(wallet)
}

fn print_record(record: &piwallet::PaymentRecord, own_address: &str) {
    match &record.detail {
        PaymentDetail::Payment { from, to, amount } => {
            let (direction, other) = if from == own_address {
                ("sent", to)
            } else {
                ("received", from)
            };
            println!(
                "{}  {}  {}  {}  tx {}",
                record.created_at,
                direction,
                format_stroops(*amount),
                other,
                record.transaction_hash
            );
        }
        PaymentDetail::CreateAccount {
            funder,
            account,
            starting_balance,
        } => {
            let verb = if funder == own_address {
                "funded"
            } else {
                "created by"
            };
            let other = if funder == own_address { account } else { funder };
            println!(
                "{}  {}  {}  {}  tx {}",
                record.created_at,
                verb,
                format_stroops(*starting_balance),
                other,
                record.transaction_hash
            );
        }
        PaymentDetail::Other { kind } => {
            println!(
                "{}  {}  tx {}",
                record.created_at, kind, record.transaction_hash
            );
        }
    }
}
