use anyhow::Result;
use clap::{Parser, Subcommand};
use storefront_client::StorefrontConfig;

mod commands;
mod formatting;
mod item_spec;
mod session_store;

use item_spec::ItemSpec;

#[derive(Parser, Debug)]
#[command(version, about = "Browse the menu, place pickup orders and follow them from the terminal")]
pub struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the menu
    Menu {
        /// Only show items in this category
        #[arg(short, long)]
        category: Option<String>,
        /// Only show items whose name or description contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Create an account and sign in to it
    Register {
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        phone: Option<String>,
    },
    /// Sign in. The session is kept in ~/.storefront until you sign out.
    Login {
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show who is signed in
    Whoami,
    /// List your orders, most recent first
    History,
    /// Place a pickup order
    Order {
        /// Items to order, as id[:size][:qty][+addon...], e.g. 201:Large:2+Cheese
        #[arg(required = true)]
        items: Vec<ItemSpec>,
        /// Keep running and report status changes until the order is completed
        #[arg(short, long)]
        watch: bool,
    },
    /// Follow your orders as they change
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    let config = StorefrontConfig::from_env_or_default();
    let result = match cli.command {
        Command::Menu { category, search } => commands::show_menu(&config, category, search).await,
        Command::Register { email, name, phone } => commands::register(&config, email, name, phone).await,
        Command::Login { email } => commands::login(&config, email).await,
        Command::Logout => commands::logout(&config).await,
        Command::Whoami => commands::whoami(),
        Command::History => commands::history(&config).await,
        Command::Order { items, watch } => commands::order(&config, items, watch).await,
        Command::Watch => commands::watch(&config).await,
    };
    match result {
        Ok(message) => {
            println!("{message}");
            Ok(())
        },
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        },
    }
}
