use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use engine::{Engine, EngineError, MoneyCents, UserCmd, WishCmd};
use migration::MigratorTrait;
use sea_orm::{Database, DbErr};
use thiserror::Error;

mod password;

#[derive(Parser, Debug)]
#[command(name = "wishlist_admin")]
#[command(about = "Bootstrap users and wishes in a Wishlist database")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./wishlist.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    User(UserCommand),
    #[command(subcommand)]
    Wish(WishCommand),
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create a user; the password is asked for interactively.
    Create(NewUser),
}

#[derive(Subcommand, Debug)]
enum WishCommand {
    /// Create a wish owned by an existing user.
    Create(NewWish),
}

#[derive(Args, Debug)]
struct NewUser {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    about: Option<String>,
}

#[derive(Args, Debug)]
struct NewWish {
    /// Username of the owner.
    #[arg(long)]
    owner: String,
    #[arg(long)]
    name: String,
    /// Price as a decimal amount, e.g. `120.50`.
    #[arg(long, value_parser = parse_price)]
    price: MoneyCents,
    #[arg(long)]
    link: Option<String>,
    #[arg(long)]
    description: Option<String>,
}

fn parse_price(raw: &str) -> Result<MoneyCents, String> {
    raw.parse().map_err(|err: EngineError| err.to_string())
}

#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("database: {0}")]
    Database(#[from] DbErr),
    #[error("terminal: {0}")]
    Terminal(#[from] std::io::Error),
    #[error("{0}")]
    Prompt(&'static str),
}

impl AdminError {
    fn exit_code(&self) -> u8 {
        match self {
            Self::Engine(EngineError::ExistingKey(_) | EngineError::NotFound(_)) => 1,
            Self::Engine(
                EngineError::InvalidAmount(_)
                | EngineError::InvalidOperation(_)
                | EngineError::Forbidden(_),
            ) => 2,
            Self::Prompt(_) => 130,
            _ => 3,
        }
    }
}

async fn run(cli: Cli) -> Result<String, AdminError> {
    let db = Database::connect(cli.database_url.as_str()).await?;
    migration::Migrator::up(&db, None).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(UserCommand::Create(args)) => {
            let password = password::read_new_password()?;
            let mut cmd = UserCmd::new(args.username, args.email, password);
            cmd.about = args.about;
            let user = engine.new_user(cmd).await?;
            Ok(format!("created user {} ({})", user.username, user.id))
        }
        Command::Wish(WishCommand::Create(args)) => {
            let owner = engine.user_by_username(&args.owner).await?;
            let mut cmd = WishCmd::new(args.name, args.price);
            cmd.link = args.link;
            cmd.description = args.description;
            let wish = engine.new_wish(cmd, owner.id).await?;
            Ok(format!(
                "created wish {} ({}) priced {} for {}",
                wish.name, wish.id, wish.price, owner.username
            ))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
