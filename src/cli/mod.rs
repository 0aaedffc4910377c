// CLI interface
pub mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dingtalk::{Config, DingTalk};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dingtalk")]
#[command(about = "Call the DingTalk open API with cached credentials", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.config/dingtalk/config.toml)
    #[arg(long, global = true, env = "DINGTALK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print an access token
    Token {
        /// Use the configured appid/appsecret instead of the corp pair
        #[arg(long)]
        app: bool,
    },

    /// Print the jsapi ticket
    Ticket,

    /// Print the JSAPI config for a page URL
    Sign {
        /// Page URL the front-end runs on
        url: String,
    },

    /// List departments
    Departments {
        /// Only departments below this id
        #[arg(long)]
        parent: Option<i64>,
    },

    /// List every user, de-duplicated across departments
    Users {
        /// Only this department
        #[arg(long)]
        department: Option<i64>,

        /// Fetch userid and name only
        #[arg(long)]
        simple: bool,

        /// Departments fetched at the same time
        #[arg(long)]
        concurrency: Option<usize>,
    },
}

pub async fn execute(args: Cli) -> anyhow::Result<()> {
    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    let dingtalk = DingTalk::new(config).context("Failed to build DingTalk client")?;

    match args.command {
        Commands::Token { app } => commands::token::execute(&dingtalk, app).await,
        Commands::Ticket => commands::token::execute_ticket(&dingtalk).await,
        Commands::Sign { url } => commands::sign::execute(&dingtalk, &url).await,
        Commands::Departments { parent } => commands::list::departments(&dingtalk, parent).await,
        Commands::Users {
            department,
            simple,
            concurrency,
        } => commands::list::users(&dingtalk, department, simple, concurrency).await,
    }
}
