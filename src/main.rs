use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use userauth::auth::validate;
use userauth::{AuthService, Config};

/// Minimal username/password authentication service.
#[derive(Parser, Debug)]
#[command(name = "userauth", version, about)]
struct Cli {
    /// Config file (defaults to the platform config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP gateway.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create an account directly in the user store.
    Register {
        username: String,
        first_name: String,
        last_name: String,
        #[arg(long, env = "USERAUTH_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Check credentials and print a bearer token.
    Signin {
        username: String,
        #[arg(long, env = "USERAUTH_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Print the profile behind a bearer token as JSON.
    Whoami { token: String },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("userauth=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            userauth::gateway::run_gateway(&config).await
        }
        Commands::Register {
            username,
            first_name,
            last_name,
            password,
        } => {
            validate::signup(&username, &password, &first_name, &last_name)?;
            let auth = AuthService::from_config(&config)?;
            auth.register(&username, &password, &first_name, &last_name)?;
            println!("Registered {username}");
            Ok(())
        }
        Commands::Signin { username, password } => {
            validate::signin(&username, &password)?;
            let auth = AuthService::from_config(&config)?;
            let token = auth.authenticate(&username, &password)?;
            println!("{token}");
            Ok(())
        }
        Commands::Whoami { token } => {
            let auth = AuthService::from_config(&config)?;
            let profile = auth.fetch_profile(Some(token.as_str()))?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(())
        }
    }
}
