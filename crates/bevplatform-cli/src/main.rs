mod display;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use bevplatform_client::{ApiClient, ClientConfig};
use bevplatform_core::format::user_display_name;
use bevplatform_core::permissions::can_grant_appropriation;
use bevplatform_core::{GrantRequest, PaymentCapabilities};
use bevplatform_store::{FileSession, Level, Store};
use chrono::Local;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bev")]
#[command(about = "Case, appropriation and payment client", version)]
struct Cli {
    /// Server base URL, without the /api suffix.
    #[arg(long, global = true, env = "BEV_API_URL")]
    api_url: Option<String>,
    /// Where the login session is kept between runs.
    #[arg(
        long,
        global = true,
        env = "BEV_SESSION_FILE",
        default_value = ".bev-session.json"
    )]
    session_file: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and keep the session for later commands.
    Login {
        username: String,
        #[arg(long, env = "BEV_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Show a case and its appropriations.
    Case { id: i64 },
    /// Show an appropriation and its activities.
    Appropriation { id: i64 },
    /// List the payments of an activity with what the current user may do.
    Payments { activity_id: i64 },
    /// Grant every activity of an appropriation that awaits approval.
    Grant {
        appropriation_id: i64,
        #[arg(long, default_value = "")]
        note: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = ClientConfig::new(url.as_str())
            .with_token_refresh_interval(config.token_refresh_interval)
            .with_request_timeout(config.request_timeout);
    }
    tracing::debug!(base_url = %config.base_url, "bev v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(Store::new());
    let session = Arc::new(FileSession::new(&cli.session_file));
    let client = ApiClient::new(config, Arc::clone(&store), session)?;

    let result = run(&client, cli.command).await;
    for note in store.take_notifications() {
        match note.level {
            Level::Error | Level::Warning => eprintln!("{}", note.message),
            Level::Info | Level::Success => println!("{}", note.message),
        }
    }
    result
}

async fn run(client: &ApiClient, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login { username, password } => {
            let user = client.login(&username, &password).await?;
            println!(
                "Logget ind som {} ({})",
                user_display_name(&user),
                user.effective_profile().label()
            );
        }
        Commands::Logout => {
            client.logout().await?;
            println!("Logget ud");
        }
        Commands::Case { id } => {
            require_login(client).await?;
            client.load_lists().await?;
            let (case, appropriations) =
                tokio::try_join!(client.fetch_case(id), client.fetch_appropriations(id))?;
            display::print_case_card(client.store(), &case, &appropriations);
        }
        Commands::Appropriation { id } => {
            require_login(client).await?;
            client.fetch_sections().await?;
            let page = client.load_appropriation_page(id).await?;
            display::print_appropriation_card(client.store(), &page);
        }
        Commands::Payments { activity_id } => {
            require_login(client).await?;
            let activity = client.fetch_activity(activity_id).await?;
            let plan_id = activity
                .payment_plan
                .as_ref()
                .and_then(|p| p.id)
                .with_context(|| format!("activity {activity_id} has no payment plan"))?;
            let plan = client.fetch_payment_plan(plan_id).await?;
            let caps =
                PaymentCapabilities::for_activity(client.store().current_profile(), &activity);
            display::print_payment_table(&activity, &plan, caps, Local::now().date_naive());
        }
        Commands::Grant {
            appropriation_id,
            note,
        } => {
            require_login(client).await?;
            let activities = client.fetch_activities(appropriation_id).await?;
            if !can_grant_appropriation(client.store().current_profile(), &activities) {
                bail!("appropriation {appropriation_id} has nothing you can grant");
            }
            let request = GrantRequest {
                activities: activities
                    .iter()
                    .filter(|a| a.status.awaits_approval())
                    .filter_map(|a| a.id)
                    .collect(),
                note,
            };
            client.grant_appropriation(appropriation_id, &request).await?;
            let page = client.load_appropriation_page(appropriation_id).await?;
            display::print_appropriation_card(client.store(), &page);
        }
    }
    Ok(())
}

async fn require_login(client: &ApiClient) -> anyhow::Result<()> {
    if client.resume().await?.is_none() {
        bail!("not logged in; run `bev login <username>` first");
    }
    Ok(())
}
