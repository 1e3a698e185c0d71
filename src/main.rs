use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rharvest::{
    init_tracing_once, CredentialProvider, Credentials, HarvestOptions, Harvester, OAuthGrant, RedditClient,
    DEFAULT_LOOKBACK_DAYS, DEFAULT_ROOT, MAX_PAGE_SIZE,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rharvest")]
#[command(about = "Incremental, content-addressed Reddit submission and comment snapshots")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Walk r/<sub>/new back to the cutoff and store changed submissions
    Submissions(SubmissionsArgs),

    /// Fetch and store comment threads for already-harvested submissions
    Comments(CommentsArgs),
}

#[derive(Args)]
struct Common {
    /// Subreddit name (with or without "r/")
    #[arg(long)]
    sub: String,

    /// Lookback window in days
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_DAYS)]
    days: u32,

    /// Storage root
    #[arg(long, default_value = DEFAULT_ROOT)]
    root: PathBuf,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    no_progress: bool,

    #[command(flatten)]
    auth: AuthArgs,
}

#[derive(Args)]
struct SubmissionsArgs {
    #[command(flatten)]
    common: Common,

    /// Page size (1..=100; out-of-range values use 100)
    #[arg(long, default_value_t = MAX_PAGE_SIZE)]
    limit: u32,
}

#[derive(Args)]
struct CommentsArgs {
    #[command(flatten)]
    common: Common,
}

#[derive(Args)]
struct AuthArgs {
    #[arg(long, env = "REDDIT_USER_AGENT", hide_env_values = true)]
    user_agent: String,
    #[arg(long, env = "REDDIT_CLIENT_ID", hide_env_values = true)]
    client_id: String,
    #[arg(long, env = "REDDIT_CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,
    #[arg(long, env = "REDDIT_USERNAME", hide_env_values = true)]
    username: Option<String>,
    #[arg(long, env = "REDDIT_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

impl From<AuthArgs> for Credentials {
    fn from(a: AuthArgs) -> Self {
        Credentials {
            user_agent: a.user_agent,
            client_id: a.client_id,
            client_secret: a.client_secret,
            username: a.username,
            password: a.password,
        }
    }
}

fn connect(creds: &Credentials) -> Result<RedditClient> {
    let client = RedditClient::new(creds.user_agent.clone()).context("building http client")?;
    let token = OAuthGrant { client: &client, creds }
        .bearer_token()
        .context("requesting access token")?;
    Ok(client.with_token(token))
}

fn harvester(c: &Common) -> Harvester {
    let opts = HarvestOptions::default()
        .with_root(&c.root)
        .with_subreddit(&c.sub)
        .with_lookback_days(c.days)
        .with_progress(!c.no_progress);
    Harvester::from_options(opts)
}

fn main() -> Result<()> {
    init_tracing_once();
    let cli = Cli::parse();

    match cli.command {
        Command::Submissions(args) => {
            let h = harvester(&args.common).page_size(args.limit);
            let client = connect(&args.common.auth.into())?;
            let counts = h.run_submissions(&client).context("submissions harvest")?;
            println!("{}", serde_json::to_string(&counts)?);
        }
        Command::Comments(args) => {
            let h = harvester(&args.common);
            let client = connect(&args.common.auth.into())?;
            let counts = h.run_comments(&client).context("comments harvest")?;
            println!("{}", serde_json::to_string(&counts)?);
        }
    }
    Ok(())
}
