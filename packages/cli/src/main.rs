//! `layergen` - command-line front end for the layer-generation service.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use api::{Api, LayerType, ProfileUpdate, Settings};
use clap::{Parser, Subcommand};
use pages::{HistoryPage, IndexPage, LoginPage, Route, UploadPage, UserPage};
use store::{FileStore, SessionStore};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser)]
#[command(name = "layergen")]
#[command(about = "Generate KML layers from spreadsheets", long_about = None)]
struct Cli {
    /// Settings file (default: ./layergen.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether you are logged in
    Status,
    /// Text a verification code to a phone number
    SendCode { phone: String },
    /// Log in with a phone number and verification code
    Login { phone: String, code: String },
    /// Show the signed-in user's profile
    Whoami,
    /// Change profile fields
    Profile {
        #[arg(long)]
        nickname: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
    },
    /// Upload a spreadsheet (.xlsx, .xls, .csv) and generate a KML layer
    Upload {
        file: PathBuf,
        /// sector, rsrp or facility
        #[arg(long, short)]
        layer: LayerType,
    },
    /// List generated layers
    History,
    /// Download a generated layer by list position or filename
    Download {
        record: String,
        #[arg(long, short, default_value = ".")]
        out: PathBuf,
    },
    /// Print the download URL of a generated file
    Url { filename: String },
    /// Forget the local session
    Logout,
    /// Inspect or create the settings file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective settings
    Show,
    /// Write a settings file with the defaults
    Init {
        #[arg(long)]
        force: bool,
    },
}

type ClientApi = Api<FileStore>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let settings_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(Settings::filename()));
    let settings = Settings::load(&settings_path).context("failed to load settings")?;
    debug!(base_url = %settings.api.base_url, "settings loaded");

    if let Commands::Config { command } = &cli.command {
        return run_config(command, &settings, &settings_path);
    }

    let sessions = SessionStore::new(FileStore::new(settings.storage_dir()));
    run(cli.command, Api::from_settings(&settings, sessions)).await
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(command: Commands, api: ClientApi) -> anyhow::Result<()> {
    match command {
        Commands::Status => {
            let mut page = IndexPage::new(api);
            page.load().await;
            match page.greeting() {
                Some(greeting) => println!("{greeting}"),
                None => println!("Not logged in. Run `layergen send-code <phone>` to begin."),
            }
        }
        Commands::SendCode { phone } => {
            let mut page = LoginPage::new(api);
            page.input_phone(phone).await;
            let effect = page.send_code().await;
            render::field_errors(&page.errors)?;
            render::finish(effect)?;
        }
        Commands::Login { phone, code } => {
            let mut page = LoginPage::new(api);
            page.input_phone(phone).await;
            page.input_code(code);
            let effect = page.login().await;
            render::field_errors(&page.errors)?;
            render::finish(effect)?;
        }
        Commands::Whoami => {
            let page = load_user(api).await?;
            if let Some(user) = &page.user {
                render::user(user);
            }
        }
        Commands::Profile { nickname, avatar } => {
            let mut page = load_user(api).await?;
            render::finish(page.update_profile(ProfileUpdate { nickname, avatar }).await)?;
            if let Some(user) = &page.user {
                render::user(user);
            }
        }
        Commands::Upload { file, layer } => {
            require_login(&api).await?;
            let mut page = UploadPage::new(api);
            render::finish(page.choose_file(file).await)?;
            page.select_layer_type(layer);
            if let Some(selected) = &page.selected_file {
                println!(
                    "Uploading {} ({}) as {}...",
                    selected.name(),
                    selected.size_label(),
                    layer.label()
                );
            }
            render::finish(page.submit().await)?;
            if let Some(url) = page.last_result.as_ref().and_then(|r| r.kml_url.as_deref()) {
                println!("{url}");
            }
        }
        Commands::History => {
            require_login(&api).await?;
            let mut page = HistoryPage::new(api);
            render::finish(page.load().await)?;
            render::history(&page.records);
        }
        Commands::Download { record, out } => {
            require_login(&api).await?;
            let mut page = HistoryPage::new(api);
            render::finish(page.load().await)?;
            let Some(index) = page.find(&record) else {
                bail!("no history record matches {record:?}, see `layergen history`");
            };
            render::finish(page.download(index, &out).await)?;
        }
        Commands::Url { filename } => {
            println!("{}", api.download_url(&filename)?);
        }
        Commands::Logout => {
            let mut page = UserPage::new(api);
            render::finish(page.logout().await)?;
        }
        // Settings commands run before the session store is opened
        Commands::Config { .. } => {}
    }
    Ok(())
}

const NOT_LOGGED_IN: &str = "not logged in, run `layergen login <phone> <code>` first";

async fn require_login(api: &ClientApi) -> anyhow::Result<()> {
    if pages::initial_route(api.session()).await == Route::Login {
        bail!(NOT_LOGGED_IN);
    }
    Ok(())
}

/// Open the user page, restoring the cached profile from a lone token when needed.
async fn load_user(api: ClientApi) -> anyhow::Result<UserPage<FileStore>> {
    let mut page = UserPage::new(api);
    render::finish(page.load().await)?;
    if page.user.is_none() {
        bail!(NOT_LOGGED_IN);
    }
    Ok(page)
}

fn run_config(command: &ConfigCommands, settings: &Settings, path: &Path) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => {
            print!("{}", settings.to_toml()?);
            println!("# storage dir: {}", settings.storage_dir().display());
        }
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                bail!("{} already exists, pass --force to overwrite", path.display());
            }
            std::fs::write(path, Settings::default().to_toml()?)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}
