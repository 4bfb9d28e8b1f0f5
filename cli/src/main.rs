//! Terminal client for browsing the catalog and driving the auth flows

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sugoi_app::slices::anime::AnimeAction;
use sugoi_app::slices::auth::AuthAction;
use sugoi_app::slices::search::SearchAction;
use sugoi_app::slices::verification::{ResendOrigin, VerificationAction};
use sugoi_app::slices::watchlist::WatchlistAction;
use sugoi_app::validation::{LoginForm, RegistrationForm};
use sugoi_app::{app_store, forward_session_events, AppAction, AppEnvironment, AppState, AppStore, Season};
use sugoi_client::config::{API_URL_ENV, DEFAULT_API_URL};
use sugoi_client::{
    ApiClient, CatalogCategory, ClientConfig, FileStorage, FilterUpdate, ScheduleDay, SessionStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod output;

#[derive(Parser)]
#[command(name = "sugoi")]
#[command(about = "Sugoi - browse anime and manage your account from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL
    #[arg(long, env = API_URL_ENV, default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    /// File holding the session token, theme and verification state
    #[arg(long, env = "SUGOI_SESSION_FILE", default_value = ".sugoi/session.json", global = true)]
    session_file: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog
    Search {
        /// Query text
        query: String,

        /// Number of result pages to load
        #[arg(short, long, default_value = "1")]
        pages: u32,

        /// Media type filter (tv, movie, ova, ...)
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// List a catalog (top, top-airing, most-popular, movies, ...)
    Top {
        /// Catalog path or view-all slug
        #[arg(default_value = "top")]
        category: String,

        /// 1-based page
        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Show the weekly schedule
    Schedule {
        /// Only this day (Monday, Tuesday, ...)
        day: Option<String>,
    },

    /// Show a season; defaults to the current one
    Season {
        /// Year
        year: Option<i32>,

        /// winter, spring, summer or fall
        season: Option<String>,
    },

    /// Show one anime
    Anime {
        /// Anime id
        id: u64,
    },

    /// Create an account and send a verification code
    Register {
        /// Display name
        name: String,

        /// Email address
        email: String,

        /// Password
        #[arg(long, env = "SUGOI_PASSWORD")]
        password: String,

        /// Accept the terms and conditions
        #[arg(long)]
        agree: bool,
    },

    /// Submit a verification code
    Verify {
        /// Email address
        email: String,

        /// Six-digit code
        code: String,
    },

    /// Send a new verification code
    Resend {
        /// Email address
        email: String,
    },

    /// Sign in
    Login {
        /// Email address
        email: String,

        /// Password
        #[arg(long, env = "SUGOI_PASSWORD")]
        password: String,
    },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Show your watchlist
    Watchlist,
}

type CliStore = AppStore<ApiClient>;

const RESEND_WAIT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let storage = FileStorage::open(cli.session_file.clone())
        .with_context(|| format!("Failed to open session file {}", cli.session_file.display()))?;
    let session = SessionStore::new(Arc::new(storage));
    let client = ApiClient::new(ClientConfig::new(&cli.api_url), session.clone());
    let events = client.session_events();

    let store = Arc::new(app_store(AppEnvironment::new(client, session)));
    let _listener = forward_session_events(Arc::clone(&store), events);

    tracing::debug!(api_url = %cli.api_url, "Starting");
    run(&store, cli.command).await
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "sugoi=debug,sugoi_app=debug,sugoi_client=debug"
    } else {
        "sugoi=info,sugoi_app=info,sugoi_client=info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

/// Send `action` and wait until its request settles
async fn dispatch(store: &CliStore, action: AppAction) -> Result<()> {
    let mut handle = store.send(action).await?;
    handle.wait().await;
    Ok(())
}

async fn read<T>(store: &CliStore, f: impl FnOnce(&AppState) -> T) -> T {
    store.state(f).await
}

/// Fail with the slice error, if any
fn check(error: Option<String>) -> Result<()> {
    match error {
        Some(message) => bail!(message),
        None => Ok(()),
    }
}

#[allow(clippy::too_many_lines)]
async fn run(store: &CliStore, command: Commands) -> Result<()> {
    match command {
        Commands::Search { query, pages, kind } => {
            if kind.is_some() {
                dispatch(store, AppAction::Search(SearchAction::SetFilter(FilterUpdate::Kind(kind)))).await?;
            }
            dispatch(store, AppAction::Search(SearchAction::search(&query))).await?;
            for _ in 1..pages {
                dispatch(store, AppAction::Search(SearchAction::LoadMore)).await?;
            }
            let (items, error, total) = read(store, |s| {
                (
                    s.search.results.data.items().to_vec(),
                    s.search.results.error.clone(),
                    s.search.pagination.total_results,
                )
            })
            .await;
            check(error)?;
            print!("{}", output::anime_list(&items));
            println!("{} of {total} results", items.len());
        },

        Commands::Top { category, page } => {
            let category = CatalogCategory::from_path(&category)
                .or_else(|| CatalogCategory::from_view_all(&category))
                .with_context(|| format!("Unknown catalog {category:?}"))?;
            dispatch(store, AppAction::Anime(AnimeAction::FetchCatalog { category, page })).await?;
            let (items, error) = read(store, |s| {
                (
                    s.anime.catalog(category).to_vec(),
                    s.anime.catalog_request(category).and_then(|r| r.error.clone()),
                )
            })
            .await;
            check(error)?;
            print!("{}", output::anime_list(&items));
        },

        Commands::Schedule { day } => {
            dispatch(store, AppAction::Anime(AnimeAction::FetchSchedule)).await?;
            let (schedule, error) =
                read(store, |s| (s.anime.schedule.data.clone(), s.anime.schedule.error.clone())).await;
            check(error)?;
            let filter = day.as_deref().map_or(ScheduleDay::All, ScheduleDay::Day);
            let items: Vec<_> = schedule.for_day(filter).into_iter().cloned().collect();
            print!("{}", output::anime_list(&items));
        },

        Commands::Season { year, season } => {
            let action = match (year, season) {
                (Some(year), Some(name)) => {
                    let season = Season::parse(&name).with_context(|| format!("Unknown season {name:?}"))?;
                    AnimeAction::FetchSeason { year, season }
                },
                (None, None) => AnimeAction::FetchCurrentSeason,
                _ => bail!("Give both a year and a season, or neither"),
            };
            let selected = matches!(action, AnimeAction::FetchSeason { .. });
            dispatch(store, AppAction::Anime(action)).await?;
            let (data, error) = read(store, |s| {
                let request = if selected { &s.anime.season } else { &s.anime.current_season };
                (request.data.clone(), request.error.clone())
            })
            .await;
            check(error)?;
            print!("{}", output::season(&data));
        },

        Commands::Anime { id } => {
            dispatch(store, AppAction::Anime(AnimeAction::FetchDetails { id })).await?;
            let (details, error) =
                read(store, |s| (s.anime.details.data.clone(), s.anime.details.error.clone())).await;
            check(error)?;
            if let Some(details) = details {
                print!("{}", output::details(&details));
            }
        },

        Commands::Register {
            name,
            email,
            password,
            agree,
        } => {
            let form = RegistrationForm {
                name,
                email,
                confirm_password: password.clone(),
                password,
                agree_to_terms: agree,
            };
            dispatch(store, AppAction::Auth(AuthAction::Register(form))).await?;
            auth_outcome(store).await?;
        },

        Commands::Verify { email, code } => {
            dispatch(store, AppAction::Auth(AuthAction::VerifyEmail { email, otp: code })).await?;
            auth_outcome(store).await?;
        },

        Commands::Resend { email } => {
            dispatch(
                store,
                AppAction::Verification(VerificationAction::Restore { email: email.clone() }),
            )
            .await?;
            dispatch(
                store,
                AppAction::Verification(VerificationAction::Resend {
                    email,
                    origin: ResendOrigin::User,
                }),
            )
            .await?;
            let (notification, wait) = read(store, |s| {
                (
                    s.ui.notification.clone(),
                    s.verification.cooldown_seconds_remaining,
                )
            })
            .await;
            if notification.open {
                println!("{}", notification.message);
            }
            if wait > 0 {
                println!("Next code available in {wait}s");
            }
        },

        Commands::Login { email, password } => {
            let mut actions = store.subscribe_actions();
            dispatch(store, AppAction::Auth(AuthAction::Login(LoginForm { email, password }))).await?;
            if read(store, |s| s.auth.pending_verification).await {
                // A refused unverified login sends a fresh code in the background
                let settled = tokio::time::timeout(RESEND_WAIT, async {
                    while let Ok(action) = actions.recv().await {
                        if matches!(
                            action,
                            AppAction::Verification(
                                VerificationAction::ResendSucceeded { .. }
                                    | VerificationAction::ResendFailed { .. }
                            )
                        ) {
                            break;
                        }
                    }
                })
                .await;
                if settled.is_err() {
                    tracing::warn!("Verification code request did not settle");
                }
            }
            auth_outcome(store).await?;
        },

        Commands::Logout => {
            dispatch(store, AppAction::Auth(AuthAction::Logout)).await?;
            println!("Signed out");
        },

        Commands::Whoami => {
            dispatch(store, AppAction::Auth(AuthAction::GetCurrentUser)).await?;
            let (user, error) =
                read(store, |s| (s.auth.session.user.clone(), s.auth.error().map(str::to_string))).await;
            check(error)?;
            if let Some(user) = user {
                let plan = if user.is_premium { "premium" } else { "free" };
                println!("{} <{}> ({plan})", user.name, user.email);
            }
        },

        Commands::Watchlist => {
            dispatch(store, AppAction::Watchlist(WatchlistAction::Fetch)).await?;
            let (items, error) = read(store, |s| {
                (s.watchlist.watchlist.data.clone(), s.watchlist.watchlist.error.clone())
            })
            .await;
            check(error)?;
            print!("{}", output::watchlist(&items));
        },
    }
    Ok(())
}

/// Print the toast and fail on field or banner errors
async fn auth_outcome(store: &CliStore) -> Result<()> {
    let (notification, field_errors, error) = read(store, |s| {
        (
            s.ui.notification.clone(),
            s.auth.field_errors.clone(),
            s.auth.error().map(str::to_string),
        )
    })
    .await;
    if notification.open {
        println!("{}", notification.message);
    }
    if !field_errors.is_empty() {
        eprint!("{}", output::field_errors(&field_errors));
        bail!("Invalid input");
    }
    check(error)
}
