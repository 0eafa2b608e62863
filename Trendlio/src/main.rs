use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use trendclient::{FeedKind, PageRequest, Post, TrendClient};
use trendconfig::Config;
use trendplayback::{
    LayoutRect, MediaController, MediaHandle, PlaybackCoordinator, PlaybackError, ViewToken,
    ViewabilityConfig, Viewport,
};

/// Height added under the media of each post (header, actions, caption)
const POST_CHROME_HEIGHT: f64 = 160.0;
/// Number of scroll steps per post during a feed replay
const SCROLL_STEPS_PER_POST: usize = 3;
const FEED_SCREEN: &str = "feed";

#[derive(Parser, Debug)]
#[command(name = "trendlio", about = "Trendlio command line client")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a session and keep its tokens in the configuration
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TRENDLIO_PASSWORD")]
        password: String,
    },
    /// Close the current session
    Logout,
    /// Show the logged in user
    Whoami,
    /// Load a feed page and replay a scroll through it
    Feed {
        /// Use the Following tab instead of For You
        #[arg(long)]
        following: bool,
        #[arg(long, default_value = "0")]
        page: u32,
        #[arg(long, default_value = "10")]
        size: u32,
    },
    /// Show notifications and the unread counter
    Notifications,
    /// Show the resolved environment and endpoints
    Env,
}

/// Stand-in for a video element: it only logs what it is asked to do
struct LoggingController {
    label: String,
}

#[async_trait]
impl MediaController for LoggingController {
    async fn play(&self) -> Result<(), PlaybackError> {
        info!("▶️  play {}", self.label);
        Ok(())
    }

    async fn pause(&self) -> Result<(), PlaybackError> {
        info!("⏸️  pause {}", self.label);
        Ok(())
    }
}

fn init_tracing(config: &Config) {
    let fallback = config.get_log_min_level().to_lowercase();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .init();
}

fn viewability_from(config: &Config) -> (Viewport, ViewabilityConfig) {
    let viewport = Viewport::new(
        config.get_viewport_width() as f64,
        config.get_viewport_height() as f64,
    );
    let viewability = ViewabilityConfig {
        min_visible_percent: config.get_min_visible_percent().min(100) as u8,
        min_view_time: Duration::from_millis(config.get_min_view_time_ms() as u64),
    };
    (viewport, viewability)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = trendconfig::get_config();
    init_tracing(&config);

    let client = TrendClient::from_config_obj(Arc::clone(&config))
        .context("Failed to build the Trendlio client")?;

    match args.command {
        Command::Login { email, password } => {
            let user = client.login(&email, &password).await?;
            info!("✅ Logged in as {} (#{})", user.username, user.id);
        }
        Command::Logout => {
            client.logout().await?;
            info!("👋 Session closed");
        }
        Command::Whoami => match client.restore_session().await? {
            Some(user) => println!("{} (#{})", user.username, user.id),
            None => bail!("Not logged in"),
        },
        Command::Feed {
            following,
            page,
            size,
        } => {
            if client.restore_session().await?.is_none() {
                bail!("Not logged in");
            }
            let kind = if following {
                FeedKind::Following
            } else {
                FeedKind::ForYou
            };
            let feed = client.fetch_feed(kind, PageRequest::new(page, size)).await?;
            info!(
                "📰 {} post(s) loaded, {} in total",
                feed.content.len(),
                feed.total_elements
            );
            replay_scroll(&config, &feed.content).await;
        }
        Command::Notifications => {
            if client.restore_session().await?.is_none() {
                bail!("Not logged in");
            }
            let summary = client.notification_summary().await?;
            println!("{} unread", summary.unread_count);
            for notification in &summary.notifications {
                let marker = if notification.is_read { " " } else { "*" };
                println!(
                    "{} {} by @{}",
                    marker, notification.notification_type, notification.actor.username
                );
            }
        }
        Command::Env => {
            let environment = config.get_environment();
            let endpoints = config.get_endpoints();
            println!("environment: {}", environment);
            println!("api:         {}", endpoints.api_url);
            println!("socket:      {}", endpoints.socket_url);
            println!("config:      {}", config.directory());
        }
    }

    Ok(())
}

/// Lays the posts out top to bottom and scrolls through them, reporting
/// viewability to the coordinator at every step.
async fn replay_scroll(config: &Config, posts: &[Post]) {
    let (viewport, viewability) = viewability_from(config);
    let coordinator = PlaybackCoordinator::with_viewability(viewport, viewability);
    coordinator.set_screen_focus(FEED_SCREEN, true);

    // Controllers live as long as the replay, like mounted video elements
    let mut controllers = Vec::new();
    for post in posts {
        for (position, media) in post.media.iter().enumerate() {
            let media_id = if media.id != 0 {
                media.id
            } else {
                position as i64
            };
            if media.is_video() {
                let controller = Arc::new(LoggingController {
                    label: format!("post {} video {}", post.id, media_id),
                });
                coordinator.register(post.id, media_id, MediaHandle::video(&controller));
                controllers.push(controller);
            } else {
                coordinator.register(post.id, media_id, MediaHandle::image());
            }
        }
    }

    let item_height = viewport.width + POST_CHROME_HEIGHT;
    let step = item_height / SCROLL_STEPS_PER_POST as f64;
    let total = item_height * posts.len() as f64;
    let min_visible = f64::from(viewability.min_visible_percent) / 100.0;

    let mut offset = 0.0;
    while offset < total {
        let items: Vec<ViewToken> = posts
            .iter()
            .enumerate()
            .map(|(index, post)| {
                let rect = LayoutRect::new(
                    0.0,
                    index as f64 * item_height - offset,
                    viewport.width,
                    item_height,
                );
                let visible =
                    (rect.bottom().min(viewport.height) - rect.y.max(0.0)).max(0.0) / item_height;
                if visible >= min_visible {
                    ViewToken::new(post.id, rect)
                } else {
                    ViewToken::hidden(post.id, rect)
                }
            })
            .collect();

        coordinator.report_viewability_from(FEED_SCREEN, &items);
        coordinator.settle().await;
        match coordinator.active_key() {
            Some(key) => info!("scroll {:>6.0}px: playing {}", offset, key),
            None => info!("scroll {:>6.0}px: nothing playing", offset),
        }
        offset += step;
    }

    coordinator.set_screen_focus(FEED_SCREEN, false);
    coordinator.settle().await;
    if coordinator.active_key().is_some() {
        warn!("Playback still active after blur");
    }
}
