//! ReSo CLI
//!
//! Command-line client for the ReSo social network:
//! - Log in and out, manage the profile
//! - Read the feed, like posts, comment
//! - Search users and follow them

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use reso::{
    ApiClient, CommentThread, Config, Credentials, Directory, FeedView, FileStore, LoggingConfig,
    Post, ProfileChanges, RegisterForm, SessionStore, User, UserPageView,
};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "reso")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Command-line client for the ReSo social network")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.config/reso/config.toml or ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, overrides the config file
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in; the password is read from stdin
    Login {
        email: String,
    },

    /// Log out and forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Change name, email or avatar
    ProfileUpdate {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
    },

    /// Delete the account of the logged-in user
    DeleteAccount {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Create an account; the password is read from stdin twice
    Register {
        name: String,
        email: String,
    },

    /// Show the feed (personalized when logged in)
    Feed,

    /// Like or unlike a post
    Like {
        post_id: u64,
    },

    /// List the comments of a post
    Comments {
        post_id: u64,
    },

    /// Comment on a post
    Comment {
        post_id: u64,
        text: String,
    },

    /// Delete one of your comments
    Uncomment {
        post_id: u64,
        comment_id: i64,
    },

    /// Like or unlike a comment
    CommentLike {
        post_id: u64,
        comment_id: i64,
    },

    /// Publish a post
    Post {
        content: String,
        /// Image URL attached to the post
        #[arg(long)]
        image: Option<String>,
    },

    /// List your own posts
    MyPosts,

    /// Search users by name or email
    Search {
        query: String,
    },

    /// Show a user's profile and posts
    User {
        user_id: u64,
    },

    /// Follow or unfollow a user
    Follow {
        user_id: u64,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }

    init_logging(&config.logging);

    if let Commands::Config { output } = &cli.command {
        return write_default_config(output.as_ref());
    }

    let api = Arc::new(ApiClient::new(&config.api)?);
    let storage = Arc::new(FileStore::new(config.session.file()));
    let session = Arc::new(SessionStore::hydrate(api.clone(), storage));
    let format = cli.format;

    match cli.command {
        Commands::Login { email } => {
            let password = prompt("Password: ")?;
            let user = session
                .login(&Credentials::new(email, password))
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("Logged in as {} <{}>", user.name, user.email);
        }

        Commands::Logout => {
            if !session.is_authenticated().await {
                println!("Not logged in.");
                return Ok(());
            }
            session
                .logout()
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("Logged out.");
        }

        Commands::Whoami => {
            if !session.is_authenticated().await {
                println!("Not logged in.");
                return Ok(());
            }
            let user = session
                .refresh_profile()
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            print_users(format, &[user])?;
        }

        Commands::ProfileUpdate {
            name,
            email,
            image_url,
        } => {
            let changes = ProfileChanges {
                name,
                email,
                image_url,
            };
            let user = session
                .update_profile(&changes)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            print_users(format, &[user])?;
        }

        Commands::DeleteAccount { yes } => {
            if !yes {
                bail!("Refusing to delete the account without --yes");
            }
            session
                .delete_account()
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("Account deleted.");
        }

        Commands::Register { name, email } => {
            let password = prompt("Password: ")?;
            let password_confirmation = prompt("Confirm password: ")?;
            let form = RegisterForm {
                name,
                email,
                password,
                password_confirmation,
            };
            session
                .register(&form)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("Account created. Log in with `reso login {}`.", form.email);
        }

        Commands::Feed => {
            let feed = FeedView::new(api, session);
            feed.load().await.map_err(|e| anyhow!(e.user_message()))?;
            print_posts(format, &feed.posts().snapshot().await)?;
        }

        Commands::Like { post_id } => {
            let feed = FeedView::new(api, session.clone());
            feed.load().await.map_err(|e| anyhow!(e.user_message()))?;
            if feed.posts().get(post_id).await.is_none() && session.is_authenticated().await {
                feed.load_mine()
                    .await
                    .map_err(|e| anyhow!(e.user_message()))?;
            }
            let state = feed
                .toggle_like(post_id)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            let verb = if state.active { "Liked" } else { "Unliked" };
            println!("{} post {} ({} likes)", verb, post_id, state.count);
        }

        Commands::Comments { post_id } => {
            let thread = CommentThread::new(api, session, post_id);
            thread.load().await.map_err(|e| anyhow!(e.user_message()))?;
            print_comments(format, &thread.comments().snapshot().await)?;
        }

        Commands::Comment { post_id, text } => {
            let thread = CommentThread::new(api, session, post_id);
            let comment = thread
                .add(&text)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("Comment {} added to post {}", comment.id, post_id);
        }

        Commands::Uncomment {
            post_id,
            comment_id,
        } => {
            let thread = CommentThread::new(api, session, post_id);
            thread.load().await.map_err(|e| anyhow!(e.user_message()))?;
            thread
                .delete(comment_id)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("Comment {} deleted", comment_id);
        }

        Commands::CommentLike {
            post_id,
            comment_id,
        } => {
            let thread = CommentThread::new(api, session, post_id);
            thread.load().await.map_err(|e| anyhow!(e.user_message()))?;
            let state = thread
                .toggle_like(comment_id)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            let verb = if state.active { "Liked" } else { "Unliked" };
            println!("{} comment {} ({} likes)", verb, comment_id, state.count);
        }

        Commands::Post { content, image } => {
            let feed = FeedView::new(api, session);
            let post = feed
                .create_post(&content, image)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            print_posts(format, &[post])?;
        }

        Commands::MyPosts => {
            let feed = FeedView::new(api, session);
            feed.load_mine()
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            print_posts(format, &feed.posts().snapshot().await)?;
        }

        Commands::Search { query } => {
            let directory = Directory::new(api, session);
            let users = directory
                .search(&query)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            print_users(format, &users)?;
        }

        Commands::User { user_id } => {
            let directory = Directory::new(api, session);
            match directory
                .load_user(user_id)
                .await
                .map_err(|e| anyhow!(e.user_message()))?
            {
                UserPageView::Own(me) => {
                    eprintln!("That is you; showing your own profile.");
                    print_users(format, &[me])?;
                }
                page @ UserPageView::Other { .. } => {
                    let profile = page
                        .profile()
                        .await
                        .context("user page without a profile")?;
                    let posts = match &page {
                        UserPageView::Other { posts, .. } => posts.snapshot().await,
                        UserPageView::Own(_) => Vec::new(),
                    };
                    match format {
                        OutputFormat::Json => print_json(&serde_json::json!({
                            "user": profile,
                            "posts": posts,
                        }))?,
                        OutputFormat::Table => {
                            println!("{} <{}>", profile.name, profile.email);
                            println!(
                                "Followers: {}  Following: {}{}",
                                profile.followers_count,
                                profile.following_count,
                                if profile.is_following { "  (you follow)" } else { "" }
                            );
                            println!();
                            print_posts(format, &posts)?;
                        }
                    }
                }
            }
        }

        Commands::Follow { user_id } => {
            let directory = Directory::new(api, session);
            let page = directory
                .load_user(user_id)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            let state = directory
                .toggle_follow(&page)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            let verb = if state.active { "Following" } else { "Unfollowed" };
            println!("{} user {} ({} followers)", verb, user_id, state.count);
        }

        Commands::Config { .. } => unreachable!("config is written before the session is built"),
    }

    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("reso={}", logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn write_default_config(output: Option<&PathBuf>) -> anyhow::Result<()> {
    let config = reso::config::generate_default_config();

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &config)
                .with_context(|| format!("Failed to write config to {:?}", path))?;
            println!("Config written to {:?}", path);
        }
        None => {
            print!("{}", config);
        }
    }
    Ok(())
}

/// Read one line from stdin after showing `label` on stderr
fn prompt(label: &str) -> anyhow::Result<String> {
    eprint!("{}", label);
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_posts(format: OutputFormat, posts: &[Post]) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(posts);
    }

    if posts.is_empty() {
        println!("No posts yet.");
        return Ok(());
    }

    println!("{:<8} {:<16} {:<17} {:<7} {}", "ID", "Author", "Date", "Likes", "Content");
    println!("{}", "-".repeat(80));
    for post in posts {
        let author = post.user.as_ref().map(|u| u.name.as_str()).unwrap_or("-");
        let likes = format!("{}{}", post.likes_count, if post.liked { "*" } else { "" });
        println!(
            "{:<8} {:<16} {:<17} {:<7} {}",
            post.id,
            truncate(author, 16),
            post.created_at.format("%Y-%m-%d %H:%M"),
            likes,
            truncate(&post.content, 40)
        );
    }
    Ok(())
}

fn print_comments(format: OutputFormat, comments: &[reso::Comment]) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(comments);
    }

    if comments.is_empty() {
        println!("No comments yet.");
        return Ok(());
    }

    println!("{:<8} {:<16} {:<7} {}", "ID", "Author", "Likes", "Comment");
    println!("{}", "-".repeat(72));
    for comment in comments {
        let author = comment
            .user
            .as_ref()
            .map(|u| u.name.clone())
            .unwrap_or_else(|| format!("user {}", comment.user_id));
        let likes = format!("{}{}", comment.likes_count, if comment.liked { "*" } else { "" });
        println!(
            "{:<8} {:<16} {:<7} {}",
            comment.id,
            truncate(&author, 16),
            likes,
            truncate(&comment.comment, 40)
        );
    }
    Ok(())
}

fn print_users(format: OutputFormat, users: &[User]) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(users);
    }

    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    println!("{:<8} {:<24} {}", "ID", "Name", "Email");
    println!("{}", "-".repeat(60));
    for user in users {
        println!("{:<8} {:<24} {}", user.id, truncate(&user.name, 24), user.email);
    }
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max {
        single_line
    } else {
        let cut: String = single_line.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_config_subcommand_parses() {
        let cli = Cli::try_parse_from(["reso", "config", "-o", "/tmp/reso.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config { output: Some(ref path) } if path == &PathBuf::from("/tmp/reso.toml")
        ));

        let cli = Cli::try_parse_from(["reso", "--format", "json", "uncomment", "3", "12"]).unwrap();
        assert!(cli.format == OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Commands::Uncomment { post_id: 3, comment_id: 12 }
        ));
    }
}
