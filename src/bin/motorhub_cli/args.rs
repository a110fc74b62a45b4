//! Command-line surface for `motorhub-cli`.

#![deny(clippy::all, clippy::pedantic)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use motorhub::config::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(name = "motorhub-cli", version, about = "Motorhub marketplace and community CLI", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigOverrides,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and persist the session token
    Login(LoginArgs),
    /// Revoke the token and clear the local session
    Logout,
    /// Show the signed-in user
    Me,
    /// Marketplace listings
    Listings(ListingsArgs),
    /// Community posts
    Posts(PostsArgs),
    /// Comments on a post
    Comments(CommentsArgs),
    /// Event calendar
    Events(EventsArgs),
    /// User directory
    Users(UsersArgs),
}

#[derive(Parser, Debug)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    /// File containing the password (takes precedence over env)
    #[arg(long)]
    pub password_file: Option<PathBuf>,

    /// Password from env (no CLI flag so it stays out of shell history)
    #[arg(hide = true, env = "MOTORHUB_PASSWORD")]
    pub password_env: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ListingsArgs {
    #[command(subcommand)]
    pub action: ListingsCmd,
}

#[derive(Subcommand, Debug)]
pub enum ListingsCmd {
    /// Page through listings, optionally filtered by search text
    List {
        #[arg(long)]
        search: Option<String>,
        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show one listing
    Get { id: i64 },
    /// Mark a listing sold to a buyer
    Sell {
        id: i64,
        #[arg(long)]
        buyer: i64,
    },
    Delete { id: i64 },
}

#[derive(Parser, Debug)]
pub struct PostsArgs {
    #[command(subcommand)]
    pub action: PostsCmd,
}

#[derive(Subcommand, Debug)]
pub enum PostsCmd {
    /// Page through the feed, or only your own posts with --mine
    List {
        #[arg(long)]
        mine: bool,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Toggle your upvote on a post
    Upvote { id: i64 },
    Delete { id: i64 },
}

#[derive(Parser, Debug)]
pub struct CommentsArgs {
    #[command(subcommand)]
    pub action: CommentsCmd,
}

#[derive(Subcommand, Debug)]
pub enum CommentsCmd {
    List {
        post: i64,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    Add {
        post: i64,
        #[arg(long)]
        content: Option<String>,
        /// Read the comment body from a file
        #[arg(long)]
        content_file: Option<PathBuf>,
    },
    /// Toggle your upvote on a comment
    Upvote { post: i64, comment: i64 },
}

#[derive(Parser, Debug)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub action: EventsCmd,
}

#[derive(Subcommand, Debug)]
pub enum EventsCmd {
    /// Events in a calendar month (defaults to the current month)
    Month {
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=12), requires = "year")]
        month: Option<u8>,
        #[arg(long, requires = "month")]
        year: Option<i32>,
    },
    /// Toggle your attendance at an event
    Attend { id: i64 },
}

#[derive(Parser, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub action: UsersCmd,
}

#[derive(Subcommand, Debug)]
pub enum UsersCmd {
    /// Search users, e.g. to pick a buyer
    Search {
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
}
