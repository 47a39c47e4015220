//! `badgify` command line driver.
//!
//! Opens a badge database, registers the built-in recipes and runs sync
//! passes or badge queries. Meant to be invoked by a scheduler; callers must
//! not run two sync commands against the same database concurrently.

use std::error::Error;

use badgify_core::db::open_db;
use badgify_core::{
    BadgeLookup, BadgeSelection, BadgeService, NewUser, RawSettings, Settings,
    SqliteAwardRepository, SqliteBadgeRepository, SqliteUserRepository, SyncService,
    UserListQuery, UserRepository,
};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

mod recipes;

/// Badge registry maintenance tool.
#[derive(Parser, Debug)]
#[command(name = "badgify")]
#[command(about = "Synchronize badge recipes with the user base")]
#[command(version)]
struct Args {
    /// SQLite database file (created when missing)
    #[arg(long, value_name = "PATH")]
    db: String,

    /// trace|debug|info|warn|error
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when omitted
    #[arg(long, value_name = "DIR")]
    log_dir: Option<String>,

    /// Awards inserted per transaction
    #[arg(long, value_name = "N")]
    batch_size: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one or all sync passes
    Sync {
        #[arg(value_enum, default_value_t = Pass::All)]
        pass: Pass,
        /// Restrict to these badge slugs
        #[arg(long = "badge", value_name = "SLUG")]
        badges: Vec<String>,
    },
    /// Delete awards and zero cached counts
    Reset {
        #[arg(long = "badge", value_name = "SLUG")]
        badges: Vec<String>,
    },
    /// Print badges as JSON lines, optionally only those awarded to a user
    Badges {
        #[arg(long, value_name = "USERNAME")]
        user: Option<String>,
    },
    /// Print registered recipe slugs
    Recipes,
    /// Create a user
    AddUser {
        username: String,
        email: String,
        #[arg(long)]
        staff: bool,
        #[arg(long)]
        inactive: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Pass {
    Badges,
    Awards,
    Counts,
    All,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let settings = Settings::from_raw(&RawSettings {
        db_path: args.db.clone(),
        log_level: args.log_level.clone(),
        log_dir: args.log_dir.clone(),
        award_batch_size: args.batch_size,
    })?;
    settings.init_logging()?;
    info!(
        "event=cli_start module=cli status=ok version={}",
        badgify_core::core_version()
    );

    let mut registry = settings.registry();
    registry.register(recipes::builtin())?;
    let conn = open_db(&settings.db_path)?;

    match args.command {
        Command::Sync { pass, badges } => {
            let selection = selection(&badges);
            let service = SyncService::sqlite(&registry, &conn);
            run_sync(&service, pass, selection)?;
        }
        Command::Reset { badges } => {
            let service = SyncService::sqlite(&registry, &conn);
            let report = service.reset_awards(selection(&badges))?;
            println!(
                "reset: deleted={} counts_updated={}",
                report.deleted_awards,
                report.counts.updated.len()
            );
        }
        Command::Badges { user } => {
            let service = BadgeService::new(
                SqliteBadgeRepository::new(&conn),
                SqliteAwardRepository::new(&conn),
                SqliteUserRepository::new(&conn),
            );
            let lookup = match user {
                Some(username) => BadgeLookup::for_username(username),
                None => BadgeLookup::all(),
            };
            for badge in service.badges_for(&lookup)? {
                println!("{}", serde_json::to_string(&badge)?);
            }
        }
        Command::Recipes => {
            for slug in registry.slugs() {
                println!("{slug}");
            }
        }
        Command::AddUser {
            username,
            email,
            staff,
            inactive,
        } => {
            let mut new_user = NewUser::new(username, email);
            new_user.is_staff = staff;
            new_user.is_active = !inactive;
            let user = SqliteUserRepository::new(&conn).create_user(&new_user)?;
            println!("{}", serde_json::to_string(&user)?);
        }
    }

    Ok(())
}

fn selection(badges: &[String]) -> BadgeSelection<'_> {
    if badges.is_empty() {
        BadgeSelection::All
    } else {
        BadgeSelection::from(badges)
    }
}

fn run_sync(
    service: &SyncService<
        '_,
        SqliteBadgeRepository<'_>,
        SqliteAwardRepository<'_>,
        SqliteUserRepository<'_>,
    >,
    pass: Pass,
    selection: BadgeSelection<'_>,
) -> Result<(), Box<dyn Error>> {
    match pass {
        Pass::Badges => {
            let report = service.sync_badges();
            println!(
                "badges: created={} failed={}",
                report.created.len(),
                report.failed.len()
            );
            for failure in &report.failed {
                eprintln!("badge {} failed: {}", failure.slug, failure.error);
            }
        }
        Pass::Awards => {
            let report = service.sync_awards(selection, &UserListQuery::default())?;
            println!(
                "awards: awarded={} badges_updated={} badges_unchanged={}",
                report.awarded_count(),
                report.updated.len(),
                report.unchanged.len()
            );
        }
        Pass::Counts => {
            let report = service.sync_counts(selection)?;
            println!(
                "counts: updated={} unchanged={}",
                report.updated.len(),
                report.unchanged.len()
            );
        }
        Pass::All => {
            let report = service.sync_all(selection)?;
            println!(
                "all: created={} failed={} awarded={} counts_updated={}",
                report.badges.created.len(),
                report.badges.failed.len(),
                report.awards.awarded_count(),
                report.counts.updated.len()
            );
            for failure in &report.badges.failed {
                eprintln!("badge {} failed: {}", failure.slug, failure.error);
            }
        }
    }
    Ok(())
}
