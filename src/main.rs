use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use slate::config::Config;
use slate::db::{Database, Department, Shot, ShotFilters, ShotStatus};
use slate::logging;
use slate::reconcile;

enum Command {
    Acts,
    Shots {
        act: Option<String>,
    },
    Status {
        shot: String,
        department: Department,
        status: ShotStatus,
        by: String,
        assignee: Option<String>,
    },
    Stats {
        json: bool,
    },
    Reconcile {
        dir: Option<PathBuf>,
        dry_run: bool,
        json: bool,
    },
}

struct Args {
    config_path: Option<PathBuf>,
    command: Command,
}

fn parse_args() -> Result<Args> {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;
    let mut command = None;
    let mut positional = Vec::new();
    let mut act = None;
    let mut by = None;
    let mut assignee = None;
    let mut dry_run = false;
    let mut json = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("slate {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                i += 1;
                let path = args.get(i).context("--config requires a path argument")?;
                config_path = Some(PathBuf::from(path));
            }
            "--dry-run" => dry_run = true,
            "--json" => json = true,
            "--act" => {
                i += 1;
                act = Some(args.get(i).context("--act requires an act code")?.clone());
            }
            "--by" => {
                i += 1;
                by = Some(args.get(i).context("--by requires a user name")?.clone());
            }
            "--assignee" => {
                i += 1;
                assignee = Some(args.get(i).context("--assignee requires a name")?.clone());
            }
            "acts" | "shots" | "status" | "stats" | "reconcile" if command.is_none() => {
                command = Some(args[i].clone());
            }
            other if command.is_some() && !other.starts_with('-') => {
                positional.push(other.to_string());
            }
            other => bail!("unknown argument: {other}"),
        }
        i += 1;
    }

    let command = match command.as_deref() {
        Some("acts") => Command::Acts,
        Some("shots") => Command::Shots { act },
        Some("status") => {
            if positional.len() != 3 {
                bail!("usage: slate status COMBINED_CODE DEPARTMENT STATUS --by NAME");
            }
            let department = Department::from_str(&positional[1])
                .with_context(|| format!("unknown department '{}'", positional[1]))?;
            let status = ShotStatus::from_str(&positional[2])
                .with_context(|| format!("unknown status '{}'", positional[2]))?;
            Command::Status {
                shot: positional[0].clone(),
                department,
                status,
                by: by.context("status requires --by NAME")?,
                assignee,
            }
        }
        Some("stats") => Command::Stats { json },
        Some("reconcile") => Command::Reconcile {
            dir: positional.first().map(PathBuf::from),
            dry_run,
            json,
        },
        _ => {
            print_help();
            std::process::exit(1);
        }
    };

    Ok(Args {
        config_path,
        command,
    })
}

fn print_help() {
    println!(
        r#"slate - production shot tracking and thumbnail reconciliation

USAGE:
    slate [OPTIONS] <COMMAND>

COMMANDS:
    acts                     List acts in display order
    shots [--act CODE]       List shots, optionally limited to one act
    status SHOT DEPT STATE --by NAME [--assignee NAME]
                             Set the status of one (shot, department) pair,
                             e.g. slate status act01_shot02 comp approved --by alice
    stats [--json]           Per-act completion statistics
    reconcile [DIR]          Derive acts/shots from thumbnail files in DIR
                             (falls back to reconcile.thumbnail_dir)
        --dry-run            List matching files without writing
        --json               Print the change summary as JSON

OPTIONS:
    --config, -c PATH   Path to config file
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    SLATE_LOG           Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/slate/config.toml"#
    );
}

fn find_shot_by_combined_code(db: &Database, combined: &str) -> Result<Shot> {
    let (act_code, shot_code) = combined
        .split_once('_')
        .with_context(|| format!("expected actNN_shotNN, got '{combined}'"))?;
    let act = db
        .find_act_by_code(act_code)?
        .with_context(|| format!("no act with code '{act_code}'"))?;
    db.find_shot_by_code(act.id, shot_code)?
        .with_context(|| format!("no shot '{combined}'"))
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let _ = logging::init(Some(Config::config_dir().join("logs")));

    let config = match args.config_path {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let db = Database::open(&config.db_path)?;

    match args.command {
        Command::Acts => {
            for act in db.list_acts()? {
                println!("{:<8} {:<4} {}", act.code, act.sort_order, act.name);
            }
        }
        Command::Shots { act } => {
            let mut filters = ShotFilters::default();
            if let Some(ref code) = act {
                let act = db
                    .find_act_by_code(code)?
                    .with_context(|| format!("no act with code '{code}'"))?;
                filters.act_id = Some(act.id);
            }
            for shot in db.list_shots(&filters)? {
                println!(
                    "{:<16} {:>5}-{:<5} {:<8} {}",
                    shot.combined_code,
                    shot.frame_start,
                    shot.frame_end,
                    shot.priority.as_str(),
                    shot.thumbnail.as_deref().unwrap_or("-"),
                );
            }
        }
        Command::Status {
            shot,
            department,
            status,
            by,
            assignee,
        } => {
            let shot = find_shot_by_combined_code(&db, &shot)?;
            let row = db.update_status(shot.id, department, status, &by, assignee.as_deref())?;
            println!(
                "{} {} -> {} (assignee: {})",
                shot.combined_code,
                row.department.as_str(),
                row.status.as_str(),
                row.assignee.as_deref().unwrap_or("-"),
            );
        }
        Command::Stats { json } => {
            let stats = db.act_stats()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                for act in stats {
                    println!("{} {} {}%", act.code, act.name, act.overall_pct);
                    for dept in act.departments {
                        println!(
                            "  {:<10} {}/{} ({}%)",
                            dept.department.as_str(),
                            dept.completed,
                            dept.total,
                            dept.pct
                        );
                    }
                }
            }
        }
        Command::Reconcile { dir, dry_run, json } => {
            let dir = dir
                .or_else(|| config.reconcile.thumbnail_dir.clone())
                .context("no directory given and reconcile.thumbnail_dir is not configured")?;
            if dry_run {
                for file in reconcile::preview(&dir, &config.reconcile)? {
                    println!("{}_{} <- {}", file.act_code, file.shot_code, file.filename);
                }
            } else {
                let summary = reconcile::apply(&db, &dir, &config.reconcile)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                } else {
                    println!(
                        "acts created: {}, shots created: {}, thumbnails updated: {}",
                        summary.acts_created, summary.shots_created, summary.thumbnails_updated
                    );
                }
            }
        }
    }

    Ok(())
}
