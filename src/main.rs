use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use route_engine::config::ProfileConfig;
use route_engine::nav::{NavData, NavigationData};
use route_engine::route::Route;

#[derive(Parser)]
#[command(name = "route-engine")]
#[command(about = "Flight plan route parser and amendment engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand a route string into legs and waypoints
    Parse {
        #[arg(short, long, default_value = "data/airports")]
        nav: PathBuf,

        route: String,
    },

    /// Apply an amendment to a route and print the result
    Amend {
        #[arg(short, long, default_value = "data/airports")]
        nav: PathBuf,

        route: String,

        amendment: String,
    },

    /// Expand every route in a profile on its active runways
    Profile {
        #[arg(short, long)]
        profile: PathBuf,
    },
}

fn load_nav(path: &Path) -> Result<Arc<dyn NavData>> {
    let nav = if path.is_dir() {
        NavigationData::load_dir(path)?
    } else {
        NavigationData::load(path)?
    };
    Ok(Arc::new(nav))
}

fn print_route(route: &Route) {
    println!("{}", route);
    for leg in route.legs() {
        let names: Vec<String> = leg.waypoints().iter().map(|wp| wp.to_string()).collect();
        println!("  {:<24} {}", leg.route_string(), names.join(", "));
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { nav, route } => {
            let nav = load_nav(&nav)?;
            let route = Route::new(&route, nav)
                .with_context(|| format!("Failed to parse route: {}", route))?;
            print_route(&route);
        }

        Commands::Amend { nav, route, amendment } => {
            let nav = load_nav(&nav)?;
            let mut route = Route::new(&route, nav)
                .with_context(|| format!("Failed to parse route: {}", route))?;

            match route.amend(&amendment) {
                Ok(readback) => {
                    info!("[ROUTE] {}", readback.log);
                    println!("{}", readback.say);
                }
                Err(e) => println!("unable, {}", e),
            }
            print_route(&route);
        }

        Commands::Profile { profile } => {
            let profile = ProfileConfig::load(&profile)?;
            let nav_data = if profile.nav_data.is_dir() {
                NavigationData::load_dir(&profile.nav_data)?
            } else {
                NavigationData::load(&profile.nav_data)?
            };

            let departure = profile
                .departure_runway
                .as_ref()
                .and_then(|active| nav_data.runway(&active.icao, &active.runway).cloned());
            let arrival = profile
                .arrival_runway
                .as_ref()
                .and_then(|active| nav_data.runway(&active.icao, &active.runway).cloned());

            let nav: Arc<dyn NavData> = Arc::new(nav_data);
            for route_string in &profile.routes {
                let mut route = match Route::new(route_string, Arc::clone(&nav)) {
                    Ok(route) => route,
                    Err(e) => {
                        warn!("[PROFILE] Skipping {}: {}", route_string, e);
                        continue;
                    }
                };

                if let Some(runway) = &departure {
                    if route.update_sid_leg_for_departure_runway(runway) {
                        info!("[PROFILE] {} now departs {}", route_string, runway.procedure_key());
                    }
                }
                if let Some(runway) = &arrival {
                    if route.update_star_leg_for_arrival_runway(runway) {
                        info!("[PROFILE] {} now arrives {}", route_string, runway.procedure_key());
                    }
                }

                print_route(&route);
            }
        }
    }

    Ok(())
}
