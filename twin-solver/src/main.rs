use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use twin_solver::api::ApiClient;
use twin_solver::config::{ServiceConfig, SolverConfig};
use twin_solver::oracle::Oracle;
use twin_solver::{Label, Map, SolveReport, Solver};

#[derive(Parser, Debug)]
#[command(name = "twin-solver")]
#[command(about = "Reconstructs a doubled library from one marked exploration walk", long_about = None)]
struct Cli {
    /// Team ID (defaults to TEAM_ID environment variable if not provided)
    #[arg(short, long, global = true)]
    team_id: Option<String>,

    /// Base URL for the API (defaults to API_BASE_URL, then the contest endpoint)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Seed for plan marks and door completion
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Completion retries after a door conflict
    #[arg(long, global = true, default_value = "8")]
    completion_attempts: usize,

    /// Fail instead of guessing when no assignment replays the trace
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Solve a recorded walk: JSON with `plan`, `results` and `mapData`
    Solve {
        /// Input JSON path ("-" for stdin)
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Select this problem before guessing
        #[arg(short, long)]
        problem: Option<String>,
    },
    /// Select a problem, walk it with random marks and solve the walk
    Run {
        /// Problem name
        #[arg(short, long)]
        problem: String,

        /// Position map JSON the walk is replayed against
        #[arg(short, long)]
        map: String,

        /// Door route, marks are added between doors
        #[arg(short, long)]
        doors: String,
    },
}

#[derive(Debug, Deserialize)]
struct RecordedWalk {
    plan: String,
    results: Vec<Label>,
    #[serde(rename = "mapData")]
    map_data: Map,
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        Ok(input)
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read input file: {}", path))
    }
}

fn print_report(report: &SolveReport) -> Result<()> {
    println!("\n=== Search ===");
    println!("Outcome: {:?}", report.outcome);
    println!("Stats: {:?}", report.stats);
    println!("Completion attempts: {}", report.completion_attempts);

    println!("\n=== Submission Map ===");
    println!("{}", serde_json::to_string_pretty(&report.map)?);

    if report.correct {
        println!("✅ Solution is CORRECT!");
    } else {
        println!("❌ Solution is INCORRECT");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let service = ServiceConfig::resolve(cli.base_url.clone(), cli.team_id.clone())
        .ok_or_else(|| anyhow!("TEAM_ID not provided via --team-id or TEAM_ID environment variable"))?;
    println!("=== Twin Solver ===");
    println!("Base URL: {}", service.base_url);

    let api = ApiClient::new(service);
    let config = SolverConfig {
        seed: cli.seed,
        completion_attempts: cli.completion_attempts,
        submit_on_exhausted: !cli.strict,
    };
    let solver = Solver::new(&api, config);

    let report = match cli.command {
        Commands::Solve { input, problem } => {
            let recorded: RecordedWalk =
                serde_json::from_str(&read_input(&input)?).context("failed to parse input JSON")?;
            if let Some(problem) = problem {
                println!("Selecting problem: {}", problem);
                api.select(&problem).await?;
            }
            solver
                .solve(&recorded.plan, &recorded.results, &recorded.map_data)
                .await
                .context("solve failed")?
        }
        Commands::Run { problem, map, doors } => {
            let map: Map = serde_json::from_str(&read_input(&map)?).context("failed to parse map JSON")?;
            println!("Problem: {}", problem);
            solver
                .run(&problem, &doors, &map)
                .await
                .with_context(|| format!("run on '{}' failed", problem))?
        }
    };

    print_report(&report)
}
