use std::sync::Arc;

use oligopoly_runner::{
    BestResponseProvider, Experiment, ExperimentConfig, ExperimentEvent, ExperimentSummary,
};

fn print_help() {
    eprintln!(
        r#"Oligopoly Simulator - repeated Cournot/Bertrand market experiments

USAGE:
    oligopoly-sim --config <PATH> [OPTIONS]

OPTIONS:
    --config <PATH>     Load experiment configuration from JSON file
    --seed <N>          Override the parameter seed
    --opening <VALUE>   First-round decision of the built-in best-response firms (default: 1)
    --output <PATH>     Write the summary as JSON to PATH instead of stdout
    --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG            Log level filter

EXAMPLES:
    # Run a demo experiment
    oligopoly-sim --config demos/cournot_duopoly.json

    # Reproducible run with debug logs
    RUST_LOG=debug oligopoly-sim --config demos/bertrand_differentiated.json --seed 7
"#
    );
}

fn value_for(args: &[String], i: usize, flag: &str) -> String {
    match args.get(i) {
        Some(value) => value.clone(),
        None => {
            eprintln!("Error: {flag} requires an argument");
            std::process::exit(1);
        }
    }
}

fn parse_or_exit<T: std::str::FromStr>(value: &str, flag: &str) -> T {
    match value.parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            eprintln!("Error: invalid value for {flag}: {value}");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut seed: Option<u64> = None;
    let mut opening = 1.0;
    let mut output: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                config_path = Some(value_for(&args, i, "--config"));
            }
            "--seed" => {
                i += 1;
                seed = Some(parse_or_exit(&value_for(&args, i, "--seed"), "--seed"));
            }
            "--opening" => {
                i += 1;
                opening = parse_or_exit(&value_for(&args, i, "--opening"), "--opening");
            }
            "--output" | "-o" => {
                i += 1;
                output = Some(value_for(&args, i, "--output"));
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(path) = config_path else {
        eprintln!("Error: --config is required");
        print_help();
        std::process::exit(1);
    };

    log::info!("Loading configuration from: {}", path);
    let mut config = ExperimentConfig::from_file(&path)?;
    if seed.is_some() {
        config.run.seed = seed;
    }
    log::info!("Experiment: {}", config.name);
    log::info!("Firms: {}", config.market.num_firms());
    log::info!("Mode: {:?}", config.market.mode);

    let provider = Arc::new(BestResponseProvider::new(opening));
    let mut experiment = Experiment::new(config, provider)?;
    let mut events = experiment.subscribe();

    let progress = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let ExperimentEvent::ReplicationCompleted(replication) = event {
                log::info!(
                    "Replication {} done: total profit {:.4}",
                    replication.replication,
                    replication.total_profit()
                );
            }
        }
    });

    let summary = experiment.run().await?;
    progress.await?;
    report(&summary);

    let json = serde_json::to_string_pretty(&summary)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            log::info!("Summary written to {}", path);
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn report(summary: &ExperimentSummary) {
    for benchmark in &summary.benchmarks {
        match benchmark.nash_profit {
            Some(nash) => log::info!(
                "{}: mean profit {:.4} (Nash {:.4})",
                benchmark.firm,
                benchmark.mean_profit,
                nash
            ),
            None => log::info!("{}: mean profit {:.4}", benchmark.firm, benchmark.mean_profit),
        }
    }
    if let Some(reason) = &summary.equilibria.nash.reason {
        log::warn!("Nash benchmark: {}", reason);
    }
    if let Some(analysis) = &summary.equilibria.limit_pricing {
        log::info!("{}", analysis.message);
    }
}
