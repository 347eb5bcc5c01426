use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc::unbounded_channel;
use tracing::{error, info};

mod classifier;
mod clock;
mod config;
mod display;
mod errors;
mod generator;
mod history;
mod identity;
mod logging;
mod models;
mod report;
mod simulation;

use classifier::{ClassifierAdapter, LogisticPipeline};
use config::{DelayRange, SimulationConfig, DEFAULT_MAX_DELAY_SECS, DEFAULT_MIN_DELAY_SECS};
use display::{DisplayDriver, HistoryFormat, Screen};
use generator::RandomBookingGenerator;
use logging::LogFormat;
use simulation::Simulation;

const DEFAULT_MODEL_PATH: &str = "models/logistic_regression_pipeline.json";

#[derive(Parser)]
#[command(name = "booking-cancellation-live")]
#[command(about = "Live demo scoring synthetic hotel bookings for cancellation risk", long_about = None)]
struct Cli {
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SampleFormat {
    Csv,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live dashboard
    Run {
        #[arg(long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,
        /// Show the table of recent predictions
        #[arg(long)]
        show_history: bool,
        #[arg(long, value_enum, default_value_t = HistoryFormat::Table)]
        history_format: HistoryFormat,
        #[arg(long, default_value_t = DEFAULT_MIN_DELAY_SECS)]
        min_delay_secs: u64,
        #[arg(long, default_value_t = DEFAULT_MAX_DELAY_SECS)]
        max_delay_secs: u64,
        /// Stop after this many bookings
        #[arg(long)]
        cycles: Option<u64>,
        #[arg(long)]
        seed: Option<u64>,
        /// Attach a fake guest identity to every booking
        #[arg(long)]
        identities: bool,
        #[arg(long)]
        banner: Option<PathBuf>,
        /// Append frames instead of clearing the terminal
        #[arg(long)]
        no_clear: bool,
    },
    /// Score a batch of bookings and print the results
    Sample {
        #[arg(long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,
        #[arg(long, default_value_t = 20)]
        count: usize,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, value_enum, default_value_t = SampleFormat::Markdown)]
        format: SampleFormat,
    },
    /// Describe the features a classifier artifact expects
    Inspect {
        #[arg(long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format)?;

    match cli.command {
        Commands::Run {
            model,
            show_history,
            history_format,
            min_delay_secs,
            max_delay_secs,
            cycles,
            seed,
            identities,
            banner,
            no_clear,
        } => {
            let pipeline = LogisticPipeline::load(&model)
                .context("cannot start without a classifier artifact")?;
            let config = SimulationConfig {
                delay: DelayRange {
                    min_secs: min_delay_secs,
                    max_secs: max_delay_secs,
                },
                max_cycles: cycles,
                identities,
                seed,
            }
            .validate()?;

            let (tx, rx) = unbounded_channel();
            let driver = DisplayDriver::new(tx, show_history, history_format);
            let renderer = tokio::spawn(display::run_renderer(
                rx,
                Screen::new(std::io::stdout(), !no_clear),
            ));
            driver.render_banner(banner.as_deref());
            let ticker = clock::spawn_clock(driver.clone(), clock::CLOCK_PERIOD);

            let generator = RandomBookingGenerator::new(seed)?;
            let mut simulation = Simulation::new(
                generator,
                ClassifierAdapter::new(pipeline),
                driver,
                &config,
            )?;
            info!(
                show_history,
                min_delay_secs,
                max_delay_secs,
                ?cycles,
                "simulation started"
            );
            let outcome = simulation.run().await;

            if let Err(err) = clock::stop_clock(ticker).await {
                error!(error = %err, "clock ticker failed");
            }
            let retained = simulation.history().len();
            drop(simulation);
            renderer.await.context("renderer task failed")?;

            let completed = outcome.context("simulation halted")?;
            info!(completed, history = retained, "simulation finished");
        }
        Commands::Sample {
            model,
            count,
            seed,
            format,
        } => {
            let adapter = ClassifierAdapter::new(
                LogisticPipeline::load(&model).context("failed to load classifier artifact")?,
            );
            let mut generator = RandomBookingGenerator::new(seed)?;
            let entries = simulation::score_batch(&mut generator, &adapter, count)?;

            match format {
                SampleFormat::Csv => report::write_csv(std::io::stdout().lock(), &entries)?,
                SampleFormat::Markdown => print!("{}", report::build_report(seed, &entries)),
            }
        }
        Commands::Inspect { model } => {
            let pipeline =
                LogisticPipeline::load(&model).context("failed to load classifier artifact")?;
            println!("Classifier artifact {}", model.display());
            println!("Intercept {:.4}", pipeline.intercept);
            for feature in &pipeline.numeric {
                println!(
                    "- {} (numeric, mean {:.3}, scale {:.3}, coef {:.4})",
                    feature.name, feature.mean, feature.scale, feature.coef
                );
            }
            for feature in &pipeline.categorical {
                let values: Vec<&str> = feature.categories.iter().map(|c| c.value.as_str()).collect();
                println!(
                    "- {} (categorical, unknown values: {:?}): {}",
                    feature.name,
                    feature.handle_unknown,
                    values.join(", ")
                );
            }
            println!("{} features in total.", pipeline.feature_names().count());
        }
    }

    Ok(())
}
