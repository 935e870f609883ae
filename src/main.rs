use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lawander::planner::{ItineraryPlanner, PlanOutcome, TripRequest, TripSession};
use lawander::{LaWanderConfig, LaWanderError, logging, prompts, web};

#[derive(Parser)]
#[command(name = "lawander", version, about = "AI travel itineraries with geocoded places")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Overrides `server.port`
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Generate an itinerary and print it
    Plan {
        destination: String,
        #[arg(short, long, default_value_t = 3)]
        days: u32,
        /// Follow-up questions asked after the itinerary
        #[arg(short, long)]
        question: Vec<String>,
        /// Print replies and markers as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = LaWanderConfig::load_from_path(cli.config)?;
    logging::init(&config.logging)?;

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let planner = ItineraryPlanner::from_config(&config)?;
            web::run(planner, &config.server).await
        }
        Command::Plan {
            destination,
            days,
            question,
            json,
        } => {
            let planner = ItineraryPlanner::from_config(&config)?;
            plan(&planner, TripRequest::new(destination, days)?, &question, json).await
        }
    }
}

async fn plan(
    planner: &ItineraryPlanner,
    request: TripRequest,
    questions: &[String],
    json: bool,
) -> Result<()> {
    let run_key = request.run_key();
    let mut session = TripSession::new(request);

    match planner.plan_itinerary(&mut session, &run_key).await {
        Ok(PlanOutcome::Generated(reply)) if json => {
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Ok(PlanOutcome::Generated(reply)) => {
            println!("{}", reply.html);
            println!(
                "\nLocated {} of {} places",
                reply.found_places.len(),
                reply.mentioned_places.len()
            );
        }
        Ok(PlanOutcome::AlreadyGenerated) => {}
        Err(LaWanderError::DestinationNotFound { .. }) => {
            let request = session.request();
            println!("{}", prompts::welcome_message(&request.destination, request.days));
        }
        Err(LaWanderError::Completion { message }) => {
            tracing::warn!("Itinerary generation failed: {}", message);
            println!("{}", prompts::FALLBACK_ITINERARY_MESSAGE);
        }
        Err(e) => return Err(e).context("Itinerary generation failed"),
    }

    for question in questions {
        match planner.answer_question(&mut session, question).await {
            Ok(reply) if json => println!("{}", serde_json::to_string_pretty(&reply)?),
            Ok(reply) => println!("\n> {question}\n{}", reply.html),
            Err(e) => {
                tracing::error!("Question failed: {}", e);
                println!("\n> {question}\n{}", prompts::CONNECTION_TROUBLE_MESSAGE);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&session.all_markers())?);
    }
    Ok(())
}
