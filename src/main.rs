// surety - command line driver for the flight-insurance ledger
//
// `simulate` plays a full round: airlines, flights, passengers, a pool of
// oracles answering a status request. `inspect` prints a saved ledger.

use chrono::Utc;
use clap::{Parser, Subcommand};
use rand::seq::SliceRandom;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use surety::insurance::MockPayoutTarget;
use surety::service::SuretyService;
use surety::storage::SuretyStore;
use surety::{Address, FlightStatus, FlightSurety, LedgerEvent, SuretyConfig, SuretyError, UNIT};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "surety", version, about = "Flight-insurance ledger with oracle consensus")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a full insurance round against an in-memory ledger
    Simulate {
        /// Number of oracles to register
        #[arg(long, default_value_t = 20)]
        oracles: usize,
        /// Number of insured passengers
        #[arg(long, default_value_t = 5)]
        passengers: usize,
        /// Status code every oracle reports (random when omitted)
        #[arg(long)]
        status: Option<u8>,
        /// Save the resulting ledger and event log here
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Print a saved ledger
    Inspect {
        #[arg(long)]
        db: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Simulate {
            oracles,
            passengers,
            status,
            db,
        } => simulate(oracles, passengers, status, db).await,
        Command::Inspect { db } => inspect(db),
    }
}

async fn simulate(
    oracle_count: usize,
    passenger_count: usize,
    forced: Option<u8>,
    db: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let status = match forced {
        Some(code) => FlightStatus::from_code(code).ok_or("unknown status code")?,
        None => *FlightStatus::ALL
            .choose(&mut rand::thread_rng())
            .unwrap_or(&FlightStatus::Unknown),
    };

    let config = SuretyConfig::default();
    let owner = Address::from_label("surety:owner");
    let first = Address::from_label("airline:ozarka");
    let ledger = FlightSurety::new(config.clone(), owner, first, "Ozarka Airlines")?;
    let service = SuretyService::new(ledger, Arc::new(MockPayoutTarget::new()));
    let mut events = service.subscribe();

    // Airlines: the first one admits three more and everyone funds
    service.execute(|l| l.fund_airline(&first, config.airline_min_funding))?;
    for name in ["Dasani Airlines", "Fiji Airlines", "Voss Airlines"] {
        let airline = Address::from_label(name);
        service.execute(|l| l.register_airline(airline, name, &first))?;
        service.execute(|l| l.fund_airline(&airline, config.airline_min_funding))?;
    }

    let now = Utc::now().timestamp().max(0) as u64;
    let mut flights = Vec::new();
    for (code, offset) in [("OA9231", 0), ("OA1464", 100), ("OA8672", 500)] {
        flights.push(service.execute(|l| l.register_flight(&first, code, now + offset))?);
    }
    let flight = flights[0].clone();

    let passengers: Vec<Address> = (0..passenger_count).map(|_| Address::generate()).collect();
    for passenger in &passengers {
        service.execute(|l| l.buy(*passenger, &flight, UNIT))?;
    }

    let mut oracles = Vec::new();
    for _ in 0..oracle_count {
        let reporter = Address::generate();
        let indexes =
            service.execute(|l| l.register_oracle(reporter, config.oracle_registration_fee))?;
        oracles.push((reporter, indexes));
    }

    let index = service.execute(|l| l.request_status(Address::generate(), &flight))?;
    info!(index, %flight, %status, "oracles answering");

    let mut finalized = None;
    for (reporter, indexes) in oracles.iter().filter(|(_, idx)| idx.contains(&index)) {
        match service.execute(|l| l.submit_status(reporter, index, &flight, status)) {
            Ok(Some(final_status)) => finalized = Some(final_status),
            Ok(None) => {}
            Err(SuretyError::Oracle(e)) => {
                warn!(%reporter, ?indexes, error = %e, "report rejected");
            }
            Err(e) => return Err(e.into()),
        }
    }

    match finalized {
        Some(final_status) => println!("Flight {} finalized as {}", flight, final_status),
        None => println!("Flight {} reached no agreement; re-request to retry", flight),
    }

    for passenger in &passengers {
        match service.withdraw(*passenger).await {
            Ok(receipt) => println!(
                "Passenger {} paid {} ({})",
                passenger,
                receipt.amount(),
                receipt.reference()
            ),
            Err(SuretyError::Insurance(e)) => println!("Passenger {}: {}", passenger, e),
            Err(e) => return Err(e.into()),
        }
    }

    let mut log: Vec<LedgerEvent> = Vec::new();
    while let Ok(event) = events.try_recv() {
        log.push(event);
    }
    println!("{} events emitted", log.len());

    if let Some(path) = db {
        let store = SuretyStore::open(&path)?;
        store.save_ledger(&service.snapshot())?;
        store.append_events(&log)?;
        store.flush()?;
        println!("Ledger saved to {}", path.display());
    }

    Ok(())
}

fn inspect(db: PathBuf) -> Result<(), Box<dyn Error>> {
    let store = SuretyStore::open(&db)?;
    let ledger = store.load_ledger()?.ok_or("no ledger saved at this path")?;

    let stats = ledger.statistics();
    println!("Ledger version {} (operational: {})", ledger.version(), ledger.is_operational());
    println!("{:#?}", stats);

    for address in ledger.registered_airlines() {
        if let Some(airline) = ledger.airline(&address) {
            println!("  {} {:<20} {:?}", address, airline.name(), airline.state());
        }
    }
    for flight in ledger.state().flights() {
        println!("  {} {}", flight.key(), flight.status());
    }
    println!("{} events in log", store.event_count()?);

    Ok(())
}
