use crate::airport::AirportId;
use crate::config::Config;
use crate::error::{ScheduleError, ScheduleResult};
use crate::regulation::RegulationStore;
use crate::repository::memory::InMemoryRepository;
use crate::repository::{RouteFilter, ScheduleRepository};
use crate::schedule::form::{ScheduleForm, ValidationResponse};
use crate::schedule::validator::ValidationResult;
use crate::schedule::{Scheduler, Submission};
use crate::time::Timestamp;
use clap::Parser;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::{Context, Editor, Helper, Highlighter, Hinter, Validator};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tabled::Tabled;
use tabled::settings::Style;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod aircraft;
mod airport;
mod config;
mod error;
mod flight;
mod regulation;
mod repository;
mod schedule;
mod time;

#[derive(Parser)]
struct Args {
    /// Path to the JSON scenario file
    #[arg(short, long, value_name = "FILE", default_value = "data/default.json")]
    scenario: PathBuf,

    /// Path to the TOML configuration file
    #[arg(short, long, value_name = "FILE", default_value = "flight-scheduler.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error), overrides the configuration file
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Helper, Hinter, Highlighter, Validator)]
pub struct CompleteHelper {
    pub commands: Vec<String>,
}

impl Completer for CompleteHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let candidates = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: format!("{} ", cmd),
            })
            .collect();

        Ok((0, candidates))
    }
}

fn paginate(content: &str) {
    let pager = Command::new("less")
        .arg("-R")
        .stdin(Stdio::piped())
        .spawn()
        // Fallback to 'more' if 'less' isn't available
        .or_else(|_| Command::new("more").stdin(Stdio::piped()).spawn());

    let Ok(mut pager) = pager else {
        println!("{}", content);
        return;
    };

    if let Some(mut stdin) = pager.stdin.take() {
        if let Err(e) = stdin.write_all(content.as_bytes()) {
            // Broken pipe is common if the user quits the pager early
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                eprintln!("Error writing to pager: {}", e);
            }
        }
    }

    // Wait for the user to close the pager before returning to the ">> " prompt
    let _ = pager.wait();
}

fn print_table<T: Tabled>(rows: &[T]) {
    if rows.is_empty() {
        println!("Nothing to show.");
        return;
    }
    let mut table = tabled::Table::new(rows);
    table.with(Style::rounded());
    table.with(tabled::settings::Alignment::left());
    if rows.len() > 20 {
        paginate(&table.to_string());
    } else {
        println!("{}", table);
    }
}

fn print_validation(result: &ValidationResult) -> ScheduleResult<()> {
    if result.valid {
        println!("{}", "Proposal is valid.".green());
    } else {
        println!("{}", "Proposal is invalid:".red());
        for (field, message) in result.messages() {
            println!("  {:<28} {}", field.yellow(), message);
        }
    }
    let response = ValidationResponse::from(result);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// `@path.json` reads a JSON form, anything else is the inline shorthand.
fn read_form(args: &[&str]) -> ScheduleResult<ScheduleForm> {
    match args.first() {
        Some(arg) if arg.starts_with('@') => {
            let data = std::fs::read_to_string(&arg[1..])?;
            ScheduleForm::from_json(&data)
        }
        _ => ScheduleForm::from_args(args),
    }
}

fn airport_arg(arg: Option<&&str>) -> Option<AirportId> {
    arg.filter(|a| **a != "-").map(|a| Arc::from(*a))
}

fn number_arg(arg: Option<&&str>, name: &str) -> ScheduleResult<Option<u32>> {
    arg.map(|a| a.parse::<u32>().map_err(|e| ScheduleError::malformed(name, e)))
        .transpose()
}

fn run_command(scheduler: &Scheduler<InMemoryRepository>, parts: &[&str]) -> ScheduleResult<bool> {
    let repository = scheduler.repository();
    match parts[0] {
        "routes" => {
            let filter = RouteFilter {
                depart_airport: airport_arg(parts.get(1)),
                arrive_airport: airport_arg(parts.get(2)),
            };
            let page_no = number_arg(parts.get(3), "page")?.unwrap_or(1) as usize;
            let page = repository.load_routes(&filter, page_no);
            print_table(&page.items);
            println!(
                "Page {}/{} ({} routes)",
                page.page,
                page.pages,
                repository.count_routes(&filter)
            );
        }
        "route" => match (parts.get(1), parts.get(2), parts.get(3)) {
            (Some(&"add"), Some(depart), Some(arrive)) => {
                let route = repository.add_route(&Arc::from(*depart), &Arc::from(*arrive))?;
                println!("Added route {}: {} -> {}", route.id, depart, arrive);
            }
            _ => println!("Usage: route add <depart_airport> <arrive_airport>"),
        },
        "flights" => {
            let Some(route_id) = number_arg(parts.get(1), "route")? else {
                println!("Usage: flights <route_id> [page]");
                return Ok(true);
            };
            let route = repository.route(route_id)?;
            let page_no = number_arg(parts.get(2), "page")?.unwrap_or(1) as usize;
            let page = repository.load_flights(route.id, page_no);
            println!(
                "Route {}: {} -> {}",
                route.id, route.depart_airport_id, route.arrive_airport_id
            );
            print_table(&page.items);
            println!(
                "Page {}/{} ({} flights)",
                page.page,
                page.pages,
                repository.count_flights(route.id)
            );
        }
        "legs" => match number_arg(parts.get(1), "flight")? {
            Some(flight_id) => print_table(&repository.intermediate_airports(flight_id)),
            None => println!("Usage: legs <flight_id>"),
        },
        "aircraft" => print_table(&repository.aircraft_list()),
        "airports" => {
            // with a route, only the airports usable as its stopovers
            let exclude = match number_arg(parts.get(1), "route")? {
                Some(route_id) => {
                    let route = repository.route(route_id)?;
                    vec![route.depart_airport_id, route.arrive_airport_id]
                }
                None => vec![],
            };
            print_table(&repository.airports(&exclude));
        }
        "regs" => print_table(&repository.regulations()),
        "validate" => {
            let proposal = read_form(&parts[1..])?.into_proposal()?;
            let result = scheduler.validate(&proposal, Timestamp::now())?;
            print_validation(&result)?;
        }
        "schedule" => {
            let proposal = read_form(&parts[1..])?.into_proposal()?;
            match scheduler.submit(&proposal, Timestamp::now()) {
                Ok(Submission::Scheduled(flight)) => {
                    println!("{}", "Schedule success".green());
                    print_table(std::slice::from_ref(&flight));
                    let legs = repository.intermediate_airports(flight.id);
                    if !legs.is_empty() {
                        print_table(&legs);
                    }
                }
                Ok(Submission::Rejected(result)) => {
                    println!("{}", "Schedule fail".red());
                    print_validation(&result)?;
                }
                Err(e) if e.is_retryable() => {
                    println!("{} {}", "Schedule fail:".red(), e);
                    println!("Retry with a different departure time or aircraft.");
                }
                Err(e) => return Err(e),
            }
        }
        "help" | "?" => {
            println!("\nAvailable Commands:");
            println!("  routes [dep|-] [arr|-] [page]  - List routes, optionally filtered by airports");
            println!("  route add <dep> <arr>          - Define a new route");
            println!("  flights <route> [page]         - List flights scheduled on a route");
            println!("  legs <flight>                  - Show the stopovers of a flight");
            println!("  aircraft                       - List aircraft");
            println!("  airports [route]               - List airports (stopover candidates for a route)");
            println!("  regs                           - Show regulation bounds");
            println!("  validate <proposal>            - Check a proposal without scheduling it");
            println!("  schedule <proposal>            - Validate and schedule a flight");
            println!("  help / ?                       - Show this help menu");
            println!("  exit / quit                    - Exit\n");
            println!("  <proposal> is @file.json or:");
            println!("    <route> <aircraft> <YYYY-MM-DDTHH:MM> <minutes> [<airport>/<YYYY-MM-DDTHH:MM>/<minutes> ...]\n");
        }
        "exit" | "quit" => return Ok(false),
        _ => println!("Unknown command: {}", parts[0]),
    }
    Ok(true)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::load(&args.config)?;

    let level = args.log_level.as_deref().unwrap_or(&config.log.level);
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let repository =
        InMemoryRepository::load_from_file(&args.scenario, config.repository.page_size)?;
    println!(
        "Scheduler online. Loaded {} flights ({} stopovers) from {}, {} rows per page",
        repository.flight_count(),
        repository.leg_count(),
        args.scenario.display(),
        repository.page_size()
    );
    let scheduler = Scheduler::new(repository);

    let rl_config = rustyline::Config::builder()
        .history_ignore_space(true)
        .completion_type(rustyline::CompletionType::List)
        .build();

    let helper = CompleteHelper {
        commands: [
            "routes", "route", "flights", "legs", "aircraft", "airports", "regs", "validate",
            "schedule", "help", "exit",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect(),
    };

    let mut rl = Editor::with_config(rl_config)?;
    rl.set_helper(Some(helper));

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                rl.add_history_entry(trimmed)?;

                let parts: Vec<&str> = trimmed.split_whitespace().collect();
                match run_command(&scheduler, &parts) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("{} {}", "Error:".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}
