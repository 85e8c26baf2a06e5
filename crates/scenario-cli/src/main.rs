//! `scenario-configurator` binary

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use scenario_model::LoadOrder;
use scenario_store::WriteOutcome;
use tracing_subscriber::EnvFilter;

fn catalog_arg() -> Arg {
    Arg::new("catalog")
        .long("catalog")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Schema catalog (JSON or YAML)")
}

fn scenario_arg() -> Arg {
    Arg::new("scenario")
        .long("scenario")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Scenario document (JSON)")
}

fn section_arg() -> Arg {
    Arg::new("section")
        .long("section")
        .required(true)
        .help("Section name, e.g. DEBUG_OPTIONS")
}

fn cli() -> Command {
    Command::new("scenario-configurator")
        .version(scenario_store::VERSION)
        .about("Resolve and apply schema-driven scenario forms")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Engine configuration (TOML)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("resolve")
                .about("Print schema, ui schema and form data for one form")
                .arg(catalog_arg())
                .arg(scenario_arg())
                .arg(section_arg())
                .arg(
                    Arg::new("target")
                        .long("target")
                        .default_value("-1")
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(i64))
                        .help("VM id, or -1 for the hypervisor"),
                ),
        )
        .subcommand(
            Command::new("apply")
                .about("Apply a renderer snapshot to a scenario")
                .arg(catalog_arg())
                .arg(scenario_arg())
                .arg(
                    Arg::new("snapshot")
                        .long("snapshot")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Snapshot {VMID, mode, load_order?, <section>: value}"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the scenario here instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("check-bdf")
                .about("Check virtual BDF text")
                .arg(Arg::new("bdf").required(true).num_args(1..).help("BDF text, BB:DD.F")),
        )
        .subcommand(
            Command::new("ui-schema")
                .about("Print the ui schema for a section")
                .arg(catalog_arg())
                .arg(section_arg())
                .arg(
                    Arg::new("load-order")
                        .long("load-order")
                        .help("VM family (PRE_LAUNCHED_VM, SERVICE_VM, POST_LAUNCHED_VM); hypervisor if omitted"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

fn path<'a>(args: &'a ArgMatches, id: &str) -> Result<&'a Path> {
    args.get_one::<PathBuf>(id)
        .map(PathBuf::as_path)
        .with_context(|| format!("missing --{id}"))
}

fn run(matches: &ArgMatches) -> Result<ExitCode> {
    let config = scenario_cli::load_config(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    match matches.subcommand() {
        Some(("resolve", args)) => {
            let store = scenario_cli::open_store(path(args, "catalog")?, path(args, "scenario")?, config)?;
            let target = args.get_one::<i64>("target").copied().unwrap_or(-1);
            let section = args.get_one::<String>("section").context("missing --section")?;
            print_json(&scenario_cli::resolve_form(&store, target, section)?)?;
        }
        Some(("apply", args)) => {
            let mut store =
                scenario_cli::open_store(path(args, "catalog")?, path(args, "scenario")?, config)?;
            let snapshot_path = path(args, "snapshot")?;
            let snapshot = std::fs::read_to_string(snapshot_path)
                .with_context(|| format!("reading snapshot {}", snapshot_path.display()))?;
            let snapshot = serde_json::from_str(&snapshot).context("parsing snapshot")?;

            let outcome = scenario_cli::apply_snapshot(&mut store, snapshot)?;
            match args.get_one::<PathBuf>("output") {
                Some(output) => scenario_cli::save_scenario(store.origin_scenario_data(), output)?,
                None => print_json(&store.origin_scenario_data().to_value()?)?,
            }
            if outcome == WriteOutcome::VmMissing {
                return Ok(ExitCode::from(2));
            }
        }
        Some(("check-bdf", args)) => {
            let mut failed = false;
            for text in args.get_many::<String>("bdf").into_iter().flatten() {
                match scenario_cli::check_bdf(text) {
                    Ok(bdf) => println!("{text}: ok ({bdf})"),
                    Err(e) => {
                        println!("{text}: {e}");
                        failed = true;
                    }
                }
            }
            if failed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Some(("ui-schema", args)) => {
            let catalog = scenario_cli::load_catalog(path(args, "catalog")?)?;
            let section = args.get_one::<String>("section").context("missing --section")?;
            let load_order = args
                .get_one::<String>("load-order")
                .map(|text| text.parse::<LoadOrder>())
                .transpose()?;
            print_json(&scenario_cli::ui_schema(&catalog, load_order, section, &config)?)?;
        }
        _ => {}
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match run(&matches) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
