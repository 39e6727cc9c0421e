use autopatch_pipeline::orchestrator::{check_line, probe_once, Pipeline};
use autopatch_pipeline::PipelineConfig;
use autopatch_probe::AttackOutcome;
use autopatch_rules::Verdict;
use clap::{Arg, Command};
use tracing_subscriber::EnvFilter;

fn load_config(args: &clap::ArgMatches) -> anyhow::Result<PipelineConfig> {
    match args.get_one::<String>("config") {
        Some(path) => Ok(PipelineConfig::load(path)?),
        None => Ok(PipelineConfig::default()),
    }
}

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .global(true)
        .help("Path to a TOML config file (defaults apply when omitted)")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Command::new("autopatch")
        .version(autopatch_types::VERSION)
        .about("Self-healing swarm: probe, diagnose, and patch an authorization flaw")
        .arg_required_else_help(true)
        .arg(config_arg())
        .subcommand(Command::new("run").about("Run the full swarm until interrupted"))
        .subcommand(
            Command::new("probe").about("Run a single probe cycle and report the outcome"),
        )
        .subcommand(
            Command::new("check")
                .about("Extract and evaluate one audit line against the rulebook")
                .arg(
                    Arg::new("line")
                        .required(true)
                        .help("Raw audit-log line to analyze"),
                ),
        );

    let matches = cli.get_matches();
    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("run", _)) => Pipeline::new(config).run().await,
        Some(("probe", _)) => {
            match probe_once(&config).await? {
                AttackOutcome::Confirmed { audit_line, .. } => {
                    println!("BREACH CONFIRMED");
                    println!("expected audit line: {audit_line}");
                }
                AttackOutcome::AlreadyFixed => {
                    println!("target rejected the attack (403): already fixed");
                }
                AttackOutcome::Anomalous { status, body } => {
                    println!("anomalous response (status {status}):");
                    println!("{body}");
                }
            }
            Ok(())
        }
        Some(("check", args)) => {
            let line = args
                .get_one::<String>("line")
                .map(String::as_str)
                .unwrap_or_default();
            match check_line(&config, line).await? {
                Verdict::Breach { rule_name, record } => {
                    println!("BREACH: rule '{rule_name}' fired");
                    println!(
                        "record: level={} user={} role={} action={}",
                        record.log_level, record.user_name, record.user_role, record.action
                    );
                    std::process::exit(1)
                }
                Verdict::Clear => {
                    println!("clear: no rules broken");
                    Ok(())
                }
            }
        }
        _ => unreachable!("arg_required_else_help guarantees a subcommand"),
    }
}
