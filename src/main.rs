//! dmctl CLI - control Drone Mission Control onboard software

use std::io::Write;

use clap::Parser;
use dmctl::cli::{Args, ConfigCommand, SubCommand};
use dmctl::output::{bad, format_status, good, warn, OutputFormat};
use dmctl::runtime::DOCKER_HELP;
use dmctl::store::{self, KEY_IMAGE};
use dmctl::{
    workload, CredentialStore, DmcError, DockerRuntime, LifecycleController, StartOptions,
    StartOutcome, StopOutcome,
};

fn main() {
    let args = Args::parse();

    if let Err(e) = dmctl::logging::init_tracing(args.verbose) {
        eprintln!("Warning: {:#}", e);
    }

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(DmcError::IoError)
        .and_then(|rt| rt.block_on(run(args)));

    if let Err(e) = result {
        if matches!(e, DmcError::RuntimeUnreachable(_)) {
            eprintln!("{}\n", DOCKER_HELP);
        }
        bad(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(args: Args) -> dmctl::Result<()> {
    let config_path = match args.config {
        Some(path) => path,
        None => store::default_config_path()?,
    };
    let store = CredentialStore::load(config_path)?.with_env_overrides();
    let output_format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match args.command {
        SubCommand::Config { command } => run_config(command, store),

        SubCommand::Pull { workload } => {
            let controller = connect(store).await?;
            println!("Pulling {}..", workload);
            let verbose = args.verbose;
            controller
                .pull(&workload, |progress| {
                    if verbose {
                        println!("{}", progress);
                    }
                })
                .await?;
            good("Done!");
            Ok(())
        }

        SubCommand::Start {
            workload,
            recreate,
            no_restart,
            location,
        } => {
            let mut controller = connect(store).await?;
            let options = StartOptions {
                recreate,
                no_restart,
                location,
            };
            match controller.start(&workload, &options).await? {
                StartOutcome::AlreadyRunning { .. } => {
                    println!("Container {} is already running", workload);
                }
                StartOutcome::Started { replaced, .. } => {
                    if !replaced.is_empty() {
                        println!("Recreated {}", workload);
                    }
                    good("Done!");
                }
            }
            Ok(())
        }

        SubCommand::Stop { workload } => {
            let controller = connect(store).await?;
            match controller.stop(&workload).await? {
                StopOutcome::NotRunning => bad(&format!("{} not running", workload)),
                StopOutcome::Removed { .. } => good("Done!"),
            }
            Ok(())
        }

        SubCommand::Ps => {
            let controller = connect(store).await?;
            let statuses = controller.status().await?;
            if statuses.is_empty() && output_format == OutputFormat::Human {
                bad("No containers running!");
            } else {
                println!("{}", format_status(&statuses, &output_format));
            }
            Ok(())
        }

        SubCommand::Logs { workload, follow } => {
            let controller = connect(store).await?;
            let mut stdout = std::io::stdout();
            let outcome = match controller
                .logs(&workload, follow, |line| {
                    stdout.write_all(line.as_bytes())?;
                    stdout.flush()
                })
                .await
            {
                // Reader went away, e.g. `dmctl logs -f | head`
                Err(DmcError::IoError(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    return Ok(())
                }
                result => result?,
            };
            if outcome == dmctl::lifecycle::LogsOutcome::NotFound {
                bad(&format!("Container {} not found", workload));
            }
            Ok(())
        }
    }
}

/// Reach the engine before any command logic runs
async fn connect(store: CredentialStore) -> dmctl::Result<LifecycleController<DockerRuntime>> {
    let runtime = DockerRuntime::connect().await?;
    Ok(LifecycleController::new(runtime, store))
}

fn run_config(command: ConfigCommand, mut store: CredentialStore) -> dmctl::Result<()> {
    match command {
        ConfigCommand::List => {
            if !store.path().exists() {
                bad("No config file created");
                return Ok(());
            }
            let listed = store.redacted();
            let yaml = serde_yaml::to_string(&listed)
                .map_err(|e| DmcError::ConfigPersistError(e.to_string()))?;
            print!("{}", yaml);
            Ok(())
        }

        ConfigCommand::Clear => {
            if store.clear()? {
                good("Config cleared!");
            } else {
                bad("No config file created");
            }
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let key = key.to_uppercase();
            if !store::KNOWN_KEYS.contains(&key.as_str()) {
                warn(&format!("{} is not a key dmctl uses", key));
            }
            store.set(&key, value);
            store.persist()?;
            good("Config saved!");
            Ok(())
        }

        ConfigCommand::Obc { kind } => {
            let variant = workload::image_variant(&kind)
                .ok_or_else(|| DmcError::UnknownObcType(kind.clone()))?;
            store.set(KEY_IMAGE, variant);
            store.persist()?;
            good(&format!("OBC set to {}", variant));
            Ok(())
        }
    }
}
