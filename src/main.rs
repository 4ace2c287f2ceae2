use clap::{Parser, Subcommand};
use dockerctl::cli;
use dockerctl::cli::run::{parse_key_value, RunOptions};
use dockerctl::logging;

#[derive(Parser)]
#[command(name = "dockerctl")]
#[command(about = "Throwaway Docker containers for integration tests", long_about = None)]
#[command(version)]
struct Cli {
    /// Docker daemon URL, e.g. unix:///var/run/docker.sock or tcp://127.0.0.1:2375
    #[arg(long, global = true)]
    url: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the Docker daemon is reachable
    Ping,
    /// Start containers, wait until ready, optionally run a command, then remove them
    Run {
        /// Image to start
        image: String,
        /// Number of containers
        #[arg(short, long, default_value_t = 1)]
        num: usize,
        /// Network mode passed to the runtime (e.g. host, bridge)
        #[arg(long)]
        network: Option<String>,
        /// Environment variable for the containers (KEY=VALUE, repeatable)
        #[arg(short, long, value_parser = parse_key_value)]
        env: Vec<(String, String)>,
        /// Label for the containers (KEY=VALUE, repeatable)
        #[arg(short, long, value_parser = parse_key_value)]
        label: Vec<(String, String)>,
        /// Port to publish (repeatable)
        #[arg(short, long)]
        publish: Vec<String>,
        /// Command to run inside each container
        #[arg(long)]
        cmd: Option<String>,
        /// Seconds to wait for each readiness check
        #[arg(short, long)]
        timeout: Option<u64>,
        /// Command to run on the host while the containers are up
        #[arg(last = true)]
        test_cmd: Vec<String>,
    },
    /// Print the value at a dotted attribute path of a container
    Inspect {
        /// Container id or name
        id: String,
        /// Dotted path, e.g. State.Health.Status
        path: String,
        /// Only report whether the path exists
        #[arg(long)]
        exists: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    let url = cli.url.as_deref();

    match cli.command {
        Commands::Ping => cli::ping::run(url)?,
        Commands::Run {
            image,
            num,
            network,
            env,
            label,
            publish,
            cmd,
            timeout,
            test_cmd,
        } => {
            let options = RunOptions {
                image,
                num,
                network,
                env,
                labels: label,
                publish,
                cmd,
                timeout_secs: timeout,
                test_cmd,
            };
            let code = cli::run::run(url, &options)?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Inspect { id, path, exists } => cli::inspect::run(url, &id, &path, exists)?,
    }

    Ok(())
}
