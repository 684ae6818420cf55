mod server;
mod sprinkler;
mod utils;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::FmtSubscriber;

use sprinkler::config::ConfigStore;
use sprinkler::effector::DefaultEffector;
use sprinkler::gpio;
use sprinkler::Controller;

#[cfg(unix)]
const DATA_DIR: &str = "/var/opt/sprinklerd";

#[cfg(not(unix))]
const DATA_DIR: &str = "./data";

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Data directory (options.yml, stations.yml, programs.yml, logs/)
    #[clap(short = 'd', long = "data-dir", default_value = DATA_DIR, parse(from_os_str))]
    data_dir: std::path::PathBuf,

    /// Bind address for the legacy API
    #[clap(long = "bind", default_value = "0.0.0.0")]
    bind: String,

    /// Override the configured HTTP port
    #[clap(short = 'p', long = "port")]
    port: Option<u16>,

    /// Increase log verbosity (-v, -vv)
    #[clap(short = 'v', long = "verbose", parse(from_occurrences))]
    verbose: usize,
}

fn setup_tracing(verbose: usize) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn gpio_backend() -> Box<dyn gpio::Backend> {
    #[cfg(feature = "demo")]
    {
        Box::new(gpio::MemoryBackend::new())
    }

    #[cfg(not(feature = "demo"))]
    {
        match gpio::RpiBackend::new() {
            Ok(backend) => Box::new(backend),
            Err(error) => {
                tracing::error!("GPIO chip unavailable ({}), using in-memory backend", error);
                Box::new(gpio::MemoryBackend::new())
            }
        }
    }
}

fn main() {
    let args = Args::parse();
    setup_tracing(args.verbose);

    #[cfg(feature = "demo")]
    tracing::info!("DEMO MODE");

    tracing::info!("data directory: {}", args.data_dir.display());

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    let controller = Controller::new(ConfigStore::new(&args.data_dir), gpio_backend(), Box::new(DefaultEffector::new()));
    let port = args.port.unwrap_or(controller.options.http_port);
    let controller = Arc::new(Mutex::new(controller));

    // the legacy API gets its own thread; this one stays the control loop
    let server_controller = Arc::clone(&controller);
    let bind = args.bind.clone();
    thread::spawn(move || {
        if let Err(error) = server::run(server_controller, bind, port) {
            tracing::error!("HTTP server exited: {}", error);
        }
    });

    // ~10 Hz polling; substantive work is gated on the second boundary
    while running.load(Ordering::SeqCst) {
        {
            let mut controller = match controller.lock() {
                Ok(guard) => guard,
                Err(_) => {
                    tracing::error!("controller lock poisoned, exiting");
                    break;
                }
            };
            controller.tick(chrono::Utc::now());
        }
        thread::sleep(Duration::from_millis(100));
    }

    tracing::info!("shutting down, zeroing outputs");
    if let Ok(mut controller) = controller.lock() {
        controller.shutdown();
    };
}
