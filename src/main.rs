//! WSI Client - Browse and inspect slides on a remote slide server.
//!
//! This binary is a thin caller of the library: it parses the command line,
//! opens a session and prints what the server reports.

use clap::Parser;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wsi_client::{
    config::{Cli, Command, ConnectionArgs, InfoArgs, LsArgs},
    Client, Depth,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.connection.verbose);

    if let Err(e) = cli.connection.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let client = Client::with_config(
        wsi_client::HttpTransport::new(),
        cli.connection.client_config(),
    );

    match cli.command {
        Command::Check => run_check(&client, &cli.connection).await,
        Command::Ls(args) => run_ls(&client, &cli.connection, args).await,
        Command::Info(args) => run_info(&client, &cli.connection, args).await,
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "wsi_client=debug"
    } else {
        "wsi_client=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Open a session, printing the failure if there is one.
async fn open_session(client: &Client, args: &ConnectionArgs) -> Option<String> {
    match client
        .connect(args.url.as_deref(), &args.username, &args.password)
        .await
    {
        Ok(token) => Some(token),
        Err(e) => {
            eprintln!("Error: unable to connect: {}", e);
            None
        }
    }
}

// =============================================================================
// Check Command
// =============================================================================

/// Outcome of the connection check: any ✗ line fails the run.
#[derive(Debug, Default)]
struct CheckReport {
    failures: usize,
}

impl CheckReport {
    fn fail(&mut self, line: String) {
        self.failures += 1;
        println!("✗ {}", line);
    }

    fn summary(&self) -> &'static str {
        if self.failures == 0 {
            "✓ All checks passed!"
        } else {
            "✗ Some checks failed"
        }
    }

    fn exit_code(&self) -> ExitCode {
        if self.failures == 0 {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

async fn run_check(client: &Client, args: &ConnectionArgs) -> ExitCode {
    let url = args
        .url
        .clone()
        .unwrap_or_else(|| client.config().local_url.clone());

    let mut report = CheckReport::default();

    println!("WSI Client Connection Check");
    println!("═══════════════════════════");
    println!();
    println!("  Server: {}", url);

    match client.is_lite(Some(url.as_str())).await {
        Some(true) => println!("✓ Local instance detected"),
        Some(false) => println!("✓ Server answers"),
        None => {
            println!("✗ Nothing answers at {}", url);
            return ExitCode::FAILURE;
        }
    }

    match client.version_info(Some(url.as_str())).await {
        Ok(version) => println!("✓ Version: {}", version),
        Err(e) => report.fail(format!("Version: {}", e)),
    }
    if let Ok(api) = client.api_version_string(Some(url.as_str())).await {
        println!("✓ API version: {}", api);
    }

    print!("Opening session... ");
    let token = match client
        .connect(args.url.as_deref(), &args.username, &args.password)
        .await
    {
        Ok(token) => {
            println!("✓ success");
            token
        }
        Err(e) => {
            println!("✗ failed");
            println!();
            println!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!();
    println!("Root directories:");
    println!("─────────────────");
    match client.root_directories(Some(&token)).await {
        Ok(dirs) if dirs.is_empty() => println!("  (none)"),
        Ok(dirs) => {
            for dir in &dirs {
                println!("  {}", dir);
            }
        }
        Err(e) => report.fail(format!("Unable to list root directories: {}", e)),
    }

    println!();
    match client.first_non_empty_directory(None, Some(&token)).await {
        Ok(Some(dir)) => println!("✓ First directory with slides: {}", dir),
        Ok(None) => report.fail("No directory with slides found".to_string()),
        Err(e) => report.fail(format!("Unable to search for slides: {}", e)),
    }

    client.disconnect(Some(&token)).await;

    println!();
    println!("═══════════════════════════");
    println!("{}", report.summary());

    report.exit_code()
}

// =============================================================================
// Ls Command
// =============================================================================

async fn run_ls(client: &Client, connection: &ConnectionArgs, args: LsArgs) -> ExitCode {
    let Some(token) = open_session(client, connection).await else {
        return ExitCode::FAILURE;
    };

    let depth = match (args.recursive, args.depth) {
        (true, _) => Depth::Unlimited,
        (false, Some(levels)) => Depth::Levels(levels),
        (false, None) => Depth::None,
    };

    let listing = match (args.path.as_deref(), args.slides) {
        (None, false) => client.root_directories(Some(&token)).await,
        (None, true) => {
            eprintln!("Error: listing slides requires a directory");
            client.disconnect(Some(&token)).await;
            return ExitCode::FAILURE;
        }
        (Some(path), false) => client.directories(path, depth, Some(&token)).await,
        (Some(path), true) => client.slides(path, depth, Some(&token)).await,
    };

    let code = match listing {
        Ok(entries) => {
            for entry in &entries {
                println!("{}", entry);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    };

    client.disconnect(Some(&token)).await;
    code
}

// =============================================================================
// Info Command
// =============================================================================

async fn run_info(client: &Client, connection: &ConnectionArgs, args: InfoArgs) -> ExitCode {
    let Some(token) = open_session(client, connection).await else {
        return ExitCode::FAILURE;
    };

    let info = match client.slide_info(&args.slide, Some(&token)).await {
        Ok(info) => info,
        Err(e) => {
            eprintln!("Error: {}", e);
            client.disconnect(Some(&token)).await;
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(info.as_ref()) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                client.disconnect(Some(&token)).await;
                return ExitCode::FAILURE;
            }
        }
        client.disconnect(Some(&token)).await;
        return ExitCode::SUCCESS;
    }

    let (width, height) = info.pixel_dimensions(None);
    let (ppm_x, ppm_y) = info.pixels_per_micrometer(None);
    let (phys_w, phys_h) = info.physical_dimensions();

    println!("Slide: {}", info.filename.as_deref().unwrap_or(args.slide.as_str()));
    if let Some(ref uid) = info.uid {
        println!("  UID: {}", uid);
    }
    println!("  Dimensions: {} x {} px", width, height);
    println!("  Resolution: {:.4} x {:.4} µm/px", ppm_x, ppm_y);
    println!("  Physical size: {:.1} x {:.1} µm", phys_w, phys_h);
    println!(
        "  Magnification: {}x (exact {}x)",
        info.magnification(None, false),
        info.magnification(None, true)
    );
    println!("  Channels: {}", info.number_of_channels());
    println!("  Z-stack layers: {}", info.number_of_z_stack_layers());
    if let Some(date) = info.last_modified_date() {
        println!("  Last modified: {}", date);
    }

    match info.tile_size() {
        Some(tile_size) => {
            println!("  Tile size: {} px", tile_size);
            println!();
            println!("  Level   Width x Height      Tiles (x * y)");
            println!("  ─────   ──────────────      ─────────────");
            for (level, tiles) in info.zoom_levels(tile_size, args.min_tiles) {
                let (w, h) = info.pixel_dimensions(Some(level));
                println!(
                    "  {:>5}   {:>6} x {:<6}      {} ({} * {})",
                    level, w, h, tiles.total, tiles.x, tiles.y
                );
            }
        }
        None => println!("  Tile size: unknown"),
    }

    client.disconnect(Some(&token)).await;
    ExitCode::SUCCESS
}
