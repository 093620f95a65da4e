// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::rt::System;
use actix_web::{App, HttpServer, middleware::Logger, web};
use log::{LevelFilter, info, warn};
use std::io::Write;
use std::sync::Arc;

use nop_blog::api;
use nop_blog::app_state::AppServices;
use nop_blog::bootstrap;
use nop_blog::config::{ValidatedConfig, ValidatedNotifierConfig, ValidatedStorageConfig};
use nop_blog::iam::build_notifier;
use nop_blog::store::{Database, FileSnapshotStore};

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let parsed_args = match parse_args() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("❌ Invalid command line arguments: {}", error);
            eprintln!("❌ Use -C <root> to set the runtime directory.");
            return 1;
        }
    };

    if matches!(parsed_args.mode, RunMode::Help) {
        print!("{}", help_text());
        return 0;
    }

    let bootstrap = match bootstrap::bootstrap_runtime(&parsed_args.runtime_root) {
        Ok(result) => result,
        Err(error) => {
            eprintln!("❌ Bootstrap error: {}", error);
            eprintln!("❌ Application cannot start with invalid configuration.");
            return 1;
        }
    };

    match System::new().block_on(run_server(bootstrap.validated_config)) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("❌ Server failed to start: {}", error);
            1
        }
    }
}

async fn run_server(validated_config: ValidatedConfig) -> std::io::Result<()> {
    let log_level = match validated_config.logging.level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
        .map_err(|error| {
            eprintln!("❌ Failed to initialize logger: {}", error);
            std::io::Error::other(error.to_string())
        })?;

    log_startup_info(&validated_config);

    let database = match &validated_config.storage {
        ValidatedStorageConfig::Memory => Database::in_memory(),
        ValidatedStorageConfig::File(path) => {
            let opened = FileSnapshotStore::new(path.clone())
                .and_then(|snapshots| Database::open(Arc::new(snapshots)));
            match opened {
                Ok(database) => database,
                Err(error) => {
                    eprintln!("❌ Failed to open data file {}: {}", path.display(), error);
                    return Err(std::io::Error::other(error.to_string()));
                }
            }
        }
    };
    let database = Arc::new(database);
    info!("✅ Store opened");

    let notifier = build_notifier(&validated_config.notifier).map_err(|error| {
        eprintln!("❌ Failed to initialize reset notifier: {}", error);
        std::io::Error::other(error.to_string())
    })?;

    let services = match AppServices::build(&validated_config, database, notifier) {
        Ok(services) => services,
        Err(error) => {
            eprintln!("❌ Failed to initialize services: {}", error);
            eprintln!("❌ Application cannot start without user services.");
            return Err(std::io::Error::other(error.to_string()));
        }
    };
    info!("✅ User and password reset services initialized");

    let (host, port) = validated_config.bind_address();
    info!("Listening on http://{}:{}", host, port);

    HttpServer::new(move || {
        let services = services.clone();
        App::new()
            .wrap(Logger::default())
            .configure(|cfg| services.register(cfg))
            .configure(api::configure)
            .default_service(web::route().to(api::not_found))
    })
    .workers(validated_config.server.workers)
    .bind((host, port))?
    .run()
    .await
}

fn log_startup_info(config: &ValidatedConfig) {
    info!("Starting nop-blog {}", env!("CARGO_PKG_VERSION"));
    info!("Workers: {}", config.server.workers);
    match &config.storage {
        ValidatedStorageConfig::Memory => info!("Storage: memory (not persisted)"),
        ValidatedStorageConfig::File(path) => info!("Storage: {}", path.display()),
    }
    match &config.notifier {
        ValidatedNotifierConfig::Log => {
            warn!("Reset notifier: log. Reset links are not delivered; development only")
        }
        ValidatedNotifierConfig::Webhook { endpoint, .. } => {
            info!("Reset notifier: webhook {}", endpoint)
        }
    }
    info!(
        "Token lifetimes: access {}h, refresh {}h",
        config.jwt.access_ttl.as_secs() / 3600,
        config.jwt.refresh_ttl.as_secs() / 3600
    );
}

fn help_text() -> &'static str {
    "Usage: nop-blog [-C <root>]\n\n  -C <root>   runtime directory holding config.yaml (default: .)\n  -h, --help  show this help\n\nEnvironment:\n  NOP_BLOG_JWT_SECRET  overrides auth.jwt.secret\n  RUST_LOG             extra log filters\n"
}

enum RunMode {
    Serve,
    Help,
}

struct ParsedArgs {
    runtime_root: std::path::PathBuf,
    mode: RunMode,
}

fn parse_args() -> Result<ParsedArgs, String> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ParsedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    if args.iter().any(|arg| is_help_flag(arg)) {
        return Ok(ParsedArgs {
            runtime_root: std::path::PathBuf::from("."),
            mode: RunMode::Help,
        });
    }

    let mut args = args.into_iter();
    let mut runtime_root = std::path::PathBuf::from(".");

    while let Some(arg) = args.next() {
        if arg == "--" {
            continue;
        } else if arg == "-C" {
            let value = args
                .next()
                .ok_or_else(|| "Missing value for -C".to_string())?;
            runtime_root = std::path::PathBuf::from(value);
        } else {
            return Err(format!("Unexpected argument '{}'", arg));
        }
    }

    let runtime_root = make_runtime_root_absolute(runtime_root)?;
    Ok(ParsedArgs {
        runtime_root,
        mode: RunMode::Serve,
    })
}

fn is_help_flag(arg: &str) -> bool {
    arg == "-h" || arg == "--help"
}

fn make_runtime_root_absolute(
    runtime_root: std::path::PathBuf,
) -> Result<std::path::PathBuf, String> {
    if runtime_root.is_absolute() {
        return Ok(runtime_root);
    }

    let current_dir = std::env::current_dir()
        .map_err(|error| format!("Failed to resolve current directory: {}", error))?;
    Ok(current_dir.join(runtime_root))
}
