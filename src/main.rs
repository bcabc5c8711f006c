use clap::Parser;
use quillpost::cli::{
    ACCESS_SECRET_ENV, Args, REFRESH_SECRET_ENV, build_config, init_logging, load_secret,
    open_database,
};
use quillpost::run_server;
use tracing::{error, info, warn};

fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    // Secrets are read (and their env vars removed) before the runtime spawns any threads
    let Some(access_secret) =
        load_secret(ACCESS_SECRET_ENV, args.access_token_secret_file.as_deref())
    else {
        std::process::exit(1);
    };

    let Some(refresh_secret) =
        load_secret(REFRESH_SECRET_ENV, args.refresh_token_secret_file.as_deref())
    else {
        std::process::exit(1);
    };

    serve(args, access_secret, refresh_secret);
}

#[tokio::main]
async fn serve(args: Args, access_secret: String, refresh_secret: String) {
    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    let Some(config) = build_config(&args, db, access_secret, refresh_secret) else {
        std::process::exit(1);
    };

    if !config.secure_cookies {
        warn!("Secure cookie flag disabled, refresh tokens will be sent over plain HTTP");
    }

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    match listener.local_addr() {
        Ok(local_addr) => info!(address = %local_addr, "Listening"),
        Err(e) => info!(address = %addr, error = %e, "Listening"),
    }

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
