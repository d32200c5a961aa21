mod commands;
mod config;
mod error;

use crate::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let (config, command) = config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "ledgerly={level},client={level}",
            level = config.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let ctx = commands::Context::new(&config)?;
    if let Err(err) = commands::run(&ctx, command).await {
        eprintln!("error: {}", err.user_message());
        if ctx.navigator.last().is_some() {
            eprintln!(
                "Your session has ended. Run `ledgerly login --email <EMAIL>` to sign in again."
            );
        }
        std::process::exit(1);
    }

    Ok(())
}
