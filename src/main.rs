use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = formrelay::cli::Cli::parse();
    if let Err(e) = formrelay::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
