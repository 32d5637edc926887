use clap::Parser;
use dotenv::dotenv;
use log::error;
use openrouter_chat::cli::Args;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Err(e) = openrouter_chat::run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
