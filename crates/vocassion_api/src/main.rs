use clap::Parser;
use std::process::ExitCode;
use vocassion_api::config::ServerConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServerConfig::parse();
    match vocassion_api::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("vocassion: {err}");
            ExitCode::FAILURE
        }
    }
}
