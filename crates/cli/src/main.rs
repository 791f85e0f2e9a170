use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    greenlight_cli::run().await
}
