use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match surgical_consent::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Start-up failed: {e}");
            eprintln!("surgical-consent: {e}");
            ExitCode::FAILURE
        }
    }
}
