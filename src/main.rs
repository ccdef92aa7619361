#[tokio::main]
async fn main() -> std::process::ExitCode {
    match gula::run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("gula: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}
