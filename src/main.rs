use clap::Parser;
use market_client::cli::{Args, Runner};
use market_client::logging;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    let runner = Runner::new(args);
    match runner.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            runner.output().error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
