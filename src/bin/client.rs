use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use futures::future::try_join_all;
use log::{info, warn};
use rand::{random_range, seq::IndexedRandom};
use submission_gateway::api::{Submission, SubmitResponse};
use tokio::time::sleep;

const LANGUAGES: &[&str] = &["python", "cpp", "rust", "java", "javascript"];

#[derive(Debug, Parser)]
struct Cli {
    #[arg(long, short, default_value = "http://localhost:3000/submit")]
    url: String,
    #[arg(long, short, default_value_t = 1.0)]
    interval: f64,
    #[arg(long, short, default_value_t = 1000)]
    max_id: u64,
    #[arg(long, short, default_value_t = 1)]
    concurrency: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let submitters = (0..cli.concurrency).map(|i| submit_loop(i, &cli, &client));
    try_join_all(submitters).await?;
    Ok(())
}

async fn submit_loop(i: u32, cli: &Cli, client: &reqwest::Client) -> Result<()> {
    loop {
        let s = sleep(Duration::from_secs_f64(cli.interval));
        let problem_id = random_range(0..cli.max_id).to_string();
        let language = LANGUAGES.choose(&mut rand::rng()).copied().unwrap_or("python");
        let req = Submission::new(
            problem_id.as_str(),
            format!("// submitter {i}, problem {problem_id}"),
            language,
        );
        let res: SubmitResponse = client
            .post(&cli.url)
            .json(&req)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        match res {
            SubmitResponse::Queued(len) => {
                info!("Submitter {i} sent problem {problem_id} in {language}, queue length {len}")
            }
            SubmitResponse::Rejected(msg) => {
                warn!("Submitter {i} was rejected: {}", msg.message)
            }
        }
        s.await;
    }
}
