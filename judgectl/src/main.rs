use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use judge_apis::{
    judge_log::TestCaseResult,
    rest::{LanguageView, SampleRunRequest, SampleRunView, SubmissionView, SubmitRequest},
    Verdict,
};

/// Command-line judge client
#[derive(Parser)]
struct Args {
    /// Judge API endpoint, e.g. http://localhost:1789
    #[arg(long, short = 'j', env = "JUDGE_API", default_value = "http://localhost:1789")]
    judge_api: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a solution and wait for its verdict
    Submit {
        #[arg(long, short = 'u')]
        user: u64,
        #[arg(long, short = 'p')]
        problem: u64,
        #[arg(long, short = 'l')]
        language: String,
        /// Path to the source file
        #[arg(long, short = 's')]
        source: PathBuf,
    },
    /// Run a solution on the sample test cases only
    Sample {
        #[arg(long, short = 'p')]
        problem: u64,
        #[arg(long, short = 'l')]
        language: String,
        #[arg(long, short = 's')]
        source: PathBuf,
    },
    /// List supported languages
    Languages,
}

async fn read_source(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read source from {}", path.display()))
}

async fn submit(
    client: &reqwest::Client,
    api: &str,
    req: SubmitRequest,
) -> anyhow::Result<()> {
    let created: SubmissionView = client
        .post(format!("{}/submissions", api))
        .query(&[("wait", "false")])
        .json(&req)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    println!("Submitted, submission id: {}", created.id);
    let mut printer = ProgressPrinter::new();
    printer.add(&created);
    let mut current = created;
    while !current.verdict.is_final() {
        tokio::time::sleep(Duration::from_secs(3)).await;
        current = client
            .get(format!("{}/submissions/{}", api, current.id))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        printer.add(&current);
    }
    println!(
        "Verdict: {} ({}/{} test cases passed)",
        current.verdict_name, current.passed_test_cases, current.total_test_cases
    );
    if let Some(ms) = current.execution_time_ms {
        println!("Time: {} ms", ms);
    }
    if let Some(kb) = current.memory_kb {
        println!("Memory: {} KB", kb);
    }
    Ok(())
}

fn print_sample_row(row: &TestCaseResult) {
    println!("Sample #{}: {}", row.number, row.verdict);
    if row.verdict != Verdict::Accepted {
        if let Some(expected) = &row.expected_output {
            println!("  expected: {:?}", expected);
        }
        if let Some(actual) = &row.actual_output {
            println!("  actual:   {:?}", actual);
        }
        if let Some(error) = &row.error {
            println!("  error:    {}", error);
        }
    }
}

async fn sample(
    client: &reqwest::Client,
    api: &str,
    problem: u64,
    req: SampleRunRequest,
) -> anyhow::Result<()> {
    let view: SampleRunView = client
        .post(format!("{}/problems/{}/sample-runs", api, problem))
        .json(&req)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    if view.results.is_empty() {
        println!("Problem {} has no sample test cases", problem);
    }
    for row in &view.results {
        print_sample_row(row);
    }
    let passed = view.results.iter().filter(|r| r.is_accepted()).count();
    println!("{}/{} samples passed", passed, view.results.len());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let client = reqwest::Client::new();
    let api = args.judge_api.trim_end_matches('/');
    match args.command {
        Command::Submit {
            user,
            problem,
            language,
            source,
        } => {
            let req = SubmitRequest {
                user_id: user,
                problem_id: problem,
                language,
                source_code: read_source(&source).await?,
            };
            submit(&client, api, req).await?;
        }
        Command::Sample {
            problem,
            language,
            source,
        } => {
            let req = SampleRunRequest {
                language,
                source_code: read_source(&source).await?,
            };
            sample(&client, api, problem, req).await?;
        }
        Command::Languages => {
            let languages: Vec<LanguageView> = client
                .get(format!("{}/languages", api))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            for l in languages {
                println!("{:<12} {:>3}  {}", l.name, l.id, l.description);
            }
        }
    }
    Ok(())
}

struct ProgressPrinter {
    last: Option<Verdict>,
}

impl ProgressPrinter {
    fn new() -> Self {
        ProgressPrinter { last: None }
    }

    fn add(&mut self, view: &SubmissionView) {
        if Some(view.verdict) != self.last {
            self.last = Some(view.verdict);
            if !view.verdict.is_final() {
                println!("Status: {}", view.verdict_name);
            }
        }
    }
}
