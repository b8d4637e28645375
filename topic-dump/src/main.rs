//! Topic dump entry point.
//!
//! Parses the operator request, wires the production dependencies, runs the
//! dump pipeline once, prints exactly one JSON result line on stdout, and
//! exits 0 on success, 2 on rejected input, 1 on any runtime failure.
//! Tracing goes to stderr so callers can parse stdout unconditionally.

use std::env;
use std::process::ExitCode;

use clap::Parser;
use dotenv::dotenv;
use topic_dump::Dependencies;
use topic_dump_pipeline::validator::RawRequest;
use topic_dump_shared::types::RunReport;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const EXIT_RUNTIME_FAILURE: u8 = 1;
const EXIT_INVALID_REQUEST: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "topic-dump",
    about = "Capture a Kafka topic, seal it with a one-time passphrase, and upload it to the artifact store",
    rename_all = "kebab-case"
)]
struct Args {
    /// Change ticket that authorizes this dump (e.g. an INC/CHG number).
    #[arg(long)]
    ticket: Option<String>,
    /// Request id, unique per dump.
    #[arg(long)]
    request_id: Option<String>,
    /// Kafka topic to capture.
    #[arg(long)]
    topic: Option<String>,
    /// One-time passphrase that seals the artifact. Used once, not stored.
    #[arg(long)]
    otp: Option<String>,
    /// Identity of the requesting operator.
    #[arg(long)]
    requestor: Option<String>,
    /// Cluster selector for endpoint resolution.
    #[arg(long)]
    cluster: Option<String>,
    /// Environment selector for endpoint resolution.
    #[arg(long)]
    env: Option<String>,
}

impl Args {
    /// Raw pipeline input. Destination credentials come from the
    /// environment, never from flags, so they cannot show up in process
    /// listings; missing values are rejected by the validator rather than
    /// by the flag parser so the stdout JSON contract holds.
    fn into_raw_request(self) -> RawRequest {
        RawRequest {
            ticket: self.ticket,
            request_id: self.request_id,
            topic: self.topic,
            passphrase: self.otp,
            requestor: self.requestor,
            cluster: self.cluster,
            environment: self.env,
            base_url: env::var("ARTIFACTORY_BASE_URL").ok(),
            username: env::var("ARTIFACTORY_USER").ok(),
            secret: env::var("ARTIFACTORY_PASSWORD").ok(),
        }
    }
}

/// Initialize tracing to stderr; stdout is reserved for the result line.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("topic_dump=info,topic_dump_pipeline=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// The one JSON object this process prints.
fn emit(report: &RunReport) {
    let line = serde_json::to_string(report).unwrap_or_else(|_| {
        r#"{"status":"ERROR","message":"failed to serialize run report"}"#.to_string()
    });
    println!("{line}");
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    init_tracing();

    let raw = Args::parse().into_raw_request();

    let dependencies = match Dependencies::new() {
        Ok(dependencies) => dependencies,
        Err(error) => {
            emit(&RunReport::error(error.to_string()));
            return ExitCode::from(EXIT_RUNTIME_FAILURE);
        }
    };

    match dependencies.into_orchestrator().run(raw).await {
        Ok(outcome) => {
            emit(&outcome.report());
            ExitCode::SUCCESS
        }
        Err(error) => {
            emit(&RunReport::error(error.to_string()));
            if error.is_validation() {
                ExitCode::from(EXIT_INVALID_REQUEST)
            } else {
                ExitCode::from(EXIT_RUNTIME_FAILURE)
            }
        }
    }
}
