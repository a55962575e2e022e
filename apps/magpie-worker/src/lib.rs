use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use magpie_pipeline::{Pipeline, Providers, ResearchRequest};
use magpie_store::{MemoryStore, Store};

#[derive(Debug, Parser)]
#[command(
	version = magpie_cli::VERSION,
	rename_all = "kebab",
	styles = magpie_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: std::path::PathBuf,
	/// Research request as a JSON file: topics, queries, direct URLs.
	#[arg(value_name = "REQUEST")]
	pub request: std::path::PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = magpie_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let request: ResearchRequest = serde_json::from_str(&std::fs::read_to_string(&args.request)?)?;
	let store = Arc::new(MemoryStore::new());
	let pipeline = Pipeline::new(config, store.clone(), Providers::default());
	let session_id = pipeline.run(request).await?;
	let papers = store.session_papers(session_id).await?;
	let mut report = Vec::with_capacity(papers.len());

	for paper in papers {
		let notes = store.paper_notes(paper.paper_id).await?;

		report.push(serde_json::json!({ "paper": paper, "notes": notes }));
	}

	println!("{}", serde_json::to_string_pretty(&serde_json::json!({
		"session_id": session_id,
		"papers": report,
	}))?);

	Ok(())
}
