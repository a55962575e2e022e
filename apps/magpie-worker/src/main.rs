use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	magpie_worker::run(magpie_worker::Args::parse()).await
}
