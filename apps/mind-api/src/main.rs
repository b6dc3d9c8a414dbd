use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = mind_api::Args::parse();

	mind_api::run(args).await
}
