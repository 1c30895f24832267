use clap::Parser;
use sixdegrees::directory::HttpDirectory;
use sixdegrees::{Config, ConnectionService};
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "connect")]
#[command(about = "Find the shortest friendship chain between two users")]
struct Args {
    /// Username the chain starts from
    from: String,

    /// Username the chain ends at
    to: String,

    /// Override the configured search horizon (edges)
    #[arg(long)]
    max_hops: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", "info"),
    )
    .init();

    let args = Args::parse();

    let mut config = Config::load()?;
    if let Some(max_hops) = args.max_hops {
        config.search.max_hops = max_hops;
    }

    let directory = Arc::new(HttpDirectory::new(
        &config.directory,
        config.search.page_size,
    ));
    let service = ConnectionService::new(directory, &config);

    let start = Instant::now();
    match service.find_connection(&args.from, &args.to).await {
        Ok(connection) => {
            println!(
                "{} degrees of separation ({:.2?})",
                connection.degree_count,
                start.elapsed()
            );
            for (i, link) in connection.chain.iter().enumerate() {
                if i == 0 {
                    println!("  {} ({})", link.name, link.id);
                } else {
                    println!("  -> {} ({})", link.name, link.id);
                }
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
