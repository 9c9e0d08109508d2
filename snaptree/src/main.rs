#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code to prevent panics from bad input.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use snaptree::{Tree, TreeConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snaptree=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match TreeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: fanout={}, memory_limit={}",
        config.fanout(),
        config.memory_limit()
    );

    let mut keys = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.parse::<i64>() {
            Ok(key) => keys.push(key),
            Err(e) => {
                tracing::error!("Invalid key '{arg}': {e}");
                std::process::exit(1);
            }
        }
    }

    let tree = keys
        .iter()
        .fold(Tree::with_config(config), |tree, &k| tree.add(k, k));

    if let Err(e) = tree.validate() {
        tracing::error!("Tree failed validation: {e}");
        std::process::exit(1);
    }

    println!("{tree}");
    println!("count: {}", tree.count());
    println!("height: {}", tree.height());

    let mut reversed = Vec::new();
    let mut cursor = tree.last();
    while let Some(c) = cursor {
        reversed.push(snaptree::tree::uid(*c.key()));
        cursor = c.previous();
    }
    println!("reverse: {}", reversed.join(" "));
}
