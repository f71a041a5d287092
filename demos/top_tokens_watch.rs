use top_tokens_tracker::{
    view::COLUMNS, FailurePolicy, HttpRankingProvider, Projection, Timeframe, TokenTable,
    TopTokensTracker, TrackerConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Top Traded Tokens");
    println!("=================");

    let config = TrackerConfig::from_env();
    println!("Backend: {}", config.api_base_url);

    // The shell checks the backend once before polling starts
    let health_probe = HttpRankingProvider::new(&config)?;
    match health_probe.fetch_health().await {
        Ok(health) => println!("Backend says: {}", health.message),
        Err(e) => eprintln!("Health check failed: {}", e),
    }

    let tracker = TopTokensTracker::from_config(&config)?;
    let mut table = TokenTable::new(FailurePolicy::ErrorTakesPrecedence);
    let mut updates = tracker.subscribe();
    tracker.start();

    // Cycle through the tabs on each update; no refetch is needed to switch
    let mut timeframes = Timeframe::all().iter().cycle();
    for _ in 0..6 {
        if updates.changed().await.is_err() {
            break;
        }
        let state = updates.borrow_and_update().clone();
        if let Some(tf) = timeframes.next() {
            table.select_timeframe(*tf);
        }

        println!("\n[{}]", table.timeframe().label());
        match table.render(&state) {
            Projection::Loading => println!("Loading tokens..."),
            Projection::Error { message } => println!("Error loading tokens: {}", message),
            Projection::Rows { rows, refreshing, .. } => {
                let [rank, name, price, change, volume] = COLUMNS;
                println!(
                    "{:<6}{:<28}{:>18}{:>12}{:>12}",
                    rank, name, price, change, volume
                );
                for row in rows {
                    println!(
                        "{:<6}{:<28}{:>18}{:>12}{:>12}",
                        row.rank,
                        format!("{} ({})", row.name, row.symbol),
                        row.price,
                        row.change.text,
                        row.volume
                    );
                }
                if refreshing {
                    println!("Updating...");
                }
            }
        }
    }

    tracker.stop();
    let metrics = tracker.get_provider_metrics().await;
    println!(
        "\n{} requests, p50={:.0}ms, success rate {:.1}%",
        metrics.total_requests,
        metrics.latency_p50_ms,
        metrics.success_rate * 100.0
    );

    Ok(())
}
