//! Tick orchestration loop.
//!
//! Drives the decision engine one tick at a time: wait for the venue to go
//! active, then run one evaluation pass per new tick and submit whatever
//! orders it produced. The next snapshot is not fetched until the current
//! pass completes, so ticks never overlap. Adapter failures count as "no
//! data this tick" and the loop keeps going.

use std::time::Duration;

use anyhow::Result;
use tracing::{error, info, warn};

use vol_arb_core::{ConfigLoader, MarketStatus, OrderRouter, SnapshotProvider};
use vol_arb_exchange_sim::{SimClient, SimClientConfig, SimExchange};
use vol_arb_strategy::TickEngine;

pub async fn run(config_path: &str) -> Result<()> {
    let config = ConfigLoader::load(config_path)?;
    info!(
        venue = %config.venue.api_url,
        underlying = %config.instruments.underlying,
        strikes = ?config.instruments.strikes,
        open_threshold = config.strategy.open_threshold,
        close_threshold = config.strategy.close_threshold,
        net_delta_limit = config.risk.net_delta_limit,
        "starting volatility agent"
    );

    let client = SimClient::new(SimClientConfig::new(
        config.venue.api_url.clone(),
        config.venue.api_key.clone(),
    ))?;
    let exchange = SimExchange::new(client, config.session);
    let mut engine = TickEngine::new(&config);

    let poll = Duration::from_millis(config.venue.poll_interval_ms);
    let mut last_tick: Option<u32> = None;
    let mut seen_active = false;

    loop {
        tokio::time::sleep(poll).await;

        let snapshot = match exchange.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "snapshot failed, skipping tick");
                continue;
            }
        };

        match snapshot.status {
            MarketStatus::Active => seen_active = true,
            MarketStatus::Closed if seen_active => {
                info!(tick = snapshot.tick, "market left active state, stopping");
                break;
            }
            MarketStatus::Closed => {
                // Session not open yet.
                continue;
            }
        }

        if last_tick == Some(snapshot.tick) {
            continue;
        }
        last_tick = Some(snapshot.tick);

        let orders = engine.on_tick(&snapshot);
        for order in &orders {
            if let Err(e) = exchange.submit(order).await {
                // The position is re-derived from the next snapshot, so a
                // lost order needs no retry bookkeeping here.
                error!(
                    instrument = %order.instrument,
                    quantity = order.quantity,
                    error = %e,
                    "order submission failed"
                );
            }
        }

        if snapshot.tick >= config.session.ticks_per_session {
            info!(tick = snapshot.tick, "session tick limit reached, stopping");
            break;
        }
    }

    match exchange.net_liquidation_value().await {
        Ok(nlv) => info!(nlv, "session complete"),
        Err(e) => warn!(error = %e, "session complete, final NLV unavailable"),
    }

    Ok(())
}
