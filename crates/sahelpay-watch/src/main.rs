use std::future::Future;
use std::time::Duration;

use sahelpay::stream::StreamTransport;
use sahelpay::{GatewayEventType, GatewayStream, StreamConfig, StreamState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sahelpay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match StreamConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };

    let stream = match GatewayStream::new(config) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(error = %e, "failed to create gateway stream");
            std::process::exit(1);
        }
    };

    stream.on_event(GatewayEventType::GatewaySwitched, |event| {
        tracing::warn!(data = %event.data().cloned().unwrap_or_default(), "active gateway switched");
        Ok(())
    });
    stream.on_event(GatewayEventType::ProviderMaintenance, |event| {
        tracing::warn!(data = %event.data().cloned().unwrap_or_default(), "provider in maintenance");
        Ok(())
    });
    stream.on_all(|event| {
        let line = serde_json::to_string(&event.payload)?;
        tracing::info!(event = %event.type_name(), payload = %line, "gateway event");
        Ok(())
    });

    stream.connect().await;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };
    let exit = supervise(&stream, shutdown, Duration::from_secs(1)).await;

    stream.disconnect().await;
    if exit == Exit::Exhausted {
        std::process::exit(1);
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Exit {
    Interrupted,
    Exhausted,
}

/// Wait for `shutdown` while checking every `every` whether the stream has
/// given up reconnecting.
async fn supervise<T: StreamTransport>(
    stream: &GatewayStream<T>,
    shutdown: impl Future<Output = ()>,
    every: Duration,
) -> Exit {
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("interrupted, disconnecting");
                return Exit::Interrupted;
            }
            _ = ticker.tick() => {
                if stream.state() == StreamState::Exhausted {
                    tracing::error!(attempts = stream.attempts(), "gateway stream gave up reconnecting");
                    return Exit::Exhausted;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_survives_ticks() {
        let stream = GatewayStream::new(StreamConfig::new("http://127.0.0.1:1", "tok")).unwrap();

        // The shutdown deadline is longer than the tick period, so it only
        // fires if the same future is polled across ticks.
        let started = tokio::time::Instant::now();
        let exit = supervise(
            &stream,
            tokio::time::sleep(Duration::from_millis(35)),
            Duration::from_millis(10),
        )
        .await;

        assert_eq!(exit, Exit::Interrupted);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_idle_stream_is_not_exhausted() {
        let stream = GatewayStream::new(StreamConfig::new("http://127.0.0.1:1", "tok")).unwrap();
        let exit = supervise(&stream, async {}, Duration::from_millis(10)).await;
        assert_eq!(exit, Exit::Interrupted);
    }
}
