use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Initialize structured logging for the engine.
///
/// JSON output with span context; export to a collector is the embedding
/// service's concern.
pub fn init_telemetry() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Requisition engine telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span with common lifecycle attributes
pub fn create_lifecycle_span(
    operation: &str,
    requisition_id: Option<&str>,
    actor_id: Option<i64>,
    correlation_id: Option<&str>,
) -> tracing::Span {
    tracing::info_span!(
        "requisition_lifecycle",
        operation = operation,
        requisition.id = requisition_id,
        actor.id = actor_id,
        correlation.id = correlation_id,
    )
}

/// Shutdown telemetry gracefully
pub fn shutdown_telemetry() {
    tracing::info!("Requisition engine telemetry shutdown complete");
}
