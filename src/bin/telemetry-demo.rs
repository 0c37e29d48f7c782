//! End-to-end wiring demo: one health-check style request recorded as a
//! detail trace plus a summary record.

use serde_json::json;

use telemetry_pipeline::{
    diagnostics, InvocationContext, LogSink, SummaryAggregator, TelemetryConfig, Trace,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    diagnostics::init();

    let mut config = TelemetryConfig::default();
    config.app_name = "telemetry-demo".to_string();

    tracing::info!(
        app_name = %config.app_name,
        log_dir = %config.log_dir,
        "telemetry pipeline starting"
    );

    let sink = LogSink::new(&config);
    let aggregator = SummaryAggregator::new(&config, sink.clone());

    // Ingress: mint the invocation context for the inbound request.
    let ctx = InvocationContext::for_ingress();
    let mut trace = Trace::new(
        &config,
        sink.clone(),
        &ctx,
        ctx.invoke(),
        "curl -X GET 'http://localhost:8080/api/v1/health'",
        "client",
    )
    .with_ambient_protocol("http", "get");

    let summary = aggregator.begin("/api/v1/health", ctx.invoke());

    // Handler: record the work as it happens.
    trace.record_outbound_request("client", "get-health", ctx.invoke(), None, json!({"q": ""}));
    let reply = json!({"status": "ok"});
    trace.record_outbound_response("m", "get-health", ctx.invoke(), None, reply.clone());

    // Completion: flush the trace, emit the summary off the critical path.
    trace.finalize()?;
    aggregator.finish_detached(summary, 200, "{\"q\":\"\"}".to_string(), reply.to_string(), None);

    // Let the detached emission land before shutting the sink down.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    sink.shutdown();

    tracing::info!("telemetry pipeline demo complete");
    Ok(())
}
