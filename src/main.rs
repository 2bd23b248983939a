use notekeeper::{
    configuration::get_configuration,
    startup,
    telemetry::{get_subscriber, init_subscriber, init_tracer_provider},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cfg = get_configuration()?;

    let tracer_provider = cfg
        .telemetry
        .otlp_endpoint
        .as_deref()
        .map(|endpoint| init_tracer_provider("notekeeper", endpoint))
        .transpose()?;
    let subscriber = get_subscriber(
        "notekeeper".into(),
        cfg.telemetry.filter.clone(),
        std::io::stdout,
        tracer_provider.clone(),
    );
    init_subscriber(subscriber)?;

    let result = startup::run(cfg).await;
    if tracer_provider.is_some() {
        opentelemetry::global::shutdown_tracer_provider();
    }
    result
}
