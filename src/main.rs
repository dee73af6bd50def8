use anyhow::Context as _;
use certcrab::reinvoke::LambdaReinvoker;
use certcrab::report::{HttpCallback, ResultReporter};
use certcrab::services::AwsServices;
use certcrab::{Config, CustomResourceEvent, InvocationBudget, Provisioner, Shared};
use is_terminal::IsTerminal;
use lambda_runtime::{service_fn, LambdaEvent};
use serde_json::Value;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Process-wide state reused by every invocation.
struct AppState {
    config: Shared,
    sdk_config: aws_config::SdkConfig,
    lambda_client: aws_sdk_lambda::Client,
    callback: HttpCallback,
}

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    tracing_init();

    let config = Config::from_env().context("loading configuration")?;
    tracing::debug!("configuration: {config:?}");
    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let state = AppState {
        lambda_client: aws_sdk_lambda::Client::new(&sdk_config),
        callback: HttpCallback::new(config.callback_timeout)
            .context("building callback client")?,
        config: Arc::new(config),
        sdk_config,
    };

    let state = &state;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(state, event).await
    }))
    .await
}

async fn handle_request(
    state: &AppState,
    event: LambdaEvent<Value>,
) -> Result<Value, lambda_runtime::Error> {
    let LambdaEvent { payload, context } = event;
    // Without a parsed event there's no response URL to report to, so this is the one
    // failure handed back to the Lambda runtime.
    let event: CustomResourceEvent = serde_json::from_value(payload)?;
    tracing::info!(
        "{:?} {} ({}) in invocation {}",
        event.request_type,
        event.logical_resource_id,
        event.request_id,
        context.request_id
    );

    let budget = InvocationBudget::from_epoch_millis(context.deadline, state.config.safety_margin);
    let provisioner = Provisioner::new(
        state.config.clone(),
        Arc::new(AwsServices::new(state.sdk_config.clone())),
        Arc::new(LambdaReinvoker::new(
            state.lambda_client.clone(),
            context.invoked_function_arn.clone(),
        )),
        ResultReporter::new(Arc::new(state.callback.clone())),
    );
    let outcome = provisioner.handle(&event, &budget).await;
    Ok(serde_json::to_value(outcome)?)
}

fn tracing_init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "certcrab=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if std::io::stdout().is_terminal() {
        registry.with(tracing_subscriber::fmt::layer()).init();
    } else {
        // CloudWatch: one JSON object per line, no ANSI colours.
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_current_span(false),
            )
            .init();
    }
}
