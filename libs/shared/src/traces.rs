use std::env;

use opentelemetry::global;
use opentelemetry::trace::TracerProvider;
use opentelemetry::KeyValue;
use opentelemetry_otlp::SpanExporter;
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tracing::{error, info};
use tracing_subscriber::{
    filter::EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Registry,
};

use crate::SharedError;

/// span 导出方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtelExport {
    /// 配置了 OTLP_ENDPOINT 时走 OTLP，否则输出到 stdout
    Auto,
    Stdout,
    /// 不创建 OpenTelemetry layer，仅保留日志输出
    Disabled,
}

impl OtelExport {
    fn from_env_value(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "stdout" => OtelExport::Stdout,
            "none" | "off" | "disabled" => OtelExport::Disabled,
            _ => OtelExport::Auto,
        }
    }
}

/// Tracing 配置结构
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// 服务名称
    pub service_name: String,
    /// 服务版本
    pub service_version: String,
    /// 服务环境 (dev, staging, prod)
    pub environment: String,
    /// OTLP collector endpoint
    pub otlp_endpoint: Option<String>,
    pub otel_export: OtelExport,
    /// 日志级别
    pub log_level: String,
    /// 是否启用控制台输出
    pub console_output: bool,
    /// 是否启用JSON格式
    pub json_format: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "user".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            otel_export: env::var("OTEL_EXPORT")
                .map(|v| OtelExport::from_env_value(&v))
                .unwrap_or(OtelExport::Auto),
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            console_output: env::var("CONSOLE_OUTPUT")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            json_format: env::var("JSON_FORMAT")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        }
    }
}

/// 初始化 OpenTelemetry tracer provider
fn init_opentelemetry(config: &TracingConfig) -> Result<Option<SdkTracerProvider>, SharedError> {
    use opentelemetry_otlp::WithExportConfig;

    if config.otel_export == OtelExport::Disabled {
        return Ok(None);
    }

    let resource = Resource::builder()
        .with_attributes([
            KeyValue::new("service.name", config.service_name.clone()),
            KeyValue::new("service.version", config.service_version.clone()),
            KeyValue::new("service.environment", config.environment.clone()),
            KeyValue::new("service.instance.id", uuid::Uuid::new_v4().to_string()),
        ])
        .build();

    let provider = match (&config.otlp_endpoint, config.otel_export) {
        (Some(otlp_endpoint), OtelExport::Auto) => {
            let exporter = SpanExporter::builder()
                .with_tonic()
                .with_endpoint(otlp_endpoint)
                .build()
                .map_err(|e| SharedError::TracingError(e.to_string()))?;

            SdkTracerProvider::builder()
                .with_resource(resource)
                .with_batch_exporter(exporter)
                .with_sampler(Sampler::AlwaysOn)
                .build()
        }
        _ => {
            // 开发环境下使用 stdout exporter
            let exporter = opentelemetry_stdout::SpanExporter::default();

            SdkTracerProvider::builder()
                .with_resource(resource)
                .with_batch_exporter(exporter)
                .with_sampler(Sampler::AlwaysOn)
                .build()
        }
    };

    Ok(Some(provider))
}

/// 统一的 tracing 初始化入口
pub fn init_tracing() -> Result<TracingCleanup, SharedError> {
    init_tracing_with_config(TracingConfig::default())
}

/// 使用自定义配置初始化 tracing
pub fn init_tracing_with_config(config: TracingConfig) -> Result<TracingCleanup, SharedError> {
    let tracer_provider = init_opentelemetry(&config)?;

    let trace_layer = tracer_provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer()
            .with_error_records_to_exceptions(true)
            .with_tracer(provider.tracer(config.service_name.clone()))
    });

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| SharedError::TracingError(e.to_string()))?;

    let registry = Registry::default().with(env_filter).with(trace_layer);

    let init_result = if !config.console_output {
        registry.try_init()
    } else if config.json_format {
        let fmt_layer = fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_target(false)
            .with_level(true)
            .with_thread_ids(true);
        registry.with(fmt_layer).try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_target(false)
            .with_level(true)
            .with_thread_ids(true);
        registry.with(fmt_layer).try_init()
    };
    init_result.map_err(|e| SharedError::TracingError(e.to_string()))?;

    if let Some(provider) = &tracer_provider {
        global::set_tracer_provider(provider.clone());
    }

    info!(
        service_name = %config.service_name,
        service_version = %config.service_version,
        environment = %config.environment,
        otel_export = ?config.otel_export,
        "Tracing initialized successfully"
    );

    Ok(TracingCleanup { tracer_provider })
}

/// 进程退出前需要 flush 的资源
#[derive(Default)]
pub struct TracingCleanup {
    tracer_provider: Option<SdkTracerProvider>,
}

impl TracingCleanup {
    pub fn cleanup(self) {
        if let Some(provider) = self.tracer_provider {
            if let Err(e) = provider.shutdown() {
                error!("Failed to shutdown tracer provider: {:?}", e);
            } else {
                info!("Tracer provider shutdown successfully");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otel_export_from_env_value() {
        assert_eq!(OtelExport::from_env_value("stdout"), OtelExport::Stdout);
        assert_eq!(OtelExport::from_env_value("NONE"), OtelExport::Disabled);
        assert_eq!(OtelExport::from_env_value("off"), OtelExport::Disabled);
        assert_eq!(OtelExport::from_env_value("otlp"), OtelExport::Auto);
    }

    #[test]
    fn test_init_tracing_without_exporter() {
        let config = TracingConfig {
            otel_export: OtelExport::Disabled,
            console_output: false,
            ..TracingConfig::default()
        };
        let cleanup = init_tracing_with_config(config).unwrap();

        let span = tracing::info_span!("test_operation", operation = "log_test");
        let _enter = span.enter();
        info!("this is a info log");

        cleanup.cleanup();
    }
}
