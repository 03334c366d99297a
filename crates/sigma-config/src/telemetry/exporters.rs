use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// OTLP exporter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    /// OTLP collector endpoint
    pub endpoint: Url,
    /// Wire protocol
    #[serde(default)]
    pub protocol: ExportProtocol,
    /// How often metrics are pushed
    #[serde(
        default = "default_export_interval",
        deserialize_with = "crate::duration::deserialize"
    )]
    pub export_interval: Duration,
}

/// OTLP export protocol
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportProtocol {
    /// gRPC (default)
    #[default]
    Grpc,
    /// HTTP/protobuf
    HttpProto,
}

const fn default_export_interval() -> Duration {
    Duration::from_secs(30)
}
