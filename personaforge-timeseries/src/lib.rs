/*!
# personaforge-timeseries

Time-Series Store (C5): append-only metric streams tagged by `persona_id`,
`user_id`, and optionally `session_id`. Writes never fail upward; a sink
that is unreachable or unconfigured just returns `false`.
*/

mod sink;

pub use sink::{InMemoryTimeSeriesSink, Measurement, MetricPoint, NullSink, TimeSeriesSink};

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::LineProtocolSink;
