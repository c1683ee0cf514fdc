use crate::sink::{Measurement, MetricPoint, TimeSeriesSink};
use async_trait::async_trait;
use personaforge_types::UserId;

/// Posts points to an InfluxDB-like line-protocol endpoint. Stubbed to the
/// same contract as [`crate::NullSink`] until a deployment supplies
/// `timeseries_url`; §6 says C5 is disabled entirely when that key is absent,
/// so the Orchestrator never constructs this sink without a URL.
pub struct LineProtocolSink {
    http: reqwest::Client,
    url: String,
    token: Option<String>,
    org: String,
    bucket: String,
}

impl LineProtocolSink {
    pub fn new(url: impl Into<String>, token: Option<String>, org: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            token,
            org: org.into(),
            bucket: bucket.into(),
        }
    }

    fn to_line(point: &MetricPoint) -> String {
        let fields = match &point.measurement {
            Measurement::ConfidenceEvolution {
                user_fact_confidence,
                relationship_confidence,
                context_confidence,
                emotional_confidence,
                overall_confidence,
            } => format!(
                "user_fact_confidence={user_fact_confidence},relationship_confidence={relationship_confidence},context_confidence={context_confidence},emotional_confidence={emotional_confidence},overall_confidence={overall_confidence}"
            ),
            Measurement::RelationshipProgression {
                trust,
                affection,
                attunement,
                interaction_quality,
                comfort,
            } => format!(
                "trust={trust},affection={affection},attunement={attunement},interaction_quality={interaction_quality},comfort={comfort}"
            ),
            Measurement::ConversationQuality {
                engagement,
                satisfaction,
                natural_flow,
                emotional_resonance,
                topic_relevance,
                ..
            } => format!(
                "engagement={engagement},satisfaction={satisfaction},natural_flow={natural_flow},emotional_resonance={emotional_resonance},topic_relevance={topic_relevance}"
            ),
            Measurement::BotEmotion { emotion, intensity, confidence } => {
                format!("emotion=\"{}\",intensity={intensity},confidence={confidence}", emotion.as_str())
            }
            Measurement::UserEmotion { emotion, intensity, confidence } => {
                format!("emotion=\"{}\",intensity={intensity},confidence={confidence}", emotion.as_str())
            }
        };
        format!(
            "{},persona_id={},user_id={} {} {}",
            point.measurement.family(),
            point.persona_id.as_str(),
            point.user_id.as_str(),
            fields,
            point.recorded_at.timestamp_nanos_opt().unwrap_or_default(),
        )
    }
}

#[async_trait]
impl TimeSeriesSink for LineProtocolSink {
    async fn write_point(&self, point: MetricPoint) -> bool {
        let line = Self::to_line(&point);
        let mut req = self
            .http
            .post(format!("{}/api/v2/write?org={}&bucket={}", self.url, self.org, self.bucket))
            .body(line);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        matches!(req.send().await, Ok(resp) if resp.status().is_success())
    }

    async fn trajectory_window(
        &self,
        _user_id: &UserId,
        _family: &str,
        _limit: usize,
    ) -> Vec<MetricPoint> {
        // Query-side support is a collaborator concern; the core only needs
        // writes plus the in-memory fallback for C8's trajectory window.
        Vec::new()
    }
}
