//! Raw TOML shape and its validation into a `PersonaDefinition`, spec §4.9
//! and §6. Read as a plain TOML document via `toml::from_str`; no
//! bundle/export concern here.

use personaforge_types::PipelineError;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct Manifest {
    pub identity: IdentitySection,
    pub personality: String,
    pub communication_style: String,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub knowledge_hooks: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IdentitySection {
    pub name: String,
    #[serde(default)]
    pub default_language: Option<String>,
}

impl Manifest {
    /// Required-field validation per §4.9: `identity.name`, `personality`,
    /// `communication_style` must be non-empty.
    pub(crate) fn validate(&self) -> Result<(), PipelineError> {
        if self.identity.name.trim().is_empty() {
            return Err(PipelineError::Invalid {
                reason: "persona descriptor missing identity.name".to_string(),
            });
        }
        if self.personality.trim().is_empty() {
            return Err(PipelineError::Invalid {
                reason: "persona descriptor missing personality".to_string(),
            });
        }
        if self.communication_style.trim().is_empty() {
            return Err(PipelineError::Invalid {
                reason: "persona descriptor missing communication_style".to_string(),
            });
        }
        Ok(())
    }
}
