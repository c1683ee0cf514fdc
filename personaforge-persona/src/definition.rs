use crate::manifest::Manifest;
use personaforge_types::PersonaId;

/// Validated persona descriptor, spec §3 and §4.9. Immutable at runtime
/// except through `PersonaStore::reload`.
#[derive(Debug, Clone)]
pub struct PersonaDefinition {
    pub persona_id: PersonaId,
    pub display_name: String,
    pub default_language: Option<String>,
    pub personality: String,
    pub communication_style: String,
    pub voice: Option<String>,
    pub background: Option<String>,
    pub knowledge_hooks: Vec<String>,
}

impl PersonaDefinition {
    pub(crate) fn from_manifest(persona_id: PersonaId, manifest: Manifest) -> Self {
        Self {
            persona_id,
            display_name: manifest.identity.name,
            default_language: manifest.identity.default_language,
            personality: manifest.personality,
            communication_style: manifest.communication_style,
            voice: manifest.voice,
            background: manifest.background,
            knowledge_hooks: manifest.knowledge_hooks,
        }
    }
}
