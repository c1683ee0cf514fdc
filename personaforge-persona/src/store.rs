//! Loads persona descriptors from a directory of `<slug>.toml` files and
//! serves them by slug. Loading the whole directory into an `RwLock`-guarded
//! map and swapping it wholesale on `reload` is what gives "no runtime
//! hot-swap; reload is an explicit operation" (§4.9) its meaning — a caller
//! holding a `PersonaDefinition` from before a reload keeps reading the old
//! value, it is never mutated under them.

use crate::definition::PersonaDefinition;
use crate::manifest::Manifest;
use parking_lot::RwLock;
use personaforge_types::{PersonaId, PipelineError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct PersonaStore {
    dir: PathBuf,
    personas: RwLock<HashMap<PersonaId, Arc<PersonaDefinition>>>,
}

impl PersonaStore {
    /// Loads every `*.toml` file in `dir` eagerly; a single malformed or
    /// invalid descriptor fails the whole load so a typo never ships
    /// silently missing a persona.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let dir = dir.as_ref().to_path_buf();
        let personas = Self::read_dir(&dir)?;
        Ok(Self {
            dir,
            personas: RwLock::new(personas),
        })
    }

    fn read_dir(dir: &Path) -> Result<HashMap<PersonaId, Arc<PersonaDefinition>>, PipelineError> {
        let entries = std::fs::read_dir(dir).map_err(|e| PipelineError::Unavailable {
            component: "persona_store",
            source: e.to_string(),
        })?;

        let mut out = HashMap::new();
        for entry in entries {
            let entry = entry.map_err(|e| PipelineError::Unavailable {
                component: "persona_store",
                source: e.to_string(),
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            let slug = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| PipelineError::Invalid {
                    reason: format!("persona file has no valid stem: {}", path.display()),
                })?
                .to_string();

            let raw = std::fs::read_to_string(&path).map_err(|e| PipelineError::Unavailable {
                component: "persona_store",
                source: e.to_string(),
            })?;
            let definition = parse_descriptor(&slug, &raw)?;
            out.insert(PersonaId::from(slug), Arc::new(definition));
        }
        Ok(out)
    }

    /// Re-reads `dir` from disk and atomically replaces the served map.
    pub fn reload(&self) -> Result<(), PipelineError> {
        let fresh = Self::read_dir(&self.dir)?;
        *self.personas.write() = fresh;
        Ok(())
    }

    pub fn get(&self, persona_id: &PersonaId) -> Result<Arc<PersonaDefinition>, PipelineError> {
        self.personas
            .read()
            .get(persona_id)
            .cloned()
            .ok_or_else(|| PipelineError::Invalid {
                reason: format!("unknown persona: {persona_id}"),
            })
    }

    pub fn len(&self) -> usize {
        self.personas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.read().is_empty()
    }
}

fn parse_descriptor(slug: &str, raw: &str) -> Result<PersonaDefinition, PipelineError> {
    let manifest: Manifest = toml::from_str(raw).map_err(|e| PipelineError::Invalid {
        reason: format!("persona descriptor {slug} failed to parse: {e}"),
    })?;
    manifest.validate()?;
    Ok(PersonaDefinition::from_manifest(PersonaId::from(slug), manifest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_descriptor(dir: &Path, slug: &str, body: &str) {
        let mut file = std::fs::File::create(dir.join(format!("{slug}.toml"))).unwrap();
        file.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn loads_valid_descriptor_and_serves_by_slug() {
        let tmp = tempfile::tempdir().unwrap();
        write_descriptor(
            tmp.path(),
            "elena",
            r#"
            [identity]
            name = "Elena"
            default_language = "en"

            personality = "warm, curious, a little wry"
            communication_style = "conversational, asks follow-up questions"
            voice = "soft-spoken"
            knowledge_hooks = ["botany", "sailing"]
            "#,
        );

        let store = PersonaStore::load(tmp.path()).unwrap();
        let elena = store.get(&PersonaId::from("elena")).unwrap();
        assert_eq!(elena.display_name, "Elena");
        assert_eq!(elena.knowledge_hooks, vec!["botany", "sailing"]);
    }

    #[test]
    fn missing_required_field_fails_load() {
        let tmp = tempfile::tempdir().unwrap();
        write_descriptor(
            tmp.path(),
            "broken",
            r#"
            [identity]
            name = "Broken"

            personality = ""
            communication_style = "terse"
            "#,
        );

        assert!(PersonaStore::load(tmp.path()).is_err());
    }

    #[test]
    fn unknown_persona_is_invalid() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PersonaStore::load(tmp.path()).unwrap();
        assert!(store.get(&PersonaId::from("nobody")).is_err());
    }

    #[test]
    fn reload_picks_up_new_descriptor_without_replacing_old_handles() {
        let tmp = tempfile::tempdir().unwrap();
        write_descriptor(
            tmp.path(),
            "elena",
            r#"
            [identity]
            name = "Elena"

            personality = "warm"
            communication_style = "casual"
            "#,
        );
        let store = PersonaStore::load(tmp.path()).unwrap();
        let before = store.get(&PersonaId::from("elena")).unwrap();
        assert_eq!(before.personality, "warm");

        write_descriptor(
            tmp.path(),
            "elena",
            r#"
            [identity]
            name = "Elena"

            personality = "warm and more playful now"
            communication_style = "casual"
            "#,
        );
        store.reload().unwrap();
        let after = store.get(&PersonaId::from("elena")).unwrap();
        assert_eq!(after.personality, "warm and more playful now");
        // the handle obtained before reload is untouched (Arc, not mutated in place)
        assert_eq!(before.personality, "warm");
    }
}
