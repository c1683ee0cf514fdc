/*!
# personaforge-persona

Character Definition Loader (C9): a static, identifier-addressable persona
descriptor store. Each persona is read as a plain TOML document per slug
via `toml::from_str`; packaging/export is out of scope here.

No runtime hot-swap: `PersonaStore::get` always serves the map installed at
construction or by the last explicit `reload`.
*/

mod definition;
mod manifest;
mod store;

pub use definition::PersonaDefinition;
pub use store::PersonaStore;
