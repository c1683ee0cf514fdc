/*!
# personaforge-attribution

Role-Attribution Manager (C11): per-context attribution ids that prevent
identity spoofing in multi-speaker histories, using a `sha2`/`hex`
content-hash for stable pseudonym derivation and a flat
suspicious-substring list for prompt-injection detection.

Three identity levels (`IdentityLevel`, spec §6): `Identified` uses the
real `user_id` as the display handle, `Contextualized` hands out stable
sequential pseudonyms per context, `Anonymous` derives a stable
hash-based pseudonym. The bot's own messages always carry the fixed
`assistant` attribution id regardless of level.
*/

mod manager;
mod pseudonym;
mod validate;

pub use manager::AttributionManager;
pub use validate::{validate, SecurityLevel, ValidationOutcome};
