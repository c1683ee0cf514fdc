//! Attachment guard, spec §4.10 step 2: when the inbound message carries
//! images, append a strict in-character policy so the reply stays in
//! character instead of degenerating into an analytical caption.

use personaforge_types::{Attachment, AttachmentKind};

const IMAGE_POLICY: &str = "An image was shared. Respond to it entirely in character, as though \
you are looking at it yourself. Do not produce an analytical breakdown, a scored table, captions \
labeled with metadata, or an offer like \"Would you like me to describe it further?\" — just react \
the way you naturally would.";

pub fn image_policy_if_needed(attachments: &[Attachment]) -> Option<&'static str> {
    if attachments.iter().any(|a| a.kind == AttachmentKind::Image) {
        Some(IMAGE_POLICY)
    } else {
        None
    }
}
