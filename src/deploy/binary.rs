//! Binary media type diffing: existing vs. requested sets into patch ops.

use crate::remote::{PatchOp, PatchOpKind};

/// JSON-Pointer escape for a media type used inside a patch path
/// (`image/png` -> `image~1png`).
fn escape_media_type(media_type: &str) -> String {
    media_type.replace('/', "~1")
}

/// Minimal patch list turning `existing` into `requested`. Missing lists are
/// empty sets. Removes come first, then adds; within each group the input
/// order is kept. An empty result means no update call is needed.
pub fn binary_media_type_ops(
    existing: Option<&[String]>,
    requested: Option<&[String]>,
) -> Vec<PatchOp> {
    let existing = existing.unwrap_or(&[]);
    let requested = requested.unwrap_or(&[]);

    let mut ops = Vec::new();
    for media_type in existing {
        if !requested.contains(media_type) {
            ops.push(PatchOp {
                op: PatchOpKind::Remove,
                path: format!("/binaryMediaTypes/{}", escape_media_type(media_type)),
            });
        }
    }
    for media_type in requested {
        if !existing.contains(media_type) {
            ops.push(PatchOp {
                op: PatchOpKind::Add,
                path: format!("/binaryMediaTypes/{}", escape_media_type(media_type)),
            });
        }
    }
    ops
}
