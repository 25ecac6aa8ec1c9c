//! Turns raw mesh payloads into a single renderable geometry.

use std::collections::HashMap;

use super::geometry::RenderableGeometry;
use super::obj::{ObjDocument, ObjObject, parse_obj};

/// Normalizes an OBJ payload into one renderable geometry.
///
/// - `None` payload: returns `None`; the caller shows a "no mesh" placeholder.
/// - Several sub-objects: the first one in payload order is used.
/// - Malformed payload or no faces at all: logs the failure and returns
///   `None`. This never aborts the surrounding workflow.
pub fn normalize(mesh_payload: Option<&str>) -> Option<RenderableGeometry> {
    let payload = mesh_payload?;

    let document = match parse_obj(payload) {
        Ok(document) => document,
        Err(err) => {
            tracing::warn!(error = %err, kind = err.kind(), "Discarding unparseable mesh payload");
            return None;
        }
    };

    let Some(first) = document.objects.first() else {
        tracing::warn!(
            kind = "mesh_parse",
            vertices = document.positions.len(),
            "Mesh payload contains no faces"
        );
        return None;
    };

    if document.objects.len() > 1 {
        tracing::debug!(
            objects = document.objects.len(),
            selected = first.name.as_deref().unwrap_or("<unnamed>"),
            "Mesh payload has several sub-objects; using the first"
        );
    }

    Some(compact(&document, first))
}

/// Copies only the positions referenced by `object`, re-indexing them in
/// first-use order.
fn compact(document: &ObjDocument, object: &ObjObject) -> RenderableGeometry {
    let mut remap: HashMap<usize, u32> = HashMap::new();
    let mut positions = Vec::new();
    let mut indices = Vec::with_capacity(object.triangles.len() * 3);

    for triangle in &object.triangles {
        for &global in triangle {
            let local = *remap.entry(global).or_insert_with(|| {
                positions.push(document.positions[global]);
                (positions.len() - 1) as u32
            });
            indices.push(local);
        }
    }

    RenderableGeometry {
        name: object.name.clone(),
        positions,
        indices,
    }
}
