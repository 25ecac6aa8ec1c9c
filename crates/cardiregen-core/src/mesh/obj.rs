//! Minimal Wavefront OBJ reader.
//!
//! Only geometry is read: `v` positions and `f` faces, split into sub-objects
//! by `o` and `g` statements. Texture coordinates, normals, materials,
//! smoothing groups and unknown statements are skipped.

use crate::error::{AnalysisError, Result};

/// Parsed OBJ payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjDocument {
    /// All vertex positions in declaration order (shared by every object).
    pub positions: Vec<[f32; 3]>,
    /// Sub-objects that own at least one face, in payload order.
    pub objects: Vec<ObjObject>,
}

/// One `o` / `g` block of an OBJ payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjObject {
    pub name: Option<String>,
    /// Triangles as zero-based indices into `ObjDocument::positions`.
    /// Polygons with more than three corners are fan-triangulated.
    pub triangles: Vec<[usize; 3]>,
}

/// Parses OBJ text.
///
/// # Errors
///
/// Returns `MeshParse` with the offending line number when a vertex has fewer
/// than three numeric coordinates, a face has fewer than three corners, or a
/// face references a vertex that does not exist.
pub fn parse_obj(text: &str) -> Result<ObjDocument> {
    let mut document = ObjDocument::default();
    let mut current = ObjObject::default();

    for (line_index, raw_line) in text.lines().enumerate() {
        let line_no = line_index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };

        match keyword {
            "v" => {
                let coords = parts
                    .take(3)
                    .map(|token| token.parse::<f32>())
                    .collect::<std::result::Result<Vec<f32>, _>>()
                    .map_err(|err| parse_error(line_no, format!("invalid vertex coordinate: {err}")))?;
                if coords.len() < 3 {
                    return Err(parse_error(line_no, "vertex needs three coordinates"));
                }
                document.positions.push([coords[0], coords[1], coords[2]]);
            }
            "f" => {
                let corners = parts
                    .map(|token| resolve_index(token, document.positions.len(), line_no))
                    .collect::<Result<Vec<usize>>>()?;
                if corners.len() < 3 {
                    return Err(parse_error(line_no, "face needs at least three vertices"));
                }
                for i in 1..corners.len() - 1 {
                    current.triangles.push([corners[0], corners[i], corners[i + 1]]);
                }
            }
            "o" | "g" => {
                let name = parts.collect::<Vec<_>>().join(" ");
                let name = (!name.is_empty()).then_some(name);
                if current.triangles.is_empty() {
                    // Nothing was drawn under the previous name; just rename.
                    current.name = name;
                } else {
                    document.objects.push(std::mem::replace(
                        &mut current,
                        ObjObject {
                            name,
                            triangles: Vec::new(),
                        },
                    ));
                }
            }
            _ => {}
        }
    }

    if !current.triangles.is_empty() {
        document.objects.push(current);
    }

    Ok(document)
}

/// Resolves one face corner (`v`, `v/vt`, `v//vn` or `v/vt/vn`) to a
/// zero-based position index. Negative indices count back from the most
/// recently declared vertex.
fn resolve_index(token: &str, vertex_count: usize, line_no: usize) -> Result<usize> {
    let position = token.split('/').next().unwrap_or_default();
    let index: i64 = position
        .parse()
        .map_err(|_| parse_error(line_no, format!("invalid face index '{token}'")))?;

    let resolved = match index {
        0 => None,
        i if i > 0 => usize::try_from(i - 1).ok(),
        i => usize::try_from(vertex_count as i64 + i).ok(),
    };

    resolved
        .filter(|&idx| idx < vertex_count)
        .ok_or_else(|| {
            parse_error(
                line_no,
                format!("face index {index} out of range ({vertex_count} vertices)"),
            )
        })
}

fn parse_error(line_no: usize, message: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::mesh_parse(format!("line {line_no}: {message}"))
}
