/// STL importer (binary and ASCII) producing indexed meshes
use std::collections::HashMap;

use nom::{
    bytes::complete::{tag, take_till},
    character::complete::{multispace0, multispace1},
    multi::many0,
    number::complete::double,
    sequence::preceded,
    IResult,
};

use nalgebra::Point3;

use crate::error::{RenderError, RenderResult};
use crate::geometry::Mesh;

type Facet = [Point3<f64>; 3];

/// Merges bit-identical corners into shared vertices.
#[derive(Default)]
struct MeshBuilder {
    points: Vec<Point3<f64>>,
    lookup: HashMap<[u64; 3], usize>,
    triangles: Vec<[usize; 3]>,
}

impl MeshBuilder {
    fn with_capacity(facets: usize) -> Self {
        Self {
            points: Vec::with_capacity(facets),
            lookup: HashMap::with_capacity(facets),
            triangles: Vec::with_capacity(facets),
        }
    }

    fn vertex(&mut self, p: Point3<f64>) -> usize {
        let key = [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];
        let points = &mut self.points;
        *self.lookup.entry(key).or_insert_with(|| {
            points.push(p);
            points.len() - 1
        })
    }

    fn add_facet(&mut self, facet: Facet) {
        let [a, b, c] = facet;
        let tri = [self.vertex(a), self.vertex(b), self.vertex(c)];
        self.triangles.push(tri);
    }

    fn build(self) -> RenderResult<Mesh> {
        Mesh::from_points(&self.points, self.triangles)
    }
}

fn read_f32(data: &[u8], offset: usize) -> f64 {
    f32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]]) as f64
}

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> RenderResult<Mesh> {
    if data.len() < 84 {
        return Err(RenderError::Stl("file too small to be a valid STL".to_string()));
    }

    // Skip 80-byte header
    let data = &data[80..];

    // Read triangle count (4 bytes, little-endian)
    let triangle_count = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;

    let mut builder = MeshBuilder::with_capacity(triangle_count);
    let mut offset = 4;

    for t in 0..triangle_count {
        if offset + 50 > data.len() {
            return Err(RenderError::Stl(format!(
                "unexpected end of file in triangle {} of {}",
                t, triangle_count
            )));
        }

        // Facet normals are recomputed from winding, so skip the stored one
        offset += 12;

        let mut facet = [Point3::origin(); 3];
        for corner in &mut facet {
            *corner = Point3::new(
                read_f32(data, offset),
                read_f32(data, offset + 4),
                read_f32(data, offset + 8),
            );
            offset += 12;
        }

        // Skip attribute byte count (2 bytes)
        offset += 2;

        builder.add_facet(facet);
    }

    builder.build()
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> RenderResult<Mesh> {
    match parse_ascii_stl_impl(input) {
        Ok((_, facets)) => {
            let mut builder = MeshBuilder::with_capacity(facets.len());
            for facet in facets {
                builder.add_facet(facet);
            }
            builder.build()
        }
        Err(e) => Err(RenderError::Stl(format!("invalid ASCII STL: {:?}", e))),
    }
}

fn parse_ascii_stl_impl(input: &str) -> IResult<&str, Vec<Facet>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _) = take_till(|c| c == '\n')(input)?; // Optional name
    let (input, facets) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    Ok((input, facets))
}

fn parse_facet(input: &str) -> IResult<&str, Facet> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, _normal) = parse_point(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input)?;
    let (input, v2) = parse_vertex(input)?;
    let (input, v3) = parse_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, [v1, v2, v3]))
}

fn parse_vertex(input: &str) -> IResult<&str, Point3<f64>> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    parse_point(input)
}

fn parse_point(input: &str) -> IResult<&str, Point3<f64>> {
    let (input, _) = multispace0(input)?;
    let (input, x) = double(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = double(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = double(input)?;
    Ok((input, Point3::new(x, y, z)))
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> RenderResult<Mesh> {
    // Binary files may also start with "solid", so fall back on failure
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }

    parse_binary_stl(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TETRA: &str = "solid tetra
  facet normal 0 0 -1
    outer loop
      vertex 0 0 0
      vertex 0 1 0
      vertex 1 0 0
    endloop
  endfacet
  facet normal 0 -1 0
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 0 1
    endloop
  endfacet
  facet normal -1 0 0
    outer loop
      vertex 0 0 0
      vertex 0 0 1
      vertex 0 1 0
    endloop
  endfacet
  facet normal 1 1 1
    outer loop
      vertex 1 0 0
      vertex 0 1 0
      vertex 0 0 1
    endloop
  endfacet
endsolid tetra
";

    fn binary_stl(facets: &[[[f32; 3]; 3]]) -> Vec<u8> {
        let mut data = vec![0u8; 80];
        data.extend_from_slice(&(facets.len() as u32).to_le_bytes());
        for facet in facets {
            data.extend_from_slice(&[0u8; 12]);
            for corner in facet {
                for c in corner {
                    data.extend_from_slice(&c.to_le_bytes());
                }
            }
            data.extend_from_slice(&[0u8; 2]);
        }
        data
    }

    #[test]
    fn test_parse_binary_header() {
        let mut data = vec![0u8; 84];
        // Set triangle count to 0
        data[80..84].copy_from_slice(&0u32.to_le_bytes());

        let mesh = parse_binary_stl(&data).unwrap();
        assert_eq!(mesh.triangle_count(), 0);
        assert!(matches!(parse_binary_stl(&data[..40]), Err(RenderError::Stl(_))));
    }

    #[test]
    fn test_parse_binary_shares_vertices() {
        let data = binary_stl(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        ]);
        let mesh = parse_stl(&data).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertices().len(), 4);
        assert_eq!(mesh.triangles()[1], [1, 3, 2]);
    }

    #[test]
    fn test_truncated_binary() {
        let mut data = binary_stl(&[[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]]);
        data.truncate(100);
        assert!(matches!(parse_stl(&data), Err(RenderError::Stl(_))));
    }

    #[test]
    fn test_parse_ascii() {
        let mesh = parse_stl(TETRA.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(mesh.vertices().len(), 4);
        assert_eq!(mesh.triangles()[0], [0, 1, 2]);
    }
}
