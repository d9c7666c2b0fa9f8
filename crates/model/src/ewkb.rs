//! Encoding of geometries to and from EWKB, the SRID-tagged binary form the
//! geometry columns round-trip. The writer always emits little-endian with
//! an SRID; the reader accepts both byte orders, with or without an SRID,
//! so plain WKB from other writers still decodes.

use geo::{Coord, LineString, Point, Polygon};

use crate::geometry::{Geometry, GeometryError};

/// WGS84, the SRID every persisted geometry is tagged with.
pub const SRID_WGS84: u32 = 4326;

const TYPE_POINT: u32 = 1;
const TYPE_LINESTRING: u32 = 2;
const TYPE_POLYGON: u32 = 3;

const FLAG_Z: u32 = 0x8000_0000;
const FLAG_M: u32 = 0x4000_0000;
const FLAG_SRID: u32 = 0x2000_0000;

pub fn encode(geometry: &Geometry, srid: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(32);
    match geometry {
        Geometry::Point(point) => {
            write_header(&mut out, TYPE_POINT, srid);
            write_coord(&mut out, point.0);
        }
        Geometry::LineString(line) => {
            write_header(&mut out, TYPE_LINESTRING, srid);
            write_ring(&mut out, line);
        }
        Geometry::Polygon(polygon) => {
            write_header(&mut out, TYPE_POLYGON, srid);
            let ring_count = 1 + polygon.interiors().len() as u32;
            out.extend_from_slice(&ring_count.to_le_bytes());
            write_ring(&mut out, polygon.exterior());
            for interior in polygon.interiors() {
                write_ring(&mut out, interior);
            }
        }
    }
    out
}

pub fn decode(data: &[u8]) -> Result<Geometry, GeometryError> {
    let mut reader = Reader::new(data);
    let geometry = read_geometry(&mut reader)?;
    if !reader.is_empty() {
        return Err(malformed("trailing bytes after geometry"));
    }
    Ok(geometry)
}

/// Some drivers hand geometry columns back as hex text rather than raw
/// bytes. Decodes the hex envelope, then the binary.
pub fn decode_hex(text: &str) -> Result<Geometry, GeometryError> {
    let data = hex::decode(text.trim())
        .map_err(|why| GeometryError::MalformedEwkb(why.to_string()))?;
    decode(&data)
}

fn write_header(out: &mut Vec<u8>, type_code: u32, srid: u32) {
    out.push(1); // little endian
    out.extend_from_slice(&(type_code | FLAG_SRID).to_le_bytes());
    out.extend_from_slice(&srid.to_le_bytes());
}

fn write_coord(out: &mut Vec<u8>, coord: Coord<f64>) {
    out.extend_from_slice(&coord.x.to_le_bytes());
    out.extend_from_slice(&coord.y.to_le_bytes());
}

fn write_ring(out: &mut Vec<u8>, line: &LineString<f64>) {
    out.extend_from_slice(&(line.0.len() as u32).to_le_bytes());
    for coord in line.coords() {
        write_coord(out, *coord);
    }
}

fn read_geometry(reader: &mut Reader<'_>) -> Result<Geometry, GeometryError> {
    reader.read_byte_order()?;
    let raw_type = reader.read_u32()?;
    if raw_type & (FLAG_Z | FLAG_M) != 0 {
        return Err(malformed("geometries with Z or M dimensions are not supported"));
    }
    if raw_type & FLAG_SRID != 0 {
        let _srid = reader.read_u32()?;
    }
    match raw_type & 0xFFFF {
        TYPE_POINT => Ok(Geometry::Point(Point::from(reader.read_coord()?))),
        TYPE_LINESTRING => Ok(Geometry::LineString(reader.read_ring()?)),
        TYPE_POLYGON => {
            let ring_count = reader.read_u32()?;
            if ring_count == 0 {
                return Err(malformed("polygon has no rings"));
            }
            let exterior = reader.read_ring()?;
            let mut interiors = Vec::with_capacity(ring_count as usize - 1);
            for _ in 1..ring_count {
                interiors.push(reader.read_ring()?);
            }
            Ok(Geometry::Polygon(Polygon::new(exterior, interiors)))
        }
        other => Err(malformed(&format!("unsupported geometry type code {}", other))),
    }
}

fn malformed(why: &str) -> GeometryError {
    GeometryError::MalformedEwkb(why.to_owned())
}

struct Reader<'a> {
    data: &'a [u8],
    position: usize,
    little_endian: bool,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            little_endian: true,
        }
    }

    fn is_empty(&self) -> bool {
        self.position == self.data.len()
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], GeometryError> {
        let end = self.position + count;
        if end > self.data.len() {
            return Err(malformed("unexpected end of input"));
        }
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    fn read_byte_order(&mut self) -> Result<(), GeometryError> {
        match self.take(1)?[0] {
            0 => self.little_endian = false,
            1 => self.little_endian = true,
            other => {
                return Err(malformed(&format!("invalid byte order marker {}", other)))
            }
        }
        Ok(())
    }

    fn read_u32(&mut self) -> Result<u32, GeometryError> {
        let bytes: [u8; 4] = self.take(4)?.try_into().expect("took 4 bytes");
        Ok(if self.little_endian {
            u32::from_le_bytes(bytes)
        } else {
            u32::from_be_bytes(bytes)
        })
    }

    fn read_f64(&mut self) -> Result<f64, GeometryError> {
        let bytes: [u8; 8] = self.take(8)?.try_into().expect("took 8 bytes");
        Ok(if self.little_endian {
            f64::from_le_bytes(bytes)
        } else {
            f64::from_be_bytes(bytes)
        })
    }

    fn read_coord(&mut self) -> Result<Coord<f64>, GeometryError> {
        let x = self.read_f64()?;
        let y = self.read_f64()?;
        Ok(Coord { x, y })
    }

    fn read_ring(&mut self) -> Result<LineString<f64>, GeometryError> {
        let count = self.read_u32()? as usize;
        // guards against a corrupt count asking for gigabytes
        if count > self.data.len() / 16 + 1 {
            return Err(malformed("coordinate count exceeds input length"));
        }
        let mut coords = Vec::with_capacity(count);
        for _ in 0..count {
            coords.push(self.read_coord()?);
        }
        Ok(LineString::new(coords))
    }
}
