// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! JSON chunk encoding.
//!
//! Produces a GeoJSON-flavoured document per chunk for clients that cannot
//! read the binary layout:
//!
//! ```json
//! {
//!   "id": "A1",
//!   "count": 1,
//!   "index": 0,
//!   "features": [{
//!     "type": "Feature",
//!     "geometry": { "type": "LineString", "coordinates": [[5.0, 52.0], [5.1, 52.1]] },
//!     "properties": { "content": "...", "sourceTimestamp": 0, ... }
//!   }]
//! }
//! ```
//!
//! The property list is declared field by field below.

use serde::{Deserialize, Serialize};

use super::ChunkEncoder;
use crate::core::{ChunkFormat, Result, TrackError};
use crate::types::{Chunk, Point, Segment};

#[derive(Debug, Serialize, Deserialize)]
struct JsonChunk {
    id: String,
    count: u32,
    index: u32,
    features: Vec<JsonFeature>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonFeature {
    #[serde(rename = "type")]
    kind: String,
    geometry: JsonGeometry,
    properties: JsonProperties,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonGeometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: [[f64; 2]; 2],
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonProperties {
    content: String,
    source_timestamp: i64,
    destination_timestamp: i64,
    distance_km: f64,
    cumulative_distance_km: f64,
}

impl From<&Segment> for JsonFeature {
    fn from(segment: &Segment) -> Self {
        Self {
            kind: "Feature".to_string(),
            geometry: JsonGeometry {
                kind: "LineString".to_string(),
                coordinates: [
                    [segment.source.longitude, segment.source.latitude],
                    [segment.target.longitude, segment.target.latitude],
                ],
            },
            properties: JsonProperties {
                content: segment.content.clone(),
                source_timestamp: segment.source_timestamp,
                destination_timestamp: segment.destination_timestamp,
                distance_km: segment.distance_km,
                cumulative_distance_km: segment.cumulative_distance_km,
            },
        }
    }
}

impl From<JsonFeature> for Segment {
    fn from(feature: JsonFeature) -> Self {
        let [source, target] = feature.geometry.coordinates;
        Segment {
            source: Point::new(source[0], source[1]),
            target: Point::new(target[0], target[1]),
            content: feature.properties.content,
            source_timestamp: feature.properties.source_timestamp,
            destination_timestamp: feature.properties.destination_timestamp,
            distance_km: feature.properties.distance_km,
            cumulative_distance_km: feature.properties.cumulative_distance_km,
        }
    }
}

/// JSON chunk encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonChunkEncoder {
    pretty: bool,
}

impl JsonChunkEncoder {
    /// Create a compact JSON encoder.
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Create an encoder that pretty-prints.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl ChunkEncoder for JsonChunkEncoder {
    fn encode(&self, chunk: &Chunk) -> Result<Vec<u8>> {
        encode_chunk_json(chunk, self.pretty).map(String::into_bytes)
    }

    fn format(&self) -> ChunkFormat {
        ChunkFormat::Json
    }
}

/// Encode a chunk as a JSON document.
pub fn encode_chunk_json(chunk: &Chunk, pretty: bool) -> Result<String> {
    let doc = JsonChunk {
        id: chunk.individual_local_identifier.clone(),
        count: chunk.count,
        index: chunk.index,
        features: chunk.segments.iter().map(JsonFeature::from).collect(),
    };

    let text = if pretty {
        serde_json::to_string_pretty(&doc)
    } else {
        serde_json::to_string(&doc)
    };
    text.map_err(|e| TrackError::encode("json", e.to_string()))
}

/// Decode a chunk from its JSON document.
pub fn decode_chunk_json(data: &[u8]) -> Result<Chunk> {
    let doc: JsonChunk = serde_json::from_slice(data)?;
    Ok(Chunk {
        individual_local_identifier: doc.id,
        count: doc.count,
        index: doc.index,
        segments: doc.features.into_iter().map(Segment::from).collect(),
    })
}
