//! Wire format for client ↔ renderer communication.
//!
//! Requests travel as JSON text frames; tile responses come back as JSON
//! with the pixel data inlined as base64 PNG. A raw binary frame is the
//! degenerate full-frame mode: one `width*height*4` RGBA buffer replacing
//! the whole canvas.

use serde::{Deserialize, Serialize};

use juliascope_core::{Complex, FractalParams, TileKey, Viewport};

/// Render parameters as transmitted, including the canvas geometry and the
/// LOD this particular batch should be computed at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireParams {
    pub c: Complex,
    pub max_iterations: u32,
    pub coloring: u32,
    pub lod: u32,
    pub width: u32,
    pub height: u32,
}

/// Viewport as transmitted: centre and zoom only — the canvas dimensions
/// ride in [`WireParams`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireViewport {
    pub center: Complex,
    pub zoom: f64,
}

/// An outbound tile batch (client → renderer).
///
/// `tiles` lists the requested grid keys as `"<x>,<y>"`; their LOD is
/// implied by `params.lod`. An empty `tiles` list asks for a single
/// full-frame buffer instead of discrete tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileRequest {
    pub params: WireParams,
    pub viewport: WireViewport,
    pub tiles: Vec<String>,
}

impl TileRequest {
    /// Build a request for `keys` at `lod`, carrying the current viewport
    /// and render parameters.
    pub fn new(viewport: &Viewport, params: &FractalParams, lod: u32, keys: &[TileKey]) -> Self {
        Self {
            params: WireParams {
                c: params.c,
                max_iterations: params.max_iterations,
                coloring: params.coloring,
                lod,
                width: viewport.width,
                height: viewport.height,
            },
            viewport: WireViewport {
                center: viewport.center,
                zoom: viewport.zoom,
            },
            tiles: keys.iter().map(|k| format!("{},{}", k.x, k.y)).collect(),
        }
    }

    /// The tile keys this request names, at the request's LOD.
    pub fn keys(&self) -> Vec<TileKey> {
        self.tiles
            .iter()
            .filter_map(|s| {
                let (x, y) = s.split_once(',')?;
                Some(TileKey::new(
                    x.trim().parse().ok()?,
                    y.trim().parse().ok()?,
                    self.params.lod,
                ))
            })
            .collect()
    }
}

/// An inbound message (renderer → client), distinguished by its `type`
/// field. Anything unrecognized lands on `Unknown` and takes the
/// malformed-message path instead of silently vanishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// One rendered tile; `image` is base64-encoded PNG.
    Tile {
        x: i64,
        y: i64,
        lod: u32,
        image: String,
    },

    /// Renderer-side failure report for a batch; informational only.
    Error { message: String },

    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_formats_tile_keys() {
        let vp = Viewport::new(Complex::new(-0.5, 0.0), 250.0, 800, 600).unwrap();
        let params = FractalParams::default();
        let keys = vec![TileKey::new(-1, 0, 4), TileKey::new(2, -3, 4)];

        let req = TileRequest::new(&vp, &params, 4, &keys);
        assert_eq!(req.tiles, vec!["-1,0", "2,-3"]);
        assert_eq!(req.params.lod, 4);
        assert_eq!(req.params.width, 800);
        assert_eq!(req.keys(), keys);
    }

    #[test]
    fn request_serializes_to_expected_shape() {
        let vp = Viewport::new(Complex::ZERO, 100.0, 640, 480).unwrap();
        let params = FractalParams::default();
        let req = TileRequest::new(&vp, &params, 1, &[TileKey::new(0, 0, 1)]);

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["params"]["max_iterations"], 256);
        assert_eq!(json["viewport"]["zoom"], 100.0);
        assert_eq!(json["tiles"][0], "0,0");
    }

    #[test]
    fn tile_message_round_trip() {
        let msg = ServerMessage::Tile {
            x: 3,
            y: -1,
            lod: 1,
            image: "aGVsbG8=".into(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"tile\""));
        assert_eq!(serde_json::from_str::<ServerMessage>(&json).unwrap(), msg);
    }

    #[test]
    fn unrecognized_type_maps_to_unknown() {
        let msg: ServerMessage =
            serde_json::from_str(r#"{"type":"telemetry","uptime":12}"#).unwrap();
        assert_eq!(msg, ServerMessage::Unknown);
    }

    #[test]
    fn missing_fields_are_malformed() {
        assert!(serde_json::from_str::<ServerMessage>(r#"{"type":"tile","x":1}"#).is_err());
    }
}
