//! Filter graph construction for chroma-key compositing.

use crate::config::EncoderSettings;

/// Chroma key parameters shared by every green-screen layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChromaKey {
    /// Key color as an encoder color literal (e.g. "0x00FF00").
    pub color: String,
    /// Similarity tolerance.
    pub similarity: f64,
    /// Blend tolerance.
    pub blend: f64,
}

impl ChromaKey {
    /// Build from encoder settings.
    pub fn from_settings(settings: &EncoderSettings) -> Self {
        Self {
            color: settings.key_color.clone(),
            similarity: settings.key_similarity,
            blend: settings.key_blend,
        }
    }

    /// Render the chromakey filter expression.
    fn filter_expr(&self) -> String {
        format!(
            "chromakey={}:{}:{}",
            self.color, self.similarity, self.blend
        )
    }
}

/// Build the sequential key-and-overlay filter graph for `layer_count`
/// inputs.
///
/// Input 0 is the opaque background. Every further input is keyed and
/// overlaid onto the accumulated frame, in order:
///
/// ```text
/// [1:v]chromakey=...[l1];[0:v][l1]overlay[m1];
/// [2:v]chromakey=...[l2];[m1][l2]overlay[m2];...
/// ```
///
/// The final overlay is labeled `[out]` for mapping. Order matters and is
/// preserved front-to-back.
pub fn build_overlay_graph(layer_count: usize, key: &ChromaKey) -> String {
    assert!(layer_count >= 2, "composition needs at least two layers");

    let mut parts = Vec::new();
    let mut acc = "[0:v]".to_string();

    for i in 1..layer_count {
        let keyed = format!("[l{}]", i);
        parts.push(format!("[{}:v]{}{}", i, key.filter_expr(), keyed));

        let merged = if i == layer_count - 1 {
            "[out]".to_string()
        } else {
            format!("[m{}]", i)
        };
        parts.push(format!("{}{}overlay{}", acc, keyed, merged));
        acc = merged;
    }

    parts.join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ChromaKey {
        ChromaKey {
            color: "0x00FF00".to_string(),
            similarity: 0.2,
            blend: 0.1,
        }
    }

    #[test]
    fn five_layer_graph_has_four_overlays() {
        let graph = build_overlay_graph(5, &key());
        assert_eq!(graph.matches("overlay").count(), 4);
        assert_eq!(graph.matches("chromakey").count(), 4);
        assert!(graph.ends_with("overlay[out]"));
    }

    #[test]
    fn graph_is_sequential() {
        let graph = build_overlay_graph(5, &key());
        assert_eq!(
            graph,
            "[1:v]chromakey=0x00FF00:0.2:0.1[l1];[0:v][l1]overlay[m1];\
             [2:v]chromakey=0x00FF00:0.2:0.1[l2];[m1][l2]overlay[m2];\
             [3:v]chromakey=0x00FF00:0.2:0.1[l3];[m2][l3]overlay[m3];\
             [4:v]chromakey=0x00FF00:0.2:0.1[l4];[m3][l4]overlay[out]"
        );
    }

    #[test]
    fn two_layer_graph_maps_straight_to_out() {
        let graph = build_overlay_graph(2, &key());
        assert_eq!(
            graph,
            "[1:v]chromakey=0x00FF00:0.2:0.1[l1];[0:v][l1]overlay[out]"
        );
    }

    #[test]
    fn key_color_is_configurable() {
        let custom = ChromaKey {
            color: "0x0000FF".to_string(),
            similarity: 0.3,
            blend: 0.05,
        };
        let graph = build_overlay_graph(3, &custom);
        assert!(graph.contains("chromakey=0x0000FF:0.3:0.05"));
        assert!(!graph.contains("0x00FF00"));
    }
}
