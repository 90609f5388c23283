//! Canned segmentation payloads and raw case text for tests

use serde_json::json;

pub struct TestFixtures;

impl TestFixtures {
    /// Raw case text in the shape the splitter receives
    pub const RAW_CASE: &'static str = "Liver: Bright liver, cyst S7 5.3 x 2.9 mm\n\
         GB: NP\nPancreas: MPD 0.7 mm\nSpleen: NP\nKidney: Right MP stone 3.9 mm\n\
         Aorta: NP\nThyroid: nodule 4 mm\nComment: f/u in 6 months";

    /// Segmentation JSON with every canonical section carrying `text`,
    /// no dynamic sections and no note
    pub fn uniform_segmentation(text: &str) -> String {
        json!({
            "liver": text,
            "gb": text,
            "pancreas": text,
            "spleen": text,
            "kidney": text,
            "aorta": text,
            "others": [],
            "comment": ""
        })
        .to_string()
    }

    /// Segmentation JSON with explicit canonical fields (unspecified sections
    /// stay empty), dynamic entries and a note
    pub fn segmentation(
        fields: &[(&str, &str)],
        others: &[(&str, &str)],
        comment: &str,
    ) -> String {
        let mut map = serde_json::Map::new();
        for key in ["liver", "gb", "pancreas", "spleen", "kidney", "aorta"] {
            map.insert(key.to_string(), json!(""));
        }
        for (key, value) in fields {
            map.insert(key.to_string(), json!(value));
        }
        let others: Vec<serde_json::Value> = others
            .iter()
            .map(|(organ, findings)| json!({ "organ": organ, "findings": findings }))
            .collect();
        map.insert("others".to_string(), json!(others));
        map.insert("comment".to_string(), json!(comment));
        serde_json::Value::Object(map).to_string()
    }
}
