//! The JSON digest and how it is written.

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::PipelineError;
use crate::parser::outline::Outline;

pub const OUTPUT_FILE: &str = "output.json";

const DIGEST_INDENT: &[u8] = b"    ";
const OUTLINE_INDENT: &[u8] = b"  ";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub input_documents: Vec<String>,
    pub persona: String,
    pub job_to_be_done: String,
    pub processing_timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedSection {
    pub document: String,
    pub section_title: String,
    pub importance_rank: usize,
    pub page_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsectionAnalysis {
    pub document: String,
    pub refined_text: String,
    pub page_number: u32,
}

/// Both arrays are in rank order and index-aligned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Digest {
    pub metadata: Metadata,
    pub extracted_sections: Vec<ExtractedSection>,
    pub subsection_analysis: Vec<SubsectionAnalysis>,
}

/// Local time, ISO-8601 with microseconds and no offset.
pub fn local_timestamp() -> String {
    Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Serialize with the given indent. Non-ASCII is kept as-is.
pub fn to_json<T: Serialize>(value: &T, indent: &[u8]) -> Result<String, PipelineError> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent));
    value.serialize(&mut ser)?;
    String::from_utf8(buf)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
}

/// Write `<output_dir>/output.json`, creating the directory if needed.
/// Serializes fully before touching the filesystem.
pub fn write_digest(output_dir: &Path, digest: &Digest) -> Result<PathBuf, PipelineError> {
    let body = to_json(digest, DIGEST_INDENT)?;
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(OUTPUT_FILE);
    std::fs::write(&path, body)?;
    Ok(path)
}

/// Write `<output_dir>/<stem>.json`.
pub fn write_outline(output_dir: &Path, stem: &str, outline: &Outline) -> Result<PathBuf, PipelineError> {
    let body = to_json(outline, OUTLINE_INDENT)?;
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{}.json", stem));
    std::fs::write(&path, body)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest() -> Digest {
        Digest {
            metadata: Metadata {
                input_documents: vec!["Côte d'Azur.pdf".into()],
                persona: "Travel Planner".into(),
                job_to_be_done: "Plan a trip".into(),
                processing_timestamp: "2025-01-01T00:00:00.000000".into(),
            },
            extracted_sections: vec![ExtractedSection {
                document: "Côte d'Azur.pdf".into(),
                section_title: "Beaches".into(),
                importance_rank: 1,
                page_number: 2,
            }],
            subsection_analysis: vec![SubsectionAnalysis {
                document: "Côte d'Azur.pdf".into(),
                refined_text: "Beaches of Nice".into(),
                page_number: 2,
            }],
        }
    }

    #[test]
    fn four_space_indent_and_field_order() {
        let json = to_json(&digest(), DIGEST_INDENT).unwrap();
        assert!(json.starts_with("{\n    \"metadata\": {\n        \"input_documents\": ["));
        let meta = json.find("\"metadata\"").unwrap();
        let sections = json.find("\"extracted_sections\"").unwrap();
        let analysis = json.find("\"subsection_analysis\"").unwrap();
        assert!(meta < sections && sections < analysis);
        assert!(json.find("\"section_title\"").unwrap() < json.find("\"importance_rank\"").unwrap());
    }

    #[test]
    fn non_ascii_preserved() {
        let json = to_json(&digest(), DIGEST_INDENT).unwrap();
        assert!(json.contains("Côte d'Azur.pdf"));
        assert!(!json.contains("\\u"));
    }

    #[test]
    fn written_text_parses_back_unchanged() {
        let json = to_json(&digest(), DIGEST_INDENT).unwrap();
        let back: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, serde_json::to_value(digest()).unwrap());
        assert_eq!(back["metadata"]["input_documents"][0], "Côte d'Azur.pdf");
    }

    #[test]
    fn writes_into_created_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let path = write_digest(&out, &digest()).unwrap();
        assert_eq!(path, out.join(OUTPUT_FILE));
        let back: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["extracted_sections"][0]["importance_rank"], 1);
    }

    #[test]
    fn timestamp_shape() {
        let ts = local_timestamp();
        assert_eq!(ts.len(), "2025-01-01T00:00:00.000000".len());
        assert_eq!(&ts[10..11], "T");
    }
}
