//! Wire types for the dataset explorer API
//!
//! Upload responses carry an `analysis_results` object whose shape depends on
//! the upload category. It is decoded into [`AnalysisResult`] by matching on
//! the record's `category` field; anything that does not fit the expected
//! shape is kept verbatim as [`AnalysisResult::Unknown`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Categories
// ============================================================================

/// Backend processing path for an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Medical,
    Xray,
    Traffic,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Medical => "medical",
            Category::Xray => "xray",
            Category::Traffic => "traffic",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown category '{0}': must be 'medical', 'xray' or 'traffic'")]
pub struct ParseCategoryError(String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "medical" => Ok(Category::Medical),
            "xray" | "x-ray" => Ok(Category::Xray),
            "traffic" => Ok(Category::Traffic),
            _ => Err(ParseCategoryError(s.to_string())),
        }
    }
}

// ============================================================================
// Upload responses
// ============================================================================

/// Body returned by `POST /upload/{category}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub uploads: Vec<UploadRecord>,
}

/// One stored file as reported by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawUploadRecord")]
pub struct UploadRecord {
    pub upload_id: String,
    pub original_filename: String,
    pub stored_filename: Option<String>,
    pub category: String,
    pub file_size: Option<u64>,
    pub processing_status: String,
    pub analysis_results: AnalysisResult,
}

#[derive(Deserialize)]
struct RawUploadRecord {
    upload_id: String,
    original_filename: String,
    #[serde(default)]
    stored_filename: Option<String>,
    category: String,
    #[serde(default)]
    file_size: Option<u64>,
    #[serde(default)]
    processing_status: String,
    #[serde(default)]
    analysis_results: Value,
}

impl From<RawUploadRecord> for UploadRecord {
    fn from(raw: RawUploadRecord) -> Self {
        let analysis_results = AnalysisResult::decode(&raw.category, raw.analysis_results);
        Self {
            upload_id: raw.upload_id,
            original_filename: raw.original_filename,
            stored_filename: raw.stored_filename,
            category: raw.category,
            file_size: raw.file_size,
            processing_status: raw.processing_status,
            analysis_results,
        }
    }
}

/// Category-specific analysis payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Xray(XrayAnalysis),
    Traffic(TrafficAnalysis),
    Medical(MedicalAnalysis),
    Unknown(Value),
}

impl AnalysisResult {
    /// Decode a raw payload according to the category it was produced for.
    pub fn decode(category: &str, value: Value) -> Self {
        match category {
            "xray" => serde_json::from_value(value.clone())
                .map(AnalysisResult::Xray)
                .unwrap_or(AnalysisResult::Unknown(value)),
            "traffic" => serde_json::from_value(value.clone())
                .map(AnalysisResult::Traffic)
                .unwrap_or(AnalysisResult::Unknown(value)),
            "medical" => serde_json::from_value(value.clone())
                .map(AnalysisResult::Medical)
                .unwrap_or(AnalysisResult::Unknown(value)),
            _ => AnalysisResult::Unknown(value),
        }
    }

    /// One-line human readable description
    pub fn summary(&self) -> String {
        match self {
            AnalysisResult::Xray(xray) => {
                let detection = &xray.pneumonia_detection;
                format!(
                    "Pneumonia detection: {} ({:.1}% confidence, model {})",
                    detection.prediction,
                    detection.confidence * 100.0,
                    detection.model_version
                )
            }
            AnalysisResult::Traffic(traffic) if traffic.detected_objects.is_empty() => {
                "Detected objects: none".to_string()
            }
            AnalysisResult::Traffic(traffic) => {
                let objects: Vec<String> = traffic
                    .detected_objects
                    .iter()
                    .map(|o| format!("{} x{} ({:.0}%)", o.label(), o.count, o.confidence * 100.0))
                    .collect();
                format!("Detected objects: {}", objects.join(", "))
            }
            AnalysisResult::Medical(medical) => format!(
                "Medical image: {} ({})",
                medical.format.as_deref().unwrap_or("unknown format"),
                if medical.anonymized {
                    "anonymized"
                } else {
                    "not anonymized"
                }
            ),
            AnalysisResult::Unknown(Value::Null) => "No analysis available".to_string(),
            AnalysisResult::Unknown(value) => format!("Analysis: {}", value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XrayAnalysis {
    #[serde(default)]
    pub image_type: Option<String>,
    #[serde(default)]
    pub orientation: Option<String>,
    pub pneumonia_detection: PneumoniaDetection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PneumoniaDetection {
    pub confidence: f64,
    pub prediction: String,
    pub model_version: String,
}

impl PneumoniaDetection {
    pub fn is_normal(&self) -> bool {
        self.prediction.eq_ignore_ascii_case("normal")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficAnalysis {
    #[serde(default)]
    pub image_type: Option<String>,
    pub detected_objects: Vec<DetectedObject>,
    #[serde(default)]
    pub gps_coordinates: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: u32,
    pub confidence: f64,
}

impl DetectedObject {
    /// `traffic_sign` -> `traffic sign`
    pub fn label(&self) -> String {
        self.kind.replace('_', " ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalAnalysis {
    #[serde(default)]
    pub image_type: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub anonymized: bool,
}

// ============================================================================
// Dataset reads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    pub source_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub total_images: Option<u64>,
    #[serde(default)]
    pub categories: Option<DatasetCategories>,
}

/// Either named categories or just a class count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatasetCategories {
    Names(Vec<String>),
    Count(u64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct DatasetList {
    pub datasets: Vec<Dataset>,
}

/// Slice of a categorical distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSlice {
    pub name: String,
    pub value: u64,
    pub color: String,
}

impl DistributionSlice {
    fn new(name: &str, value: u64, color: &str) -> Self {
        Self {
            name: name.to_string(),
            value,
            color: color.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChestXrayStats {
    pub total_images: u64,
    pub normal_cases: u64,
    pub pneumonia_cases: u64,
    pub distribution: Vec<DistributionSlice>,
}

impl ChestXrayStats {
    /// Published figures for the Kaggle chest X-ray set, used when the
    /// backend cannot be reached.
    pub fn reference() -> Self {
        Self {
            total_images: 5856,
            normal_cases: 1583,
            pneumonia_cases: 4273,
            distribution: vec![
                DistributionSlice::new("Normal", 1583, "#10b981"),
                DistributionSlice::new("Pneumonia", 4273, "#ef4444"),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TinyImageNetStats {
    pub total_images: u64,
    pub total_classes: u64,
    pub training_images: u64,
    pub validation_images: u64,
    pub test_images: u64,
    pub distribution: Vec<DistributionSlice>,
}

impl TinyImageNetStats {
    /// Published figures for Tiny-ImageNet-200
    pub fn reference() -> Self {
        Self {
            total_images: 120_000,
            total_classes: 200,
            training_images: 100_000,
            validation_images: 10_000,
            test_images: 10_000,
            distribution: vec![
                DistributionSlice::new("Training", 100_000, "#3b82f6"),
                DistributionSlice::new("Validation", 10_000, "#8b5cf6"),
                DistributionSlice::new("Test", 10_000, "#f59e0b"),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSample {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub category: Option<String>,
    pub file_size: u64,
    pub width: u32,
    pub height: u32,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SampleList {
    pub samples: Vec<DatasetSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageClass {
    pub id: String,
    pub name: String,
    pub wordnet_id: String,
    pub sample_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ClassList {
    pub classes: Vec<ImageClass>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KittiSequence {
    pub id: String,
    pub name: String,
    pub location: String,
    pub scenario: String,
    pub frame_count: u64,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SequenceList {
    pub sequences: Vec<KittiSequence>,
}

/// One Tiny-ImageNet image within a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TinyImageNetSample {
    pub id: String,
    pub filename: String,
    pub class_id: String,
    pub width: u32,
    pub height: u32,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TinyImageNetSampleList {
    pub samples: Vec<TinyImageNetSample>,
}

/// A KITTI sequence with its sensor inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KittiSequenceDetail {
    #[serde(flatten)]
    pub sequence: KittiSequence,
    #[serde(default)]
    pub sensors: Vec<String>,
    #[serde(default)]
    pub data_types: Vec<KittiDataType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KittiDataType {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KittiFrame {
    pub id: String,
    pub sequence_id: String,
    pub frame_number: u64,
    /// Seconds from the start of the sequence
    pub timestamp: f64,
    pub camera_url: String,
    pub lidar_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct FrameList {
    pub frames: Vec<KittiFrame>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(category: &str, analysis: Value) -> UploadRecord {
        serde_json::from_value(json!({
            "upload_id": "u-1",
            "original_filename": "scan.jpg",
            "stored_filename": "u-1.jpg",
            "category": category,
            "file_size": 2048,
            "processing_status": "completed",
            "analysis_results": analysis
        }))
        .unwrap()
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("xray".parse::<Category>().unwrap(), Category::Xray);
        assert_eq!("Traffic".parse::<Category>().unwrap(), Category::Traffic);
        assert!("kitti".parse::<Category>().is_err());
        assert_eq!(Category::Medical.to_string(), "medical");
    }

    #[test]
    fn test_decode_xray_analysis() {
        let rec = record(
            "xray",
            json!({
                "image_type": "chest_xray",
                "orientation": "corrected",
                "pneumonia_detection": {
                    "confidence": 0.85,
                    "prediction": "normal",
                    "model_version": "v1.0"
                }
            }),
        );

        match &rec.analysis_results {
            AnalysisResult::Xray(xray) => {
                assert!(xray.pneumonia_detection.is_normal());
                assert_eq!(xray.pneumonia_detection.model_version, "v1.0");
            }
            other => panic!("Expected xray analysis, got {:?}", other),
        }
        assert_eq!(
            rec.analysis_results.summary(),
            "Pneumonia detection: normal (85.0% confidence, model v1.0)"
        );
    }

    #[test]
    fn test_decode_traffic_analysis() {
        let rec = record(
            "traffic",
            json!({
                "image_type": "traffic_scene",
                "detected_objects": [
                    {"type": "vehicle", "count": 3, "confidence": 0.92},
                    {"type": "traffic_sign", "count": 1, "confidence": 0.88}
                ],
                "gps_coordinates": null
            }),
        );

        assert_eq!(
            rec.analysis_results.summary(),
            "Detected objects: vehicle x3 (92%), traffic sign x1 (88%)"
        );
    }

    #[test]
    fn test_mismatched_shape_is_kept_as_unknown() {
        let payload = json!({"image_type": "chest_xray"});
        let rec = record("xray", payload.clone());
        assert_eq!(rec.analysis_results, AnalysisResult::Unknown(payload));
    }

    #[test]
    fn test_unknown_category_and_missing_analysis() {
        let rec: UploadRecord = serde_json::from_value(json!({
            "upload_id": "u-2",
            "original_filename": "frame.png",
            "category": "traffic_sequence",
            "processing_status": "completed"
        }))
        .unwrap();

        assert_eq!(rec.analysis_results, AnalysisResult::Unknown(Value::Null));
        assert_eq!(rec.analysis_results.summary(), "No analysis available");
    }

    #[test]
    fn test_dataset_categories_untagged() {
        let list: DatasetList = serde_json::from_value(json!({
            "datasets": [
                {"id": "chest-xray", "name": "Chest X-ray", "source_type": "kaggle",
                 "description": "", "total_images": 5856, "categories": ["Normal", "Pneumonia"]},
                {"id": "tiny-imagenet", "name": "Tiny", "source_type": "stanford",
                 "description": "", "total_images": 120000, "categories": 200},
                {"id": "kitti", "name": "KITTI", "source_type": "kitti", "description": ""}
            ]
        }))
        .unwrap();

        assert_eq!(list.datasets.len(), 3);
        assert_eq!(list.datasets[1].categories, Some(DatasetCategories::Count(200)));
        assert_eq!(list.datasets[2].total_images, None);
    }
}
