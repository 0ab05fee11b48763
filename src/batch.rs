//! Sequential batch processing with continue-on-error semantics.
//!
//! Images are processed one at a time in submission order; a failure on
//! one item never aborts the rest. Each item moves through
//! pending -> processing -> success | error, and the report aggregates
//! counts plus per-item outcomes.

use crate::codec;
use crate::error::PrepError;
use crate::preprocessing::{Pipeline, PrepConfig};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;

/// One input image in a batch.
pub struct BatchInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Processing,
    Success,
    Error,
}

/// Final outcome for one batch item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub name: String,
    pub status: ItemStatus,
    /// Failure reason, present only for errored items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Base64-encoded PNG of the binarized image, present only on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_png: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_ms: Option<u64>,
}

/// Aggregate result of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<ItemReport>,
}

/// Process a batch of images through the pipeline, in order.
pub fn process_batch(inputs: Vec<BatchInput>, config: PrepConfig) -> Result<BatchReport, PrepError> {
    let pipeline = Pipeline::new(config)?;
    let total = inputs.len();

    // Every item starts out pending; statuses advance independently.
    let mut items: Vec<ItemReport> = inputs
        .iter()
        .map(|input| ItemReport {
            name: input.name.clone(),
            status: ItemStatus::Pending,
            error: None,
            output_png: None,
            time_ms: None,
        })
        .collect();

    let mut succeeded = 0;
    let mut failed = 0;

    for (index, input) in inputs.iter().enumerate() {
        items[index].status = ItemStatus::Processing;
        tracing::info!("processing batch item {}/{}: {}", index + 1, total, input.name);

        match process_one(&pipeline, &input.bytes) {
            Ok((png, time_ms)) => {
                succeeded += 1;
                items[index].status = ItemStatus::Success;
                items[index].output_png = Some(BASE64.encode(png));
                items[index].time_ms = Some(time_ms);
            }
            Err(e) => {
                failed += 1;
                tracing::warn!("batch item {} failed: {}", input.name, e);
                items[index].status = ItemStatus::Error;
                items[index].error = Some(e.to_string());
            }
        }
    }

    Ok(BatchReport {
        total,
        succeeded,
        failed,
        items,
    })
}

fn process_one(pipeline: &Pipeline, bytes: &[u8]) -> Result<(Vec<u8>, u64), PrepError> {
    let rgba = codec::decode_rgba(bytes)?;
    let result = pipeline.process(&rgba);
    let png = codec::encode_png(&result.image)?;
    Ok((png, result.total_time_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, _| {
            let v = if x < width / 2 { 220 } else { 40 };
            Rgba([v, v, v, 255])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_batch_continues_after_failure() {
        let inputs = vec![
            BatchInput {
                name: "good-1.png".into(),
                bytes: png_bytes(60, 40),
            },
            BatchInput {
                name: "broken.png".into(),
                bytes: b"definitely not a png".to_vec(),
            },
            BatchInput {
                name: "good-2.png".into(),
                bytes: png_bytes(30, 30),
            },
        ];

        let report = process_batch(inputs, PrepConfig::default()).unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);

        // Submission order is preserved
        assert_eq!(report.items[0].name, "good-1.png");
        assert_eq!(report.items[0].status, ItemStatus::Success);
        assert_eq!(report.items[1].status, ItemStatus::Error);
        assert!(report.items[1].error.as_deref().unwrap().contains("decode"));
        assert_eq!(report.items[2].status, ItemStatus::Success);
    }

    #[test]
    fn test_batch_success_items_carry_decodable_output() {
        let inputs = vec![BatchInput {
            name: "scan.png".into(),
            bytes: png_bytes(50, 50),
        }];
        let report = process_batch(inputs, PrepConfig::default()).unwrap();

        let encoded = report.items[0].output_png.as_deref().unwrap();
        let png = BASE64.decode(encoded).unwrap();
        let out = image::load_from_memory(&png).unwrap().to_luma8();
        assert_eq!(out.dimensions(), (50, 50));
        assert!(out.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn test_batch_rejects_invalid_config_up_front() {
        let config = PrepConfig {
            block_size: 10,
            ..PrepConfig::default()
        };
        assert!(process_batch(vec![], config).is_err());
    }

    #[test]
    fn test_empty_batch_reports_zero_counts() {
        let report = process_batch(vec![], PrepConfig::default()).unwrap();
        assert_eq!(report.total, 0);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 0);
        assert!(report.items.is_empty());
    }
}
