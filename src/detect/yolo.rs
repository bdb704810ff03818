//! YOLOv8-style output decoding and per-class non-maximum suppression.
//!
//! Model-runtime independent so it can be exercised without an ONNX runtime.
//! The expected output layout is `[1, 4 + num_classes, num_boxes]` with rows
//! `cx, cy, w, h, score_0 .. score_n` in model input pixels.

use std::cmp::Ordering;
use std::collections::HashMap;

use anyhow::{anyhow, Result};

use crate::detect::result::{Detection, ObjectClass, VehicleBox};

#[derive(Clone, Copy, Debug)]
pub struct DecodeParams {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    /// Multiplier from model input x to frame x.
    pub scale_x: f32,
    /// Multiplier from model input y to frame y.
    pub scale_y: f32,
}

/// Decode a flat row-major `[rows, boxes]` output tensor into detections.
pub fn decode_output(
    output: &[f32],
    shape: &[usize],
    params: &DecodeParams,
) -> Result<Vec<Detection>> {
    let (rows, boxes) = match shape {
        [1, rows, boxes] | [rows, boxes] => (*rows, *boxes),
        _ => return Err(anyhow!("expected [1, C, N] output, got {:?}", shape)),
    };
    if rows <= 4 {
        return Err(anyhow!("output has {} rows, need box + class scores", rows));
    }
    if output.len() != rows * boxes {
        return Err(anyhow!(
            "output length {} does not match shape {:?}",
            output.len(),
            shape
        ));
    }
    let at = |row: usize, i: usize| output[row * boxes + i];

    let mut detections = Vec::new();
    for i in 0..boxes {
        let (best_class, best_score) = (4..rows)
            .map(|row| (row - 4, at(row, i)))
            .fold((0, f32::NEG_INFINITY), |best, cur| {
                if cur.1 > best.1 {
                    cur
                } else {
                    best
                }
            });
        if best_score <= params.confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (at(0, i), at(1, i), at(2, i), at(3, i));
        let bbox = VehicleBox::from_f32(
            (cx - w / 2.0) * params.scale_x,
            (cy - h / 2.0) * params.scale_y,
            (cx + w / 2.0) * params.scale_x,
            (cy + h / 2.0) * params.scale_y,
        );
        if let Some(bbox) = bbox {
            detections.push(Detection {
                bbox,
                confidence: best_score,
                class: ObjectClass::from_coco_id(best_class),
            });
        }
    }

    Ok(nms(detections, params.iou_threshold))
}

/// Class-aware NMS. Output is sorted by descending confidence.
pub fn nms(detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    let mut by_class: HashMap<ObjectClass, Vec<Detection>> = HashMap::new();
    for detection in detections {
        by_class.entry(detection.class).or_default().push(detection);
    }

    let mut kept = Vec::new();
    for (_, mut group) in by_class {
        group.sort_by(by_confidence_desc);
        let mut suppressed = vec![false; group.len()];
        for i in 0..group.len() {
            if suppressed[i] {
                continue;
            }
            for j in (i + 1)..group.len() {
                if !suppressed[j] && group[i].bbox.iou(&group[j].bbox) > iou_threshold {
                    suppressed[j] = true;
                }
            }
            kept.push(group[i].clone());
        }
    }
    kept.sort_by(by_confidence_desc);
    kept
}

fn by_confidence_desc(a: &Detection, b: &Detection) -> Ordering {
    b.confidence
        .partial_cmp(&a.confidence)
        .unwrap_or(Ordering::Equal)
}
