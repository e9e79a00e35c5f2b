//! Raw detector anchors
//!
//! Detector output rows use the layout `[cx, cy, w, h, confidence, scores...]`
//! with one score per known class.

use crate::boxes::CenterBox;
use crate::error::{AnchorError, LabelError};
use crate::labels::LabelTable;
use ndarray::{ArrayView3, Axis};
use serde::{Deserialize, Serialize};

/// Column holding the objectness confidence
pub const CONFIDENCE_COLUMN: usize = 4;
/// First class-score column
pub const CLASS_COLUMN: usize = 5;

/// Candidate detection produced by a detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: CenterBox,
    pub confidence: f64,
    pub class_scores: Vec<f64>,
}

impl Detection {
    /// Create a new detection
    pub fn new(bbox: CenterBox, confidence: f64, class_scores: Vec<f64>) -> Self {
        Self {
            bbox,
            confidence,
            class_scores,
        }
    }

    /// Parse one anchor row
    pub fn from_row(row: &[f64]) -> Result<Self, AnchorError> {
        if row.len() < CLASS_COLUMN {
            return Err(AnchorError::TooShort(row.len()));
        }

        Ok(Self {
            bbox: CenterBox::new(row[0], row[1], row[2], row[3]),
            confidence: row[CONFIDENCE_COLUMN],
            class_scores: row[CLASS_COLUMN..].to_vec(),
        })
    }

    /// Index of the highest class score; ties go to the lowest index
    pub fn argmax_class(&self) -> Result<usize, LabelError> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, &score) in self.class_scores.iter().enumerate() {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((idx, score)),
            }
        }
        best.map(|(idx, _)| idx).ok_or(LabelError::NoScores)
    }

    /// Label of the winning class
    pub fn label<'a>(&self, table: &'a LabelTable) -> Result<&'a str, LabelError> {
        table.get(self.argmax_class()?)
    }
}

/// Ordered per-image anchor sets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnchorBatch {
    images: Vec<Vec<Detection>>,
}

impl AnchorBatch {
    /// Create a batch from per-image detections
    pub fn new(images: Vec<Vec<Detection>>) -> Self {
        Self { images }
    }

    /// Slice a `(batch, anchors, 5 + classes)` tensor
    pub fn from_array(anchors: ArrayView3<f64>) -> Result<Self, AnchorError> {
        let images = anchors
            .axis_iter(Axis(0))
            .map(|image| {
                image
                    .axis_iter(Axis(0))
                    .map(|row| Detection::from_row(&row.to_vec()))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { images })
    }

    /// Parse nested rows, as dumped by a detector to JSON.
    ///
    /// Every row in the batch must carry the same number of class scores.
    pub fn from_rows(rows: &[Vec<Vec<f64>>]) -> Result<Self, AnchorError> {
        let mut expected: Option<usize> = None;
        let mut images = Vec::with_capacity(rows.len());

        for image in rows {
            let mut detections = Vec::with_capacity(image.len());
            for row in image {
                let det = Detection::from_row(row)?;
                let classes = det.class_scores.len();
                match expected {
                    Some(n) if n != classes => {
                        return Err(AnchorError::ClassCountMismatch {
                            expected: n,
                            actual: classes,
                        });
                    }
                    _ => expected = Some(classes),
                }
                detections.push(det);
            }
            images.push(detections);
        }

        Ok(Self { images })
    }

    /// Per-image detections in batch order
    pub fn images(&self) -> &[Vec<Detection>] {
        &self.images
    }

    /// Number of images
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vec<Detection>> {
        self.images.iter()
    }
}

impl IntoIterator for AnchorBatch {
    type Item = Vec<Detection>;
    type IntoIter = std::vec::IntoIter<Vec<Detection>>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.into_iter()
    }
}

impl FromIterator<Vec<Detection>> for AnchorBatch {
    fn from_iter<T: IntoIterator<Item = Vec<Detection>>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_from_row() {
        let det = Detection::from_row(&[1.0, 2.0, 3.0, 4.0, 0.7, 0.1, 0.9]).unwrap();
        assert_eq!(det.bbox, CenterBox::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(det.confidence, 0.7);
        assert_eq!(det.class_scores, vec![0.1, 0.9]);
        assert_eq!(Detection::from_row(&[1.0, 2.0]), Err(AnchorError::TooShort(2)));
    }

    #[test]
    fn test_label_mapping() {
        let table: LabelTable = ["cat", "dog", "bird"].into_iter().collect();
        let det = Detection::new(CenterBox::default(), 0.8, vec![0.1, 0.9, 0.2]);
        assert_eq!(det.argmax_class().unwrap(), 1);
        assert_eq!(det.label(&table).unwrap(), "dog");
    }

    #[test]
    fn test_argmax_ties_lowest_index() {
        let det = Detection::new(CenterBox::default(), 0.8, vec![0.3, 0.5, 0.5]);
        assert_eq!(det.argmax_class().unwrap(), 1);
        let empty = Detection::new(CenterBox::default(), 0.8, vec![]);
        assert_eq!(empty.argmax_class(), Err(LabelError::NoScores));
    }

    #[test]
    fn test_from_array() {
        let mut tensor = Array3::<f64>::zeros((2, 3, 7));
        tensor[[1, 2, CONFIDENCE_COLUMN]] = 0.9;
        tensor[[1, 2, 6]] = 1.0;

        let batch = AnchorBatch::from_array(tensor.view()).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.images()[0].len(), 3);
        let det = &batch.images()[1][2];
        assert_eq!(det.confidence, 0.9);
        assert_eq!(det.argmax_class().unwrap(), 1);
    }

    #[test]
    fn test_from_rows_class_mismatch() {
        let rows = vec![
            vec![vec![0.0, 0.0, 1.0, 1.0, 0.5, 0.1, 0.2]],
            vec![vec![0.0, 0.0, 1.0, 1.0, 0.5, 0.1]],
        ];
        assert_eq!(
            AnchorBatch::from_rows(&rows),
            Err(AnchorError::ClassCountMismatch {
                expected: 2,
                actual: 1
            })
        );
    }
}
