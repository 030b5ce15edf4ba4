//! How well a trained model fits its own training patterns, per intent.

/// Square tally of (true intent, predicted intent) index pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    size: usize,
    // cells[truth][predicted], flattened.
    cells: Vec<u32>,
}

impl ConfusionMatrix {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![0; size * size],
        }
    }

    /// Tally `(truth, predicted)` pairs; pairs naming an unknown class are skipped.
    pub fn from_pairs(size: usize, pairs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        pairs.into_iter().fold(Self::new(size), |mut cm, (truth, predicted)| {
            cm.add(truth, predicted);
            cm
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if let Some(cell) = self.cell_index(truth, predicted) {
            self.cells[cell] = self.cells[cell].saturating_add(1);
        }
    }

    /// Count for the pair, 0 when either index is out of range.
    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.cell_index(truth, predicted)
            .map_or(0, |cell| self.cells[cell])
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().map(|&count| u64::from(count)).sum()
    }

    fn correct(&self) -> u64 {
        (0..self.size).map(|class| u64::from(self.get(class, class))).sum()
    }

    fn row_sum(&self, truth: usize) -> u32 {
        (0..self.size).map(|predicted| self.get(truth, predicted)).sum()
    }

    fn column_sum(&self, predicted: usize) -> u32 {
        (0..self.size).map(|truth| self.get(truth, predicted)).sum()
    }

    fn cell_index(&self, truth: usize, predicted: usize) -> Option<usize> {
        (truth < self.size && predicted < self.size).then_some(truth * self.size + predicted)
    }
}

/// Fit of one intent tag.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentFit {
    pub tag: String,
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
    /// Patterns labelled with this tag.
    pub support: u32,
}

/// One entry per matrix row, named from `classes` (empty name when missing).
pub fn fit_by_intent(cm: &ConfusionMatrix, classes: &[String]) -> Vec<IntentFit> {
    (0..cm.size())
        .map(|class| {
            let hits = cm.get(class, class) as f32;
            let support = cm.row_sum(class);
            let precision = ratio(hits, cm.column_sum(class));
            let recall = ratio(hits, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            IntentFit {
                tag: classes.get(class).cloned().unwrap_or_default(),
                precision,
                recall,
                f1,
                support,
            }
        })
        .collect()
}

/// Share of pairs on the diagonal; 0 when nothing was tallied.
pub fn accuracy(cm: &ConfusionMatrix) -> f32 {
    match cm.total() {
        0 => 0.0,
        total => cm.correct() as f32 / total as f32,
    }
}

fn ratio(hits: f32, out_of: u32) -> f32 {
    if out_of == 0 { 0.0 } else { hits / out_of as f32 }
}
