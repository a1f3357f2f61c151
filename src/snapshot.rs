use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layer::Layer;

/// On-disk form of the network parameters: the four named arrays, JSON
/// encoded. serde_json prints f64 with round-trip precision, so a
/// save/load cycle reproduces the parameters bit for bit.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub w1: Vec<Vec<f64>>,
    pub b1: Vec<f64>,
    pub w2: Vec<Vec<f64>>,
    pub b2: Vec<f64>,
}

impl Snapshot {
    pub fn capture(l1: &Layer, l2: &Layer) -> Self {
        Snapshot {
            w1: matrix_rows(&l1.weights),
            b1: l1.bias.to_vec(),
            w2: matrix_rows(&l2.weights),
            b2: l2.bias.to_vec(),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Snapshot> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::Snapshot(format!("cannot open {}: {}", path.display(), e)))?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Rebuilds the two layers, rejecting dimensionally inconsistent
    /// snapshots. Momentum and dropout state are not persisted; both
    /// restart disabled/zeroed.
    pub fn into_layers(self) -> Result<(Layer, Layer)> {
        let w1 = matrix_from_rows(self.w1, "w1")?;
        let w2 = matrix_from_rows(self.w2, "w2")?;
        if w1.nrows() != self.b1.len() {
            return Err(Error::Snapshot(format!(
                "w1 has {} rows but b1 has {} entries",
                w1.nrows(),
                self.b1.len()
            )));
        }
        if w2.nrows() != self.b2.len() {
            return Err(Error::Snapshot(format!(
                "w2 has {} rows but b2 has {} entries",
                w2.nrows(),
                self.b2.len()
            )));
        }
        if w2.ncols() != w1.nrows() {
            return Err(Error::Snapshot(format!(
                "layer widths do not chain: w2 expects {} inputs, w1 outputs {}",
                w2.ncols(),
                w1.nrows()
            )));
        }
        Ok((
            Layer::from_params(w1, Array1::from_vec(self.b1)),
            Layer::from_params(w2, Array1::from_vec(self.b2)),
        ))
    }
}

fn matrix_rows(m: &Array2<f64>) -> Vec<Vec<f64>> {
    m.rows().into_iter().map(|row| row.to_vec()).collect()
}

fn matrix_from_rows(rows: Vec<Vec<f64>>, name: &str) -> Result<Array2<f64>> {
    if rows.is_empty() || rows[0].is_empty() {
        return Err(Error::Snapshot(format!("{} is empty", name)));
    }
    let cols = rows[0].len();
    if rows.iter().any(|row| row.len() != cols) {
        return Err(Error::Snapshot(format!("{} has ragged rows", name)));
    }
    let n_rows = rows.len();
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, cols), flat)
        .map_err(|e| Error::Snapshot(format!("{}: {}", name, e)))
}
