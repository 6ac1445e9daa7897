use faqrag_core::{Error, Result};

const NORM_EPS: f32 = 1e-12;

/// Mean over token vectors. `None` for an empty or ragged matrix.
pub fn mean_pool(tokens: &[Vec<f32>]) -> Option<Vec<f32>> {
    let dim = tokens.first()?.len();
    if dim == 0 || tokens.iter().any(|t| t.len() != dim) {
        return None;
    }
    let mut sum = vec![0f32; dim];
    for token in tokens {
        for (acc, x) in sum.iter_mut().zip(token) {
            *acc += x;
        }
    }
    let n = tokens.len() as f32;
    for acc in &mut sum {
        *acc /= n;
    }
    Some(sum)
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt() + NORM_EPS;
    for x in v.iter_mut() {
        *x /= norm;
    }
}

/// Check that every row has the same non-zero dimension, then unit-normalize.
pub fn normalize_rows(mut rows: Vec<Vec<f32>>) -> Result<Vec<Vec<f32>>> {
    let Some(dim) = rows.first().map(Vec::len) else { return Ok(rows) };
    if dim == 0 {
        return Err(Error::Embedding("provider returned empty vectors".into()));
    }
    if let Some(bad) = rows.iter().find(|r| r.len() != dim) {
        return Err(Error::Embedding(format!("inconsistent embedding dimensions: {} vs {}", dim, bad.len())));
    }
    for row in &mut rows {
        l2_normalize(row);
    }
    Ok(rows)
}
