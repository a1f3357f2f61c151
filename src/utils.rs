use ndarray::{Array1, Array2};

/// Outer product of a delta vector (n_out) and an input vector (n_in),
/// shaped (n_out × n_in) to match a layer's weight matrix.
pub fn outer_product(delta: &Array1<f64>, input: &Array1<f64>) -> Array2<f64> {
    let a = delta.view().into_shape_with_order((delta.len(), 1)).unwrap();
    let b = input.view().into_shape_with_order((1, input.len())).unwrap();

    a.dot(&b)
}

/// Index of the largest element. Ties resolve to the lowest index.
pub fn argmax(v: &Array1<f64>) -> usize {
    let mut best = 0;
    for (i, &x) in v.iter().enumerate() {
        if x > v[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_outer_product_shape_and_values() {
        let d = array![1.0, 2.0];
        let x = array![3.0, 4.0, 5.0];
        let m = outer_product(&d, &x);
        assert_eq!(m.shape(), &[2, 3]);
        assert_eq!(m[[0, 0]], 3.0);
        assert_eq!(m[[1, 2]], 10.0);
    }

    #[test]
    fn test_argmax_ties_take_lowest_index() {
        assert_eq!(argmax(&array![0.1, 0.5, 0.5, 0.2]), 1);
    }
}
