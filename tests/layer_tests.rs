use digitnet::{Activation, Layer};
use ndarray::{array, Array1};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_update_reduces_to_plain_gradient_descent() {
    // With momentum 0 and weight decay 0 the update is W -= lr * grad
    let mut layer = Layer::from_params(array![[1.0, 2.0], [3.0, 4.0]], array![0.5, -0.5]);
    let weight_grad = array![[0.1, -0.2], [0.3, 0.0]];
    let bias_grad = array![0.2, -0.4];
    let lr = 0.1;

    layer.update_params(&weight_grad, &bias_grad, lr, 0.0, 0.0);

    for i in 0..2 {
        for j in 0..2 {
            let expected = [[1.0, 2.0], [3.0, 4.0]][i][j] - lr * weight_grad[[i, j]];
            assert!((layer.weights[[i, j]] - expected).abs() < 1e-15);
        }
    }
    assert!((layer.bias[0] - (0.5 - lr * 0.2)).abs() < 1e-15);
    assert!((layer.bias[1] - (-0.5 + lr * 0.4)).abs() < 1e-15);
}

#[test]
fn test_momentum_carries_the_previous_step() {
    let mut layer = Layer::from_params(array![[1.0]], array![0.0]);
    let grad = array![[0.2]];
    let zero_bias = array![0.0];
    let (lr, momentum) = (0.1, 0.9);

    layer.update_params(&grad, &zero_bias, lr, 0.0, momentum);
    let after_first = layer.weights[[0, 0]];
    assert!((after_first - (1.0 - lr * 0.2)).abs() < 1e-15);

    // Zero gradient on the second update: the step is momentum times the
    // stored previous step
    layer.update_params(&array![[0.0]], &zero_bias, lr, 0.0, momentum);
    let expected = after_first + momentum * (-lr * 0.2);
    assert!((layer.weights[[0, 0]] - expected).abs() < 1e-15);
}

#[test]
fn test_weight_decay_regularizes_weights_but_not_bias() {
    let mut layer = Layer::from_params(array![[2.0, -4.0]], array![3.0]);
    let decay = 0.5;
    let lr = 0.1;

    layer.update_params(&array![[0.0, 0.0]], &array![0.0], lr, decay, 0.0);

    assert!((layer.weights[[0, 0]] - (2.0 - lr * decay * 2.0)).abs() < 1e-15);
    assert!((layer.weights[[0, 1]] - (-4.0 + lr * decay * 4.0)).abs() < 1e-15);
    assert_eq!(layer.bias[0], 3.0);
}

#[test]
fn test_eval_forward_never_applies_dropout() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut layer = Layer::new(4, 3, &mut rng);
    layer.set_dropout(0.5);

    let input = array![1.0, -2.0, 3.0, 0.5];
    let pass = layer.forward(&input, Activation::ReLU);

    assert!(pass.mask.is_none());
    assert_eq!(pass.input, input);
    // u = W·x + b, no scaling applied
    let expected_u = layer.weights.dot(&input) + &layer.bias;
    assert_eq!(pass.preactivation, expected_u);
}

#[test]
fn test_dropout_zeroes_or_scales_each_element() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut layer = Layer::new(20, 3, &mut rng);
    let keep = 0.5;
    layer.set_dropout(keep);

    let input = Array1::from_elem(20, 0.7);
    let pass = layer.forward_train(&input, Activation::ReLU, &mut rng);
    let mask = pass.mask.as_ref().expect("training pass samples a mask");

    for i in 0..20 {
        assert!(mask[i] == 0.0 || mask[i] == 1.0);
        let expected = input[i] * mask[i] / keep;
        assert_eq!(pass.input[i], expected);
    }
}

#[test]
fn test_inverted_dropout_is_unbiased() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut layer = Layer::new(50, 2, &mut rng);
    layer.set_dropout(0.5);

    let input = Array1::from_elem(50, 1.0);
    let draws = 2000;
    let mut mean = Array1::<f64>::zeros(50);
    for _ in 0..draws {
        let pass = layer.forward_train(&input, Activation::ReLU, &mut rng);
        mean += &pass.input;
    }
    mean /= draws as f64;

    // Expected value of the transformed vector equals the original
    for &m in mean.iter() {
        assert!((m - 1.0).abs() < 0.15, "biased dropout estimate: {}", m);
    }
}

#[test]
fn test_each_training_pass_resamples_its_mask() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut layer = Layer::new(100, 2, &mut rng);
    layer.set_dropout(0.5);

    let input = Array1::from_elem(100, 1.0);
    let first = layer.forward_train(&input, Activation::ReLU, &mut rng);
    let second = layer.forward_train(&input, Activation::ReLU, &mut rng);

    assert_ne!(first.mask.unwrap(), second.mask.unwrap());
}

#[test]
fn test_backward_reapplies_the_recorded_mask() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut layer = Layer::new(6, 4, &mut rng);
    let keep = 0.5;
    layer.set_dropout(keep);

    let input = array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let pass = layer.forward_train(&input, Activation::ReLU, &mut rng);
    let mask = pass.mask.clone().unwrap();

    let delta = array![1.0, -1.0, 0.5, 2.0];
    let lower_pre = array![1.0, 1.0, 1.0, 1.0, 1.0, 1.0]; // all positive: relu' = 1
    let propagated = layer.backward(&delta, &lower_pre, Activation::ReLU, &pass);

    let unmasked = layer.weights.t().dot(&delta);
    for i in 0..6 {
        let expected = unmasked[i] * mask[i] / keep;
        assert!((propagated[i] - expected).abs() < 1e-12);
    }
}

#[test]
#[should_panic(expected = "input size")]
fn test_forward_with_wrong_input_width_panics() {
    let mut rng = StdRng::seed_from_u64(6);
    let layer = Layer::new(3, 2, &mut rng);
    layer.forward(&array![1.0, 2.0], Activation::ReLU);
}

#[test]
#[should_panic(expected = "keep probability")]
fn test_enabling_dropout_with_keep_prob_one_panics() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut layer = Layer::new(3, 2, &mut rng);
    layer.set_dropout(1.0);
}
