use mnist::{Mnist, MnistBuilder};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;

use digitnet::{Network, Sample, TrainConfig};

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let Mnist {
        trn_img,
        trn_lbl,
        tst_img,
        tst_lbl,
        ..
    } = MnistBuilder::new()
        .base_path("data")
        .label_format_digit()
        .training_set_length(60_000)
        .validation_set_length(0)
        .test_set_length(10_000)
        .finalize();

    let mut train_data = to_samples(&trn_img, &trn_lbl);
    let test_data = to_samples(&tst_img, &tst_lbl);

    let mut rng = StdRng::seed_from_u64(0);
    let mut network = Network::fresh(784, 100, 10, &mut rng);

    let cfg = TrainConfig {
        batch_size: 10,
        eval_interval: 1000,
        epochs: 10,
        base_lr: 0.01,
        lr_decay_interval: 30_000,
        lr_decay_factor: 0.2,
        weight_decay: 0.0005,
        momentum: 0.9,
        log_interval: 100,
        ..TrainConfig::default()
    };
    network.train(&mut train_data, &test_data, &cfg, &mut rng)?;
    network.save("nn_model_h1.json")?;

    for sample in test_data.iter().take(3) {
        println!("label: {}", sample.label);
        let ranked = network.predict(&sample.features);
        for (rank, (score, class)) in ranked.into_iter().take(5).enumerate() {
            println!("#{} | {} | {:.3}%", rank + 1, class, score * 100.0);
        }
    }

    Ok(())
}

fn to_samples(images: &[u8], labels: &[u8]) -> Vec<Sample> {
    images
        .chunks(784)
        .zip(labels.iter())
        .map(|(pixels, &label)| {
            let features: Array1<f64> = pixels.iter().map(|&p| p as f64 / 255.0).collect();
            Sample::new(features, label as usize)
        })
        .collect()
}
