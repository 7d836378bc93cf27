//! Generates a synthetic HuGCDN2014-OXI-style folder tree so the pipeline
//! can be exercised without the proprietary corpus:
//!
//! ```text
//! HuGCDN2014-OXI/
//!   RR/      s01.mat .. s08.mat   (RR_notch_abs_pr_ada, ms)
//!   SAT/     s01.mat .. s08.mat   (SAT, %)
//!   LABELS/  s01.mat .. s08.mat   (salida_man_1m, 0/1)
//! ```
//!
//! Includes one subject with an empty SpO2 channel and one file present in
//! only two folders, so the skip and matching paths are visible in a run.

use std::path::Path;

use oxi_dataset::config::PipelineConfig;
use oxi_dataset::mat::{write_file, MatValue};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One subject's three channels. Apnea episodes raise RR variability and
/// pull saturation down.
fn generate_subject(rng: &mut SimpleRng, minutes: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut rr = Vec::with_capacity(minutes);
    let mut sat = Vec::with_capacity(minutes);
    let mut labels = Vec::with_capacity(minutes);

    let mut in_episode = false;
    for _ in 0..minutes {
        // Episodes start and end with small per-minute probabilities.
        if in_episode {
            if rng.next_f64() < 0.3 {
                in_episode = false;
            }
        } else if rng.next_f64() < 0.08 {
            in_episode = true;
        }

        if in_episode {
            rr.push(rng.gauss(1050.0, 180.0).max(1.0));
            sat.push(rng.gauss(88.0, 3.0).clamp(60.0, 100.0));
            labels.push(1.0);
        } else {
            rr.push(rng.gauss(850.0, 60.0).max(1.0));
            sat.push(rng.gauss(96.5, 1.0).clamp(60.0, 100.0));
            labels.push(0.0);
        }
    }
    (rr, sat, labels)
}

fn main() -> std::io::Result<()> {
    let mut rng = SimpleRng::new(42);
    let cfg = PipelineConfig::default();

    for dir in [&cfg.rr_folder, &cfg.sat_folder, &cfg.labels_folder] {
        std::fs::create_dir_all(dir)?;
    }

    let write = |dir: &Path, file: &str, key: &str, values: Vec<f64>| {
        write_file(&dir.join(file), &[(key, &MatValue::Numeric(values))])
    };

    for i in 1..=8usize {
        let file = format!("s{i:02}.mat");
        let minutes = 420 + (i * 17) % 60;
        let (rr, mut sat, mut labels) = generate_subject(&mut rng, minutes);

        // The recording subsystems drift by a few samples per session.
        sat.truncate(minutes - i % 3);
        labels.truncate(minutes - (i + 1) % 4);

        // s06 has a dead oximeter channel; the pipeline must skip it.
        if i == 6 {
            sat.clear();
        }

        write(&cfg.rr_folder, &file, &cfg.rr_key, rr)?;
        write(&cfg.sat_folder, &file, &cfg.sat_key, sat)?;
        write(&cfg.labels_folder, &file, &cfg.label_key, labels)?;
    }

    // s99 exists only in RR and SAT, so it never matches.
    let (rr, sat, _) = generate_subject(&mut rng, 60);
    write(&cfg.rr_folder, "s99.mat", &cfg.rr_key, rr)?;
    write(&cfg.sat_folder, "s99.mat", &cfg.sat_key, sat)?;

    println!("sample corpus written to HuGCDN2014-OXI/");
    Ok(())
}
