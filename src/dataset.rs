use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::{DatasetLayout, SplitConfig};
use crate::error::Result;
use crate::io::{collect_identifiers, write_split_files};
use crate::types::SplitData;

/// Number of items kept on the `fraction` side of a split of `len` items
fn floor_count(fraction: f64, len: usize) -> usize {
    let count = (fraction * len as f64).floor();
    if count <= 0.0 {
        0
    } else {
        (count as usize).min(len)
    }
}

/// Split identifiers into training, validation, and testing sets.
///
/// Stage one shuffles everything and keeps the first `floor(train_fraction * N)`
/// identifiers as the training pool; the remainder is the test set. Stage two
/// reshuffles the pool and keeps the first `floor((1 - val_fraction) * M)` as the
/// final training set; the remainder of the pool is the validation set.
pub fn split_identifiers<R: Rng + ?Sized>(
    mut identifiers: Vec<String>,
    train_fraction: f64,
    val_fraction: f64,
    rng: &mut R,
) -> SplitData {
    identifiers.shuffle(rng);
    let pool_size = floor_count(train_fraction, identifiers.len());
    let test = identifiers.split_off(pool_size);

    let mut pool = identifiers;
    pool.shuffle(rng);
    let train_size = floor_count(1.0 - val_fraction, pool.len());
    let val = pool.split_off(train_size);

    SplitData {
        train: pool,
        val,
        test,
    }
}

/// Seeded generator when a seed is configured, otherwise one seeded from the OS
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Split the annotation identifiers of a layout and write the three index files
pub fn process_split(layout: &DatasetLayout, config: &SplitConfig) -> Result<SplitData> {
    let identifiers = collect_identifiers(&layout.annotations_dir, &config.annotation_ext)?;
    let total = identifiers.len();
    info!(
        "Found {} annotation identifiers in {}",
        total,
        layout.annotations_dir.display()
    );
    if total == 0 {
        warn!("No annotations found; writing empty image sets.");
    }

    let mut rng = make_rng(config.seed);
    let split = split_identifiers(
        identifiers,
        config.train_fraction,
        config.val_fraction,
        &mut rng,
    );
    split.verify(total)?;

    write_split_files(&layout.image_sets_dir, &split)?;
    info!(
        "Wrote {} train, {} val and {} test identifiers to {}",
        split.train.len(),
        split.val.len(),
        split.test.len(),
        layout.image_sets_dir.display()
    );
    Ok(split)
}
