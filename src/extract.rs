//! Dominant color extraction with seeded, restarted k-means.

use std::collections::HashSet;

use kmeans_colors::get_kmeans;
use palette::Srgb;
use serde::Serialize;
use tracing::{debug, trace};

use crate::color::Color;
use crate::config::{InsufficientPolicy, PaletteConfig, PaletteOrder};
use crate::error::{PaletteError, Result};

/// One palette entry: the cluster's mean color and how many samples it holds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Swatch {
    pub color: Color,
    pub population: usize,
    /// Share of all samples, 0.0-1.0.
    pub percentage: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Palette {
    swatches: Vec<Swatch>,
}

impl Palette {
    pub fn swatches(&self) -> &[Swatch] {
        &self.swatches
    }

    pub fn colors(&self) -> Vec<Color> {
        self.swatches.iter().map(|s| s.color).collect()
    }

    pub fn len(&self) -> usize {
        self.swatches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.swatches.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Swatch> {
        self.swatches.iter()
    }
}

impl IntoIterator for Palette {
    type Item = Swatch;
    type IntoIter = std::vec::IntoIter<Swatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.swatches.into_iter()
    }
}

/// Cluster `samples` into `config.num_colors` swatches.
///
/// Runs k-means `config.restarts` times with seeds `seed, seed + 1, ...`.
/// Each run's samples are assigned to its nearest final centroid and scored
/// by inertia, the summed squared distance of every sample to its cluster
/// mean. The lowest inertia wins and ties go to the earlier run, so a fixed
/// config always gives the same palette for the same samples.
///
/// # Errors
///
/// - [`PaletteError::InvalidParameter`] if the config doesn't validate.
/// - [`PaletteError::InsufficientSamples`] if there are fewer distinct colors
///   than requested and the policy is [`InsufficientPolicy::Fail`].
pub fn extract_swatches(samples: &[Color], config: &PaletteConfig) -> Result<Palette> {
    config.validate()?;

    let requested = config.num_colors;
    let distinct = samples.iter().copied().collect::<HashSet<_>>().len();
    debug!(samples = samples.len(), distinct, requested, "clustering pixel matrix");

    let k = if distinct >= requested {
        requested
    } else {
        match config.on_insufficient {
            InsufficientPolicy::Clamp if distinct > 0 => distinct,
            _ => return Err(PaletteError::InsufficientSamples { distinct, requested }),
        }
    };

    let buf = to_srgb(samples);

    let mut best: Option<Clustering> = None;
    for i in 0..config.restarts {
        let seed = config.seed.wrapping_add(i as u64);
        let run = get_kmeans(k, config.max_iterations, config.convergence, false, &buf, seed);
        let clustering = Clustering::assign(&buf, &run.centroids);
        trace!(restart = i, seed, inertia = clustering.inertia, "k-means run finished");

        if best.as_ref().is_none_or(|b| clustering.inertia < b.inertia) {
            best = Some(clustering);
        }
    }
    let Some(best) = best else {
        return Err(PaletteError::invalid_parameter("restarts", config.restarts));
    };
    debug!(inertia = best.inertia, "selected lowest-inertia k-means run");

    let mut swatches = summarize(samples, &best);
    let unique = swatches.iter().map(|s| s.color).collect::<HashSet<_>>().len();
    if unique < swatches.len() {
        debug!(
            swatches = swatches.len(),
            unique, "cluster means truncate to the same color"
        );
    }

    if config.order == PaletteOrder::Population {
        // Stable: equal populations keep clustering order.
        swatches.sort_by(|a, b| b.population.cmp(&a.population));
    }

    Ok(Palette { swatches })
}

fn to_srgb(samples: &[Color]) -> Vec<Srgb<f32>> {
    samples
        .iter()
        .map(|c| Srgb::new(c.red, c.green, c.blue).into_format::<f32>())
        .collect()
}

#[inline(always)]
fn distance_squared(a: &Srgb<f32>, b: &Srgb<f32>) -> f64 {
    let dr = (a.red - b.red) as f64;
    let dg = (a.green - b.green) as f64;
    let db = (a.blue - b.blue) as f64;
    dr * dr + dg * dg + db * db
}

/// Final assignment of one k-means run, with every cluster non-empty.
#[derive(Clone, Debug)]
struct Clustering {
    labels: Vec<usize>,
    k: usize,
    /// Sum of squared distances from each sample to its cluster mean.
    inertia: f64,
}

impl Clustering {
    /// Assign each sample to its nearest centroid (lowest index on ties).
    ///
    /// The backend re-seeds a cluster that empties on its last iteration with
    /// a random color, so a centroid may own no sample. Each such cluster
    /// takes the sample farthest from its own centroid, drawn from a cluster
    /// that still has more than one sample.
    fn assign(buf: &[Srgb<f32>], centroids: &[Srgb<f32>]) -> Self {
        let k = centroids.len();
        let mut labels = Vec::with_capacity(buf.len());
        let mut counts = vec![0usize; k];

        for p in buf {
            let mut best_idx = 0;
            let mut best_dist = f64::INFINITY;
            for (idx, c) in centroids.iter().enumerate() {
                let d = distance_squared(p, c);
                if d < best_dist {
                    best_dist = d;
                    best_idx = idx;
                }
            }
            labels.push(best_idx);
            counts[best_idx] += 1;
        }

        for empty in 0..k {
            if counts[empty] > 0 {
                continue;
            }
            let donor = labels
                .iter()
                .enumerate()
                .filter(|&(_, &l)| counts[l] > 1)
                .map(|(i, &l)| (i, distance_squared(&buf[i], &centroids[l])))
                .fold(None, |acc: Option<(usize, f64)>, (i, d)| match acc {
                    Some((_, best)) if best >= d => acc,
                    _ => Some((i, d)),
                });
            if let Some((i, _)) = donor {
                debug!(cluster = empty, sample = i, "refilling empty cluster");
                counts[labels[i]] -= 1;
                labels[i] = empty;
                counts[empty] += 1;
            }
        }

        let mut sums = vec![[0f64; 3]; k];
        for (p, &l) in buf.iter().zip(&labels) {
            sums[l][0] += p.red as f64;
            sums[l][1] += p.green as f64;
            sums[l][2] += p.blue as f64;
        }
        let means: Vec<Srgb<f32>> = sums
            .iter()
            .zip(&counts)
            .map(|(s, &n)| {
                let n = n.max(1) as f64;
                Srgb::new((s[0] / n) as f32, (s[1] / n) as f32, (s[2] / n) as f32)
            })
            .collect();

        let inertia = buf
            .iter()
            .zip(&labels)
            .map(|(p, &l)| distance_squared(p, &means[l]))
            .sum();

        Self { labels, k, inertia }
    }
}

/// Exact per-cluster means of the input u8 samples, truncated toward zero.
fn summarize(samples: &[Color], clustering: &Clustering) -> Vec<Swatch> {
    let k = clustering.k;
    let mut sums = vec![[0u64; 3]; k];
    let mut counts = vec![0usize; k];

    for (c, &idx) in samples.iter().zip(&clustering.labels) {
        sums[idx][0] += c.red as u64;
        sums[idx][1] += c.green as u64;
        sums[idx][2] += c.blue as u64;
        counts[idx] += 1;
    }

    let total = samples.len().max(1) as f32;

    (0..k)
        .map(|i| {
            let n = counts[i];
            let mean = |s: u64| (s / n.max(1) as u64).min(255) as u8;
            Swatch {
                color: Color::new(mean(sums[i][0]), mean(sums[i][1]), mean(sums[i][2])),
                population: n,
                percentage: n as f32 / total,
            }
        })
        .collect()
}
