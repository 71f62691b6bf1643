use anyhow::{bail, Result};
use image::RgbImage;
use ndarray::{Array1, Array2, ArrayView1, Axis};

use super::types::{InitMode, SegmentationEngine};
use crate::annotation::{Label, LabelMask, Rect};

const COMPONENTS: usize = 5;
const KMEANS_STEPS: usize = 4;
const VARIANCE_FLOOR: f64 = 4.0;

/// In-process foreground extraction by colour modelling.
///
/// Each call fits one Gaussian mixture per class from the current labels,
/// assigns every probable cell to the cheaper class and then runs
/// `iterations` sweeps of iterated conditional modes over a Potts
/// smoothness term on the 4-neighbourhood. Definite cells are fixed.
pub struct ColorModelEngine {
    iterations: usize,
    smoothness: f64,
}

impl ColorModelEngine {
    pub fn new(iterations: usize, smoothness: f64) -> Self {
        Self {
            iterations: iterations.max(1),
            smoothness: smoothness.max(0.0),
        }
    }
}

impl Default for ColorModelEngine {
    fn default() -> Self {
        Self::new(1, 2.0)
    }
}

impl SegmentationEngine for ColorModelEngine {
    fn segment(
        &mut self,
        image: &RgbImage,
        mask: &mut LabelMask,
        rect: Rect,
        mode: InitMode,
    ) -> Result<()> {
        let _span = tracing::debug_span!("color_model_segment").entered();

        if mode == InitMode::Rect {
            init_from_rect(mask, rect)?;
        }

        let (width, height) = mask.dimensions();
        let colors = pixel_colors(image);

        let (mut fg, mut bg) = (Vec::new(), Vec::new());
        for (i, label) in mask.cells().iter().enumerate() {
            if label.is_foreground() {
                fg.push(i);
            } else {
                bg.push(i);
            }
        }
        if fg.is_empty() {
            bail!("no foreground samples to model");
        }
        if bg.is_empty() {
            bail!("no background samples to model");
        }

        tracing::debug!(fg = fg.len(), bg = bg.len(), "fitting colour models");
        let fg_model = ColorMixture::fit(&colors, &fg, COMPONENTS);
        let bg_model = ColorMixture::fit(&colors, &bg, COMPONENTS);

        let n = colors.nrows();
        let fg_cost: Vec<f64> = (0..n).map(|i| -fg_model.log_likelihood(colors.row(i))).collect();
        let bg_cost: Vec<f64> = (0..n).map(|i| -bg_model.log_likelihood(colors.row(i))).collect();

        for y in 0..height {
            for x in 0..width {
                let i = (y * width + x) as usize;
                if !mask.get(x, y).is_definite() {
                    mask.set(x, y, cheaper(fg_cost[i], bg_cost[i]));
                }
            }
        }

        for _ in 0..self.iterations {
            let changed = self.icm_sweep(mask, &fg_cost, &bg_cost);
            tracing::debug!(changed, "smoothing sweep");
            if changed == 0 {
                break;
            }
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "color-model"
    }
}

impl ColorModelEngine {
    /// One raster-order pass of iterated conditional modes. Returns the
    /// number of relabelled cells.
    fn icm_sweep(&self, mask: &mut LabelMask, fg_cost: &[f64], bg_cost: &[f64]) -> usize {
        let (width, height) = mask.dimensions();
        let mut changed = 0;
        for y in 0..height {
            for x in 0..width {
                let current = mask.get(x, y);
                if current.is_definite() {
                    continue;
                }
                let (mut fg_nb, mut bg_nb) = (0.0, 0.0);
                for (nx, ny) in neighbours(x, y, width, height) {
                    if mask.get(nx, ny).is_foreground() {
                        fg_nb += 1.0;
                    } else {
                        bg_nb += 1.0;
                    }
                }
                let i = (y * width + x) as usize;
                // Potts: pay `smoothness` for every neighbour of the other class
                let as_fg = fg_cost[i] + self.smoothness * bg_nb;
                let as_bg = bg_cost[i] + self.smoothness * fg_nb;
                let next = cheaper(as_fg, as_bg);
                if next != current {
                    mask.set(x, y, next);
                    changed += 1;
                }
            }
        }
        changed
    }
}

fn cheaper(fg_cost: f64, bg_cost: f64) -> Label {
    if fg_cost < bg_cost {
        Label::ProbableForeground
    } else {
        Label::ProbableBackground
    }
}

fn neighbours(x: u32, y: u32, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    let candidates = [
        (x.checked_sub(1), Some(y)),
        (x.checked_add(1).filter(|&v| v < width), Some(y)),
        (Some(x), y.checked_sub(1)),
        (Some(x), y.checked_add(1).filter(|&v| v < height)),
    ];
    candidates.into_iter().filter_map(|(nx, ny)| Some((nx?, ny?)))
}

/// Outside the clamped rectangle is background, inside probable foreground.
fn init_from_rect(mask: &mut LabelMask, rect: Rect) -> Result<()> {
    let (width, height) = mask.dimensions();
    let clamped = rect.clamp_to(width, height);
    if clamped.area() == 0 {
        bail!("rectangle {rect:?} has no area inside the {width}x{height} image");
    }
    for y in 0..height {
        for x in 0..width {
            let label = if clamped.contains(x as i32, y as i32) {
                Label::ProbableForeground
            } else {
                Label::Background
            };
            mask.set(x, y, label);
        }
    }
    Ok(())
}

/// Row-major (n, 3) matrix of RGB values as f64.
fn pixel_colors(image: &RgbImage) -> Array2<f64> {
    let (width, height) = image.dimensions();
    let n = (width * height) as usize;
    Array2::from_shape_fn((n, 3), |(i, c)| {
        let x = (i as u32) % width;
        let y = (i as u32) / width;
        image.get_pixel(x, y)[c] as f64
    })
}

/// Diagonal-covariance Gaussian mixture over RGB.
struct ColorMixture {
    weights: Array1<f64>,
    means: Array2<f64>,
    variances: Array2<f64>,
}

impl ColorMixture {
    /// Fit by a few deterministic k-means steps over the sampled rows.
    fn fit(colors: &Array2<f64>, samples: &[usize], components: usize) -> Self {
        let k = components.min(samples.len()).max(1);
        let mut means = Array2::<f64>::zeros((k, 3));
        for j in 0..k {
            let pick = samples[j * samples.len() / k];
            means.row_mut(j).assign(&colors.row(pick));
        }

        let mut assignment = vec![0usize; samples.len()];
        for _ in 0..KMEANS_STEPS {
            for (slot, &s) in assignment.iter_mut().zip(samples) {
                *slot = nearest(&means, colors.row(s));
            }
            let mut sums = Array2::<f64>::zeros((k, 3));
            let mut counts = vec![0usize; k];
            for (&j, &s) in assignment.iter().zip(samples) {
                let mut row = sums.row_mut(j);
                row += &colors.row(s);
                counts[j] += 1;
            }
            for j in 0..k {
                if counts[j] > 0 {
                    let mean = &sums.row(j) / counts[j] as f64;
                    means.row_mut(j).assign(&mean);
                }
            }
        }

        let mut counts = vec![0usize; k];
        let mut sq = Array2::<f64>::zeros((k, 3));
        for (&j, &s) in assignment.iter().zip(samples) {
            let diff = &colors.row(s) - &means.row(j);
            let mut row = sq.row_mut(j);
            row += &(&diff * &diff);
            counts[j] += 1;
        }

        let live: Vec<usize> = (0..k).filter(|&j| counts[j] > 0).collect();
        let total = samples.len() as f64;
        let weights = Array1::from_iter(live.iter().map(|&j| counts[j] as f64 / total));
        let means = means.select(Axis(0), &live);
        let mut variances = Array2::<f64>::zeros((live.len(), 3));
        for (row, &j) in live.iter().enumerate() {
            for c in 0..3 {
                variances[[row, c]] = (sq[[j, c]] / counts[j] as f64).max(VARIANCE_FLOOR);
            }
        }

        Self {
            weights,
            means,
            variances,
        }
    }

    fn log_likelihood(&self, color: ArrayView1<f64>) -> f64 {
        let log_terms: Vec<f64> = (0..self.weights.len())
            .map(|j| {
                let mut log_p = self.weights[j].ln();
                for c in 0..3 {
                    let var = self.variances[[j, c]];
                    let d = color[c] - self.means[[j, c]];
                    log_p -= 0.5 * ((2.0 * std::f64::consts::PI * var).ln() + d * d / var);
                }
                log_p
            })
            .collect();
        let max = log_terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        max + log_terms.iter().map(|t| (t - max).exp()).sum::<f64>().ln()
    }
}

fn nearest(means: &Array2<f64>, color: ArrayView1<f64>) -> usize {
    let mut best = (0, f64::INFINITY);
    for (j, mean) in means.axis_iter(Axis(0)).enumerate() {
        let d: f64 = (&mean - &color).mapv(|v| v * v).sum();
        if d < best.1 {
            best = (j, d);
        }
    }
    best.0
}
