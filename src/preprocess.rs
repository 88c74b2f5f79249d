use image::DynamicImage;
use ndarray::Array2;

/// Grayscale conversion, Gaussian smoothing and contrast-limited adaptive
/// histogram equalization, in that order. Parameters are fixed at
/// construction; the enhanced image keeps the input dimensions.
pub struct Preprocessor {
    ksize: usize,
    clip_limit: f32,
    tile_grid: (usize, usize),
}

impl Preprocessor {
    /// `ksize` must be odd.
    pub fn new(ksize: usize, clip_limit: f32, tile_grid: (usize, usize)) -> Self {
        assert!(ksize % 2 == 1, "Gaussian kernel size must be odd");
        Self {
            ksize,
            clip_limit,
            tile_grid,
        }
    }

    pub fn process(&self, img: &DynamicImage) -> Array2<u8> {
        let gray = img.to_luma8();
        let (width, height) = gray.dimensions();
        let gray = Array2::from_shape_vec((height as usize, width as usize), gray.into_raw())
            .expect("luma buffer matches image dimensions");

        let smoothed = gaussian_blur(&gray, self.ksize);

        clahe(&smoothed, self.clip_limit, self.tile_grid)
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(3, 2.0, (8, 8))
    }
}

fn gaussian_kernel(ksize: usize) -> Vec<f32> {
    let sigma = 0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (ksize / 2) as isize;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|x| (-((x * x) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}

// Reflect-101 indexing: -1 maps to 1, n maps to n - 2.
fn reflect(idx: isize, len: usize) -> usize {
    let len = len as isize;
    let mut i = idx;
    if i < 0 {
        i = -i;
    }
    if i >= len {
        i = 2 * len - i - 2;
    }
    i as usize
}

fn gaussian_blur(img: &Array2<u8>, ksize: usize) -> Array2<u8> {
    let (height, width) = img.dim();
    let kernel = gaussian_kernel(ksize);
    let half = (ksize / 2) as isize;

    let mut horizontal = Array2::<f32>::zeros((height, width));
    for r in 0..height {
        for c in 0..width {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let cc = reflect(c as isize + k as isize - half, width);
                acc += weight * img[[r, cc]] as f32;
            }
            horizontal[[r, c]] = acc;
        }
    }

    let mut out = Array2::<u8>::zeros((height, width));
    for r in 0..height {
        for c in 0..width {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let rr = reflect(r as isize + k as isize - half, height);
                acc += weight * horizontal[[rr, c]];
            }
            out[[r, c]] = acc.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Contrast-limited adaptive histogram equalization. The image is divided
/// into a grid of tiles; each tile gets an equalization LUT built from its
/// clipped histogram, and every pixel is remapped by bilinear interpolation
/// between the LUTs of the four surrounding tile centers.
fn clahe(img: &Array2<u8>, clip_limit: f32, tile_grid: (usize, usize)) -> Array2<u8> {
    let (height, width) = img.dim();
    let (tiles_y, tiles_x) = tile_grid;
    let tile_h = (height + tiles_y - 1) / tiles_y;
    let tile_w = (width + tiles_x - 1) / tiles_x;

    let mut luts = vec![[0u8; 256]; tiles_y * tiles_x];
    for ti in 0..tiles_y {
        for tj in 0..tiles_x {
            let r0 = ti * tile_h;
            let r1 = ((ti + 1) * tile_h).min(height);
            let c0 = tj * tile_w;
            let c1 = ((tj + 1) * tile_w).min(width);

            let mut hist = [0u32; 256];
            for r in r0..r1 {
                for c in c0..c1 {
                    hist[img[[r, c]] as usize] += 1;
                }
            }
            let area = ((r1 - r0) * (c1 - c0)) as u32;

            // Clip the histogram and hand the excess back uniformly.
            let clip = ((clip_limit * area as f32 / 256.0).max(1.0)) as u32;
            let mut excess = 0u32;
            for bin in hist.iter_mut() {
                if *bin > clip {
                    excess += *bin - clip;
                    *bin = clip;
                }
            }
            let bonus = excess / 256;
            let leftover = (excess % 256) as usize;
            for bin in hist.iter_mut() {
                *bin += bonus;
            }
            for bin in hist.iter_mut().take(leftover) {
                *bin += 1;
            }

            let scale = 255.0 / area as f32;
            let lut = &mut luts[ti * tiles_x + tj];
            let mut cdf = 0u32;
            for (value, count) in hist.iter().enumerate() {
                cdf += count;
                lut[value] = (cdf as f32 * scale).round().min(255.0) as u8;
            }
        }
    }

    let last_y = (tiles_y - 1) as isize;
    let last_x = (tiles_x - 1) as isize;
    let mut out = Array2::<u8>::zeros((height, width));
    for r in 0..height {
        let gy = (r as f32 + 0.5) / tile_h as f32 - 0.5;
        let ti = gy.floor();
        let dy = gy - ti;
        let t0 = (ti as isize).clamp(0, last_y) as usize;
        let t1 = (ti as isize + 1).clamp(0, last_y) as usize;

        for c in 0..width {
            let gx = (c as f32 + 0.5) / tile_w as f32 - 0.5;
            let tj = gx.floor();
            let dx = gx - tj;
            let s0 = (tj as isize).clamp(0, last_x) as usize;
            let s1 = (tj as isize + 1).clamp(0, last_x) as usize;

            let value = img[[r, c]] as usize;
            let top = (1.0 - dx) * luts[t0 * tiles_x + s0][value] as f32
                + dx * luts[t0 * tiles_x + s1][value] as f32;
            let bottom = (1.0 - dx) * luts[t1 * tiles_x + s0][value] as f32
                + dx * luts[t1 * tiles_x + s1][value] as f32;
            out[[r, c]] = ((1.0 - dy) * top + dy * bottom)
                .round()
                .clamp(0.0, 255.0) as u8;
        }
    }
    out
}
