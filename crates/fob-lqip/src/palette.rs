//! Dominant color extraction
//!
//! Pixels are bucketed by their top 5 bits per channel; the most populated
//! buckets become the palette, each represented by the mean color of its
//! pixels.

use image::DynamicImage;
use std::collections::HashMap;

/// Longest edge the image is reduced to before counting pixels.
const SAMPLE_EDGE: u32 = 100;

/// Pixels with lower alpha do not contribute to the palette.
const MIN_ALPHA: u8 = 125;

const QUANT_SHIFT: u8 = 3;

/// A palette entry with the number of pixels it represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swatch {
    pub rgb: [u8; 3],
    pub population: u32,
}

impl Swatch {
    /// Lowercase `#rrggbb`
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.rgb[0], self.rgb[1], self.rgb[2])
    }
}

#[derive(Default)]
struct Bucket {
    count: u32,
    sum: [u64; 3],
}

/// Extract up to `max_colors` swatches, most populated first.
pub fn swatches(image: &DynamicImage, max_colors: usize) -> Vec<Swatch> {
    let sample = if image.width() > SAMPLE_EDGE || image.height() > SAMPLE_EDGE {
        image.thumbnail(SAMPLE_EDGE, SAMPLE_EDGE)
    } else {
        image.clone()
    };
    let rgba = sample.to_rgba8();

    let mut buckets: HashMap<(u8, u8, u8), Bucket> = HashMap::new();
    for px in rgba.pixels() {
        let [r, g, b, a] = px.0;
        if a < MIN_ALPHA {
            continue;
        }
        let key = (r >> QUANT_SHIFT, g >> QUANT_SHIFT, b >> QUANT_SHIFT);
        let bucket = buckets.entry(key).or_default();
        bucket.count += 1;
        bucket.sum[0] += r as u64;
        bucket.sum[1] += g as u64;
        bucket.sum[2] += b as u64;
    }

    let mut sorted: Vec<_> = buckets.into_iter().collect();
    // Ties broken by bucket key so output is stable across runs
    sorted.sort_by(|(ka, a), (kb, b)| b.count.cmp(&a.count).then(ka.cmp(kb)));

    sorted
        .into_iter()
        .take(max_colors)
        .map(|(_, bucket)| {
            let n = bucket.count as u64;
            Swatch {
                rgb: [
                    (bucket.sum[0] / n) as u8,
                    (bucket.sum[1] / n) as u8,
                    (bucket.sum[2] / n) as u8,
                ],
                population: bucket.count,
            }
        })
        .collect()
}

/// Hex colors of the dominant swatches, most populated first.
pub fn dominant_colors(image: &DynamicImage, max_colors: usize) -> Vec<String> {
    swatches(image, max_colors).iter().map(Swatch::hex).collect()
}
