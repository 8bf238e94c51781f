use image::RgbImage;
use std::ops::RangeInclusive;

use super::AdmissibilityError;
use crate::config::AnomalyConfig;

/// Flags images whose subject is obviously not a leaf.
pub trait AnomalyDetector: Send + Sync {
    fn name(&self) -> &'static str;
    fn detect(&self, image: &RgbImage) -> Result<bool, AdmissibilityError>;
}

/// Always reports "no anomaly".
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnomalyDetector;

impl AnomalyDetector for NoAnomalyDetector {
    fn name(&self) -> &'static str {
        "none"
    }

    fn detect(&self, _image: &RgbImage) -> Result<bool, AdmissibilityError> {
        Ok(false)
    }
}

const CB_RANGE: RangeInclusive<f32> = 77.0..=127.0;
const CR_RANGE: RangeInclusive<f32> = 133.0..=173.0;

pub fn is_skin(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
    let cb = 128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b;
    let cr = 128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b;
    CB_RANGE.contains(&cb) && CR_RANGE.contains(&cr)
}

/// Bounding box and pixel count of one 4-connected skin region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkinRegion {
    pub area: u64,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl SkinRegion {
    fn at(x: u32, y: u32) -> Self {
        Self {
            area: 1,
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn grow(&mut self, x: u32, y: u32) {
        self.area += 1;
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Height over width of the bounding box.
    pub fn aspect(&self) -> f32 {
        self.height() as f32 / self.width() as f32
    }

    /// Share of the bounding box covered by the region.
    pub fn fill(&self) -> f32 {
        self.area as f32 / (self.width() as u64 * self.height() as u64) as f32
    }

    /// Number of image borders the region reaches.
    pub fn borders_touched(&self, width: u32, height: u32) -> usize {
        [
            self.min_x == 0,
            self.min_y == 0,
            self.max_x + 1 == width,
            self.max_y + 1 == height,
        ]
        .iter()
        .filter(|touch| **touch)
        .count()
    }
}

#[derive(Debug)]
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new() -> Self {
        Self { parent: Vec::new() }
    }

    fn make(&mut self) -> usize {
        let id = self.parent.len();
        self.parent.push(id);
        id
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}

/// Two-pass labelling of the skin mask.
pub fn skin_regions(image: &RgbImage) -> Vec<SkinRegion> {
    let (width, height) = image.dimensions();
    let mut labels: Vec<Option<usize>> = vec![None; width as usize * height as usize];
    let mut sets = UnionFind::new();
    let index = |x: u32, y: u32| y as usize * width as usize + x as usize;

    for (x, y, p) in image.enumerate_pixels() {
        if !is_skin(p[0], p[1], p[2]) {
            continue;
        }
        let left = if x > 0 { labels[index(x - 1, y)] } else { None };
        let up = if y > 0 { labels[index(x, y - 1)] } else { None };
        labels[index(x, y)] = Some(match (left, up) {
            (Some(a), Some(b)) => {
                sets.union(a, b);
                a.min(b)
            }
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => sets.make(),
        });
    }

    let mut regions: Vec<Option<SkinRegion>> = vec![None; sets.parent.len()];
    for y in 0..height {
        for x in 0..width {
            if let Some(label) = labels[index(x, y)] {
                let root = sets.find(label);
                match &mut regions[root] {
                    Some(region) => region.grow(x, y),
                    slot => *slot = Some(SkinRegion::at(x, y)),
                }
            }
        }
    }
    regions.into_iter().flatten().collect()
}

/// Looks for a face-like skin patch: one compact region of plausible size
/// with an upright, oval bounding box that does not run off several image
/// edges. Brown backgrounds such as soil span the frame and fail the border
/// and shape rules.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinRegionDetector {
    min_area_fraction: f32,
    aspect: RangeInclusive<f32>,
    fill: RangeInclusive<f32>,
}

impl Default for SkinRegionDetector {
    fn default() -> Self {
        Self::from(&AnomalyConfig::default())
    }
}

impl From<&AnomalyConfig> for SkinRegionDetector {
    fn from(config: &AnomalyConfig) -> Self {
        Self {
            min_area_fraction: config.min_region_fraction,
            aspect: config.min_aspect..=config.max_aspect,
            fill: config.min_fill..=config.max_fill,
        }
    }
}

impl SkinRegionDetector {
    pub fn is_face_like(&self, region: &SkinRegion, width: u32, height: u32) -> bool {
        let total = width as u64 * height as u64;
        region.area as f32 / total as f32 >= self.min_area_fraction
            && region.borders_touched(width, height) <= 1
            && self.aspect.contains(&region.aspect())
            && self.fill.contains(&region.fill())
    }
}

impl AnomalyDetector for SkinRegionDetector {
    fn name(&self) -> &'static str {
        "skin-region"
    }

    fn detect(&self, image: &RgbImage) -> Result<bool, AdmissibilityError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(AdmissibilityError::EmptyImage { width, height });
        }
        let regions = skin_regions(image);
        let face = regions
            .iter()
            .find(|region| self.is_face_like(region, width, height));
        match face {
            Some(region) => {
                log::debug!(
                    "Face-like skin region {}x{} at ({}, {})",
                    region.width(),
                    region.height(),
                    region.min_x,
                    region.min_y
                );
                Ok(true)
            }
            None => {
                log::debug!("{} skin regions, none face-like", regions.len());
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const SKIN: Rgb<u8> = Rgb([224, 172, 105]);
    const SOIL: Rgb<u8> = Rgb([139, 90, 43]);
    const LEAF: Rgb<u8> = Rgb([40, 160, 40]);
    const GREY: Rgb<u8> = Rgb([110, 110, 120]);

    fn oval(side: u32, background: Rgb<u8>) -> RgbImage {
        let (cx, cy) = (side as f32 / 2.0, side as f32 / 2.0);
        let (rx, ry) = (side as f32 * 0.2, side as f32 * 0.28);
        RgbImage::from_fn(side, side, |x, y| {
            let dx = (x as f32 + 0.5 - cx) / rx;
            let dy = (y as f32 + 0.5 - cy) / ry;
            if dx * dx + dy * dy <= 1.0 { SKIN } else { background }
        })
    }

    #[test]
    fn skin_tones_are_recognised() {
        assert!(is_skin(224, 172, 105));
        assert!(is_skin(198, 134, 66));
        assert!(!is_skin(40, 160, 40));
        assert!(!is_skin(128, 128, 128));
    }

    #[test]
    fn regions_are_separated() {
        let image = RgbImage::from_fn(10, 4, |x, _| if x < 3 || x > 6 { SKIN } else { GREY });
        let mut regions = skin_regions(&image);
        regions.sort_by_key(|r| r.min_x);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].area, 12);
        assert_eq!((regions[1].min_x, regions[1].max_x), (7, 9));
    }

    #[test]
    fn u_shaped_region_is_merged() {
        let image = RgbImage::from_fn(5, 3, |x, y| {
            if x == 0 || x == 4 || y == 2 { SKIN } else { GREY }
        });
        let regions = skin_regions(&image);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 9);
    }

    #[test]
    fn oval_face_patch_is_flagged() {
        assert!(SkinRegionDetector::default().detect(&oval(120, GREY)).unwrap());
    }

    #[test]
    fn leaf_on_soil_is_not_flagged() {
        let by_rows = RgbImage::from_fn(100, 100, |_, y| if y < 40 { LEAF } else { SOIL });
        let by_cols = RgbImage::from_fn(100, 100, |x, _| if x < 40 { LEAF } else { SOIL });
        let detector = SkinRegionDetector::default();
        assert!(!detector.detect(&by_rows).unwrap());
        assert!(!detector.detect(&by_cols).unwrap());
    }

    #[test]
    fn full_frame_brown_is_not_a_face() {
        let image = RgbImage::from_pixel(64, 64, SOIL);
        assert!(!SkinRegionDetector::default().detect(&image).unwrap());
    }

    #[test]
    fn small_specks_are_ignored() {
        let image = RgbImage::from_fn(100, 100, |x, y| {
            if (40..44).contains(&x) && (40..45).contains(&y) { SKIN } else { LEAF }
        });
        assert!(!SkinRegionDetector::default().detect(&image).unwrap());
    }

    #[test]
    fn empty_image_is_an_error() {
        assert_eq!(
            SkinRegionDetector::default()
                .detect(&RgbImage::new(0, 0))
                .unwrap_err(),
            AdmissibilityError::EmptyImage {
                width: 0,
                height: 0
            }
        );
    }
}
