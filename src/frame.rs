//! Frames and the monitored-area masking filter.
//!
//! - `Frame`: an RGB8 frame as produced by the ingestion layer.
//! - `Mask`: binary coverage of the monitored area (255 inside, 0 outside).
//! - `MaskedFrame`: a frame with everything outside the mask zeroed.
//!
//! Detectors accept `MaskedFrame` only, and the only way to build one is
//! [`Frame::apply_mask`]. A detection outside the monitored area therefore
//! cannot reach the classifier.

use anyhow::{anyhow, Result};

use crate::geometry::{Point, Polygon, PolygonRole};
use crate::OccupancyError;

/// Bytes per pixel of every frame in the pipeline (interleaved RGB).
pub const CHANNELS: usize = 3;

pub const MASK_ON: u8 = 255;
pub const MASK_OFF: u8 = 0;

// ----------------------------------------------------------------------------
// Frame
// ----------------------------------------------------------------------------

/// One decoded video frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Sequence number assigned by the source, starting at 0.
    pub index: u64,
}

impl Frame {
    /// Wrap RGB8 pixel data. The buffer length must be `width * height * 3`.
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: u64) -> Result<Self> {
        let expected = pixel_count(width, height)
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if data.len() != expected {
            return Err(anyhow!(
                "RGB frame length mismatch: expected {}, got {}",
                expected,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            index,
        })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// Zero every pixel outside `mask`; pixels inside are copied unchanged.
    pub fn apply_mask<'m>(&self, mask: &'m Mask) -> Result<MaskedFrame<'m>, OccupancyError> {
        mask.check_dimensions(self.width, self.height)?;
        let mut data = self.data.clone();
        for (pixel, &m) in data.chunks_exact_mut(CHANNELS).zip(mask.data.iter()) {
            if m == MASK_OFF {
                pixel.fill(0);
            }
        }
        Ok(MaskedFrame {
            data,
            width: self.width,
            height: self.height,
            index: self.index,
            mask,
        })
    }
}

// ----------------------------------------------------------------------------
// Mask
// ----------------------------------------------------------------------------

/// Binary pixel mask for the monitored area.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Mask {
    /// Scanline-fill `area` into a `width` x `height` mask.
    ///
    /// A pixel is on iff it lies inside the polygon or on its boundary, the
    /// same rule as [`Polygon::contains`]. Parts of the polygon outside the
    /// frame are clipped.
    pub fn build(width: u32, height: u32, area: &Polygon) -> Result<Self, OccupancyError> {
        area.ensure_valid(PolygonRole::MonitoredArea)?;
        let w = width as usize;
        let mut data = vec![MASK_OFF; w * height as usize];
        let Some((min, max)) = area.bounds() else {
            return Ok(Self {
                data,
                width,
                height,
            });
        };
        if width == 0 || height == 0 {
            return Ok(Self {
                data,
                width,
                height,
            });
        }

        let x_limit = i64::from(width) - 1;
        let y_start = i64::from(min.y).max(0);
        let y_end = i64::from(max.y).min(i64::from(height) - 1);
        let mut crossings: Vec<Fraction> = Vec::new();

        for y in y_start..=y_end {
            let row = &mut data[y as usize * w..(y as usize + 1) * w];
            let mut fill = |from: i64, to: i64| {
                let from = from.max(0);
                let to = to.min(x_limit);
                if from <= to {
                    row[from as usize..=to as usize].fill(MASK_ON);
                }
            };

            crossings.clear();
            for (a, b) in area.edges() {
                let (ax, ay) = (i64::from(a.x), i64::from(a.y));
                let (bx, by) = (i64::from(b.x), i64::from(b.y));

                // Boundary pixels on this row.
                if ay == by {
                    if ay == y {
                        fill(ax.min(bx), ax.max(bx));
                    }
                } else if y >= ay.min(by) && y <= ay.max(by) {
                    let x = Fraction::edge_x(ax, ay, bx, by, y);
                    if let Some(exact) = x.exact() {
                        fill(exact, exact);
                    }
                }

                // Interior spans use the half-open crossing rule.
                if (ay > y) != (by > y) {
                    crossings.push(Fraction::edge_x(ax, ay, bx, by, y));
                }
            }

            crossings.sort_by(|l, r| l.cmp_value(r));
            for pair in crossings.chunks_exact(2) {
                fill(pair[0].ceil(), pair[1].floor());
            }
        }

        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Whether a pixel is inside the mask. Out-of-frame points are not.
    pub fn covers(&self, p: Point) -> bool {
        if p.x < 0 || p.y < 0 || p.x as u32 >= self.width || p.y as u32 >= self.height {
            return false;
        }
        self.data[p.y as usize * self.width as usize + p.x as usize] == MASK_ON
    }

    /// Number of pixels switched on.
    pub fn coverage(&self) -> usize {
        self.data.iter().filter(|&&m| m == MASK_ON).count()
    }

    fn check_dimensions(&self, width: u32, height: u32) -> Result<(), OccupancyError> {
        if self.width != width || self.height != height {
            return Err(OccupancyError::DimensionMismatch {
                mask_width: self.width,
                mask_height: self.height,
                frame_width: width,
                frame_height: height,
            });
        }
        Ok(())
    }
}

/// Free-function form of [`Mask::build`].
pub fn build_mask(width: u32, height: u32, area: &Polygon) -> Result<Mask, OccupancyError> {
    Mask::build(width, height, area)
}

/// Free-function form of [`Frame::apply_mask`].
pub fn apply_mask<'m>(frame: &Frame, mask: &'m Mask) -> Result<MaskedFrame<'m>, OccupancyError> {
    frame.apply_mask(mask)
}

// ----------------------------------------------------------------------------
// MaskedFrame
// ----------------------------------------------------------------------------

/// A frame restricted to the monitored area. This is what detectors see.
pub struct MaskedFrame<'m> {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: u64,
    mask: &'m Mask,
}

impl<'m> MaskedFrame<'m> {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// Whether a point is visible in this frame (inside the monitored area).
    pub fn covers(&self, p: Point) -> bool {
        self.mask.covers(p)
    }
}

fn pixel_count(width: u32, height: u32) -> Option<usize> {
    (width as usize).checked_mul(height as usize)
}

/// Exact rational `num / den` with `den > 0`, used for edge/row intersections.
#[derive(Clone, Copy, Debug)]
struct Fraction {
    num: i128,
    den: i128,
}

impl Fraction {
    /// x where the edge (ax, ay)-(bx, by) meets row `y`. Requires `ay != by`.
    /// The result lies between `ax` and `bx`, so its floor and ceil fit i64.
    fn edge_x(ax: i64, ay: i64, bx: i64, by: i64, y: i64) -> Self {
        let (ax, ay, bx, by, y) = (
            i128::from(ax),
            i128::from(ay),
            i128::from(bx),
            i128::from(by),
            i128::from(y),
        );
        let num = ax * (by - ay) + (y - ay) * (bx - ax);
        let den = by - ay;
        if den < 0 {
            Self {
                num: -num,
                den: -den,
            }
        } else {
            Self { num, den }
        }
    }

    fn exact(self) -> Option<i64> {
        (self.num % self.den == 0).then(|| (self.num / self.den) as i64)
    }

    fn floor(self) -> i64 {
        self.num.div_euclid(self.den) as i64
    }

    fn ceil(self) -> i64 {
        -((-self.num).div_euclid(self.den) as i64)
    }

    fn cmp_value(&self, other: &Self) -> std::cmp::Ordering {
        (self.num * other.den).cmp(&(other.num * self.den))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
