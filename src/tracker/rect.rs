use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel units, stored as TLWH.
///
/// Detections arrive in TLWH; the motion model works in XYAH (center x,
/// center y, width / height, height); warps and crops work on TLBR corners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// From corners `(x1, y1)` and `(x2, y2)`.
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    /// From the motion model's measurement space.
    #[inline]
    pub fn from_xyah(cx: f32, cy: f32, aspect_ratio: f32, height: f32) -> Self {
        let width = aspect_ratio * height;
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    #[inline]
    pub fn to_tlwh(&self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.right(), self.bottom()]
    }

    /// `[cx, cy, w / h, h]`; a flat box reports an aspect ratio of zero.
    #[inline]
    pub fn to_xyah(&self) -> [f32; 4] {
        let (cx, cy) = self.center();
        let aspect_ratio = if self.height > 0.0 {
            self.width / self.height
        } else {
            0.0
        };
        [cx, cy, aspect_ratio, self.height]
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// True when every coordinate is finite and both extents are positive.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.to_tlwh().iter().all(|v| v.is_finite()) && self.width > 0.0 && self.height > 0.0
    }

    /// Overlapping region, or `None` when the boxes only touch or are apart.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        (x2 > x1 && y2 > y1).then(|| Rect::from_tlbr(x1, y1, x2, y2))
    }

    /// Intersection over union; zero for disjoint or degenerate pairs.
    pub fn iou(&self, other: &Rect) -> f32 {
        let Some(inter) = self.intersection(other) else {
            return 0.0;
        };
        let inter_area = inter.area();
        let union_area = self.area() + other.area() - inter_area;
        if union_area > 0.0 {
            inter_area / union_area
        } else {
            0.0
        }
    }

    /// Whole-pixel bounds `[x1, y1, x2, y2)` of this box inside a
    /// `width` x `height` image, or `None` when nothing is left.
    pub fn pixel_bounds(&self, width: u32, height: u32) -> Option<[usize; 4]> {
        if !self.is_valid() {
            return None;
        }
        let clamp = |v: f32, max: u32| v.clamp(0.0, max as f32) as usize;
        let x1 = clamp(self.x.floor(), width);
        let y1 = clamp(self.y.floor(), height);
        let x2 = clamp(self.right().ceil(), width);
        let y2 = clamp(self.bottom().ceil(), height);
        (x2 > x1 && y2 > y1).then_some([x1, y1, x2, y2])
    }
}
