//! Spawn mask — the jar's interior as an alpha raster.
//!
//! Image decode happens on the JS side (canvas `drawImage` at the raster size,
//! then `getImageData`). The RGBA readback is handed to `load_mask`, which
//! keeps only the alpha channel. Placement code borrows the raster for the
//! length of one operation via [`acquire`] and never sees pixels directly,
//! only [`AlphaMask::alpha_at`].

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMask {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl AlphaMask {
    /// Build from RGBA bytes. `None` if the buffer is shorter than
    /// `width * height * 4` or either dimension is zero.
    pub fn from_rgba(rgba: &[u8], width: u32, height: u32) -> Option<Self> {
        let pixels = (width as usize).checked_mul(height as usize)?;
        if pixels == 0 || rgba.len() < pixels * 4 {
            return None;
        }
        let alpha = rgba.chunks_exact(4).take(pixels).map(|px| px[3]).collect();
        Some(Self {
            width,
            height,
            alpha,
        })
    }

    /// Fully opaque (or fully transparent) raster; test fixtures and demos.
    pub fn filled(width: u32, height: u32, alpha: u8) -> Self {
        Self {
            width,
            height,
            alpha: vec![alpha; width as usize * height as usize],
        }
    }

    /// Build from a per-pixel predicate returning alpha.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> Self {
        let mut alpha = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                alpha.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            alpha,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Alpha at a (possibly fractional) coordinate, truncated to the pixel
    /// grid the way canvas `getImageData` does. `None` outside the raster.
    pub fn alpha_at(&self, x: f64, y: f64) -> Option<u8> {
        if !(x >= 0.0 && y >= 0.0 && x < self.width as f64 && y < self.height as f64) {
            return None;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.alpha.get(idx).copied()
    }
}

thread_local! {
    static MASK: RefCell<Option<Rc<AlphaMask>>> = const { RefCell::new(None) };
}

/// Install the decoded mask. Returns false when the buffer is unusable; the
/// previous mask (if any) is dropped either way.
pub fn install(rgba: &[u8], width: u32, height: u32) -> bool {
    let mask = AlphaMask::from_rgba(rgba, width, height);
    let ok = mask.is_some();
    if ok {
        debug!(width, height, "spawn mask installed");
    } else {
        warn!(len = rgba.len(), width, height, "spawn mask buffer rejected");
    }
    MASK.with(|m| *m.borrow_mut() = mask.map(Rc::new));
    ok
}

pub fn set(mask: Option<AlphaMask>) {
    MASK.with(|m| *m.borrow_mut() = mask.map(Rc::new));
}

pub fn clear() {
    set(None);
}

/// Borrow the current mask for one placement operation. `None` means the
/// mask image never loaded; callers fall back rather than fail.
pub fn acquire() -> Option<Rc<AlphaMask>> {
    MASK.with(|m| m.borrow().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_alpha_channel_only() {
        // 2x1: first pixel opaque, second transparent
        let rgba = [10, 20, 30, 255, 40, 50, 60, 0];
        let mask = AlphaMask::from_rgba(&rgba, 2, 1).unwrap();
        assert_eq!(mask.alpha_at(0.0, 0.0), Some(255));
        assert_eq!(mask.alpha_at(1.0, 0.0), Some(0));
    }

    #[test]
    fn rejects_short_buffer() {
        assert!(AlphaMask::from_rgba(&[0; 15], 2, 2).is_none());
        assert!(AlphaMask::from_rgba(&[], 0, 0).is_none());
    }

    #[test]
    fn fractional_coordinates_truncate() {
        let mask = AlphaMask::from_fn(4, 4, |x, y| (x * 10 + y) as u8);
        assert_eq!(mask.alpha_at(2.9, 1.2), Some(21));
    }

    #[test]
    fn out_of_bounds_is_none() {
        let mask = AlphaMask::filled(300, 300, 255);
        assert_eq!(mask.alpha_at(-0.5, 10.0), None);
        assert_eq!(mask.alpha_at(300.0, 10.0), None);
        assert_eq!(mask.alpha_at(10.0, 300.0), None);
        assert_eq!(mask.alpha_at(299.9, 299.9), Some(255));
    }

    #[test]
    fn install_and_acquire() {
        clear();
        assert!(acquire().is_none());
        let rgba = vec![255u8; 3 * 3 * 4];
        assert!(install(&rgba, 3, 3));
        assert_eq!(acquire().unwrap().width(), 3);
        assert!(!install(&rgba, 10, 10));
        assert!(acquire().is_none());
        clear();
    }
}
