use std::fmt;

/// A decoded frame: an immutable raster of tightly packed RGBA8 pixels.
///
/// Bitmaps are created by a decoder during a decode batch and owned by the
/// [`FrameProvider`]'s cache afterwards. They are never mutated.
///
/// [`FrameProvider`]: crate::FrameProvider
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Box<[u8]>,
}

impl Bitmap {
    /// Create a bitmap from raw RGBA8 pixel data in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` is not exactly `width * height * 4`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            width as usize * height as usize * 4,
            "pixel data length does not match {}x{} RGBA dimensions",
            width,
            height
        );

        Self {
            width,
            height,
            data: data.into_boxed_slice(),
        }
    }

    /// The width of the frame in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The height of the frame in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The raw RGBA8 pixel data in row-major order.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The `[r, g, b, a]` value of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width && y < self.height);

        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
