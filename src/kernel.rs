use image::{DynamicImage, ImageBuffer, Pixel};

/// Square convolution kernel applied to every channel of an 8-bit image.
///
/// Each output sample is `offset + sum(weight * sample) / scale`, rounded and
/// clamped to `0..=255`. Pixels within `N / 2` of an edge keep their source
/// value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel<const N: usize> {
    weights: [[f32; N]; N],
    scale: f32,
    offset: f32,
}

/// 5x5 ring blur: the 16 outer samples averaged, the inner 3x3 ignored.
pub const BLUR: Kernel<5> = Kernel::new(
    [
        [1.0, 1.0, 1.0, 1.0, 1.0],
        [1.0, 0.0, 0.0, 0.0, 1.0],
        [1.0, 0.0, 0.0, 0.0, 1.0],
        [1.0, 0.0, 0.0, 0.0, 1.0],
        [1.0, 1.0, 1.0, 1.0, 1.0],
    ],
    16.0,
    0.0,
);

/// 3x3 Laplacian offset to white, so flat regions come out 255 and edges dark.
pub const CONTOUR: Kernel<3> = Kernel::new(
    [
        [-1.0, -1.0, -1.0],
        [-1.0, 8.0, -1.0],
        [-1.0, -1.0, -1.0],
    ],
    1.0,
    255.0,
);

impl<const N: usize> Kernel<N> {
    pub const fn new(weights: [[f32; N]; N], scale: f32, offset: f32) -> Self {
        Self {
            weights,
            scale,
            offset,
        }
    }

    pub fn size(&self) -> usize {
        N
    }

    fn radius(&self) -> u32 {
        (self.size() / 2) as u32
    }

    fn finish(&self, acc: f32) -> u8 {
        // round half up, then saturate
        (self.offset + acc / self.scale + 0.5)
            .floor()
            .clamp(0.0, 255.0) as u8
    }

    /// Convolve one 8-bit buffer. Images smaller than the kernel come back unchanged.
    pub fn convolve<P>(&self, img: &ImageBuffer<P, Vec<u8>>) -> ImageBuffer<P, Vec<u8>>
    where
        P: Pixel<Subpixel = u8>,
    {
        let (w, h) = img.dimensions();
        let r = self.radius();
        let mut out = img.clone();

        if w <= 2 * r || h <= 2 * r {
            return out;
        }

        for y in r..h - r {
            for x in r..w - r {
                // 8-bit pixel types carry at most 4 channels
                let mut acc = [0.0f32; 4];

                for (ky, row) in self.weights.iter().enumerate() {
                    for (kx, &k) in row.iter().enumerate() {
                        if k == 0.0 {
                            continue;
                        }
                        let p = img.get_pixel(x - r + kx as u32, y - r + ky as u32);
                        for (a, &c) in acc.iter_mut().zip(p.channels()) {
                            *a += (c as f32) * k;
                        }
                    }
                }

                let px = out.get_pixel_mut(x, y);
                for (c, a) in px.channels_mut().iter_mut().zip(acc) {
                    *c = self.finish(a);
                }
            }
        }

        out
    }

    /// Convolve a decoded image, keeping its channel layout.
    ///
    /// 16-bit and float images are reduced to the 8-bit layout with the same
    /// channels first.
    pub fn apply(&self, image: &DynamicImage) -> DynamicImage {
        match image {
            DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(self.convolve(buf)),
            DynamicImage::ImageLumaA8(buf) => DynamicImage::ImageLumaA8(self.convolve(buf)),
            DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(self.convolve(buf)),
            DynamicImage::ImageRgba8(buf) => DynamicImage::ImageRgba8(self.convolve(buf)),
            other => {
                let color = other.color();
                match (color.channel_count(), color.has_alpha()) {
                    (1, _) => DynamicImage::ImageLuma8(self.convolve(&other.to_luma8())),
                    (2, _) => DynamicImage::ImageLumaA8(self.convolve(&other.to_luma_alpha8())),
                    (_, false) => DynamicImage::ImageRgb8(self.convolve(&other.to_rgb8())),
                    (_, true) => DynamicImage::ImageRgba8(self.convolve(&other.to_rgba8())),
                }
            }
        }
    }
}
