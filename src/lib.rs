use anyhow::{Context, Result};
use image::DynamicImage;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod kernel;

pub use kernel::{Kernel, BLUR, CONTOUR};

/// Appended to the input stem to name the output file.
pub const OUTPUT_SUFFIX: &str = "_Processed";

/// Simulated duration of the light stage.
pub const LIGHT_DELAY: Duration = Duration::from_secs(1);

/// Simulated duration of the heavy stage.
pub const HEAVY_DELAY: Duration = Duration::from_secs(60);

// --- output path derivation ---

/// `dir/name.ext` -> `dir/name_Processed.ext`. A missing extension stays missing.
pub fn derive_output_path(input: &Path) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .context("Input filename has no valid stem")?;

    let mut filename = OsString::from(stem);
    filename.push(OUTPUT_SUFFIX);
    if let Some(ext) = input.extension() {
        filename.push(".");
        filename.push(ext);
    }

    Ok(input.with_file_name(filename))
}

// --- processing stages ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOptions {
    pub light: bool,
    pub heavy: bool,
    pub light_delay: Duration,
    pub heavy_delay: Duration,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            light: false,
            heavy: false,
            light_delay: LIGHT_DELAY,
            heavy_delay: HEAVY_DELAY,
        }
    }
}

/// Blur once, then block for `delay`.
pub fn light_processing(image: DynamicImage, delay: Duration) -> DynamicImage {
    let started = std::time::Instant::now();
    let out = BLUR.apply(&image);
    log::debug!("light: blur done in {:?}", started.elapsed());
    std::thread::sleep(delay);
    out
}

/// Contour once, then block for `delay`.
pub fn heavy_processing(image: DynamicImage, delay: Duration) -> DynamicImage {
    let started = std::time::Instant::now();
    let out = CONTOUR.apply(&image);
    log::debug!("heavy: contour done in {:?}", started.elapsed());
    std::thread::sleep(delay);
    out
}

/// Run the enabled stages in order: light, then heavy.
pub fn process_image(image: DynamicImage, options: &ProcessOptions) -> DynamicImage {
    let mut image = image;

    if options.light {
        log::info!("Applying light processing");
        image = light_processing(image, options.light_delay);
    }

    if options.heavy {
        log::info!("Applying heavy processing");
        image = heavy_processing(image, options.heavy_delay);
    }

    image
}

/// Open `input`, process it and save next to it. Returns the written path.
pub fn process_file(input: &Path, options: &ProcessOptions) -> Result<PathBuf> {
    let out_path = derive_output_path(input)?;

    let original = image::open(input)
        .with_context(|| format!("Failed to open input image: {}", input.display()))?;
    log::info!(
        "Loaded: {} ({}x{})",
        input.display(),
        original.width(),
        original.height()
    );

    let processed = process_image(original, options);

    processed
        .save(&out_path)
        .with_context(|| format!("Failed to save output image: {}", out_path.display()))?;
    log::info!("Saved: {}", out_path.display());

    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn no_delay(light: bool, heavy: bool) -> ProcessOptions {
        ProcessOptions {
            light,
            heavy,
            light_delay: Duration::ZERO,
            heavy_delay: Duration::ZERO,
        }
    }

    fn gradient() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(12, 10, |x, y| {
            Luma([((x * 21) ^ (y * 13)) as u8])
        }))
    }

    #[test]
    fn output_path_appends_suffix() {
        let out = derive_output_path(Path::new("photos/cat.png")).unwrap();
        assert_eq!(out, PathBuf::from("photos/cat_Processed.png"));
    }

    #[test]
    fn output_path_keeps_only_last_extension() {
        let out = derive_output_path(Path::new("/tmp/archive.tar.jpg")).unwrap();
        assert_eq!(out, PathBuf::from("/tmp/archive.tar_Processed.jpg"));
    }

    #[test]
    fn output_path_without_extension() {
        let out = derive_output_path(Path::new("scan")).unwrap();
        assert_eq!(out, PathBuf::from("scan_Processed"));
    }

    #[test]
    fn output_path_never_equals_input() {
        for p in ["a.png", "dir/b.jpeg", ".hidden", "x", "nested/dir/c.d.e.bmp"] {
            let input = Path::new(p);
            assert_ne!(derive_output_path(input).unwrap(), input);
        }
    }

    #[test]
    fn output_path_requires_stem() {
        assert!(derive_output_path(Path::new("..")).is_err());
        assert!(derive_output_path(Path::new("/")).is_err());
    }

    #[test]
    fn default_options_use_simulated_delays() {
        let opts = ProcessOptions::default();
        assert!(!opts.light && !opts.heavy);
        assert_eq!(opts.light_delay, Duration::from_secs(1));
        assert_eq!(opts.heavy_delay, Duration::from_secs(60));
    }

    #[test]
    fn no_stage_is_passthrough() {
        let img = gradient();
        assert_eq!(process_image(img.clone(), &no_delay(false, false)), img);
    }

    #[test]
    fn stages_run_light_then_heavy() {
        let img = gradient();
        let both = process_image(img.clone(), &no_delay(true, true));
        let expected = CONTOUR.apply(&BLUR.apply(&img));
        let reversed = BLUR.apply(&CONTOUR.apply(&img));
        assert_eq!(both, expected);
        assert_ne!(both, reversed);
    }

    #[test]
    fn single_stages_match_their_kernel() {
        let img = gradient();
        assert_eq!(process_image(img.clone(), &no_delay(true, false)), BLUR.apply(&img));
        assert_eq!(process_image(img.clone(), &no_delay(false, true)), CONTOUR.apply(&img));
    }

    #[test]
    fn light_stage_waits_for_delay() {
        let started = std::time::Instant::now();
        let out = light_processing(gradient(), Duration::from_millis(30));
        assert!(started.elapsed() >= Duration::from_millis(30));
        assert_eq!(out, BLUR.apply(&gradient()));
    }

    #[test]
    fn heavy_stage_waits_for_delay() {
        let started = std::time::Instant::now();
        let out = heavy_processing(gradient(), Duration::from_millis(40));
        assert!(started.elapsed() >= Duration::from_millis(40));
        assert_eq!(out, CONTOUR.apply(&gradient()));
    }
}
