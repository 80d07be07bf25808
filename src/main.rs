use anyhow::Result;
use clap::Parser;
use image_processing::{process_file, ProcessOptions};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Blur and/or contour an image and save it as <stem>_Processed.<ext> next to the input"
)]
struct Args {
    /// Input image path (png/jpg/etc)
    image_path: PathBuf,

    /// Apply the blur filter (short simulated processing time)
    #[arg(long)]
    light: bool,

    /// Apply the contour filter (long simulated processing time)
    #[arg(long)]
    heavy: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let options = ProcessOptions {
        light: args.light,
        heavy: args.heavy,
        ..Default::default()
    };

    let out_path = process_file(&args.image_path, &options)?;

    println!("Wrote: {}", out_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn flags_default_off() {
        let args = Args::try_parse_from(["image-processing", "cat.png"]).unwrap();
        assert_eq!(args.image_path, PathBuf::from("cat.png"));
        assert!(!args.light);
        assert!(!args.heavy);
    }

    #[test]
    fn flags_are_independent() {
        let args = Args::try_parse_from(["image-processing", "--heavy", "cat.png"]).unwrap();
        assert!(!args.light);
        assert!(args.heavy);

        let args =
            Args::try_parse_from(["image-processing", "cat.png", "--light", "--heavy"]).unwrap();
        assert!(args.light && args.heavy);
    }

    #[test]
    fn image_path_is_required() {
        assert!(Args::try_parse_from(["image-processing", "--light"]).is_err());
    }
}
