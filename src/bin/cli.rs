//! This is the command line tool that loads an input file and either compresses
//! or decompresses it.

extern crate clap;
extern crate env_logger;
extern crate log;

use clap::{value_parser, Arg, ArgAction, Command};
use lzctx::header::{Header, HEADER_SIZE};
use lzctx::volume::VolumeReader;
use lzctx::{
    compress_bound, CompressCtx, Compressor, DecompressCtx, Decompressor,
    LzmaError, StreamCompressCtx, StreamDecompressCtx,
};

use std::{fs, time::Instant};
use std::{fs::File, io::Write};

const FILE_EXTENSION: &str = ".lzma";

fn save_file(data: &[u8], path: &str) {
    let mut f = File::create(path).expect("Can't create file");
    f.write_all(data).expect("Unable to write data");
    log::info!("Wrote {}.", &path);
}

/// A scoped utility struct for measuring and reporting time.
struct Timer {
    start: std::time::Instant,
}

impl Timer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let now = Instant::now();
        if let Some(duration) = now.checked_duration_since(self.start) {
            log::info!(
                "Operation completed in {:03} seconds",
                duration.as_secs_f32()
            );
        }
    }
}

fn compress(
    is_stream: bool,
    level: u32,
    input: &[u8],
) -> Result<Vec<u8>, LzmaError> {
    let mut compressor: Box<dyn Compressor> = if is_stream {
        log::info!("Compressing with the stream codec");
        Box::new(StreamCompressCtx::new(level)?)
    } else {
        log::info!("Compressing with a compression context");
        Box::new(CompressCtx::new(level)?)
    };
    let mut output = vec![0; compress_bound(input.len())];
    let written = compressor.compress(input, &mut output)?;
    output.truncate(written);
    Ok(output)
}

fn decompress(is_stream: bool, input: &[u8]) -> Result<Vec<u8>, LzmaError> {
    let header = Header::read(&mut VolumeReader::wrapped(input, 0))?;
    let mut decompressor: Box<dyn Decompressor> = if is_stream {
        log::info!("Decompressing with the stream codec");
        Box::new(StreamDecompressCtx::new())
    } else {
        log::info!("Decompressing with a decompression context");
        Box::new(DecompressCtx::new())
    };

    if let Some(size) = header.uncompressed_size {
        let mut output = vec![0; size as usize];
        let written = decompressor.decompress(input, &mut output)?;
        output.truncate(written);
        return Ok(output);
    }

    // The size is not recorded. Retry with a larger buffer until the whole
    // stream fits.
    let mut output = vec![0; (input.len() - HEADER_SIZE) * 4 + 1024];
    loop {
        match decompressor.decompress(input, &mut output) {
            Ok(written) if written < output.len() => {
                output.truncate(written);
                return Ok(output);
            }
            Ok(_) | Err(LzmaError::BufferOverflow { .. }) => {
                log::info!("Growing the output buffer");
                output.resize(output.len() * 2, 0);
            }
            Err(err) => return Err(err),
        }
    }
}

fn main() {
    let matches = Command::new("CLI")
        .version("1.x")
        .arg(
            Arg::new("checked")
                .long("check")
                .help("Enables checked-mode")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("decompress")
                .short('d')
                .long("decompress")
                .help("Try to decompress the input")
                .action(ArgAction::SetTrue)
                .conflicts_with("compress"),
        )
        .arg(
            Arg::new("compress")
                .short('c')
                .long("compress")
                .help("Compress the input")
                .conflicts_with("decompress")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("level")
                .short('l')
                .long("level")
                .value_name("LEVEL")
                .help("The compression level (0-9)")
                .value_parser(value_parser!(u32).range(0..=9))
                .num_args(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Path of the output file")
                .num_args(1),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .value_name("mode")
                .help("The codec used for compression.")
                .value_parser(["ctx", "stream"])
                .num_args(1),
        )
        .arg(
            Arg::new("INPUT")
                .help("Sets the input file to use")
                .required(true)
                .index(1),
        )
        .get_matches();

    env_logger::builder().format_timestamp(None).init();

    let mut cli_compress = matches.get_flag("compress");
    let cli_decompress = matches.get_flag("decompress");
    let cli_checked_mode = matches.get_flag("checked");
    let mut cli_output_path = matches.get_one::<String>("output").cloned();
    let cli_level = matches
        .get_one::<u32>("level")
        .copied()
        .unwrap_or(lzctx::options::LEVEL_DEFAULT);
    let cli_mode = matches
        .get_one::<String>("mode")
        .cloned()
        .unwrap_or_else(|| String::from("ctx"));

    let input_path = matches.get_one::<String>("INPUT").unwrap();
    let input = fs::read(input_path).expect("Can't open the input file");

    // The user did not specify if this is compress of decompress. Try to figure
    // out using the extension.
    let ends_with_ext = input_path.ends_with(FILE_EXTENSION);
    if !cli_compress && !cli_decompress && !ends_with_ext {
        cli_compress = true;
    }

    // Come up with a file name.
    if cli_output_path.is_none() {
        if ends_with_ext {
            // remove the extension.
            let end = input_path.len() - FILE_EXTENSION.len();
            cli_output_path = Some(String::from(&input_path[0..end]));
        } else {
            // Add the extension.
            cli_output_path = Some(input_path.clone() + FILE_EXTENSION);
        }
    }

    let is_stream = cli_mode == "stream";
    let out = &cli_output_path.unwrap();
    let _timer = Timer::new();

    if cli_compress {
        let dest = match compress(is_stream, cli_level, &input) {
            Ok(dest) => dest,
            Err(err) => {
                log::error!("Compression failed: {}", err);
                return;
            }
        };
        let (from, to) = (input.len(), dest.len());
        log::info!("Compressed from {} to {} bytes.", from, to);
        log::info!("Compression ratio is {:.4}x.", from as f64 / to as f64);
        save_file(&dest, out);

        if cli_checked_mode {
            match decompress(is_stream, &dest) {
                Ok(decoded) if decoded == input => log::info!("Correct!"),
                Ok(_) => log::info!("Incorrect!"),
                Err(err) => {
                    log::info!("Could not decompress the file: {}", err)
                }
            }
        }
        return;
    }

    match decompress(is_stream, &input) {
        Ok(dest) => {
            log::info!(
                "Decompressed from {} to {} bytes.",
                input.len(),
                dest.len()
            );
            save_file(&dest, out);
        }
        Err(err) => log::error!("Decompression failed: {}", err),
    }
}
