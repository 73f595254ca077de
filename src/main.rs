use std::path::PathBuf;
use std::process;

use pico_args::Arguments;

use iconfont::IconFont;

const HELP: &str = "\
iconfont builds an OpenType (CFF2) icon font from a directory of SVG files.

Each *.svg file becomes one glyph; file stems become constant names and
code points are assigned from U+E000 in name order.

USAGE:
  iconfont [OPTIONS] <icons-dir> <out-font.otf>

OPTIONS:
  -h, --help                    Prints help information
  -o, --output-class-file PATH  Also writes a Rust module declaring the
                                icon code points
  -i, --indent N                Indentation width of the generated module
                                [default: 2]
  -c, --class-name NAME         Name of the generated constants struct
                                [default: Icons]
  -f, --font-name NAME          Font family name
                                [default: output file stem]
  --normalize BOOL              Scales and centers each icon into the em
                                square [default: true]
  --ignore-shapes BOOL          Drops rect/circle/ellipse/line/poly
                                primitives, converting <path> elements
                                only [default: true]
  -v, --verbose                 Enables progress logging

ARGS:
  <icons-dir>                   Directory with the input SVG icons
  <out-font.otf>                Output font file
";

#[derive(Debug)]
struct Args {
    class_file: Option<PathBuf>,
    indent: usize,
    class_name: Option<String>,
    font_name: Option<String>,
    normalize: bool,
    ignore_shapes: bool,
    verbose: bool,

    icons_dir: PathBuf,
    font_file: PathBuf,
}

fn collect_args() -> Result<Args, pico_args::Error> {
    let mut input = Arguments::from_env();

    if input.contains(["-h", "--help"]) {
        print!("{}", HELP);
        process::exit(0);
    }

    Ok(Args {
        class_file: input.opt_value_from_str(["-o", "--output-class-file"])?,
        indent: input
            .opt_value_from_fn(["-i", "--indent"], parse_indent)?
            .unwrap_or(2),
        class_name: input.opt_value_from_str(["-c", "--class-name"])?,
        font_name: input.opt_value_from_str(["-f", "--font-name"])?,
        normalize: input
            .opt_value_from_fn("--normalize", parse_bool)?
            .unwrap_or(true),
        ignore_shapes: input
            .opt_value_from_fn("--ignore-shapes", parse_bool)?
            .unwrap_or(true),
        verbose: input.contains(["-v", "--verbose"]),

        icons_dir: input.free_from_str()?,
        font_file: input.free_from_str()?,
    })
}

fn parse_indent(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|_| "invalid number".to_string())?;
    if n <= 16 {
        Ok(n)
    } else {
        Err("indent out of bounds".to_string())
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err("expected 'true' or 'false'".to_string()),
    }
}

fn main() {
    let args = match collect_args() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {}.", e);
            process::exit(1);
        }
    };

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if args.verbose {
            log::LevelFilter::Info
        } else {
            log::LevelFilter::Warn
        });
    }

    if let Err(e) = process(args) {
        eprintln!("Error: {}.", e);
        process::exit(1);
    }
}

fn process(args: Args) -> Result<(), iconfont::Error> {
    let mut builder = IconFont::builder(&args.icons_dir, &args.font_file);
    if let Some(class_file) = &args.class_file {
        builder.set_class_file(class_file);
    }
    if let Some(class_name) = &args.class_name {
        builder.set_class_name(class_name);
    }
    if let Some(font_name) = &args.font_name {
        builder.set_font_name(font_name);
    }
    builder
        .set_indent(args.indent)
        .set_normalize(args.normalize)
        .set_ignore_shapes(args.ignore_shapes)
        .build()
}

/// A simple stderr logger.
static LOGGER: SimpleLogger = SimpleLogger;
struct SimpleLogger;

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let prefix = match record.level() {
                log::Level::Error => "Error",
                log::Level::Warn => "Warning",
                log::Level::Info => "Info",
                log::Level::Debug => "Debug",
                log::Level::Trace => "Trace",
            };
            eprintln!("{}: {}.", prefix, record.args());
        }
    }

    fn flush(&self) {}
}
