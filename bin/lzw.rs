#![forbid(unsafe_code)]
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::{env, ffi, fs, io};

use lzw12::{decode::Decoder, encode::Encoder, LzwError};

const BUF_SIZE: usize = 1 << 20;

fn main() -> CodingResult {
    env_logger::init();
    CodingResult::catch_panic(|| match Flags::from_args(env::args_os()) {
        Ok(flags) => match run_coding(flags) {
            Ok(()) => CodingResult::Ok,
            Err(err) => CodingResult::Err(err),
        },
        Err(err) => CodingResult::Usage(err),
    })
}

fn run_coding(flags: Flags) -> Result<(), LzwError> {
    let input: Box<dyn io::BufRead> = match &flags.input {
        Input::Stdin => Box::new(io::BufReader::with_capacity(BUF_SIZE, io::stdin())),
        Input::File(path) => {
            let file = fs::File::open(path).map_err(LzwError::InputUnavailable)?;
            Box::new(io::BufReader::with_capacity(BUF_SIZE, file))
        }
    };

    let output: Box<dyn io::Write> = match &flags.output {
        Output::Stdout => Box::new(io::BufWriter::with_capacity(BUF_SIZE, io::stdout())),
        Output::File(path) => {
            let file = fs::File::create(path).map_err(LzwError::OutputUnavailable)?;
            Box::new(io::BufWriter::with_capacity(BUF_SIZE, file))
        }
    };

    let result = match flags.operation {
        Operation::Encode => Encoder::new().into_stream(output).encode_all(input),
        Operation::Decode => Decoder::new().into_stream(output).decode_all(input),
    };

    log::info!(
        "{:?}: {} bytes read, {} bytes written",
        flags.operation,
        result.bytes_read,
        result.bytes_written
    );
    result.status
}

struct Flags {
    input: Input,
    output: Output,
    operation: Operation,
}

enum ParamError {
    Clap(clap::Error),
    /// No output name can be derived from this input.
    Name(PathBuf),
}

#[derive(Debug)]
enum Input {
    File(PathBuf),
    Stdin,
}

#[derive(Debug)]
enum Output {
    File(PathBuf),
    Stdout,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Operation {
    Encode,
    Decode,
}

fn command() -> clap::Command {
    clap::Command::new("lzw")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compress or expand files with 12-bit LZW")
        .arg(
            clap::Arg::new("file")
                .required(true)
                .help("filepath or '-' for stdin")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            clap::Arg::new("mode")
                .required(true)
                .help("e to encode, d to decode")
                .value_parser(["e", "d", "encode", "decode"]),
        )
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .help("output file, derived from the input name by default")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            clap::Arg::new("stdout")
                .short('c')
                .long("stdout")
                .help("write to stdout")
                .action(clap::ArgAction::SetTrue)
                .conflicts_with("output"),
        )
}

impl Flags {
    fn from_args(args: impl Iterator<Item = ffi::OsString>) -> Result<Self, ParamError> {
        let matches = command()
            .try_get_matches_from(args)
            .map_err(ParamError::Clap)?;

        let operation = match matches.get_one::<String>("mode").map(String::as_str) {
            Some("e") | Some("encode") => Operation::Encode,
            Some("d") | Some("decode") => Operation::Decode,
            _ => unreachable!("unparsed mode"),
        };

        let input = match matches.get_one::<PathBuf>("file") {
            Some(p) if p.as_path() == Path::new("-") => Input::Stdin,
            Some(p) => Input::File(p.clone()),
            None => Input::Stdin,
        };

        let output = if matches.get_flag("stdout") {
            Output::Stdout
        } else if let Some(p) = matches.get_one::<PathBuf>("output") {
            Output::File(p.clone())
        } else {
            match &input {
                Input::Stdin => Output::Stdout,
                Input::File(p) => Output::File(
                    output_name(p, operation).ok_or_else(|| ParamError::Name(p.clone()))?,
                ),
            }
        };

        Ok(Flags {
            input,
            output,
            operation,
        })
    }
}

/// Append `.LZW` when encoding, strip the last extension when decoding.
fn output_name(input: &Path, operation: Operation) -> Option<PathBuf> {
    match operation {
        Operation::Encode => {
            let mut name = input.as_os_str().to_owned();
            name.push(".LZW");
            Some(name.into())
        }
        Operation::Decode => {
            input.extension()?;
            Some(input.with_extension(""))
        }
    }
}

enum CodingResult {
    Ok,
    Usage(ParamError),
    Err(LzwError),
    Panic,
}

impl CodingResult {
    fn catch_panic(op: fn() -> CodingResult) -> Self {
        std::panic::catch_unwind(op).unwrap_or(CodingResult::Panic)
    }
}

impl std::process::Termination for CodingResult {
    fn report(self) -> ExitCode {
        match self {
            CodingResult::Ok => ExitCode::SUCCESS,
            CodingResult::Usage(ParamError::Clap(err)) => {
                let _ = err.print();
                if err.use_stderr() {
                    ExitCode::from(4)
                } else {
                    ExitCode::SUCCESS
                }
            }
            CodingResult::Usage(ParamError::Name(path)) => {
                eprintln!(
                    "Can not derive an output name from {}, use --output",
                    path.display()
                );
                ExitCode::from(4)
            }
            CodingResult::Err(LzwError::InputUnavailable(err)) => {
                eprintln!("Read error: {}", err);
                ExitCode::from(2)
            }
            CodingResult::Err(err) => {
                eprintln!("{}", err);
                ExitCode::FAILURE
            }
            CodingResult::Panic => {
                eprintln!(
                    "The process failed irrecoverably! This should never happen and is a bug."
                );
                ExitCode::from(128)
            }
        }
    }
}
