use std::{
    fs,
    io::{self, BufWriter, Read, Write},
    path::PathBuf,
    thread,
};

use clap::Parser;
use miette::{IntoDiagnostic, miette};
use mlr_lang::{AstNode, DEFAULT_MAX_CALL_DEPTH, Engine, Options, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::{
    input::{self, DEFAULT_RECORDS_PER_BATCH, Reader},
    output::{self, writer_for},
    stream::{self, StreamOptions},
};

/// Environment variable holding the log filter, e.g. `MLR_LOG=mlr_lang=trace`.
pub const LOG_ENV: &str = "MLR_LOG";

/// Stack size of the thread that runs the program. Deep recursion of
/// user-defined functions up to the default call depth fits in it even in
/// debug builds.
pub const EVALUATOR_STACK_SIZE: usize = 256 * 1024 * 1024;

#[derive(Parser, Debug, Default)]
#[command(name = "mlr")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(after_help = "# Examples:\n\n\
    ## To run a program over a CSV file:\n\
    mlr program.json input.csv\n\n\
    ## To read the program from a file and write JSON:\n\
    mlr -F json -f program.json input.csv\n\n\
    ## To run only begin/end blocks:\n\
    mlr -n -s total=0 program.json")]
#[command(
    about = "mlr runs compiled record-processing programs over CSV, TSV and JSON streams.",
    long_about = None
)]
pub struct Cli {
    #[clap(flatten)]
    input: InputArgs,

    #[clap(flatten)]
    output: OutputArgs,

    /// Enable debug logging (overridden by MLR_LOG)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Maximum nesting depth of user-defined function calls [default: 1024]
    #[arg(long, value_name = "N")]
    max_call_depth: Option<u32>,

    /// Program as a JSON syntax tree, or a path to one with -f
    #[arg(value_name = "PROGRAM OR FILE")]
    program: Option<String>,
    files: Vec<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum InputFormat {
    Csv,
    Tsv,
    Json,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

#[derive(Clone, Debug, clap::Args)]
struct InputArgs {
    /// Load the program from the file
    #[arg(short, long, default_value_t = false)]
    from_file: bool,

    /// Set input format (default: guessed from the first file's extension)
    #[arg(short = 'I', long, value_enum)]
    input_format: Option<InputFormat>,

    /// Read no input; run only begin and end blocks
    #[arg(short = 'n', default_value_t = false)]
    null_input: bool,

    /// Preset an out-of-stream variable, as NAME=VALUE
    #[arg(short = 's', value_name = "NAME=VALUE")]
    presets: Vec<String>,

    /// Records per message between the reader and the evaluator
    #[arg(long, default_value_t = DEFAULT_RECORDS_PER_BATCH)]
    records_per_batch: usize,
}

impl Default for InputArgs {
    fn default() -> Self {
        Self {
            from_file: false,
            input_format: None,
            null_input: false,
            presets: Vec::new(),
            records_per_batch: DEFAULT_RECORDS_PER_BATCH,
        }
    }
}

#[derive(Clone, Debug, clap::Args, Default)]
struct OutputArgs {
    /// Set output format
    #[arg(short = 'F', long, value_enum, default_value_t)]
    output_format: OutputFormat,

    /// Stop after writing this many records
    #[arg(long, value_name = "N")]
    head: Option<usize>,

    /// Output to the specified file
    #[clap(short = 'o', long = "output", value_name = "FILE")]
    output_file: Option<PathBuf>,

    /// Unbuffered output
    #[clap(long, default_value_t = false)]
    unbuffered: bool,
}

impl Cli {
    /// Installs the stderr log subscriber. `MLR_LOG` wins over `-v`.
    pub fn init_logging(&self) {
        let default = if self.verbose { "debug" } else { "warn" };
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init();
    }

    pub fn run(&self) -> miette::Result<()> {
        let program = self.read_program()?;
        let root = AstNode::from_json(&program).into_diagnostic()?;

        // User-defined functions recurse on the native stack.
        thread::scope(|scope| {
            thread::Builder::new()
                .name("evaluator".to_string())
                .stack_size(EVALUATOR_STACK_SIZE)
                .spawn_scoped(scope, || self.evaluate(&root))
                .into_diagnostic()?
                .join()
                .map_err(|_| miette!("evaluator thread panicked"))?
        })
    }

    fn evaluate(&self, root: &AstNode) -> miette::Result<()> {
        let mut engine = Engine::from_ast(
            root,
            Options {
                max_call_depth: self.max_call_depth.unwrap_or(DEFAULT_MAX_CALL_DEPTH),
            },
        )?;

        for preset in &self.input.presets {
            let (name, value) = preset
                .split_once('=')
                .ok_or_else(|| miette!("-s expects NAME=VALUE; got \"{}\"", preset))?;
            engine.define_oosvar(name.trim_start_matches('@'), Value::infer(value));
        }

        let reader = (!self.input.null_input).then(|| {
            Reader::new(self.input_format(), self.files.clone())
                .with_records_per_batch(self.input.records_per_batch)
        });
        debug!(
            files = self.files.len(),
            null_input = self.input.null_input,
            "starting stream"
        );

        let writer = writer_for(self.output_format(), self.open_output()?);
        stream::run(
            &mut engine,
            reader,
            writer,
            &StreamOptions {
                head: self.output.head,
                unbuffered: self.output.unbuffered,
            },
        )
    }

    fn read_program(&self) -> miette::Result<String> {
        match self.program.as_ref() {
            Some(path) if self.input.from_file => fs::read_to_string(path)
                .map_err(|e| miette!("couldn't read program file {}: {}", path, e)),
            Some(program) => Ok(program.clone()),
            None if self.input.from_file => Err(miette!("-f requires a program file")),
            None => {
                let mut program = String::new();
                io::stdin().read_to_string(&mut program).into_diagnostic()?;
                Ok(program)
            }
        }
    }

    fn input_format(&self) -> input::InputFormat {
        match self.input.input_format {
            Some(InputFormat::Csv) => input::InputFormat::Csv,
            Some(InputFormat::Tsv) => input::InputFormat::Tsv,
            Some(InputFormat::Json) => input::InputFormat::Json,
            None => self
                .files
                .first()
                .map(|path| input::InputFormat::from_path(path))
                .unwrap_or_default(),
        }
    }

    fn output_format(&self) -> output::OutputFormat {
        match self.output.output_format {
            OutputFormat::Csv => output::OutputFormat::Csv,
            OutputFormat::Tsv => output::OutputFormat::Tsv,
            OutputFormat::Json => output::OutputFormat::Json,
        }
    }

    fn open_output(&self) -> miette::Result<Box<dyn Write + Send>> {
        Ok(if let Some(output_file) = &self.output.output_file {
            let file = fs::File::create(output_file).into_diagnostic()?;
            Box::new(BufWriter::new(file))
        } else if self.output.unbuffered {
            Box::new(io::stdout())
        } else {
            Box::new(BufWriter::new(io::stdout()))
        })
    }
}
