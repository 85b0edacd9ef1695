use clap::{Parser, ValueEnum};
use std::error::Error;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;
use tapefsm::{
    Budget, Encoding, Halt, Observer, Program, ProgramLoader, ProgramManager, Step, StepEvent,
    TracingObserver, MAX_EXECUTION_STEPS,
};
use tracing_subscriber::EnvFilter;

/// Runs a deterministic single-tape machine and prints the final tape.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  tapefsm machines/binary-increment.json --debug
  tapefsm --builtin 'unary addition' --input 1+11
  cat machines/invert.json | tapefsm")]
struct Cli {
    /// Path to a program file (.json).
    /// If not provided, the program is read from stdin when stdin is piped.
    program_file: Option<PathBuf>,

    /// Run a built-in program by name
    #[clap(short, long, conflicts_with = "program_file")]
    builtin: Option<String>,

    /// List the built-in programs and exit
    #[clap(short, long)]
    list: bool,

    /// Replace the program's initial tape content
    #[clap(short, long)]
    input: Option<String>,

    /// Maximum number of steps before giving up, 0 for no limit
    #[clap(long, default_value_t = MAX_EXECUTION_STEPS)]
    max_steps: usize,

    /// Give up after this many milliseconds instead of counting steps
    #[clap(long)]
    timeout_ms: Option<u64>,

    /// Text encoding of the program file
    #[clap(long, value_enum, default_value_t = TextEncoding::Utf8)]
    encoding: TextEncoding,

    /// Print each step of the execution
    #[clap(short = 'd', long)]
    debug: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TextEncoding {
    Utf8,
    Utf16le,
    Utf16be,
}

impl From<TextEncoding> for Encoding {
    fn from(encoding: TextEncoding) -> Self {
        match encoding {
            TextEncoding::Utf8 => Encoding::Utf8,
            TextEncoding::Utf16le => Encoding::Utf16Le,
            TextEncoding::Utf16be => Encoding::Utf16Be,
        }
    }
}

/// Prints transitions to stdout when asked to and forwards everything to `tracing`.
struct Printer {
    debug: bool,
    log: TracingObserver,
}

impl Observer for Printer {
    fn on_step(&mut self, event: &StepEvent) {
        if self.debug {
            println!("{}", event);
        }
        self.log.on_step(event);
    }

    fn on_halt(&mut self, halt: &Halt) {
        self.log.on_halt(halt);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.list {
        for (i, name) in ProgramManager::list_program_names().iter().enumerate() {
            println!("{:>2}. {}", i, name);
        }
        return Ok(());
    }

    let program = match load_program(&cli) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut tape = match &cli.input {
        Some(input) => program.tape_with_input(input)?,
        None => program.tape()?,
    };
    let mut machine = program.machine()?;

    let budget = match cli.timeout_ms {
        Some(ms) => Budget::Time(Duration::from_millis(ms)),
        None => Budget::steps(cli.max_steps),
    };

    tracing::info!(program = %program.name, start = %program.start, "running");

    let mut printer = Printer {
        debug: cli.debug,
        log: TracingObserver,
    };

    match machine.run(&mut tape, &mut printer, budget)? {
        Step::Halt(halt) => {
            println!("{}", halt);
            println!("Steps: {}, Head: {}", machine.step_count(), tape.head());
            if halt.is_error() {
                std::process::exit(2);
            }
        }
        Step::Continue => {
            println!(
                "Budget exhausted after {} steps  |  {}",
                machine.step_count(),
                tape
            );
            std::process::exit(3);
        }
    }

    Ok(())
}

/// Loads the program from a built-in name, a file path or stdin, in that order.
fn load_program(cli: &Cli) -> Result<Program, String> {
    let encoding = Encoding::from(cli.encoding);

    if let Some(name) = &cli.builtin {
        ProgramManager::get_program_by_name(name).map_err(|e| e.to_string())
    } else if let Some(path) = &cli.program_file {
        ProgramLoader::load_program(path, encoding).map_err(|e| e.to_string())
    } else if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = Vec::new();
        io::stdin()
            .read_to_end(&mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        let content = encoding.decode(&buffer).map_err(|e| e.to_string())?;
        ProgramLoader::load_program_from_str(&content).map_err(|e| e.to_string())
    } else {
        Err("no program given; pass a file, --builtin NAME, or pipe a program on stdin".to_string())
    }
}
