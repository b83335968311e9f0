//! MIC-1 cycle-accurate simulator CLI.
//!
//! This binary provides a single entry point for working with the simulator:
//! 1. **Run:** Install a microcode image, load a macroprogram, and execute it
//!    for a bounded number of macroinstructions.
//! 2. **Assemble:** Translate macroassembly source into a memory image of
//!    MSB-first bit strings, one 16-bit word per line.

use std::path::Path;
use std::{fs, process};

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mic1_core::asm::assemble;
use mic1_core::common::bits::Bits;
use mic1_core::config::Config;
use mic1_core::control::MICROWORD_WIDTH;
use mic1_core::loader;
use mic1_core::machine::{Machine, REGISTER_NAMES, WORD_WIDTH};

#[derive(Parser, Debug)]
#[command(
    name = "mic1",
    author,
    version,
    about = "MIC-1 cycle-accurate simulator",
    long_about = "Simulate the MIC-1 microarchitecture at the level of individual \
clock phases and memory ticks.\n\nExamples:\n  \
mic1 assemble program.asm -o program.img\n  \
mic1 run -m microcode.mc -p program.asm -s 500\n  \
mic1 run -m microcode.mc --image program.img -c machine.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute a macroprogram under a microcode image.
    Run {
        /// Microcode image to install in the control store.
        #[arg(short, long)]
        microcode: String,

        /// Macroassembly source, assembled and loaded at cell 0.
        #[arg(short, long)]
        program: Option<String>,

        /// Pre-assembled memory image, loaded at cell 0.
        #[arg(long, conflicts_with = "program")]
        image: Option<String>,

        /// Machine configuration (JSON). Defaults to the stock machine.
        #[arg(short, long)]
        config: Option<String>,

        /// Number of macroinstructions to execute.
        #[arg(short, long, default_value_t = 1000)]
        steps: usize,
    },

    /// Assemble macroassembly source into a memory image.
    Assemble {
        /// Assembly source file.
        input: String,

        /// Output image path. Prints to stdout when omitted.
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(true)
        .init();

    match Cli::parse().command {
        Commands::Run {
            microcode,
            program,
            image,
            config,
            steps,
        } => cmd_run(&microcode, program, image, config, steps),
        Commands::Assemble { input, output } => cmd_assemble(&input, output),
    }
}

/// Builds the machine, installs microcode and program, and steps it.
///
/// Executes `steps` macroinstructions (the MIC-1 has no halt instruction;
/// a real microprogram loops forever), then dumps the register file.
fn cmd_run(
    microcode: &str,
    program: Option<String>,
    image: Option<String>,
    config: Option<String>,
    steps: usize,
) {
    let config = load_config(config);
    let mut machine = Machine::new(&config).unwrap_or_else(|e| {
        eprintln!("Error building machine: {e}");
        process::exit(1);
    });

    let words = loader::read_image(
        Path::new(microcode),
        config.control_store_words,
        MICROWORD_WIDTH,
    )
    .unwrap_or_else(|e| {
        eprintln!("Error in microcode image {microcode}: {e}");
        process::exit(1);
    });
    println!("[*] Microcode: {microcode} ({} words)", words.len());
    if let Err(e) = machine.load_microcode(&words) {
        eprintln!("Error installing microcode: {e}");
        process::exit(1);
    }

    if let Some(words) = load_program(program, image) {
        println!("[*] Program: {} words at cell 0", words.len());
        if let Err(e) = machine.load_program(&words) {
            eprintln!("Error loading program: {e}");
            process::exit(1);
        }
    }

    for executed in 0..steps {
        machine.step_macro();
        debug!(executed, mpc = %machine.mpc(), "macroinstruction complete");
    }

    println!("[*] Ran {steps} macroinstructions");
    dump_registers(&machine);
}

/// Assembles a source file, writing the image to a file or stdout.
fn cmd_assemble(input: &str, output: Option<String>) {
    let source = fs::read_to_string(input).unwrap_or_else(|e| {
        eprintln!("Error reading {input}: {e}");
        process::exit(1);
    });
    let words = assemble(&source).unwrap_or_else(|e| {
        eprintln!("Error assembling {input}: {e}");
        process::exit(1);
    });
    let text: String = words
        .iter()
        .map(|word| format!("{word}\n"))
        .collect();

    match output {
        Some(path) => {
            if let Err(e) = fs::write(&path, text) {
                eprintln!("Error writing {path}: {e}");
                process::exit(1);
            }
            println!("[*] Assembled {} words to {}", words.len(), path);
        }
        None => print!("{text}"),
    }
}

/// Reads a JSON configuration file, or falls back to the stock machine.
fn load_config(path: Option<String>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    let text = fs::read_to_string(&path).unwrap_or_else(|e| {
        eprintln!("Error reading config {path}: {e}");
        process::exit(1);
    });
    Config::from_json(&text).unwrap_or_else(|e| {
        eprintln!("Error in config {path}: {e}");
        process::exit(1);
    })
}

/// Produces the memory image to load: assembled source, or a file of
/// MSB-first bit strings, one word per line.
fn load_program(program: Option<String>, image: Option<String>) -> Option<Vec<Bits>> {
    if let Some(path) = program {
        let source = fs::read_to_string(&path).unwrap_or_else(|e| {
            eprintln!("Error reading program {path}: {e}");
            process::exit(1);
        });
        let words = assemble(&source).unwrap_or_else(|e| {
            eprintln!("Error assembling {path}: {e}");
            process::exit(1);
        });
        return Some(words);
    }
    let path = image?;
    let text = fs::read_to_string(&path).unwrap_or_else(|e| {
        eprintln!("Error reading image {path}: {e}");
        process::exit(1);
    });
    let mut words = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.len() != WORD_WIDTH {
            eprintln!(
                "Error in image {path} line {}: expected {WORD_WIDTH} bits, found {}",
                number + 1,
                line.len()
            );
            process::exit(1);
        }
        match Bits::from_bit_string(line) {
            Ok(word) => words.push(word),
            Err(e) => {
                eprintln!("Error in image {path} line {}: {e}", number + 1);
                process::exit(1);
            }
        }
    }
    Some(words)
}

/// Prints the register file, four registers per row.
fn dump_registers(machine: &Machine) {
    println!("    MPC = {}  phase = {:?}", machine.mpc(), machine.current_phase());
    for (index, name) in REGISTER_NAMES.iter().enumerate() {
        let value = machine.register(index);
        print!("    {name:>6} = {value}");
        if index % 4 == 3 {
            println!();
        }
    }
}
