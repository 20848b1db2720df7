mod cli;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ampkernel", about = "WDF guitar-amp distortion core — offline WAV renderer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process an input WAV through the amp channel.
    Render {
        /// Input WAV file.
        input: String,
        /// Output WAV file.
        output: String,
        /// Knob overrides (e.g. gain=24 tone=4000 volume=8000).
        #[arg(trailing_var_arg = true)]
        knobs: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Render {
            input,
            output,
            knobs,
        } => cli::process::run(&input, &output, &knobs),
    }
}
