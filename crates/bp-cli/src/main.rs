//! `blueprint` — headless diagram tool.
//!
//! ```text
//! blueprint layout <in.json> [out.json]   auto-layout a document
//! blueprint stats <in.json>               print component/port/connection counts
//! blueprint preset <name> [out.json]      instantiate a built-in preset
//! ```
//!
//! Output goes to stdout when no output path is given. `RUST_LOG` controls
//! log verbosity.

use bp_core::{DiagramError, Preset};
use bp_editor::Editor;
use std::process::ExitCode;

const USAGE: &str = "usage:
  blueprint layout <in.json> [out.json]
  blueprint stats <in.json>
  blueprint preset <name> [out.json]";

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        Some("layout") => match args.get(1) {
            Some(input) => layout(input, args.get(2).map(String::as_str)).await,
            None => return usage(),
        },
        Some("stats") => match args.get(1) {
            Some(input) => stats(input).await,
            None => return usage(),
        },
        Some("preset") => match args.get(1) {
            Some(name) => preset(name, args.get(2).map(String::as_str)).await,
            None => return usage(),
        },
        Some("--help" | "-h") => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        _ => return usage(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("blueprint: {e}");
            ExitCode::FAILURE
        }
    }
}

fn usage() -> ExitCode {
    eprintln!("{USAGE}");
    ExitCode::from(2)
}

async fn write_output(editor: &Editor, output: Option<&str>) -> Result<(), DiagramError> {
    match output {
        Some(path) => {
            editor.save_file(path).await?;
            log::info!("wrote {path}");
        }
        None => println!("{}", editor.save_json()?),
    }
    Ok(())
}

async fn layout(input: &str, output: Option<&str>) -> Result<(), DiagramError> {
    let mut editor = Editor::new();
    editor.load_file(input).await?;
    let layout = editor.auto_layout();
    log::info!(
        "{} layer(s), {} overlap pass(es)",
        layout.layers.len(),
        layout.overlap_passes
    );
    write_output(&editor, output).await
}

async fn stats(input: &str) -> Result<(), DiagramError> {
    let mut editor = Editor::new();
    editor.load_file(input).await?;
    let stats = editor.stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

async fn preset(name: &str, output: Option<&str>) -> Result<(), DiagramError> {
    let preset = match Preset::builtin(name) {
        Ok(preset) => preset,
        Err(e) => {
            eprintln!("available presets: {}", Preset::builtin_names().join(", "));
            return Err(e);
        }
    };
    let mut editor = Editor::new();
    editor.load_preset(&preset);
    write_output(&editor, output).await
}
