use std::io::Read as _;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Subcommand;

use rawcon::buffer::BufferName;
use rawcon::console::Console;
use rawcon::store::KeyValueStore;

use crate::output;

#[derive(Subcommand)]
pub enum BufferAction {
    /// Print a buffer's text
    Show { name: BufferName },
    /// Replace a buffer's text (from TEXT, --file, or stdin)
    Set {
        name: BufferName,
        text: Option<String>,
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },
    /// Restore a buffer's template
    Reset { name: BufferName },
    /// Replace one existing top-level field (VALUE is JSON, or a plain string)
    Patch {
        name: BufferName,
        field: String,
        value: String,
    },
}

pub fn run_buffer_action<S: KeyValueStore>(
    console: &mut Console<S>,
    action: &BufferAction,
    fail: bool,
) -> anyhow::Result<i32> {
    let code = match action {
        BufferAction::Show { name } => {
            println!("{}", console.buffers().text(*name));
            0
        }
        BufferAction::Set { name, text, file } => {
            let text = read_text(text.as_deref(), file.as_deref())?;
            output::finish(&console.set_buffer(*name, text), fail)
        }
        BufferAction::Reset { name } => output::finish(&console.reset_buffer(*name), fail),
        BufferAction::Patch { name, field, value } => {
            output::finish(&console.patch_buffer(*name, field, value), fail)
        }
    };
    Ok(code)
}

fn read_text(text: Option<&str>, file: Option<&std::path::Path>) -> anyhow::Result<String> {
    if let Some(text) = text {
        return Ok(text.to_owned());
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("read buffer file {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("read buffer text from stdin")?;
    Ok(buf)
}
