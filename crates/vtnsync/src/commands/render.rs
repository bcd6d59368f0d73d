//! `render`: derive and print the document without publishing.

use std::io::Write;

use crate::cli::{GlobalOpts, RenderArgs};
use crate::commands::{Session, print_skipped};
use crate::error::CliError;

pub fn handle(args: &RenderArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let session = Session::open(global)?;
    let derivation = session.reconciler.render()?;
    print_skipped(&derivation.skipped);

    let mut text = derivation.document.into_string();
    text.push('\n');
    match &args.output {
        Some(path) => std::fs::write(path, text)?,
        None => std::io::stdout().lock().write_all(text.as_bytes())?,
    }
    Ok(())
}
