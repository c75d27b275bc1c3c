use std::path::{Path, PathBuf};

use carrot_core::lexer::{self, LexError};
use carrot_core::parser::ParseError;
use carrot_interpreter::{EvaluationError, Evaluator, PrintHandler};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("could not open '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// What to do with a script once it has been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Run,
    DumpTokens,
    DumpAst,
}

pub fn read_source(path: &Path) -> Result<String, RunError> {
    std::fs::read_to_string(path).map_err(|source| RunError::Io {
        path: path.to_owned(),
        source,
    })
}

/// Drives the pipeline over `source`, writing everything the script (or the
/// dump) produces to `output`, and hands `output` back on success.
pub fn execute(
    source: &str,
    action: Action,
    mut output: PrintHandler,
) -> Result<PrintHandler, RunError> {
    match action {
        Action::DumpTokens => {
            for token in lexer::tokenize(source)? {
                output.print(&format!("{}\n", token))?;
            }
            Ok(output)
        }
        Action::DumpAst => {
            let program = carrot_core::parse(source)?;
            output.print(&program.to_string())?;
            Ok(output)
        }
        Action::Run => {
            let program = carrot_core::parse(source)?;
            let mut evaluator = Evaluator::new(output);
            let result = evaluator.eval_program(&program);
            evaluator.teardown();
            result?;
            Ok(evaluator.into_output())
        }
    }
}
