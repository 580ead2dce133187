use std::path::PathBuf;

use clap::Parser as CParser;
use log::error;

use qcc::compiler::Compiler;
use qcc::parser;

#[derive(CParser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// C89-dialect source file to compile.
    source_path: PathBuf,
}

fn main() {
    simple_logger::init_with_level(log::Level::Warn).unwrap();
    let args = Cli::parse();

    let mut source = std::fs::read_to_string(&args.source_path)
        .unwrap_or_else(|e| panic!("could not read file '{}': {e}", args.source_path.to_string_lossy()));
    source.push('\n');

    let ast = match parser::parse(&source) {
        Ok(ast) => ast,
        Err(e) => {
            error!("{}", e.render(&source));
            std::process::exit(1);
        }
    };

    let mut compiler = Compiler::from_ast(ast);
    match compiler.emit_assembly() {
        Ok(assembly) => print!("{assembly}"),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}
