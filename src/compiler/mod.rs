//! Top-level driver for turning a parsed translation unit into NASM text:
//! lays out storage for every function and emits its assembly. Assembling
//! and linking the result is out of scope here — the compiler's job ends
//! at the emitted text, which `main` writes to standard output.
mod scope;

use std::error::Error;

use log::info;

use crate::allocator;
use crate::asm::Instruction;
use crate::ast::statement::Statement;
use crate::ast::Ast;
use crate::scope::Object;

use self::scope::{Constant, FunctionEmitter};

pub struct Compiler {
    ast: Ast,
}

impl Compiler {
    pub fn from_ast(ast: Ast) -> Self {
        Compiler { ast }
    }

    /// Allocates storage and emits NASM text for every function defined at
    /// the top level, returning the rendered `.text` body and every
    /// constant (string/float literal) its functions reference.
    fn compile_functions(&mut self) -> (String, Vec<Constant>) {
        let mut text = String::new();
        let mut constants = Vec::new();

        let top_level = self.ast.top_level.clone();
        for stmt in top_level {
            let Statement::Function(f) = self.ast.statements.get(stmt).clone() else { continue };
            let Some(body) = f.body else { continue };

            let locals = allocator::collect_locals(&self.ast, body);
            if let Object::Function(func) = self.ast.objects.get_mut(f.object) {
                func.locals = locals.clone();
            }
            allocator::allocate_function(&mut self.ast, f.object, body);

            let Object::Function(func) = self.ast.object(f.object) else { unreachable!() };
            let name = func.name.text.clone();
            if !func.is_defined {
                continue;
            }

            let emitter = FunctionEmitter::new(&self.ast, f.object, locals, &name);
            let (body, mut body_constants) = emitter.emit(&name, body);

            if body.is_main {
                text.push_str(&format!("\n{}", Instruction::Label("_start".to_string())));
            }
            text.push_str(&format!("\n{}\n", Instruction::Label(body.label)));
            for instruction in &body.instructions {
                text.push_str(&format!("{instruction}\n"));
            }
            constants.append(&mut body_constants);
        }

        (text, constants)
    }

    fn render_data_section(constants: &[Constant]) -> String {
        let mut out = String::from("section .data\n");
        for Constant { name, bytes } in constants {
            let rendered = bytes.iter().map(|b| b.to_string()).collect::<Vec<_>>().join(", ");
            let rendered = if rendered.is_empty() { "0".to_string() } else { rendered };
            out.push_str(&format!("\t{name} db {rendered}\n"));
        }
        out.push('\n');
        out
    }

    /// Renders the full program as NASM source text: a freestanding
    /// `_start` header followed by every function's body, with `main`
    /// additionally exposed as `_start` (see `compile_functions`).
    /// Assembling and linking this text is the caller's responsibility,
    /// not the compiler's.
    pub fn emit_assembly(&mut self) -> Result<String, Box<dyn Error>> {
        info!("Generating code...");

        let (text, constants) = self.compile_functions();

        let mut out = String::from("BITS 64\n\n");
        if !constants.is_empty() {
            out.push_str(&Self::render_data_section(&constants));
        }
        out.push_str("section .text\n");
        out.push_str("global _start\n");
        out.push_str(&text);

        Ok(out)
    }
}
