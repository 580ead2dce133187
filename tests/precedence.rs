use std::{error::Error, path::Path};

use test_utils::check_exit_code;

const SRC_PATH: &str = "./tests/fixtures/precedence.c";

#[test]
fn compile_and_run_precedence() -> Result<(), Box<dyn Error>> {
    check_exit_code(Path::new(SRC_PATH), 1)
}
