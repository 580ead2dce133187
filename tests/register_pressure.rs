use std::{error::Error, path::Path};

use test_utils::check_exit_code;

const SRC_PATH: &str = "./tests/fixtures/register_pressure.c";

/// Drives more integer locals than the allocator's GPR pool holds, live
/// across a call, so register reallocation and callee-saved restoration
/// around `call` both have to be correct for the sum to survive.
#[test]
fn compile_and_run_register_reallocation() -> Result<(), Box<dyn Error>> {
    check_exit_code(Path::new(SRC_PATH), 1)
}
