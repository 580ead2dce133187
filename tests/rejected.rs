use std::{error::Error, path::Path};

use test_utils::check_rejected;

#[test]
fn rejects_wrong_argument_count() -> Result<(), Box<dyn Error>> {
    check_rejected(Path::new("./tests/fixtures/bad_arg_count.c"))
}

#[test]
fn rejects_redefinition() -> Result<(), Box<dyn Error>> {
    check_rejected(Path::new("./tests/fixtures/redefinition.c"))
}
