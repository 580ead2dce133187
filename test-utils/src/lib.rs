use std::{
    error::Error,
    fs,
    io,
    path::{Path, PathBuf},
    process::{Command, Output},
};

const QCC_PATH: &str = "./target/debug/qcc";
const BUILD_DIR: &str = "./output";

/// Runs qcc on `src_path`, returning its raw `Output` (stdout holds the
/// emitted NASM text on success; the compiler never assembles or links).
fn run_compiler(src_path: &Path) -> Result<Output, io::Error> {
    Command::new(QCC_PATH).arg(src_path).output()
}

/// Assembles and links the NASM text qcc produced, mirroring the way the
/// original project's own test harness drives `nasm`/`ld` itself rather
/// than asking the compiler to do it: the freestanding `_start` entry
/// point needs no libc/crt0, so `cc` never enters the picture.
fn assemble_and_link(assembly: &str, stem: &str) -> Result<PathBuf, Box<dyn Error>> {
    fs::create_dir_all(BUILD_DIR)?;
    let asm_path = Path::new(BUILD_DIR).join(format!("{stem}.s"));
    let obj_path = Path::new(BUILD_DIR).join(format!("{stem}.o"));
    let exe_path = Path::new(BUILD_DIR).join(stem);

    fs::write(&asm_path, assembly)?;

    let nasm = Command::new("nasm").args(["-g", "-f", "elf64", "-o"]).arg(&obj_path).arg(&asm_path).output()?;
    assert!(nasm.status.success(), "nasm error: {}", std::str::from_utf8(&nasm.stderr)?);

    let ld = Command::new("ld").args(["-m", "elf_x86_64"]).arg(&obj_path).arg("-o").arg(&exe_path).output()?;
    assert!(ld.status.success(), "ld error: {}", std::str::from_utf8(&ld.stderr)?);

    Ok(exe_path)
}

/// Compiles `src_path`, assembles and links the result, and asserts the
/// produced binary exits with `expected_code` — qcc's observable contract
/// is the exit code of the program it describes, not anything it prints.
pub fn check_exit_code(src_path: &Path, expected_code: i32) -> Result<(), Box<dyn Error>> {
    let stem = src_path.file_stem().unwrap().to_string_lossy().into_owned();

    let compile_output = run_compiler(src_path)?;
    let compile_stderr = std::str::from_utf8(&compile_output.stderr)?;
    assert!(
        compile_output.status.success(),
        "qcc exited with status {:?}: {compile_stderr}",
        compile_output.status.code()
    );

    let assembly = std::str::from_utf8(&compile_output.stdout)?;
    let exe_path = assemble_and_link(assembly, &stem)?;

    let output = Command::new(&exe_path).output()?;
    assert_eq!(
        output.status.code(),
        Some(expected_code),
        "program exited with {:?}, expected {expected_code}",
        output.status.code()
    );

    Ok(())
}

/// Compiles `src_path` and asserts that qcc itself rejects it (a type or
/// parse error), without ever attempting to assemble the result.
pub fn check_rejected(src_path: &Path) -> Result<(), Box<dyn Error>> {
    let compile_output = run_compiler(src_path)?;
    assert!(
        !compile_output.status.success(),
        "qcc should have rejected '{}'",
        src_path.to_string_lossy()
    );

    Ok(())
}
