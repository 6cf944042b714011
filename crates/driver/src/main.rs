//! veriloc: verification-guided fault localization and repair.
//!
//! The AST provider (parser/resolver) runs upstream and hands over the
//! resolved program as JSON; the source path inside it points at the text
//! to patch and verify.
//!
//! Usage:
//!   veriloc localize <program.json> [--workdir DIR]
//!   veriloc repair   <program.json> [--workdir DIR] [--stop-on-exhaustion]
//!   veriloc mutate   <program.json> --out DIR [--seed N]

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use veriloc_analysis::ast::Program;
use veriloc_driver::{
    candidate::HttpCandidateSource, dataset, failing_members, localize_members, mutate_method,
    output, repair::repair_member, CancelFlag, DriverError, RepairConfig,
};
use veriloc_verifier::create_default_backend;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("veriloc: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), DriverError> {
    let Some(command) = args.first() else {
        return usage();
    };
    let Some(program_path) = args.get(1) else {
        return usage();
    };

    let program: Program = serde_json::from_str(&fs::read_to_string(program_path)?)?;
    let source_text = fs::read_to_string(&program.path)?;
    let workdir = flag_value(args, "--workdir")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("veriloc"));
    fs::create_dir_all(&workdir)?;

    match command.as_str() {
        "localize" => localize_command(&program, &source_text, &workdir),
        "repair" => repair_command(args, &program, &source_text, &workdir),
        "mutate" => mutate_command(args, &program, &source_text),
        _ => usage(),
    }
}

fn localize_command(
    program: &Program,
    source_text: &str,
    workdir: &std::path::Path,
) -> Result<(), DriverError> {
    output::print_header("Localizing", &program.path);
    let backend = create_default_backend()?;

    // First pass: which members fail at all?
    let original = backend.verify_file(std::path::Path::new(&program.path))?;
    if original.is_fully_verified() {
        eprintln!("all members verify; nothing to localize");
        return Ok(());
    }
    let members = failing_members(program, &original);
    let report = localize_members(program, &members, source_text, backend.as_ref(), workdir);

    output::print_localization(&report);
    for outcome in &report.outcomes {
        output::print_member_suspicions(
            &program.path,
            source_text,
            &outcome.member,
            &outcome.suspicious,
        );
    }
    Ok(())
}

fn repair_command(
    args: &[String],
    program: &Program,
    source_text: &str,
    workdir: &std::path::Path,
) -> Result<(), DriverError> {
    output::print_header("Repairing", &program.path);
    let backend = create_default_backend()?;
    let candidates = HttpCandidateSource::from_env()?;
    let config = RepairConfig {
        stop_at_first_exhaustion: args.iter().any(|a| a == "--stop-on-exhaustion"),
        ..RepairConfig::default()
    };
    let cancel = CancelFlag::new();

    let original = backend.verify_file(std::path::Path::new(&program.path))?;
    if original.is_fully_verified() {
        eprintln!("all members verify; nothing to repair");
        return Ok(());
    }
    let members = failing_members(program, &original);
    let localization = localize_members(program, &members, source_text, backend.as_ref(), workdir);
    output::print_localization(&localization);

    for outcome in &localization.outcomes {
        if cancel.is_cancelled() {
            break;
        }
        if outcome.suspicious.is_empty() {
            continue;
        }
        let report = repair_member(
            &outcome.member,
            source_text,
            &outcome.suspicious,
            &candidates,
            backend.as_ref(),
            workdir,
            &config,
            &cancel,
        )?;
        output::print_repair(&report);
        if let Some((line, replacement)) = report.accepted() {
            let attempts = report
                .lines
                .iter()
                .find_map(|l| match l {
                    veriloc_driver::LineRepair::Repaired { attempts, .. } => Some(*attempts),
                    _ => None,
                })
                .unwrap_or(0);
            dataset::write_repair_result(workdir, &outcome.member, attempts, line, replacement)?;
        }
    }
    Ok(())
}

fn mutate_command(
    args: &[String],
    program: &Program,
    source_text: &str,
) -> Result<(), DriverError> {
    let Some(out_dir) = flag_value(args, "--out").map(PathBuf::from) else {
        return usage();
    };
    let seed = flag_value(args, "--seed").and_then(|s| s.parse().ok());
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    output::print_header("Mutating", &program.path);
    let base = PathBuf::from(&program.path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "program".to_string());

    // One index sequence across all members, so file names never collide.
    let mut mutations = Vec::new();
    for method in &program.methods {
        mutations.extend(mutate_method(method, &mut rng));
    }
    let total = dataset::write_mutation_set(
        source_text,
        &base,
        &mutations,
        &out_dir.join("hints"),
        &out_dir.join("mutations"),
    )?;
    eprintln!("{total} mutation pairs written to {}", out_dir.display());
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn usage() -> Result<(), DriverError> {
    eprintln!(
        "usage:\n  veriloc localize <program.json> [--workdir DIR]\n  \
         veriloc repair   <program.json> [--workdir DIR] [--stop-on-exhaustion]\n  \
         veriloc mutate   <program.json> --out DIR [--seed N]"
    );
    Err(DriverError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        "invalid arguments",
    )))
}
