// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Context;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use visprog::config::{load_and_validate_config, Config, RuntimeBuilder};
use visprog::traits::ProgramExecutor;
use visprog::value::Value;

/// Command line split into its parts.
struct CliArgs {
    config_file: String,
    programs: Vec<PathBuf>,
    bindings: Vec<(String, PathBuf)>,
}

/// `NAME=path` arguments bind images; everything else after the config is a program file.
fn parse_args(args: &[String]) -> Option<CliArgs> {
    let (config_file, rest) = args.split_first()?;
    let mut programs = Vec::new();
    let mut bindings = Vec::new();
    for arg in rest {
        match arg.split_once('=') {
            Some((name, path)) if !name.is_empty() && !Path::new(arg).exists() => {
                bindings.push((name.to_string(), PathBuf::from(path)))
            }
            _ => programs.push(PathBuf::from(arg)),
        }
    }
    if programs.is_empty() {
        return None;
    }
    Some(CliArgs {
        config_file: config_file.clone(),
        programs,
        bindings,
    })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(cli) = args.get(1..).and_then(parse_args) else {
        let bin = args.first().map(String::as_str).unwrap_or("visprog");
        eprintln!("Usage: {} <config.yaml> <program.txt> [program.txt ...] [NAME=image_path ...]", bin);
        eprintln!("Example: {} configs/nlvr.yaml programs/nlvr.txt LEFT=left.png RIGHT=right.png", bin);
        std::process::exit(1);
    };

    let config = match load_and_validate_config(&cli.config_file) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load {}: {}", cli.config_file, e);
            std::process::exit(1);
        }
    };

    println!("🚀 VisProg Interpreter");
    println!("═══════════════════════════════════");
    println!("📋 Configuration: {}", cli.config_file);
    println!("🧭 Profile: {}", config.profile.name());
    println!("🔌 Backend: {}", config.capabilities.backend.as_str());
    println!("Programs: {:?}", cli.programs);
    println!();

    let registry_start = Instant::now();
    let executor = match RuntimeBuilder::from_config(&config) {
        Ok((executor, _)) => executor,
        Err(e) => {
            eprintln!("❌ Failed to build runtime: {}", e);
            std::process::exit(1);
        }
    };
    println!("🧰 Registry built in {:?}", registry_start.elapsed());

    let mut failures = 0;
    for (i, program) in cli.programs.iter().enumerate() {
        if i > 0 {
            println!("\n{}", "─".repeat(80));
        }

        if let Err(e) = run_program(executor.as_ref(), &config, &cli.bindings, program).await {
            failures += 1;
            eprintln!("❌ Failed to execute {}: {:#}", program.display(), e);
        }
    }

    println!(
        "\n🎉 Done: {} of {} programs succeeded",
        cli.programs.len() - failures,
        cli.programs.len()
    );
    if failures > 0 {
        std::process::exit(2);
    }
}

async fn run_program(
    executor: &dyn ProgramExecutor,
    config: &Config,
    bindings: &[(String, PathBuf)],
    program_file: &Path,
) -> anyhow::Result<()> {
    let start_time = Instant::now();

    let program = std::fs::read_to_string(program_file)
        .with_context(|| format!("cannot read program {}", program_file.display()))?;

    // one registry for the whole run, a fresh state per program
    let mut state = RuntimeBuilder::initial_state(config);
    for (name, path) in bindings {
        state.bind_path(name.clone(), path.clone());
    }

    println!("📜 Program: {}", program_file.display());
    for line in program.lines().filter(|l| !l.trim().is_empty()) {
        println!("   {}", line.trim());
    }

    let execution_start = Instant::now();
    let output = executor.execute(&program, &mut state, config.trace).await?;
    let execution_time = execution_start.elapsed();

    println!("\n📊 Execution Results:");
    println!("⏱️  Execution Time: {:?}", execution_time);
    println!("🔢 Variables Bound: {}", state.len());

    if let Some(trace) = &output.trace {
        println!("\n🔄 Trace:");
        for fragment in trace.fragments() {
            println!("  {}. {}", fragment.index + 1, fragment);
        }
    }

    println!("\n🎯 Result: {}", output.value);
    match &output.value {
        Value::Image(image) => {
            let out = program_file.with_extension("png");
            image
                .as_image()
                .save(&out)
                .with_context(|| format!("cannot write {}", out.display()))?;
            println!("🖼️  Saved result image to {}", out.display());
        }
        value => println!("📦 JSON: {}", serde_json::to_string(value)?),
    }

    println!("\n⏱️  Total Time (including program load): {:?}", start_time.elapsed());
    Ok(())
}
