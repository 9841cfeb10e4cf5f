use clap::Parser;
use pai_submit::core::{parser, template};
use pai_submit::utils::{logger, validation::Validate};
use pai_submit::TableRef;
use std::collections::BTreeMap;

#[derive(Parser)]
#[command(name = "check-script")]
#[command(about = "Parse and validate an existing PAI job-submission script")]
struct Args {
    /// Path to the script file to check
    script: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    tracing::info!("🔎 Checking submission script: {}", args.script);

    let content = match std::fs::read_to_string(&args.script) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("❌ Failed to read '{}': {}", args.script, e);
            std::process::exit(3);
        }
    };

    // 語法解析
    let spec = match parser::parse(&content) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    println!("📋 Parsed statement:");
    println!("  Extension: {}", spec.extension);
    if let Some(project) = &spec.project {
        println!("  Project: {}", project);
    }
    println!("  Command: {}", spec.cmd);
    println!("  Config: {}", spec.config);

    println!("  Tables ({}):", spec.tables.len());
    for table in &spec.tables {
        match TableRef::parse(table) {
            Ok(parsed) => println!(
                "    {} (project={}, table={})",
                table, parsed.project, parsed.table
            ),
            Err(_) => println!("    {} (templated or non-canonical)", table),
        }
    }

    if let Some(strategy) = &spec.distribute_strategy {
        println!("  Strategy: {}", strategy);
    }
    if let Some(cluster) = &spec.cluster {
        if let Some(ps) = &cluster.ps {
            println!("  PS: count={}", ps.count);
        }
        if let Some(worker) = &cluster.worker {
            println!("  Workers: count={}", worker.count);
        }
    }
    if !spec.extra.is_empty() {
        println!("  Passthrough options: {}", spec.extra.len());
    }

    // 佔位符檢查: 全部格式正確, 且名稱為已知 (內建或統一大寫慣例)
    let ctx = template::TemplateContext::new(BTreeMap::new());
    let mut placeholders: Vec<(String, bool)> = Vec::new();
    for (field, value) in spec.templated_fields() {
        match template::scan_placeholders(field, value) {
            Ok(names) => {
                for name in names {
                    let known = ctx.is_known(&name);
                    placeholders.push((name, known));
                }
            }
            Err(e) => {
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 {}", e.recovery_suggestion());
                std::process::exit(2);
            }
        }
    }

    if !placeholders.is_empty() {
        placeholders.sort();
        placeholders.dedup();
        println!("  Placeholders:");
        for (name, known) in &placeholders {
            if *known {
                println!("    {{{}}} (builtin)", name);
            } else {
                println!("    {{{}}} (caller-supplied)", name);
            }
        }
    }

    // 選項齊全與取值檢查
    if let Err(e) = spec.validate() {
        tracing::error!("❌ Validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    println!();
    println!("✅ Script is a valid PAI submission statement");

    Ok(())
}
