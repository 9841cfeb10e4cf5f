use clap::Parser;
use pai_submit::core::template::TemplateContext;
use pai_submit::utils::{logger, validation::Validate};
use pai_submit::{LocalScriptStore, ScriptWorkflow, SubmitEngine, TomlJobConfig};

#[derive(Parser)]
#[command(name = "pai-submit")]
#[command(about = "Compose and render PAI job-submission scripts from a TOML job definition")]
struct Args {
    /// Path to the TOML job definition
    #[arg(short, long, default_value = "job.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the command verb (train, evaluate, export, predict)
    #[arg(long)]
    cmd: Option<String>,

    /// Placeholder values, e.g. --set OSS_BUCKET_NAME=my-bucket (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Override the script output directory
    #[arg(long)]
    output: Option<String>,

    /// Dry run - show the job summary and template analysis without writing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting PAI submission tool");
    tracing::info!("📁 Loading job definition from: {}", args.config);

    // 載入 TOML 任務定義
    let mut config = match TomlJobConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load job definition '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(cmd) = &args.cmd {
        config.job.cmd = cmd.clone();
        tracing::info!("🔧 Command verb overridden to: {}", cmd);
    }
    if let Some(output) = &args.output {
        config.set_output_path(output.clone());
        tracing::info!("🔧 Output directory overridden to: {}", output);
    }
    for pair in &args.set {
        match pair.split_once('=') {
            Some((key, value)) => config.set_placeholder(key, value),
            None => {
                eprintln!("❌ Invalid --set value '{}', expected KEY=VALUE", pair);
                std::process::exit(1);
            }
        }
    }

    // 驗證任務定義
    if let Err(e) = config.validate() {
        tracing::error!("❌ Job definition validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Job definition loaded and validated successfully");

    // 顯示配置摘要
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No script will be written");
        perform_dry_run(&config)?;
        return Ok(());
    }

    // 創建腳本存儲和工作流
    let store = LocalScriptStore::new(config.output_path().to_string());
    let workflow = ScriptWorkflow::new(store, config);

    // 創建引擎並運行
    let engine = SubmitEngine::new(workflow);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Submission script generated successfully!");
            tracing::info!("📁 Script saved to: {}", output_path);
            println!("✅ Submission script generated successfully!");
            println!("📁 Script saved to: {}", output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Script generation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                pai_submit::utils::error::ErrorSeverity::Low => 0, // 警告，但成功
                pai_submit::utils::error::ErrorSeverity::Medium => 2, // 模板錯誤
                pai_submit::utils::error::ErrorSeverity::High => 1, // 配置/解析錯誤
                pai_submit::utils::error::ErrorSeverity::Critical => 3, // 系統錯誤
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlJobConfig, args: &Args) {
    println!("📋 Job Summary:");
    println!("  Extension: {}", config.job.name);
    if let Some(project) = &config.job.project {
        println!("  Project: {}", project);
    }
    println!("  Command: {}", config.job.cmd);
    println!("  Config: {}", config.inputs.config);
    println!("  Tables: {}", config.inputs.tables.len());

    if let Some(distribution) = &config.distribution {
        println!("  Strategy: {}", distribution.strategy);
    }

    if let Some(cluster) = &config.cluster {
        if let Some(ps) = &cluster.ps {
            println!("  PS: {} instance(s)", ps.count);
        }
        if let Some(worker) = &cluster.worker {
            println!("  Workers: {} instance(s)", worker.count);
        }
    }

    println!("  Output: {}/{}", config.output_path(), config.script_filename());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlJobConfig) -> Result<(), Box<dyn std::error::Error>> {
    use pai_submit::domain::ports::JobSource;

    println!("🔍 Dry Run Analysis:");
    println!();

    let spec = config.job()?;
    let ctx = TemplateContext::new(config.placeholder_values()).with_auto_timestamp();

    // 佔位符分析
    println!("🔤 Template Placeholders:");
    let mut any = false;
    for (field, value) in spec.templated_fields() {
        for name in pai_submit::core::template::scan_placeholders(field, value)? {
            any = true;
            match ctx.get(&name) {
                Some(resolved) => println!("  {{{}}} ({}) -> {}", name, field, resolved),
                None => println!("  {{{}}} ({}) -> ❌ NO VALUE", name, field),
            }
        }
    }
    if !any {
        println!("  (no placeholders, statement is fully concrete)");
    }

    // 叢集拓撲分析
    if let Some(cluster) = &spec.cluster {
        println!();
        println!("⚙️ Cluster Topology:");
        if let Some(ps) = &cluster.ps {
            println!(
                "  ps: count={}, cpu={:?}, memory={:?}MB",
                ps.count, ps.cpu, ps.memory
            );
        }
        if let Some(worker) = &cluster.worker {
            println!(
                "  worker: count={}, cpu={:?}, gpu={:?}, memory={:?}MB",
                worker.count, worker.cpu, worker.gpu, worker.memory
            );
        }
    }

    // 未決佔位符會讓實際運行失敗, 提前指出
    let mut unresolved: Vec<String> = Vec::new();
    for (field, value) in spec.templated_fields() {
        unresolved.extend(ctx.missing_in(field, value)?);
    }
    unresolved.sort();
    unresolved.dedup();

    println!();
    if unresolved.is_empty() {
        println!("✅ All placeholders resolve; the script would be written to {}/{}",
            config.output_path(),
            config.script_filename()
        );
    } else {
        println!(
            "❌ {} placeholder(s) missing values: {}",
            unresolved.len(),
            unresolved.join(", ")
        );
        println!("💡 Provide them in the [template] table or with --set KEY=VALUE");
    }

    Ok(())
}
