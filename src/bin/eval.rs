//! Batch evaluation: run a question set through the pipeline, then write details and summary JSON.

use chrono::Local;
use clap::{Parser, ValueEnum};
use kbeval::eval::{report::write_run_artifacts, summarize, QualityBand};
use kbeval::pipeline::GradedText;
use kbeval::{build_pipeline, Config};
use std::path::PathBuf;

const DEFAULT_QUESTIONS: [&str; 3] = [
    "Why is my SCOM agent not sending heartbeats?",
    "How do I troubleshoot high CPU usage on a monitored server?",
    "What should I do if SCOM database backup fails?",
];

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Grade {
    /// Grade the generated answer for faithfulness
    Answer,
    /// Grade the KB coverage verdict for faithfulness
    Verdict,
}

/// Evaluation batch runner.
#[derive(Parser, Debug)]
#[command(name = "eval")]
struct Args {
    /// JSON array of question strings (default: built-in SCOM question set).
    #[arg(long)]
    questions: Option<PathBuf>,

    /// Directory for the run artifacts (default: kbeval.output_dir).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Which text the faithfulness judge checks.
    #[arg(long, value_enum, default_value = "answer")]
    grade: Grade,

    /// Questions evaluated at the same time.
    #[arg(long, default_value_t = 1)]
    parallel: usize,
}

fn load_questions(path: Option<&PathBuf>) -> anyhow::Result<Vec<String>> {
    let Some(path) = path else {
        return Ok(DEFAULT_QUESTIONS.iter().map(|q| q.to_string()).collect());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    let questions: Vec<String> =
        serde_json::from_str(&json).map_err(|e| anyhow::anyhow!("Invalid questions JSON: {}", e))?;
    Ok(questions)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load()?;
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", config.kbeval.log_level.as_str()),
    )
    .init();

    let questions = load_questions(args.questions.as_ref())?;
    if questions.is_empty() {
        anyhow::bail!("No questions to evaluate");
    }

    let graded = match args.grade {
        Grade::Answer => GradedText::Answer,
        Grade::Verdict => GradedText::Verdict,
    };
    let pipeline = build_pipeline(&config).grading(graded);

    println!("Running evaluation on {} questions\n", questions.len());
    let run_at = Local::now();
    let batch = pipeline.run_batch(&questions, args.parallel).await;

    for eval in &batch.evaluations {
        println!(
            "  {} (overall {:.3}, {})",
            eval.question,
            eval.overall_score,
            QualityBand::from_score(eval.overall_score)
        );
    }
    for failed in &batch.failures {
        println!("  {} (skipped: {})", failed.question, failed.error);
    }

    let summary = summarize(&batch.evaluations)?;
    let out_dir = args
        .out_dir
        .unwrap_or_else(|| config.output_dir().to_path_buf());
    let artifacts = write_run_artifacts(&out_dir, &batch.evaluations, &summary, run_at)?;

    let avg = &summary.avg_metrics;
    println!("\n=== Evaluation Results ({} of {} questions) ===", summary.total_questions, questions.len());
    println!("Overall:       {:.3}", avg.overall_score);
    println!("Relevancy:     {:.3}", avg.context_relevancy);
    println!("Completeness:  {:.3}", avg.answer_completeness);
    println!("Faithfulness:  {:.3}", avg.faithfulness);
    println!("Precision@3:   {:.3}", avg.precision_at_3);

    println!("\nNeeds improvement:");
    for worst in &summary.worst_questions {
        println!(
            "  {:.3}  {}\n         rel {:.2} | comp {:.2} | faith {:.2} | p@3 {:.2}",
            worst.overall_score,
            worst.question,
            worst.context_relevancy,
            worst.answer_completeness,
            worst.faithfulness,
            worst.precision_at_3
        );
    }

    println!("\nDetails: {}", artifacts.details_path.display());
    println!("Summary: {}", artifacts.summary_path.display());

    Ok(())
}
