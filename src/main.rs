use anyhow::Result;
use clap::{Parser, Subcommand};
use kbeval::eval::QualityBand;
use kbeval::{build_pipeline, Config};

/// Ask the infrastructure KB a question and score the retrieval and answer.
#[derive(Parser, Debug)]
#[command(name = "kbeval")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Retrieve, answer, and evaluate one question.
    Ask {
        question: String,
        /// Also print the retrieved snippets.
        #[arg(long)]
        show_sources: bool,
    },
    /// Only judge whether the KB covers the question.
    Check { question: String },
}

fn init_logging(config: &Config) {
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", config.kbeval.log_level.as_str()),
    )
    .init();
}

fn print_metric(name: &str, score: f64) {
    println!("  {:<14} {:.2} ({})", name, score, QualityBand::from_score(score));
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;
    init_logging(&config);

    let pipeline = build_pipeline(&config);

    match args.command {
        Command::Ask {
            question,
            show_sources,
        } => {
            let outcome = pipeline.run_question(&question).await?;
            let eval = &outcome.evaluation;

            println!("Question: {}\n", question);
            if let Some(answer) = &outcome.answer {
                println!("Answer:\n{}\n", answer);
            }

            if show_sources {
                for (i, item) in eval.retrieved_items.iter().enumerate() {
                    let preview: String = item.text.chars().take(300).collect();
                    println!("Source {} (similarity {:.3})\n{}...\n", i + 1, item.score, preview);
                }
            }

            println!("Quality:");
            print_metric("Overall", eval.overall_score);
            print_metric("Relevancy", eval.metrics.context_relevancy);
            print_metric("Completeness", eval.metrics.answer_completeness);
            print_metric("Faithfulness", eval.metrics.faithfulness);
            print_metric("Precision@3", eval.metrics.precision_at_3);
        }
        Command::Check { question } => {
            let (items, verdict) = pipeline.check_coverage(&question).await?;
            println!("Retrieved {} snippets", items.len());
            for (i, item) in items.iter().enumerate() {
                let preview: String = item.text.chars().take(150).collect();
                println!("Snippet {} - Score: {:.3}\n{}...\n", i + 1, item.score, preview);
            }
            println!("{}", verdict.raw.trim());
            println!("\nParsed: {:?} ({:?} confidence)", verdict.verdict, verdict.confidence);
        }
    }

    Ok(())
}
